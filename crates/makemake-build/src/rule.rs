//! In-memory model of the generated Makefile.
//!
//! Rules and variables are plain records; the only place that knows the
//! textual format is the `Display` implementations at the bottom of this file.

use std::fmt;

/// Assignment flavour of a header variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assign {
    /// `NAME = value`
    Recursive,
    /// `NAME := value`
    Simple,
}

/// A header variable such as `CC = g++`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub assign: Assign,
    pub value: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            assign: Assign::Recursive,
            value: value.into(),
        }
    }

    pub fn simple(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            assign: Assign::Simple,
            ..Self::new(name, value)
        }
    }
}

/// A target with its prerequisites and recipe lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub target: String,
    pub prerequisites: Vec<String>,
    pub recipe: Vec<String>,
}

impl Rule {
    /// Create a rule with no prerequisites and an empty recipe.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            prerequisites: Vec::new(),
            recipe: Vec::new(),
        }
    }

    /// Append a prerequisite.
    pub fn with_prerequisite(mut self, prerequisite: impl Into<String>) -> Self {
        self.prerequisites.push(prerequisite.into());
        self
    }

    /// Append several prerequisites, keeping their order.
    pub fn with_prerequisites<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerequisites.extend(prerequisites.into_iter().map(Into::into));
        self
    }

    /// Append a recipe line (without the leading tab).
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.recipe.push(step.into());
        self
    }

    /// Position of the first recipe line starting with `prefix`.
    pub fn step_index(&self, prefix: &str) -> Option<usize> {
        self.recipe.iter().position(|line| line.starts_with(prefix))
    }
}

/// A complete Makefile: header variables followed by rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Makefile {
    pub variables: Vec<Variable>,
    pub rules: Vec<Rule>,
}

impl Makefile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_variable(&mut self, variable: Variable) {
        self.variables.push(variable);
    }

    pub fn push_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Find a rule by target name.
    pub fn find_rule(&self, target: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.target == target)
    }

    /// Find a variable by name.
    pub fn find_variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.assign {
            Assign::Recursive => "=",
            Assign::Simple => ":=",
        };
        if self.value.is_empty() {
            write!(f, "{} {}", self.name, op)
        } else {
            write!(f, "{} {} {}", self.name, op, self.value)
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.target)?;
        for prerequisite in &self.prerequisites {
            write!(f, " {prerequisite}")?;
        }
        writeln!(f)?;
        for step in &self.recipe {
            writeln!(f, "\t{step}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Makefile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for variable in &self.variables {
            writeln!(f, "{variable}")?;
        }
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 || !self.variables.is_empty() {
                writeln!(f)?;
            }
            write!(f, "{rule}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_rule() {
        let rule = Rule::new("states.o")
            .with_prerequisite("src/states/*.cpp")
            .with_step("mkdir -p obj/states");

        assert_eq!(
            rule.to_string(),
            "states.o: src/states/*.cpp\n\tmkdir -p obj/states\n"
        );
    }

    #[test]
    fn test_render_rule_without_prerequisites() {
        assert_eq!(Rule::new("empty").to_string(), "empty:\n");
    }

    #[test]
    fn test_render_variables() {
        assert_eq!(Variable::new("CC", "g++").to_string(), "CC = g++");
        assert_eq!(
            Variable::simple(".DEFAULT_GOAL", "tests").to_string(),
            ".DEFAULT_GOAL := tests"
        );
        assert_eq!(Variable::new("EMPTY", "").to_string(), "EMPTY =");
    }

    #[test]
    fn test_render_makefile() {
        let mut makefile = Makefile::new();
        makefile.push_variable(Variable::new("CC", "g++"));
        makefile.push_rule(Rule::new("a.o").with_prerequisite("a/*.cpp"));
        makefile.push_rule(Rule::new("all.o").with_prerequisite("a.o"));

        assert_eq!(
            makefile.to_string(),
            "CC = g++\n\na.o: a/*.cpp\n\nall.o: a.o\n"
        );
        // rules are separated by one blank line; the file ends with one newline
        assert!(!makefile.to_string().ends_with("\n\n"));
        assert!(makefile.find_rule("all.o").is_some());
        assert!(makefile.find_variable("CC").is_some());
    }

    #[test]
    fn test_step_index() {
        let rule = Rule::new("t").with_step("mkdir -p x").with_step("mv *.o x");
        assert_eq!(rule.step_index("mkdir"), Some(0));
        assert_eq!(rule.step_index("mv "), Some(1));
        assert_eq!(rule.step_index("$(CC)"), None);
    }
}
