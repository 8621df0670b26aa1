//! Target names, directory paths and directory variables.
//!
//! Everything in here is a pure function of its arguments: the same module
//! name and base directories always derive the same variable names and paths.

use crate::error::{GenError, Result};

/// Suffix appended to module and area names to form their target names.
pub const OBJECT_SUFFIX: &str = ".o";

/// A pair of Makefile variables aliasing the source and object directory
/// of one module (or top-level area).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryVariable {
    /// Variable holding the source directory (e.g. `STATES_SRC`).
    pub source_var: String,
    /// Variable holding the object directory (e.g. `STATES_OBJ`).
    pub object_var: String,
    /// Concrete source directory (base source dir + module name).
    pub source_path: String,
    /// Concrete object directory (base object dir + module name).
    pub object_path: String,
}

impl DirectoryVariable {
    /// `$(NAME_SRC)`
    pub fn source_ref(&self) -> String {
        format!("$({})", self.source_var)
    }

    /// `$(NAME_OBJ)`
    pub fn object_ref(&self) -> String {
        format!("$({})", self.object_var)
    }
}

/// Derive the directory variables of a module.
///
/// Fails if `module_name` is empty or contains anything that is not safe to
/// place verbatim into a Makefile target or variable name.
pub fn emit_directory_variable(
    module_name: &str,
    base_source_dir: &str,
    base_object_dir: &str,
) -> Result<DirectoryVariable> {
    validate_name("module", module_name)?;
    validate_path("base source directory", base_source_dir)?;
    validate_path("base object directory", base_object_dir)?;

    let stem = variable_stem(module_name);
    Ok(DirectoryVariable {
        source_var: format!("{stem}_SRC"),
        object_var: format!("{stem}_OBJ"),
        source_path: join_dir(base_source_dir, module_name),
        object_path: join_dir(base_object_dir, module_name),
    })
}

/// Target name of a module or area: `states` -> `states.o`.
pub fn target_name(name: &str) -> String {
    format!("{name}{OBJECT_SUFFIX}")
}

/// Upper-cased variable stem: `state_transitions` -> `STATE_TRANSITIONS`,
/// `dec-pomdp` -> `DEC_POMDP`.
pub fn variable_stem(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '-' | '.' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// Join a base directory and a child name with a single `/`.
pub fn join_dir(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Check a module, area or target name.
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(GenError::config(format!("{kind} name must not be empty")));
    }
    if let Some(bad) = name.chars().find(|&c| !is_name_char(c)) {
        return Err(GenError::config(format!(
            "{kind} name {name:?} contains unsafe character {bad:?}"
        )));
    }
    Ok(())
}

/// Check a directory path. Same alphabet as names plus `/`.
pub fn validate_path(kind: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(GenError::config(format!("{kind} must not be empty")));
    }
    if let Some(bad) = path.chars().find(|&c| !is_name_char(c) && c != '/') {
        return Err(GenError::config(format!(
            "{kind} {path:?} contains unsafe character {bad:?}"
        )));
    }
    Ok(())
}

/// Check a verbatim word such as a source glob: anything but whitespace.
pub fn validate_word(kind: &str, word: &str) -> Result<()> {
    if word.is_empty() || word.chars().any(char::is_whitespace) {
        return Err(GenError::config(format!(
            "{kind} {word:?} must be a single non-empty word"
        )));
    }
    Ok(())
}

/// Check a verbatim value (flags, variable values): any text on one line.
pub fn validate_line(kind: &str, value: &str) -> Result<()> {
    if value.contains(['\n', '\r']) {
        return Err(GenError::config(format!(
            "{kind} {value:?} must not contain a line break"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_variable() {
        let var = emit_directory_variable("states", "src/core", "obj").unwrap();

        assert_eq!(var.source_var, "STATES_SRC");
        assert_eq!(var.object_var, "STATES_OBJ");
        assert_eq!(var.source_path, "src/core/states");
        assert_eq!(var.object_path, "obj/states");
        assert_eq!(var.source_ref(), "$(STATES_SRC)");
        assert_eq!(var.object_ref(), "$(STATES_OBJ)");
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let a = emit_directory_variable("state_transitions", "librbr/src/core", "librbr/obj");
        let b = emit_directory_variable("state_transitions", "librbr/src/core", "librbr/obj");
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[test]
    fn test_trailing_slash_in_base() {
        let var = emit_directory_variable("policy", "src/core/", "obj/").unwrap();
        assert_eq!(var.source_path, "src/core/policy");
        assert_eq!(var.object_path, "obj/policy");
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = emit_directory_variable("", "src", "obj").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unsafe_names_rejected() {
        for name in ["two words", "a:b", "x#", "$(HOME)", "a=b", "tab\there", "p%"] {
            let result = emit_directory_variable(name, "src", "obj");
            assert!(result.is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn test_variable_stem() {
        assert_eq!(variable_stem("dec-pomdp"), "DEC_POMDP");
        assert_eq!(variable_stem("file.loaders"), "FILE_LOADERS");
        assert_eq!(target_name("mdp"), "mdp.o");
    }

    #[test]
    fn test_validate_word() {
        assert!(validate_word("source", "librbr_tests/src/*.cpp").is_ok());
        assert!(validate_word("source", "a b").is_err());
        assert!(validate_word("source", "").is_err());
    }

    #[test]
    fn test_validate_line() {
        assert!(validate_line("CFLAGS", "-std=c++11 -g `pkg-config --libs clp`").is_ok());
        assert!(validate_line("CFLAGS", "").is_ok());
        assert!(validate_line("CFLAGS", "-g\n-O2").is_err());
        assert!(validate_line("CFLAGS", "-g\r").is_err());
    }
}
