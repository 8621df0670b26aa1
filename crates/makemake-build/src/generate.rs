//! Makefile generation.
//!
//! [`build_makefile`] and [`generate`] are pure. [`write`] is the only
//! function here with file-system effects.

use crate::config::Config;
use crate::emit::{emit_aggregate_rule, emit_compile_rule, emit_test_rule, TestLayout};
use crate::error::{GenError, Result};
use crate::naming::{
    emit_directory_variable, join_dir, target_name, variable_stem, DirectoryVariable,
};
use crate::rule::{Makefile, Variable};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One compiled directory (module or area) with its resolved locations.
struct Unit {
    target: String,
    dirs: DirectoryVariable,
}

impl Unit {
    fn source(&self, aliased: bool) -> String {
        if aliased {
            self.dirs.source_ref()
        } else {
            self.dirs.source_path.clone()
        }
    }

    fn object(&self, aliased: bool) -> String {
        if aliased {
            self.dirs.object_ref()
        } else {
            self.dirs.object_path.clone()
        }
    }
}

/// Rewrite `path` relative to the directory behind `$(var)` when it lies
/// below `dir`; other paths are returned unchanged.
fn alias_under(path: &str, dir: &str, var: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if path == dir {
        return format!("$({var})");
    }
    match path.strip_prefix(dir).and_then(|rest| rest.strip_prefix('/')) {
        Some(rest) => join_dir(&format!("$({var})"), rest),
        None => path.to_string(),
    }
}

/// Build the rule model for `config`.
///
/// Rules come out in dependency order: modules, areas, the aggregate, then
/// the test rule.
pub fn build_makefile(config: &Config) -> Result<Makefile> {
    config.validate()?;

    let layout = &config.layout;
    let aliased = layout.directory_variables;
    let module_base = config.module_source_dir();

    let mut units = Vec::with_capacity(layout.modules.len() + layout.areas.len());
    for module in &layout.modules {
        units.push(Unit {
            target: target_name(module),
            dirs: emit_directory_variable(module, &module_base, &layout.object_dir)?,
        });
    }
    for area in &layout.areas {
        units.push(Unit {
            target: target_name(area),
            dirs: emit_directory_variable(area, &layout.source_dir, &layout.object_dir)?,
        });
    }

    let mut makefile = Makefile::new();
    makefile.push_variable(Variable::new("CC", &config.compiler.cc));
    makefile.push_variable(Variable::new("CFLAGS", &config.compiler.cflags));
    for variable in &config.compiler.variables {
        makefile.push_variable(Variable::new(&variable.name, &variable.value));
    }
    let tests = &config.tests;
    let test_dirs = DirectoryVariable {
        source_var: format!("{}_SRC", variable_stem(&tests.target)),
        object_var: format!("{}_OBJ", variable_stem(&tests.target)),
        source_path: tests.source_dir.clone(),
        object_path: tests.object_dir.clone(),
    };
    if aliased {
        for dirs in units.iter().map(|u| &u.dirs).chain([&test_dirs]) {
            makefile.push_variable(Variable::new(&dirs.source_var, &dirs.source_path));
            makefile.push_variable(Variable::new(&dirs.object_var, &dirs.object_path));
        }
    }
    // the test rule is emitted last, so it has to be named explicitly
    makefile.push_variable(Variable::simple(".DEFAULT_GOAL", &config.tests.target));

    for unit in &units {
        tracing::debug!(rule = %unit.target, "emitting compile rule");
        makefile.push_rule(emit_compile_rule(
            &unit.target,
            &unit.source(aliased),
            &unit.object(aliased),
        ));
    }

    let members: Vec<String> = units.iter().map(|u| u.target.clone()).collect();
    makefile.push_rule(emit_aggregate_rule(&layout.aggregate, &members)?);

    let library_objects: Vec<String> = units.iter().map(|u| u.object(aliased)).collect();
    let test_source = |path: &String| {
        if aliased {
            alias_under(path, &test_dirs.source_path, &test_dirs.source_var)
        } else {
            path.clone()
        }
    };
    let groups: Vec<String> = tests.groups.iter().map(&test_source).collect();
    let extra_sources: Vec<String> = tests.extra_sources.iter().map(&test_source).collect();
    let test_object_dir = if aliased {
        test_dirs.object_ref()
    } else {
        test_dirs.object_path.clone()
    };
    let test_layout = TestLayout {
        target: &tests.target,
        extra_sources: &extra_sources,
        compile_flags: &tests.compile_flags,
        link_flags: &tests.link_flags,
        library_objects: &library_objects,
        object_dir: &test_object_dir,
    };
    makefile.push_rule(emit_test_rule(
        &layout.aggregate,
        &groups,
        &tests.binary,
        &test_layout,
    )?);

    Ok(makefile)
}

/// Render the complete Makefile text for `config`.
pub fn generate(config: &Config) -> Result<String> {
    Ok(build_makefile(config)?.to_string())
}

/// Generate the Makefile and write it below `root`.
///
/// The text is produced before anything is touched on disk, so a
/// configuration error leaves the tree unchanged. The working directories
/// are then created and the output replaced atomically through a temporary
/// file in the same directory.
///
/// There is no locking: two concurrent runs against the same `root` race and
/// the last one to finish wins.
pub fn write(config: &Config, root: &Path) -> Result<PathBuf> {
    let text = generate(config)?;

    for dir in config.working_dirs() {
        let path = root.join(dir);
        std::fs::create_dir_all(&path).map_err(|e| GenError::fs(&path, e))?;
    }

    let output = root.join(&config.output);
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut file =
        tempfile::NamedTempFile::new_in(&parent).map_err(|e| GenError::fs(&parent, e))?;
    file.write_all(text.as_bytes()).map_err(|e| GenError::fs(file.path(), e))?;
    file.persist(&output).map_err(|e| GenError::fs(&output, e.error))?;

    tracing::info!("wrote {} ({} bytes)", output.display(), text.len());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.compiler.variables.clear();
        config.layout.source_dir = "src".to_string();
        config.layout.object_dir = "obj".to_string();
        config.layout.modules = vec!["states".to_string(), "actions".to_string()];
        config.layout.areas.clear();
        config.layout.directory_variables = false;
        config.tests.groups = vec!["tests/core".to_string(), "tests/mdp".to_string()];
        config.tests.extra_sources.clear();
        config.tests.compile_flags.clear();
        config.tests.link_flags.clear();
        config.tests.object_dir = "tests/obj".to_string();
        config.tests.tmp_dir = "tests/tmp".to_string();
        config
    }

    #[test]
    fn test_generate_small_tree() {
        let text = generate(&small_config()).unwrap();

        let expected = "\
CC = g++
CFLAGS = -std=c++11 -g
.DEFAULT_GOAL := tests

states.o: src/core/states/*.cpp
\tmkdir -p obj/states
\t$(CC) $(CFLAGS) -c src/core/states/*.cpp
\tmv $(notdir $(patsubst %.cpp,%.o,$(wildcard src/core/states/*.cpp))) obj/states

actions.o: src/core/actions/*.cpp
\tmkdir -p obj/actions
\t$(CC) $(CFLAGS) -c src/core/actions/*.cpp
\tmv $(notdir $(patsubst %.cpp,%.o,$(wildcard src/core/actions/*.cpp))) obj/actions

all.o: states.o actions.o

tests: all.o tests/core/*.cpp tests/mdp/*.cpp
\tmkdir -p tests/obj
\t$(CC) $(CFLAGS) -c tests/core/*.cpp tests/mdp/*.cpp
\t$(CC) $(CFLAGS) -o perform_tests obj/states/*.o obj/actions/*.o \
$(notdir $(patsubst %.cpp,%.o,$(wildcard tests/core/*.cpp tests/mdp/*.cpp)))
\tmv $(notdir $(patsubst %.cpp,%.o,$(wildcard tests/core/*.cpp tests/mdp/*.cpp))) tests/obj
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_rule_order() {
        let makefile = build_makefile(&Config::default()).unwrap();
        let targets: Vec<&str> = makefile.rules.iter().map(|r| r.target.as_str()).collect();

        assert_eq!(targets.first(), Some(&"states.o"));
        assert_eq!(targets[targets.len() - 2], "all.o");
        assert_eq!(targets.last(), Some(&"tests"));
    }

    #[test]
    fn test_directory_variables_in_header() {
        let mut config = small_config();
        config.layout.directory_variables = true;
        let makefile = build_makefile(&config).unwrap();

        let src = makefile.find_variable("STATES_SRC").unwrap();
        assert_eq!(src.value, "src/core/states");
        let obj = makefile.find_variable("ACTIONS_OBJ").unwrap();
        assert_eq!(obj.value, "obj/actions");

        let rule = makefile.find_rule("states.o").unwrap();
        assert_eq!(rule.prerequisites, vec!["$(STATES_SRC)/*.cpp"]);
        assert_eq!(rule.recipe[0], "mkdir -p $(STATES_OBJ)");
    }

    #[test]
    fn test_areas_use_source_root() {
        let mut config = small_config();
        config.layout.areas = vec!["core".to_string(), "utilities".to_string()];
        let makefile = build_makefile(&config).unwrap();

        let core = makefile.find_rule("core.o").unwrap();
        assert_eq!(core.prerequisites, vec!["src/core/*.cpp"]);
        let all = makefile.find_rule("all.o").unwrap();
        assert_eq!(
            all.prerequisites,
            vec!["states.o", "actions.o", "core.o", "utilities.o"]
        );
    }

    #[test]
    fn test_test_directories_aliased() {
        let mut config = small_config();
        config.layout.directory_variables = true;
        config.tests.source_dir = "tests".to_string();
        config.tests.extra_sources = vec![
            "tests/*.cpp".to_string(),
            "other/main.cpp".to_string(),
        ];
        let makefile = build_makefile(&config).unwrap();

        assert_eq!(makefile.find_variable("TESTS_SRC").unwrap().value, "tests");
        assert_eq!(makefile.find_variable("TESTS_OBJ").unwrap().value, "tests/obj");

        let rule = makefile.find_rule("tests").unwrap();
        assert_eq!(
            rule.prerequisites,
            vec!["all.o", "$(TESTS_SRC)/core/*.cpp", "$(TESTS_SRC)/mdp/*.cpp"]
        );
        assert_eq!(rule.recipe[0], "mkdir -p $(TESTS_OBJ)");
        assert!(rule.recipe[1].ends_with("$(TESTS_SRC)/*.cpp other/main.cpp"));
        assert!(rule.recipe[3].ends_with(" $(TESTS_OBJ)"));
    }

    #[test]
    fn test_alias_under() {
        assert_eq!(alias_under("t/src/core", "t/src", "T_SRC"), "$(T_SRC)/core");
        assert_eq!(alias_under("t/src", "t/src/", "T_SRC"), "$(T_SRC)");
        assert_eq!(alias_under("t/srcx/core", "t/src", "T_SRC"), "t/srcx/core");
    }

    #[test]
    fn test_generate_rejects_empty_module_list() {
        let mut config = small_config();
        config.layout.modules.clear();
        assert!(generate(&config).unwrap_err().is_configuration());
    }
}
