//! Rule emitters.
//!
//! Each emitter is a pure text producer returning a [`Rule`]. None of them
//! touch the file system.

use crate::error::{GenError, Result};
use crate::naming::{validate_name, validate_word};
use crate::rule::Rule;
use rustc_hash::FxHashSet;

/// Compiler invocation prefix shared by every compile and link step.
pub const COMPILER: &str = "$(CC) $(CFLAGS)";

/// Glob matching every C++ source file of a directory.
pub fn source_glob(dir: &str) -> String {
    format!("{dir}/*.cpp")
}

/// Glob matching every object file of a directory.
pub fn object_glob(dir: &str) -> String {
    format!("{dir}/*.o")
}

/// Names of the objects the compiler leaves in the working directory for
/// the given source globs: `a/x.cpp b/y.cpp` -> `x.o y.o`.
///
/// Expanded by `make`, so rules running in parallel only ever touch the
/// objects of their own sources.
pub fn compiled_objects(source_globs: &[String]) -> String {
    format!(
        "$(notdir $(patsubst %.cpp,%.o,$(wildcard {})))",
        source_globs.join(" ")
    )
}

/// Emit the compile rule of one module.
///
/// The recipe is always: create `object_dir`, compile `source_dir/*.cpp`,
/// move the resulting objects into `object_dir`. `make` runs the steps
/// sequentially, so this order must not change.
pub fn emit_compile_rule(target: &str, source_dir: &str, object_dir: &str) -> Rule {
    let sources = source_glob(source_dir);
    let objects = compiled_objects(std::slice::from_ref(&sources));
    Rule::new(target)
        .with_prerequisite(sources.clone())
        .with_step(format!("mkdir -p {object_dir}"))
        .with_step(format!("{COMPILER} -c {sources}"))
        .with_step(format!("mv {objects} {object_dir}"))
}

/// Emit a rule that only groups `members` through its prerequisites.
pub fn emit_aggregate_rule(name: &str, members: &[String]) -> Result<Rule> {
    validate_name("aggregate target", name)?;
    if members.is_empty() {
        return Err(GenError::config(format!(
            "aggregate target {name:?} has no members"
        )));
    }

    let mut seen = FxHashSet::default();
    for member in members {
        if member.is_empty() {
            return Err(GenError::config(format!(
                "aggregate target {name:?} has an empty member"
            )));
        }
        if !seen.insert(member.as_str()) {
            return Err(GenError::config(format!(
                "aggregate target {name:?} lists {member:?} twice"
            )));
        }
    }

    Ok(Rule::new(name).with_prerequisites(members.iter().cloned()))
}

/// Everything about the test rule besides its prerequisites and output.
#[derive(Debug, Clone, Copy)]
pub struct TestLayout<'a> {
    /// Name of the test target (e.g. `tests`).
    pub target: &'a str,
    /// Sources compiled with the tests but not listed as prerequisites.
    pub extra_sources: &'a [String],
    /// Flags added to the test compile step (e.g. `-I..`).
    pub compile_flags: &'a str,
    /// Flags added to the link step, passed through verbatim.
    pub link_flags: &'a str,
    /// Object directories of the library, linked into the binary.
    pub library_objects: &'a [String],
    /// Where the compiled test objects are moved to.
    pub object_dir: &'a str,
}

/// Emit the rule compiling the tests and linking them into `output_binary`.
///
/// `aggregate_target` comes first among the prerequisites so every library
/// object exists before the link step runs.
pub fn emit_test_rule(
    aggregate_target: &str,
    test_groups: &[String],
    output_binary: &str,
    layout: &TestLayout<'_>,
) -> Result<Rule> {
    validate_name("test target", layout.target)?;
    validate_name("aggregate target", aggregate_target)?;
    validate_name("test binary", output_binary)?;
    validate_word("test object directory", layout.object_dir)?;
    if test_groups.is_empty() {
        return Err(GenError::config("no test source groups configured"));
    }
    let mut seen = FxHashSet::default();
    for group in test_groups {
        validate_word("test source group", group)?;
        if !seen.insert(group.as_str()) {
            return Err(GenError::config(format!(
                "test source group {group:?} listed twice"
            )));
        }
    }
    for source in layout.extra_sources {
        validate_word("extra test source", source)?;
    }

    let group_globs: Vec<String> = test_groups.iter().map(|g| source_glob(g)).collect();
    let mut test_sources = group_globs.clone();
    test_sources.extend(layout.extra_sources.iter().cloned());
    let test_objects = compiled_objects(&test_sources);

    let mut compile = vec![COMPILER.to_string(), "-c".to_string()];
    push_flags(&mut compile, layout.compile_flags);
    compile.extend(test_sources.iter().cloned());

    let mut link = vec![COMPILER.to_string()];
    push_flags(&mut link, layout.link_flags);
    link.push("-o".to_string());
    link.push(output_binary.to_string());
    link.extend(layout.library_objects.iter().map(|dir| object_glob(dir)));
    link.push(test_objects.clone());

    Ok(Rule::new(layout.target)
        .with_prerequisite(aggregate_target)
        .with_prerequisites(group_globs)
        .with_step(format!("mkdir -p {}", layout.object_dir))
        .with_step(compile.join(" "))
        .with_step(link.join(" "))
        .with_step(format!("mv {test_objects} {}", layout.object_dir)))
}

fn push_flags(words: &mut Vec<String>, flags: &str) {
    let flags = flags.trim();
    if !flags.is_empty() {
        words.push(flags.to_string());
    }
}
