//! Makefile generation for module-structured C++ source trees.
//!
//! This crate provides:
//! - Generator configuration format (`makemake.toml`)
//! - A small rule model rendered to Makefile text
//! - Rule emitters for modules, the aggregate target and the test binary
//! - [`generate`] (pure) and [`write`] (creates working directories and
//!   replaces the output file atomically)
//!
//! # Example
//!
//! ```toml
//! # makemake.toml
//! [layout]
//! source_dir = "src"
//! object_dir = "obj"
//! modules = ["states", "actions"]
//! areas = ["core", "mdp"]
//!
//! [tests]
//! groups = ["tests/core", "tests/mdp"]
//! binary = "perform_tests"
//! ```

mod config;
mod emit;
mod error;
mod generate;
mod naming;
mod rule;

pub use config::{CompilerConfig, Config, LayoutConfig, TestConfig, VariableConfig, CONFIG_FILE};
pub use emit::{emit_aggregate_rule, emit_compile_rule, emit_test_rule, TestLayout};
pub use error::{GenError, Result};
pub use generate::{build_makefile, generate, write};
pub use naming::{emit_directory_variable, target_name, DirectoryVariable};
pub use rule::{Assign, Makefile, Rule, Variable};
