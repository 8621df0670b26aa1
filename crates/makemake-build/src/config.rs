//! Generator configuration types (makemake.toml format).
//!
//! Every field has a default; the defaults describe the librbr source tree,
//! so an empty file (or no file at all) reproduces its Makefile.

use crate::error::{GenError, Result};
use crate::naming::{
    target_name, validate_line, validate_name, validate_path, validate_word, variable_stem,
};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the project root.
pub const CONFIG_FILE: &str = "makemake.toml";

/// Root generator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output file, relative to the project root.
    pub output: String,

    /// Compiler variables written to the header.
    pub compiler: CompilerConfig,

    /// Library source layout.
    pub layout: LayoutConfig,

    /// Test executable.
    pub tests: TestConfig,
}

/// Compiler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Value of `CC`.
    pub cc: String,

    /// Value of `CFLAGS`.
    pub cflags: String,

    /// Additional variables (external library flags), emitted verbatim.
    pub variables: Vec<VariableConfig>,
}

/// A verbatim header variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableConfig {
    pub name: String,
    pub value: String,
}

/// Library source layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Root of the library sources.
    pub source_dir: String,

    /// Root of the compiled objects.
    pub object_dir: String,

    /// Directory below `source_dir` holding the modules.
    pub module_dir: String,

    /// Module subdirectories, in emission order.
    pub modules: Vec<String>,

    /// Top-level directories below `source_dir`, compiled like modules.
    pub areas: Vec<String>,

    /// Name of the target grouping every module and area.
    pub aggregate: String,

    /// Alias directories through `NAME_SRC`/`NAME_OBJ` variables.
    pub directory_variables: bool,
}

/// Test executable settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Name of the test target.
    pub target: String,

    /// Root of the test sources, aliased by the test directory variable.
    pub source_dir: String,

    /// Test source directories; each one is a prerequisite.
    pub groups: Vec<String>,

    /// Sources compiled with the tests but not listed as prerequisites.
    pub extra_sources: Vec<String>,

    /// Extra flags for compiling the tests.
    pub compile_flags: String,

    /// Extra flags for linking the test binary.
    pub link_flags: String,

    /// Name of the linked executable.
    pub binary: String,

    /// Where the test objects end up.
    pub object_dir: String,

    /// Scratch directory used by the tests at run time.
    pub tmp_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: "Makefile".to_string(),
            compiler: CompilerConfig::default(),
            layout: LayoutConfig::default(),
            tests: TestConfig::default(),
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        let coin = [
            "`pkg-config --cflags --libs Coin`",
            "`pkg-config --cflags --libs clp`",
            "`pkg-config --cflags --libs osi`",
            "`pkg-config --libs coinutils`",
            "`pkg-config --cflags --libs osi-clp`",
        ];
        Self {
            cc: "g++".to_string(),
            cflags: "-std=c++11 -g".to_string(),
            variables: vec![VariableConfig {
                name: "COINFLAGS".to_string(),
                value: coin.join(" "),
            }],
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            source_dir: "librbr/src".to_string(),
            object_dir: "librbr/obj".to_string(),
            module_dir: "core".to_string(),
            modules: strings(&[
                "states",
                "actions",
                "observations",
                "state_transitions",
                "observation_transitions",
                "policy",
                "rewards",
                "agents",
            ]),
            areas: strings(&[
                "core",
                "utilities",
                "management",
                "mdp",
                "ssp",
                "pomdp",
                "dec_pomdp",
            ]),
            aggregate: "all.o".to_string(),
            directory_variables: true,
        }
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            target: "tests".to_string(),
            source_dir: "librbr_tests/src".to_string(),
            groups: strings(&[
                "librbr_tests/src/core",
                "librbr_tests/src/mdp",
                "librbr_tests/src/pomdp",
                "librbr_tests/src/management",
                "librbr_tests/src/utilities",
            ]),
            extra_sources: strings(&["librbr_tests/src/*.cpp"]),
            compile_flags: "-I..".to_string(),
            link_flags: "$(COINFLAGS)".to_string(),
            binary: "perform_tests".to_string(),
            object_dir: "librbr_tests/obj".to_string(),
            tmp_dir: "librbr_tests/tmp".to_string(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| GenError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load `makemake.toml` from `root` if present, otherwise the defaults.
    pub fn discover(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            tracing::debug!("loading {}", path.display());
            Self::from_file(&path)
        } else {
            tracing::debug!("no {} in {}, using defaults", CONFIG_FILE, root.display());
            Ok(Self::default())
        }
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Base source directory of the modules.
    pub fn module_source_dir(&self) -> String {
        crate::naming::join_dir(&self.layout.source_dir, &self.layout.module_dir)
    }

    /// Directories that must exist before any rule runs.
    pub fn working_dirs(&self) -> [&str; 3] {
        [
            self.layout.object_dir.as_str(),
            self.tests.object_dir.as_str(),
            self.tests.tmp_dir.as_str(),
        ]
    }

    /// Check everything that would otherwise produce a broken Makefile.
    pub fn validate(&self) -> Result<()> {
        validate_path("output file", &self.output)?;
        validate_word("CC", &self.compiler.cc)?;
        validate_line("CFLAGS", &self.compiler.cflags)?;

        let mut variables = FxHashSet::default();
        for reserved in ["CC", "CFLAGS"] {
            variables.insert(reserved.to_string());
        }
        for variable in &self.compiler.variables {
            validate_name("variable", &variable.name)?;
            validate_line(&variable.name, &variable.value)?;
            if !variables.insert(variable.name.clone()) {
                return Err(GenError::config(format!(
                    "variable {:?} defined twice",
                    variable.name
                )));
            }
        }

        let layout = &self.layout;
        validate_path("source directory", &layout.source_dir)?;
        validate_path("object directory", &layout.object_dir)?;
        validate_path("module directory", &layout.module_dir)?;
        validate_name("aggregate target", &layout.aggregate)?;
        if layout.modules.is_empty() {
            return Err(GenError::config("module list is empty"));
        }

        let mut targets = FxHashSet::default();
        for name in layout.modules.iter().chain(&layout.areas) {
            validate_name("module", name)?;
            if !targets.insert(name.as_str()) {
                return Err(GenError::config(format!(
                    "module or area {name:?} listed twice"
                )));
            }
            if layout.directory_variables {
                let stem = variable_stem(name);
                for var in [format!("{stem}_SRC"), format!("{stem}_OBJ")] {
                    if !variables.insert(var.clone()) {
                        return Err(GenError::config(format!(
                            "{name:?} maps to variable {var} which is already defined"
                        )));
                    }
                }
            }
        }

        let tests = &self.tests;
        validate_name("test target", &tests.target)?;
        validate_path("test source directory", &tests.source_dir)?;
        for group in &tests.groups {
            validate_path("test source group", group)?;
        }
        validate_line("test compile flags", &tests.compile_flags)?;
        validate_line("test link flags", &tests.link_flags)?;
        if layout.directory_variables {
            let stem = variable_stem(&tests.target);
            for var in [format!("{stem}_SRC"), format!("{stem}_OBJ")] {
                if !variables.insert(var.clone()) {
                    return Err(GenError::config(format!(
                        "test target {:?} maps to variable {var} which is already defined",
                        tests.target
                    )));
                }
            }
        }
        let mut target_names: FxHashSet<String> = targets.iter().map(|n| target_name(n)).collect();
        for extra in [&layout.aggregate, &tests.target] {
            if !target_names.insert(extra.clone()) {
                return Err(GenError::config(format!(
                    "target {extra:?} collides with another target"
                )));
            }
        }
        validate_path("test object directory", &tests.object_dir)?;
        validate_path("test tmp directory", &tests.tmp_dir)?;
        Ok(())
    }
}
