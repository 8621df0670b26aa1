//! Error types for makemake-build.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for makemake-build operations.
pub type Result<T> = std::result::Result<T, GenError>;

/// Errors that can occur while generating a Makefile.
#[derive(Error, Debug, Diagnostic)]
pub enum GenError {
    /// Malformed or missing configuration (empty names, unsafe characters,
    /// empty lists where one is required, duplicates).
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(makemake::configuration),
        help("fix the configuration and run the generator again")
    )]
    Configuration(String),

    /// A working directory or the output file could not be written.
    #[error("Cannot write {}: {source}", .path.display())]
    #[diagnostic(code(makemake::file_system))]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read configuration file.
    #[error("Failed to read config file {}: {source}", .path.display())]
    #[diagnostic(code(makemake::read_config))]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    #[diagnostic(code(makemake::parse_config))]
    ParseConfig(#[from] toml::de::Error),

    /// Failed to serialize a configuration back to TOML.
    #[error("Failed to serialize config: {0}")]
    #[diagnostic(code(makemake::serialize_config))]
    SerializeConfig(#[from] toml::ser::Error),
}

impl GenError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        GenError::Configuration(message.into())
    }

    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenError::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a configuration problem (as opposed to I/O).
    pub fn is_configuration(&self) -> bool {
        matches!(self, GenError::Configuration(_))
    }
}
