//! CLI error types.

use std::path::PathBuf;

use downmark_config::ConfigError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid attribute '{0}': expected NAME, NAME=VALUE or NAME!")]
    InvalidAttribute(String),

    #[error("output file would overwrite the input: {}", .0.display())]
    OverwritesInput(PathBuf),
}
