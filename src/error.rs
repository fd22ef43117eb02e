use miette::Diagnostic;
use thiserror::Error;

/// Main error type for atx2img operations.
///
/// Only run-stopping failures are represented here. Per-block and per-mesh
/// problems are reported as [`crate::diagnostics::Diagnostic`] records instead.
#[derive(Error, Diagnostic, Debug)]
pub enum AtxError {
    #[error("IO error: {0}")]
    #[diagnostic(code(atx2img::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(atx2img::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Archive error with {path}: {message}")]
    #[diagnostic(code(atx2img::archive))]
    Archive {
        path: std::path::PathBuf,
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Manifest error: {message}")]
    #[diagnostic(code(atx2img::manifest))]
    Manifest {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Config error: {message}")]
    #[diagnostic(code(atx2img::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Usage error: {message}")]
    #[diagnostic(code(atx2img::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },
}

pub type Result<T> = std::result::Result<T, AtxError>;
