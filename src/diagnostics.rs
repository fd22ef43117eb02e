//! Diagnostic records for non-fatal conversion problems.
//!
//! Missing textures, bad crops, unwritable outputs and similar problems never
//! stop a run. Each one becomes a [`Diagnostic`] that is printed as it occurs
//! and collected into the run summary.

use std::fmt;

/// Diagnostic codes emitted by the converter.
pub mod codes {
    pub const INVALID_DIMENSIONS: &str = "atx2img::block::invalid-dimensions";
    pub const TEXTURE_MISSING: &str = "atx2img::mesh::texture-missing";
    pub const TEXTURE_DECODE: &str = "atx2img::mesh::texture-decode";
    pub const CROP_OUT_OF_BOUNDS: &str = "atx2img::mesh::crop-out-of-bounds";
    pub const BASE_MISSING: &str = "atx2img::character::base-missing";
    pub const BASE_LOAD: &str = "atx2img::character::base-load";
    pub const SAVE_FAILED: &str = "atx2img::save::failed";
    pub const NO_BLOCKS: &str = "atx2img::manifest::no-blocks";
}

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single conversion diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: Severity,
    /// Machine-readable diagnostic code (e.g. "atx2img::mesh::texture-missing").
    pub code: String,
    /// Human-readable message naming the block, mesh or file involved.
    pub message: String,
    /// Optional help text.
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
            help: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.into(),
            message: message.into(),
            help: None,
        }
    }

    /// Add help text to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

/// An ordered collection of diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.items.iter().filter(|d| !d.is_error()).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check whether any diagnostic carries the given code.
    pub fn contains_code(&self, code: &str) -> bool {
        self.items.iter().any(|d| d.code == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }
}
