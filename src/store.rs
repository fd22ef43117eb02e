//! Output directory handling.
//!
//! Every output is `<dir>/<identifier>.png`. The directory doubles as the
//! place character overlays read their base image back from.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AtxError, Result};
use crate::raster::Surface;

/// The directory converted sprites are written to.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    /// Use an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Use `root`, creating it if needed. The flag reports whether it was created.
    pub fn ensure(root: &Path) -> Result<(Self, bool)> {
        if root.is_dir() {
            return Ok((Self::new(root), false));
        }

        fs::create_dir_all(root).map_err(|e| AtxError::Io {
            path: root.to_path_buf(),
            message: format!("Failed to create output directory: {}", e),
        })?;

        Ok((Self::new(root), true))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the PNG for an identifier.
    pub fn path_for(&self, identifier: &str) -> PathBuf {
        self.root.join(format!("{}.png", identifier))
    }

    pub fn exists(&self, identifier: &str) -> bool {
        self.path_for(identifier).is_file()
    }

    /// Path for a plain sprite: `<filename>.png`, or `<filename>_<priority>.png`
    /// when the former is already taken.
    pub fn plain_path(&self, filename: &str, priority: i32) -> PathBuf {
        if self.exists(filename) {
            self.path_for(&format!("{}_{}", filename, priority))
        } else {
            self.path_for(filename)
        }
    }

    /// Write a surface to an explicit path inside this directory.
    pub fn save_at(&self, path: &Path, surface: &Surface) -> Result<PathBuf> {
        surface.save(path)?;
        Ok(path.to_path_buf())
    }

    /// Write a surface as `<identifier>.png`, replacing any existing file.
    pub fn save(&self, identifier: &str, surface: &Surface) -> Result<PathBuf> {
        self.save_at(&self.path_for(identifier), surface)
    }

    pub fn load(&self, identifier: &str) -> Result<Surface> {
        Surface::load(&self.path_for(identifier))
    }
}
