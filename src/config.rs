//! Conversion configuration (atx2img.yaml) parsing.
//!
//! The config names the archive entries the converter looks for. Every field
//! has a default, so an absent or empty file is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AtxError, Result};

/// The name of the config file picked up from the working directory.
pub const CONFIG_FILENAME: &str = "atx2img.yaml";

/// Conversion settings loaded from atx2img.yaml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Archive entry holding the JSON manifest.
    pub manifest_entry: String,

    /// Prefix of texture sheet entries; the sheet for `texNo` N is `<prefix>N.<ext>`.
    pub texture_prefix: String,

    /// Texture sheet extensions, probed in order. Lossless formats come first.
    pub texture_extensions: Vec<String>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            manifest_entry: "atlas.json".to_string(),
            texture_prefix: "tex".to_string(),
            texture_extensions: vec!["png".to_string(), "webp".to_string()],
        }
    }
}

impl ConvertConfig {
    /// Load config from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AtxError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read config: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Load an explicit config file, or atx2img.yaml from `dir` if present,
    /// or fall back to defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(content).map_err(|e| AtxError::Config {
            message: format!("Invalid config: {}", e),
            help: Some(format!("Check {} syntax", CONFIG_FILENAME)),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.manifest_entry.trim().is_empty() {
            return Err(AtxError::Config {
                message: "manifest_entry must not be empty".to_string(),
                help: Some("The default is atlas.json".to_string()),
            });
        }

        if self.texture_extensions.is_empty() {
            return Err(AtxError::Config {
                message: "texture_extensions must list at least one extension".to_string(),
                help: Some("The default is [png, webp]".to_string()),
            });
        }

        if let Some(ext) = self.texture_extensions.iter().find(|e| e.trim().is_empty()) {
            return Err(AtxError::Config {
                message: format!("texture_extensions contains an empty entry ({:?})", ext),
                help: None,
            });
        }

        Ok(())
    }

    /// Candidate archive entry names for a texture number, in probe order.
    pub fn texture_candidates(&self, tex_no: i32) -> Vec<String> {
        self.texture_extensions
            .iter()
            .map(|ext| format!("{}{}.{}", self.texture_prefix, tex_no, ext.trim_start_matches('.')))
            .collect()
    }
}
