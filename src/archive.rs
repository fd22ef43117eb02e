//! Read access to .atx containers.
//!
//! An .atx file is a zip archive holding the manifest and the texture
//! sheets. The converter only needs to probe for entries and read them whole,
//! which is what [`EntrySource`] offers.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{AtxError, Result};

/// A container of named byte entries.
pub trait EntrySource {
    /// Check whether an entry exists.
    fn contains(&self, name: &str) -> bool;

    /// Read an entry in full. Returns `Ok(None)` when it does not exist.
    fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>>;

    /// All entry names, in container order.
    fn entry_names(&self) -> Vec<String>;
}

/// A zip-backed .atx archive on disk.
pub struct ZipArchiveReader {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
}

impl ZipArchiveReader {
    /// Open an archive, failing if the file is missing or not a zip.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(AtxError::Archive {
                path: path.to_path_buf(),
                message: "File not found".to_string(),
                help: Some("Check the input path".to_string()),
            });
        }

        let file = File::open(path).map_err(|e| AtxError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to open archive: {}", e),
        })?;

        let archive = ZipArchive::new(BufReader::new(file)).map_err(|e| AtxError::Archive {
            path: path.to_path_buf(),
            message: format!("Failed to read archive: {}", e),
            help: Some("An .atx file must be a zip container".to_string()),
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }
}

impl EntrySource for ZipArchiveReader {
    fn contains(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(AtxError::Archive {
                    path: self.path.clone(),
                    message: format!("Failed to read entry '{}': {}", name, e),
                    help: None,
                })
            }
        };

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes).map_err(|e| AtxError::Archive {
            path: self.path.clone(),
            message: format!("Failed to read entry '{}': {}", name, e),
            help: None,
        })?;

        Ok(Some(bytes))
    }

    fn entry_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }
}

/// An in-memory entry source.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    entries: HashMap<String, Vec<u8>>,
    order: Vec<String>,
    reads: Vec<String>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let name = name.into();
        if !self.entries.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.entries.insert(name, bytes.into());
    }

    pub fn with_entry(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    /// Names of entries read so far, in read order.
    pub fn reads(&self) -> &[String] {
        &self.reads
    }
}

impl EntrySource for MemoryArchive {
    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let bytes = self.entries.get(name).cloned();
        if bytes.is_some() {
            self.reads.push(name.to_string());
        }
        Ok(bytes)
    }

    fn entry_names(&self) -> Vec<String> {
        self.order.clone()
    }
}
