//! atx2img - Sprite reconstruction from .atx texture atlases
//!
//! An .atx archive packs many sprites into shared texture sheets and
//! describes, in an `atlas.json` manifest, how to cut each sprite back out.
//! This library reads the manifest, reassembles every block from its mesh
//! pieces, resolves delta-encoded character sprites against their base
//! image, and writes one PNG per sprite.

pub mod archive;
pub mod cli;
pub mod compositor;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod raster;
pub mod resolver;
pub mod store;

pub use archive::{EntrySource, MemoryArchive, ZipArchiveReader};
pub use compositor::{BlockCompositor, BlockOutcome, ComposedBlock, MeshOutcome};
pub use config::ConvertConfig;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{AtxError, Result};
pub use manifest::{Atlas, Attribute, Block, Canvas, Mesh};
pub use pipeline::{convert, run, Summary};
pub use raster::{blend_over, RasterError, Surface};
pub use resolver::{plan, resolve, CharacterState, Resolution, Route};
pub use store::OutputDir;
