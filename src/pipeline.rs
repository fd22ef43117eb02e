//! Conversion pipeline.
//!
//! Opens an archive, reads its manifest, then composes and persists every
//! block in manifest order. Problems with individual blocks or meshes are
//! reported and skipped; only archive, manifest and configuration failures
//! end the run early.

use std::path::{Path, PathBuf};

use crate::archive::{EntrySource, ZipArchiveReader};
use crate::compositor::{BlockCompositor, BlockOutcome};
use crate::config::ConvertConfig;
use crate::diagnostics::{codes, Diagnostic, Diagnostics};
use crate::error::{AtxError, Result};
use crate::manifest::Atlas;
use crate::output::{display_path, Printer};
use crate::resolver::{resolve, CharacterState, Route};
use crate::store::OutputDir;

/// What a conversion run did.
#[derive(Debug, Default)]
pub struct Summary {
    /// Blocks listed in the manifest.
    pub blocks_total: usize,
    /// Blocks written to disk.
    pub saved: usize,
    /// Blocks skipped for invalid dimensions.
    pub skipped: usize,
    /// Blocks that were composed but could not be written.
    pub failed: usize,
    /// Files written, in write order. A path may repeat when a character
    /// base or overlay is rewritten.
    pub outputs: Vec<PathBuf>,
    /// Whether the output directory had to be created.
    pub created_output_dir: bool,
    pub diagnostics: Diagnostics,
}

impl Summary {
    fn record(&mut self, printer: &Printer, diagnostic: Diagnostic) {
        printer.diagnostic(&diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

/// Convert the .atx archive at `archive_path` into PNGs under `output_dir`.
pub fn run(
    archive_path: &Path,
    output_dir: &Path,
    config: &ConvertConfig,
    printer: &Printer,
) -> Result<Summary> {
    let mut archive = ZipArchiveReader::open(archive_path)?;
    convert(&mut archive, output_dir, config, printer)
}

/// Convert an already opened entry source.
pub fn convert<S: EntrySource>(
    source: &mut S,
    output_dir: &Path,
    config: &ConvertConfig,
    printer: &Printer,
) -> Result<Summary> {
    let atlas = load_atlas(source, config)?;

    let (out, created) = OutputDir::ensure(output_dir)?;
    if created {
        printer.info("Created", &display_path(output_dir));
    }

    let mut summary = Summary {
        blocks_total: atlas.blocks.len(),
        created_output_dir: created,
        ..Default::default()
    };

    if atlas.blocks.is_empty() {
        summary.record(
            printer,
            Diagnostic::warning(
                codes::NO_BLOCKS,
                format!("No blocks found in {}; nothing to convert", config.manifest_entry),
            ),
        );
        return Ok(summary);
    }

    let mut compositor = BlockCompositor::new(source, config);
    let mut state = CharacterState::new();

    for block in &atlas.blocks {
        let composed = match compositor.compose(block)? {
            BlockOutcome::Composed(composed) => composed,
            BlockOutcome::Skipped(diagnostic) => {
                summary.skipped += 1;
                summary.record(printer, diagnostic);
                continue;
            }
        };

        printer.verbose(
            "Composed",
            &format!(
                "{} ({}x{}, {}/{} meshes)",
                block.filename(),
                composed.surface.width(),
                composed.surface.height(),
                composed.placed,
                block.mesh_count()
            ),
        );
        for diagnostic in composed.diagnostics {
            summary.record(printer, diagnostic);
        }

        let resolution = resolve(&mut state, block, composed.surface, &out);
        for diagnostic in resolution.diagnostics {
            summary.record(printer, diagnostic);
        }

        match resolution.saved {
            Some(path) => {
                let verb = match resolution.route {
                    Route::Plain | Route::Fallback => "Saved",
                    Route::Base => "Saved base",
                    Route::Overlay { .. } => "Merged",
                };
                printer.status(verb, &display_path(&path));
                summary.saved += 1;
                summary.outputs.push(path);
            }
            None => summary.failed += 1,
        }
    }

    Ok(summary)
}

/// Read and parse the manifest entry.
pub fn load_atlas<S: EntrySource>(source: &mut S, config: &ConvertConfig) -> Result<Atlas> {
    let bytes = source
        .read_entry(&config.manifest_entry)?
        .ok_or_else(|| AtxError::Manifest {
            message: format!("{} not found in the archive", config.manifest_entry),
            help: Some("Is this an .atx file?".to_string()),
        })?;

    Atlas::parse(&bytes)
}
