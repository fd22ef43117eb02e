//! Block compositor - assembles one block from its mesh pieces.
//!
//! Each mesh names a texture sheet, a crop rectangle within it, and a
//! destination offset on the block canvas. Pieces are drawn in manifest
//! order onto a transparent canvas of the block's declared size.

use std::collections::HashMap;

use crate::archive::EntrySource;
use crate::config::ConvertConfig;
use crate::diagnostics::{codes, Diagnostic};
use crate::error::{AtxError, Result};
use crate::manifest::{Block, Mesh};
use crate::raster::Surface;

/// Result of composing a single block.
#[derive(Debug)]
pub enum BlockOutcome {
    /// The block was assembled; some meshes may have been skipped.
    Composed(ComposedBlock),
    /// The block cannot be produced at all.
    Skipped(Diagnostic),
}

/// A fully composited block canvas.
#[derive(Debug)]
pub struct ComposedBlock {
    pub surface: Surface,
    /// Number of mesh pieces drawn.
    pub placed: usize,
    /// One entry per skipped mesh.
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of drawing a single mesh piece.
#[derive(Debug, PartialEq, Eq)]
pub enum MeshOutcome {
    Placed,
    Skipped(Diagnostic),
}

/// A texture sheet as resolved from the archive, cached per texture number.
#[derive(Debug)]
enum Sheet {
    Ready { entry: String, surface: Surface },
    Missing { candidates: Vec<String> },
    Undecodable { entry: String, reason: String },
}

/// Composes blocks using sheets pulled from an archive.
pub struct BlockCompositor<'a, S: EntrySource> {
    source: &'a mut S,
    config: &'a ConvertConfig,
    sheets: HashMap<i32, Sheet>,
}

impl<'a, S: EntrySource> BlockCompositor<'a, S> {
    pub fn new(source: &'a mut S, config: &'a ConvertConfig) -> Self {
        Self {
            source,
            config,
            sheets: HashMap::new(),
        }
    }

    /// Compose a block onto a fresh transparent canvas.
    ///
    /// Returns an error only when the block has no mesh list at all, which
    /// stops the whole run. Every other problem is reported in the outcome.
    pub fn compose(&mut self, block: &Block) -> Result<BlockOutcome> {
        let Some((width, height)) = block.valid_size() else {
            let (w, h) = block.pixel_size();
            return Ok(BlockOutcome::Skipped(Diagnostic::warning(
                codes::INVALID_DIMENSIONS,
                format!(
                    "Skipping block '{}' due to invalid dimensions ({}x{})",
                    block.filename(),
                    w,
                    h
                ),
            )));
        };

        let Some(meshes) = &block.mesh else {
            return Err(AtxError::Manifest {
                message: format!("Block '{}' has no Mesh list", block.filename()),
                help: Some("Every block in the manifest needs a Mesh array, even an empty one".to_string()),
            });
        };

        let mut surface = Surface::blank(width, height);
        let mut placed = 0;
        let mut diagnostics = Vec::new();

        for (index, mesh) in meshes.iter().enumerate() {
            match self.draw_mesh(&mut surface, block, index, mesh) {
                MeshOutcome::Placed => placed += 1,
                MeshOutcome::Skipped(diagnostic) => diagnostics.push(diagnostic),
            }
        }

        Ok(BlockOutcome::Composed(ComposedBlock {
            surface,
            placed,
            diagnostics,
        }))
    }

    fn draw_mesh(&mut self, canvas: &mut Surface, block: &Block, index: usize, mesh: &Mesh) -> MeshOutcome {
        let name = block.filename();

        let (entry, sheet) = match self.sheet(mesh.tex_no) {
            Sheet::Ready { entry, surface } => (entry, surface),
            Sheet::Missing { candidates } => {
                return MeshOutcome::Skipped(Diagnostic::warning(
                    codes::TEXTURE_MISSING,
                    format!(
                        "Texture {} not found for block '{}' mesh {}; skipping mesh",
                        candidates.join(" or "),
                        name,
                        index
                    ),
                ));
            }
            Sheet::Undecodable { entry, reason } => {
                return MeshOutcome::Skipped(Diagnostic::warning(
                    codes::TEXTURE_DECODE,
                    format!(
                        "Failed to load texture '{}' for block '{}' mesh {}: {}; skipping mesh",
                        entry, name, index, reason
                    ),
                ));
            }
        };

        let (x, y, w, h) = mesh.crop_rect();
        let piece = match sheet.crop(x, y, w, h) {
            Ok(piece) => piece,
            Err(e) => {
                return MeshOutcome::Skipped(Diagnostic::warning(
                    codes::CROP_OUT_OF_BOUNDS,
                    format!(
                        "Mesh {} crop for block '{}' is outside texture '{}' ({}); skipping mesh",
                        index, name, entry, e
                    ),
                ));
            }
        };

        let (dx, dy) = mesh.dest_offset();
        canvas.composite_over(&piece, dx, dy);
        MeshOutcome::Placed
    }

    /// Resolve, read and decode the sheet for a texture number, once per run.
    fn sheet(&mut self, tex_no: i32) -> &Sheet {
        if !self.sheets.contains_key(&tex_no) {
            let sheet = self.load_sheet(tex_no);
            self.sheets.insert(tex_no, sheet);
        }
        &self.sheets[&tex_no]
    }

    fn load_sheet(&mut self, tex_no: i32) -> Sheet {
        let candidates = self.config.texture_candidates(tex_no);

        let Some(entry) = candidates.iter().find(|c| self.source.contains(c)).cloned() else {
            return Sheet::Missing { candidates };
        };

        match self.source.read_entry(&entry) {
            Ok(Some(bytes)) => match Surface::decode(&bytes) {
                Ok(surface) => Sheet::Ready { entry, surface },
                Err(e) => Sheet::Undecodable {
                    entry,
                    reason: e.to_string(),
                },
            },
            Ok(None) => Sheet::Missing { candidates },
            Err(e) => Sheet::Undecodable {
                entry,
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::archive::MemoryArchive;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    pub const RED: [u8; 4] = [255, 0, 0, 255];
    pub const GREEN: [u8; 4] = [0, 255, 0, 255];
    pub const CLEAR: [u8; 4] = [0, 0, 0, 0];

    /// A 4x2 sheet: left half red, right half green.
    pub fn two_tone_png() -> Vec<u8> {
        let mut img = RgbaImage::from_pixel(4, 2, Rgba(RED));
        for y in 0..2 {
            for x in 2..4 {
                img.put_pixel(x, y, Rgba(GREEN));
            }
        }
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    pub fn mesh(tex_no: i32, view: (f64, f64), size: (f64, f64), dest: (f64, f64)) -> Mesh {
        Mesh {
            tex_no,
            view_x: view.0,
            view_y: view.1,
            width: size.0,
            height: size.1,
            src_offset_x: dest.0,
            src_offset_y: dest.1,
            ..Default::default()
        }
    }

    pub fn block(name: &str, size: (f64, f64), meshes: Vec<Mesh>) -> Block {
        Block {
            filename: Some(name.to_string()),
            filename_old: Some(name.to_string()),
            width: size.0,
            height: size.1,
            mesh: Some(meshes),
            ..Default::default()
        }
    }

    fn composed(outcome: BlockOutcome) -> ComposedBlock {
        match outcome {
            BlockOutcome::Composed(c) => c,
            BlockOutcome::Skipped(d) => panic!("block skipped: {}", d),
        }
    }

    #[test]
    fn test_compose_two_meshes() {
        let mut archive = MemoryArchive::new().with_entry("tex0.png", two_tone_png());
        let config = ConvertConfig::default();
        let mut compositor = BlockCompositor::new(&mut archive, &config);

        let block = block(
            "a",
            (4.0, 4.0),
            vec![
                mesh(0, (0.0, 0.0), (2.0, 2.0), (0.0, 0.0)),
                mesh(0, (2.0, 0.0), (2.0, 2.0), (2.0, 2.0)),
            ],
        );

        let result = composed(compositor.compose(&block).unwrap());
        assert_eq!(result.surface.size(), (4, 4));
        assert_eq!(result.placed, 2);
        assert!(result.diagnostics.is_empty());

        assert_eq!(result.surface.pixel(0, 0), Some(RED));
        assert_eq!(result.surface.pixel(1, 1), Some(RED));
        assert_eq!(result.surface.pixel(2, 2), Some(GREEN));
        assert_eq!(result.surface.pixel(3, 3), Some(GREEN));
        assert_eq!(result.surface.pixel(3, 0), Some(CLEAR));
        assert_eq!(result.surface.pixel(0, 3), Some(CLEAR));
    }

    #[test]
    fn test_invalid_dimensions_skip_without_reading_textures() {
        let mut archive = MemoryArchive::new().with_entry("tex0.png", two_tone_png());
        let config = ConvertConfig::default();

        for size in [(0.0, 4.0), (4.0, 0.0), (-2.0, 4.0), (0.9, 4.0)] {
            let mut compositor = BlockCompositor::new(&mut archive, &config);
            let block = block("zero", size, vec![mesh(0, (0.0, 0.0), (1.0, 1.0), (0.0, 0.0))]);

            match compositor.compose(&block).unwrap() {
                BlockOutcome::Skipped(d) => assert_eq!(d.code, codes::INVALID_DIMENSIONS),
                BlockOutcome::Composed(_) => panic!("expected skip for {:?}", size),
            }
        }

        assert!(archive.reads().is_empty());
    }

    #[test]
    fn test_invalid_dimensions_checked_before_missing_mesh_list() {
        let mut archive = MemoryArchive::new();
        let config = ConvertConfig::default();
        let mut compositor = BlockCompositor::new(&mut archive, &config);

        let block = Block {
            filename: Some("nomesh".into()),
            mesh: None,
            ..Default::default()
        };
        assert!(matches!(
            compositor.compose(&block).unwrap(),
            BlockOutcome::Skipped(_)
        ));
    }

    #[test]
    fn test_missing_mesh_list_is_fatal() {
        let mut archive = MemoryArchive::new();
        let config = ConvertConfig::default();
        let mut compositor = BlockCompositor::new(&mut archive, &config);

        let block = Block {
            filename: Some("nomesh".into()),
            width: 2.0,
            height: 2.0,
            mesh: None,
            ..Default::default()
        };
        assert!(matches!(
            compositor.compose(&block),
            Err(AtxError::Manifest { .. })
        ));
    }

    #[test]
    fn test_empty_mesh_list_yields_blank_canvas() {
        let mut archive = MemoryArchive::new();
        let config = ConvertConfig::default();
        let mut compositor = BlockCompositor::new(&mut archive, &config);

        let result = composed(compositor.compose(&block("empty", (3.0, 2.0), vec![])).unwrap());
        assert_eq!(result.surface, Surface::blank(3, 2));
        assert_eq!(result.placed, 0);
    }

    #[test]
    fn test_out_of_bounds_mesh_does_not_contaminate_siblings() {
        let mut archive = MemoryArchive::new().with_entry("tex0.png", two_tone_png());
        let config = ConvertConfig::default();
        let mut compositor = BlockCompositor::new(&mut archive, &config);

        let block = block(
            "mixed",
            (2.0, 2.0),
            vec![
                mesh(0, (3.0, 0.0), (2.0, 2.0), (0.0, 0.0)),
                mesh(0, (2.0, 0.0), (1.0, 1.0), (1.0, 1.0)),
                mesh(0, (-1.0, 0.0), (1.0, 1.0), (0.0, 0.0)),
            ],
        );

        let result = composed(compositor.compose(&block).unwrap());
        assert_eq!(result.placed, 1);
        assert_eq!(result.diagnostics.len(), 2);
        assert!(result
            .diagnostics
            .iter()
            .all(|d| d.code == codes::CROP_OUT_OF_BOUNDS));

        assert_eq!(result.surface.pixel(1, 1), Some(GREEN));
        assert_eq!(result.surface.pixel(0, 0), Some(CLEAR));
        assert_eq!(result.surface.pixel(1, 0), Some(CLEAR));
        assert_eq!(result.surface.pixel(0, 1), Some(CLEAR));
    }

    #[test]
    fn test_missing_texture_skips_mesh() {
        let mut archive = MemoryArchive::new().with_entry("tex0.png", two_tone_png());
        let config = ConvertConfig::default();
        let mut compositor = BlockCompositor::new(&mut archive, &config);

        let block = block(
            "gap",
            (2.0, 1.0),
            vec![
                mesh(5, (0.0, 0.0), (1.0, 1.0), (0.0, 0.0)),
                mesh(0, (0.0, 0.0), (1.0, 1.0), (1.0, 0.0)),
                mesh(5, (0.0, 0.0), (1.0, 1.0), (0.0, 0.0)),
            ],
        );

        let result = composed(compositor.compose(&block).unwrap());
        assert_eq!(result.placed, 1);
        assert_eq!(result.diagnostics.len(), 2);
        assert_eq!(result.diagnostics[0].code, codes::TEXTURE_MISSING);
        assert!(result.diagnostics[0].message.contains("tex5.png or tex5.webp"));
        assert_eq!(result.surface.pixel(0, 0), Some(CLEAR));
        assert_eq!(result.surface.pixel(1, 0), Some(RED));
    }

    #[test]
    fn test_lossless_sheet_preferred_over_lossy() {
        let mut archive = MemoryArchive::new()
            .with_entry("tex0.webp", b"not really webp".to_vec())
            .with_entry("tex0.png", two_tone_png());
        let config = ConvertConfig::default();
        let mut compositor = BlockCompositor::new(&mut archive, &config);

        let block = block("pref", (1.0, 1.0), vec![mesh(0, (0.0, 0.0), (1.0, 1.0), (0.0, 0.0))]);
        let result = composed(compositor.compose(&block).unwrap());
        assert_eq!(result.placed, 1);
        assert_eq!(result.surface.pixel(0, 0), Some(RED));

        assert_eq!(archive.reads(), &["tex0.png".to_string()]);
    }

    #[test]
    fn test_falls_back_to_lossy_sheet() {
        let mut archive = MemoryArchive::new().with_entry("tex2.webp", b"garbage".to_vec());
        let config = ConvertConfig::default();
        let mut compositor = BlockCompositor::new(&mut archive, &config);

        let block = block("lossy", (1.0, 1.0), vec![mesh(2, (0.0, 0.0), (1.0, 1.0), (0.0, 0.0))]);
        let result = composed(compositor.compose(&block).unwrap());

        // The webp entry was chosen; it just fails to decode.
        assert_eq!(result.diagnostics[0].code, codes::TEXTURE_DECODE);
        assert!(result.diagnostics[0].message.contains("tex2.webp"));
        assert_eq!(archive.reads(), &["tex2.webp".to_string()]);
    }

    #[test]
    fn test_configured_extension_order() {
        let mut archive = MemoryArchive::new()
            .with_entry("tex0.png", two_tone_png())
            .with_entry("tex0.webp", b"garbage".to_vec());
        let config = ConvertConfig {
            texture_extensions: vec!["webp".to_string(), "png".to_string()],
            ..Default::default()
        };
        let mut compositor = BlockCompositor::new(&mut archive, &config);

        let block = block("order", (1.0, 1.0), vec![mesh(0, (0.0, 0.0), (1.0, 1.0), (0.0, 0.0))]);
        let result = composed(compositor.compose(&block).unwrap());
        assert_eq!(result.diagnostics[0].code, codes::TEXTURE_DECODE);
    }

    #[test]
    fn test_sheet_decoded_once_per_run() {
        let mut archive = MemoryArchive::new().with_entry("tex0.png", two_tone_png());
        let config = ConvertConfig::default();
        let mut compositor = BlockCompositor::new(&mut archive, &config);

        let one = block("one", (1.0, 1.0), vec![mesh(0, (0.0, 0.0), (1.0, 1.0), (0.0, 0.0))]);
        let two = block("two", (1.0, 1.0), vec![mesh(0, (2.0, 0.0), (1.0, 1.0), (0.0, 0.0))]);
        compositor.compose(&one).unwrap();
        compositor.compose(&two).unwrap();

        assert_eq!(archive.reads().len(), 1);
    }

    #[test]
    fn test_piece_may_hang_off_canvas() {
        let mut archive = MemoryArchive::new().with_entry("tex0.png", two_tone_png());
        let config = ConvertConfig::default();
        let mut compositor = BlockCompositor::new(&mut archive, &config);

        let block = block(
            "edge",
            (2.0, 2.0),
            vec![
                mesh(0, (2.0, 0.0), (2.0, 2.0), (1.0, 1.0)),
                mesh(0, (0.0, 0.0), (2.0, 2.0), (10.0, 10.0)),
            ],
        );
        let result = composed(compositor.compose(&block).unwrap());
        assert_eq!(result.placed, 2);
        assert_eq!(result.surface.pixel(1, 1), Some(GREEN));
        assert_eq!(result.surface.pixel(0, 0), Some(CLEAR));
    }
}
