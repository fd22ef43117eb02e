//! Atlas manifest (atlas.json) model.
//!
//! The manifest lists blocks in output order. Each block is assembled from
//! mesh pieces cropped out of shared texture sheets. Geometry is stored as
//! the JSON numbers it arrives as and truncated to whole pixels when used.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AtxError, Result};

/// Root of an atlas manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Atlas {
    /// Canvas size of the original layout. Informational only.
    #[serde(rename = "Canvas")]
    pub canvas: Option<Canvas>,

    /// Blocks in manifest order. Order matters for character sprites.
    #[serde(rename = "Block", deserialize_with = "null_as_default")]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Canvas {
    #[serde(rename = "Width")]
    pub width: i32,
    #[serde(rename = "Height")]
    pub height: i32,
}

/// One output sprite built from mesh pieces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Block {
    /// Current identifier of the sprite.
    pub filename: Option<String>,

    /// Original identifier. Equal to `filename` for ordinary sprites; shared
    /// by a character base and all its overlay variants.
    pub filename_old: Option<String>,

    pub blend: Option<String>,
    pub id: i32,
    pub anchor_x: f64,
    pub anchor_y: f64,
    pub width: f64,
    pub height: f64,

    /// Placement offset, used to align character overlays with their base.
    pub offset_x: f64,
    pub offset_y: f64,

    /// Disambiguates outputs whose `filename` collides.
    pub priority: i32,

    /// Mesh pieces. `None` when the manifest has no mesh list for this block.
    #[serde(rename = "Mesh")]
    pub mesh: Option<Vec<Mesh>>,

    #[serde(rename = "Attribute", deserialize_with = "null_as_default")]
    pub attributes: Vec<Attribute>,
}

impl Block {
    /// The block's `filename`, or "" when absent.
    pub fn filename(&self) -> &str {
        self.filename.as_deref().unwrap_or("")
    }

    /// The block's `filenameOld`, or "" when absent.
    pub fn filename_old(&self) -> &str {
        self.filename_old.as_deref().unwrap_or("")
    }

    /// True when the current and original identifiers differ, which marks
    /// the block as part of a character sprite.
    pub fn is_renamed(&self) -> bool {
        self.filename != self.filename_old
    }

    /// Canvas size in whole pixels.
    pub fn pixel_size(&self) -> (i64, i64) {
        (self.width as i64, self.height as i64)
    }

    /// Returns the pixel size when both dimensions are positive.
    pub fn valid_size(&self) -> Option<(u32, u32)> {
        let (w, h) = self.pixel_size();
        if w <= 0 || h <= 0 {
            return None;
        }
        Some((u32::try_from(w).ok()?, u32::try_from(h).ok()?))
    }

    /// Placement offset in whole pixels.
    pub fn offset(&self) -> (i64, i64) {
        (self.offset_x as i64, self.offset_y as i64)
    }

    /// Number of mesh pieces, 0 when the list is absent.
    pub fn mesh_count(&self) -> usize {
        self.mesh.as_ref().map_or(0, Vec::len)
    }
}

/// A rectangle cropped from a texture sheet and placed on a block canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Mesh {
    /// Texture sheet number, resolved to `tex<texNo>.<ext>`.
    pub tex_no: i32,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Placement within the block canvas.
    pub src_offset_x: f64,
    pub src_offset_y: f64,
    #[serde(rename = "texU1")]
    pub tex_u1: f64,
    #[serde(rename = "texV1")]
    pub tex_v1: f64,
    #[serde(rename = "texU2")]
    pub tex_u2: f64,
    #[serde(rename = "texV2")]
    pub tex_v2: f64,
    /// Crop origin within the texture sheet.
    pub view_x: f64,
    pub view_y: f64,
    /// Crop size.
    pub width: f64,
    pub height: f64,
}

impl Mesh {
    /// Crop rectangle `(x, y, width, height)` in whole pixels.
    pub fn crop_rect(&self) -> (i64, i64, i64, i64) {
        (
            self.view_x as i64,
            self.view_y as i64,
            self.width as i64,
            self.height as i64,
        )
    }

    /// Destination offset on the block canvas in whole pixels.
    pub fn dest_offset(&self) -> (i64, i64) {
        (self.src_offset_x as i64, self.src_offset_y as i64)
    }
}

/// Per-block attribute region. Carried through but not used for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attribute {
    pub id: i32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: u32,
}

impl Atlas {
    /// Parse a manifest from raw JSON bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| AtxError::Manifest {
            message: format!("Error parsing manifest: {}", e),
            help: Some("The manifest entry must be a JSON object with a Block list".to_string()),
        })
    }

    /// Index of the block that switches character mode on, if any.
    ///
    /// Blocks with unusable dimensions are skipped during conversion and
    /// never count.
    pub fn first_renamed(&self) -> Option<usize> {
        self.blocks
            .iter()
            .position(|b| b.valid_size().is_some() && b.is_renamed())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "Canvas": { "Width": 512, "Height": 256 },
        "Block": [
            {
                "filename": "hero_idle",
                "filenameOld": "hero_idle",
                "blend": "normal",
                "id": 7,
                "anchorX": 0.5,
                "anchorY": 1.0,
                "width": 32.0,
                "height": 48.0,
                "offsetX": 10.0,
                "offsetY": 12.0,
                "priority": 3,
                "Mesh": [
                    {
                        "texNo": 1,
                        "offsetX": 0, "offsetY": 0,
                        "srcOffsetX": 4.0, "srcOffsetY": 6.0,
                        "texU1": 0.1, "texV1": 0.2, "texU2": 0.3, "texV2": 0.4,
                        "viewX": 64.0, "viewY": 32.0,
                        "width": 16.0, "height": 24.0
                    }
                ],
                "Attribute": [
                    { "id": 1, "x": 1, "y": 2, "width": 3, "height": 4, "color": 4294967295 }
                ],
                "somethingNew": true
            }
        ]
    }"#;

    #[test]
    fn test_parse_full_block() {
        let atlas = Atlas::parse(SAMPLE.as_bytes()).unwrap();

        assert_eq!(atlas.canvas, Some(Canvas { width: 512, height: 256 }));
        assert_eq!(atlas.blocks.len(), 1);

        let block = &atlas.blocks[0];
        assert_eq!(block.filename(), "hero_idle");
        assert_eq!(block.filename_old(), "hero_idle");
        assert_eq!(block.priority, 3);
        assert_eq!(block.pixel_size(), (32, 48));
        assert_eq!(block.offset(), (10, 12));
        assert!(!block.is_renamed());

        let mesh = &block.mesh.as_ref().unwrap()[0];
        assert_eq!(mesh.tex_no, 1);
        assert_eq!(mesh.crop_rect(), (64, 32, 16, 24));
        assert_eq!(mesh.dest_offset(), (4, 6));
        assert_eq!(mesh.tex_u1, 0.1);

        assert_eq!(block.attributes.len(), 1);
        assert_eq!(block.attributes[0].color, u32::MAX);
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let atlas = Atlas::parse(br#"{ "Block": [ { "filename": "a", "filenameOld": "a", "Mesh": [] } ] }"#)
            .unwrap();

        let block = &atlas.blocks[0];
        assert!(block.attributes.is_empty());
        assert_eq!(block.mesh, Some(vec![]));
        assert!(atlas.canvas.is_none());
    }

    #[test]
    fn test_absent_mesh_list_is_none() {
        let atlas = Atlas::parse(br#"{ "Block": [ { "filename": "a" } ] }"#).unwrap();
        assert_eq!(atlas.blocks[0].mesh, None);

        let atlas = Atlas::parse(br#"{ "Block": [ { "filename": "a", "Mesh": null } ] }"#).unwrap();
        assert_eq!(atlas.blocks[0].mesh, None);
    }

    #[test]
    fn test_null_block_list_is_empty() {
        let atlas = Atlas::parse(br#"{ "Block": null }"#).unwrap();
        assert!(atlas.blocks.is_empty());

        let atlas = Atlas::parse(b"{}").unwrap();
        assert!(atlas.blocks.is_empty());
    }

    #[test]
    fn test_malformed_manifest_is_error() {
        let err = Atlas::parse(b"{ \"Block\": [ ").unwrap_err();
        assert!(matches!(err, AtxError::Manifest { .. }));

        let err = Atlas::parse(b"not json").unwrap_err();
        assert!(matches!(err, AtxError::Manifest { .. }));
    }

    #[test]
    fn test_geometry_truncates_toward_zero() {
        let block = Block {
            width: 9.9,
            height: -0.5,
            offset_x: -3.7,
            offset_y: 2.2,
            ..Default::default()
        };
        assert_eq!(block.pixel_size(), (9, 0));
        assert_eq!(block.offset(), (-3, 2));
        assert_eq!(block.valid_size(), None);
    }

    #[test]
    fn test_valid_size() {
        let block = Block {
            width: 4.0,
            height: 2.0,
            ..Default::default()
        };
        assert_eq!(block.valid_size(), Some((4, 2)));
    }

    #[test]
    fn test_is_renamed_compares_raw_identifiers() {
        let block = Block {
            filename: Some("b1".into()),
            filename_old: Some("base".into()),
            ..Default::default()
        };
        assert!(block.is_renamed());

        let block = Block {
            filename: Some("".into()),
            filename_old: None,
            ..Default::default()
        };
        assert!(block.is_renamed());
    }

    #[test]
    fn test_first_renamed() {
        let plain = Block {
            filename: Some("a".into()),
            filename_old: Some("a".into()),
            ..Default::default()
        };
        let variant = Block {
            filename: Some("b".into()),
            filename_old: Some("base".into()),
            width: 1.0,
            height: 1.0,
            ..Default::default()
        };
        let unusable = Block {
            width: 0.0,
            ..variant.clone()
        };
        let atlas = Atlas {
            canvas: None,
            blocks: vec![plain.clone(), unusable, variant, plain],
        };
        assert_eq!(atlas.first_renamed(), Some(2));

        let none = Atlas {
            canvas: None,
            blocks: vec![Block::default()],
        };
        assert_eq!(none.first_renamed(), None);
    }

    #[test]
    fn test_serialize_round_trip_keeps_key_names() {
        let atlas = Atlas::parse(SAMPLE.as_bytes()).unwrap();
        let json = serde_json::to_value(&atlas).unwrap();

        assert!(json.get("Block").is_some());
        assert!(json["Block"][0].get("filenameOld").is_some());
        assert!(json["Block"][0]["Mesh"][0].get("srcOffsetX").is_some());
        assert!(json["Block"][0]["Mesh"][0].get("texU1").is_some());
    }
}
