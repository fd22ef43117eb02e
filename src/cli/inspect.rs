//! Inspect command implementation.
//!
//! Reads an archive's manifest and prints what a conversion would do.

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Args;

use crate::archive::{EntrySource, ZipArchiveReader};
use crate::config::ConvertConfig;
use crate::error::{AtxError, Result};
use crate::manifest::{Atlas, Block};
use crate::output::{display_path, plural, Printer};
use crate::pipeline::load_atlas;
use crate::resolver::{plan, CharacterState, Route};

/// Show the blocks and textures of an archive without writing anything
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input .atx archive
    pub input: PathBuf,

    /// Conversion config file (default: ./atx2img.yaml when present)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Print the parsed manifest as JSON to stdout
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: InspectArgs, printer: &Printer) -> Result<()> {
    let config = ConvertConfig::discover(args.config.as_deref(), &std::env::current_dir()?)?;
    let mut archive = ZipArchiveReader::open(&args.input)?;
    let atlas = load_atlas(&mut archive, &config)?;

    if args.json {
        let json = serde_json::to_string_pretty(&atlas).map_err(|e| AtxError::Manifest {
            message: format!("Failed to serialize manifest: {}", e),
            help: None,
        })?;
        println!("{}", json);
        return Ok(());
    }

    printer.info("Archive", &display_path(&args.input));
    printer.info("Entries", &plural(archive.entry_names().len(), "entry", "entries"));
    if let Some(canvas) = atlas.canvas {
        printer.info("Canvas", &format!("{}x{}", canvas.width, canvas.height));
    }
    printer.info("Blocks", &plural(atlas.blocks.len(), "block", "blocks"));
    printer.info("Character", &describe_character(&atlas));

    for line in describe_blocks(&atlas) {
        printer.info("Block", &line);
    }

    for (tex_no, resolved) in resolve_textures(&atlas, &archive, &config) {
        match resolved {
            Some(entry) => printer.info("Texture", &format!("{} -> {}", tex_no, entry)),
            None => printer.warning(
                "Missing",
                &format!("texture {} ({})", tex_no, config.texture_candidates(tex_no).join(" or ")),
            ),
        }
    }

    Ok(())
}

/// One summary line per block, including the route it would take.
fn describe_blocks(atlas: &Atlas) -> Vec<String> {
    let mut state = CharacterState::new();

    atlas
        .blocks
        .iter()
        .map(|block| {
            let (w, h) = block.pixel_size();
            let route = if block.valid_size().is_none() {
                "skipped".to_string()
            } else if block.mesh.is_none() {
                "fatal: no Mesh list".to_string()
            } else {
                describe_route(plan(&mut state, block), block, &state)
            };
            format!(
                "{} {}x{}, {} -> {}",
                block.filename(),
                w,
                h,
                plural(block.mesh_count(), "mesh", "meshes"),
                route
            )
        })
        .collect()
}

/// Where character mode starts, or that it never does.
fn describe_character(atlas: &Atlas) -> String {
    match atlas.first_renamed() {
        Some(index) => {
            let block = &atlas.blocks[index];
            format!(
                "mode starts at block {} ({}), base {}",
                index,
                block.filename(),
                block.filename_old()
            )
        }
        None => "mode never activates".to_string(),
    }
}

fn describe_route(route: Route, block: &Block, state: &CharacterState) -> String {
    match route {
        Route::Plain | Route::Fallback => format!("{}.png", block.filename()),
        Route::Base => format!("{}.png (character base)", block.filename_old()),
        Route::Overlay { offset: (x, y) } => format!(
            "{}.png (overlay on {} at {},{})",
            block.filename_old(),
            state.base_identifier().unwrap_or_default(),
            x,
            y
        ),
    }
}

/// Every referenced texture number with the entry it resolves to.
fn resolve_textures<S: EntrySource>(
    atlas: &Atlas,
    source: &S,
    config: &ConvertConfig,
) -> Vec<(i32, Option<String>)> {
    let tex_nos: BTreeSet<i32> = atlas
        .blocks
        .iter()
        .filter_map(|b| b.mesh.as_ref())
        .flatten()
        .map(|m| m.tex_no)
        .collect();

    tex_nos
        .into_iter()
        .map(|tex_no| {
            let entry = config
                .texture_candidates(tex_no)
                .into_iter()
                .find(|c| source.contains(c));
            (tex_no, entry)
        })
        .collect()
}
