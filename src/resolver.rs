//! Character sprite resolution.
//!
//! Character sprites are delta encoded: one block carries the full base
//! image and later blocks carry only what changes, positioned relative to the
//! base. The first block whose `filename` differs from its `filenameOld`
//! switches the run into character mode for good and fixes which identifier
//! is the base and where its origin lies.
//!
//! Overlays are merged onto the base file as it exists on disk at that
//! moment, so blocks must arrive in manifest order.

use std::path::PathBuf;

use crate::diagnostics::{codes, Diagnostic};
use crate::manifest::Block;
use crate::raster::Surface;
use crate::store::OutputDir;

/// Character-mode state carried across the blocks of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterState {
    active: bool,
    base_identifier: String,
    base_offset: (i64, i64),
}

impl CharacterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The `filenameOld` of the block that switched character mode on.
    pub fn base_identifier(&self) -> Option<&str> {
        self.active.then_some(self.base_identifier.as_str())
    }

    pub fn base_offset(&self) -> (i64, i64) {
        self.base_offset
    }

    /// Switch character mode on at the first renamed block. Later calls are no-ops.
    fn observe(&mut self, block: &Block) {
        if !self.active && block.is_renamed() {
            self.active = true;
            self.base_identifier = block.filename_old().to_string();
            self.base_offset = block.offset();
        }
    }
}

/// How a block was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Ordinary sprite saved under its `filename`.
    Plain,
    /// Character base saved under its `filenameOld`.
    Base,
    /// Character variant merged onto the base at `offset`.
    Overlay { offset: (i64, i64) },
    /// Character variant saved as a plain sprite because the base was missing.
    Fallback,
}

/// Outcome of resolving and persisting one block.
#[derive(Debug)]
pub struct Resolution {
    pub route: Route,
    /// Where the block was written, if it was.
    pub saved: Option<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    pub fn is_saved(&self) -> bool {
        self.saved.is_some()
    }
}

/// Advance the state for `block` and decide its route, without touching disk.
///
/// Never returns [`Route::Fallback`]; that depends on what is on disk.
pub fn plan(state: &mut CharacterState, block: &Block) -> Route {
    state.observe(block);

    if !state.active {
        return Route::Plain;
    }
    // An absent filenameOld never matches, not even an empty base identifier.
    if block.filename_old.as_deref() == Some(state.base_identifier.as_str()) {
        return Route::Base;
    }

    let (base_x, base_y) = state.base_offset;
    let (x, y) = block.offset();
    Route::Overlay {
        offset: (x.saturating_sub(base_x), y.saturating_sub(base_y)),
    }
}

/// Decide how a composited block is persisted, and persist it.
pub fn resolve(
    state: &mut CharacterState,
    block: &Block,
    surface: Surface,
    out: &OutputDir,
) -> Resolution {
    let offset = match plan(state, block) {
        Route::Overlay { offset } => offset,
        Route::Base => {
            let mut diagnostics = Vec::new();
            let saved = persist(out.save(block.filename_old(), &surface), block, &mut diagnostics);
            return Resolution {
                route: Route::Base,
                saved,
                diagnostics,
            };
        }
        route => return save_plain(block, &surface, out, route, Vec::new()),
    };

    if !out.exists(&state.base_identifier) {
        let diagnostics = vec![Diagnostic::warning(
            codes::BASE_MISSING,
            format!(
                "Base image '{}.png' not found for block '{}'; cannot overlay",
                state.base_identifier,
                block.filename_old()
            ),
        )];
        return save_plain(block, &surface, out, Route::Fallback, diagnostics);
    }

    let mut diagnostics = Vec::new();
    let saved = match out.load(&state.base_identifier) {
        Ok(mut base) => {
            base.composite_over(&surface, offset.0, offset.1);
            persist(out.save(block.filename_old(), &base), block, &mut diagnostics)
        }
        Err(e) => {
            diagnostics.push(
                Diagnostic::error(
                    codes::BASE_LOAD,
                    format!(
                        "Failed to load base image '{}.png' for block '{}': {}",
                        state.base_identifier,
                        block.filename_old(),
                        e
                    ),
                )
                .with_help("Remove the damaged file from the output directory and convert again"),
            );
            None
        }
    };

    Resolution {
        route: Route::Overlay { offset },
        saved,
        diagnostics,
    }
}

fn save_plain(
    block: &Block,
    surface: &Surface,
    out: &OutputDir,
    route: Route,
    mut diagnostics: Vec<Diagnostic>,
) -> Resolution {
    let path = out.plain_path(block.filename(), block.priority);
    let saved = persist(out.save_at(&path, surface), block, &mut diagnostics);
    Resolution {
        route,
        saved,
        diagnostics,
    }
}

fn persist(
    result: crate::error::Result<PathBuf>,
    block: &Block,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<PathBuf> {
    match result {
        Ok(path) => Some(path),
        Err(e) => {
            diagnostics.push(Diagnostic::error(
                codes::SAVE_FAILED,
                format!("Error saving image for block '{}': {}", block.filename(), e),
            ));
            None
        }
    }
}
