// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cache entry state and draw metadata.

use super::buffer::AtlasLayout;

/// Lifecycle of a cached icon.
///
/// `Waiting -> Generating -> ReadyToDraw -> Drawing`. There is no error
/// state; eviction removes an entry whatever its status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IconStatus {
    /// A slot is assigned but its pixels are not valid yet.
    Waiting,
    /// The in-flight generation is producing this icon.
    Generating,
    /// Pixels are valid and have not been handed to a draw call yet.
    ReadyToDraw,
    /// Steady state while the icon is being drawn.
    Drawing,
}

impl IconStatus {
    /// Whether the slot holds valid pixels for this icon.
    #[inline]
    pub fn is_drawable(self) -> bool {
        match self {
            Self::ReadyToDraw | Self::Drawing => true,
            Self::Waiting | Self::Generating => false,
        }
    }
}

/// Location and state of a cached icon.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IconEntry {
    /// Slot index in row-major order.
    pub slot: u32,
    /// Grid row of the slot under the current layout.
    pub row: u32,
    /// Grid column of the slot under the current layout.
    pub col: u32,
    /// Clock time of the last draw, or of creation if never drawn.
    pub last_drawn: f64,
    /// Current state.
    pub status: IconStatus,
    /// Set when the rasterizer produced nothing for this icon, so it is not
    /// generated again.
    pub unrenderable: bool,
    /// Set when generating this icon failed, e.g. because its font file could
    /// not be read. The icon is not generated again while it stays cached.
    pub failed: bool,
}

impl IconEntry {
    pub(crate) fn new(slot: u32, layout: &AtlasLayout, now: f64) -> Self {
        let (row, col) = layout.cell_of(slot);
        Self {
            slot,
            row,
            col,
            last_drawn: now,
            status: IconStatus::Waiting,
            unrenderable: false,
            failed: false,
        }
    }

    /// Recomputes row and column after the grid changed.
    #[inline]
    pub(crate) fn relayout(&mut self, layout: &AtlasLayout) {
        (self.row, self.col) = layout.cell_of(self.slot);
    }
}

/// What a renderer needs to draw a cached icon.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IconDrawInfo {
    /// Slot index.
    pub slot: u32,
    /// Grid row.
    pub row: u32,
    /// Grid column.
    pub col: u32,
    /// Status when the request was served, before any transition it caused.
    pub status: IconStatus,
    /// Cell size in texture coordinates, as (width, height).
    pub uv_size: (f32, f32),
}

impl IconDrawInfo {
    pub(crate) fn new(entry: &IconEntry, layout: &AtlasLayout) -> Self {
        Self {
            slot: entry.slot,
            row: entry.row,
            col: entry.col,
            status: entry.status,
            uv_size: layout.uv_size(),
        }
    }

    /// Top-left texture coordinate of the cell.
    #[inline]
    pub fn uv_origin(&self) -> (f32, f32) {
        (
            self.col as f32 * self.uv_size.0,
            self.row as f32 * self.uv_size.1,
        )
    }
}
