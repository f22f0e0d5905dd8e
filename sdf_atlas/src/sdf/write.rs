// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copying distance fields into atlas cells.

use crate::atlas::{AtlasBuffer, BLACK};

use super::SdfBitmap;

/// Writes `bitmap` into the cell of `slot`, anchored at the cell's top-left
/// corner.
///
/// Every row of the cell is rewritten in full: distance values become opaque
/// grey pixels and whatever the bitmap does not cover becomes opaque black, so
/// bitmaps narrower or wider than the cell never shift later rows. Pixels
/// beyond the cell are dropped. Slots outside the current layout are ignored.
pub fn write_cell(buffer: &mut AtlasBuffer, slot: u32, bitmap: &SdfBitmap) {
    let layout = *buffer.layout();
    if !layout.contains(slot) {
        log::warn!(
            "slot {slot} is outside the {}x{} atlas; skipping write",
            layout.width,
            layout.height
        );
        return;
    }
    let cell = layout.cell_size as usize;
    let stride = layout.width as usize;
    let origin = layout.cell_offset(slot);
    let (width, height) = (bitmap.width as usize, bitmap.height as usize);

    let pixels = buffer.pixels_mut();
    for r in 0..cell {
        let start = origin + r * stride;
        let row = &mut pixels[start..start + cell];
        let src = if r < height {
            bitmap.data.get(r * width..(r + 1) * width).unwrap_or(&[])
        } else {
            &[]
        };
        for (c, pixel) in row.iter_mut().enumerate() {
            *pixel = match src.get(c) {
                Some(&v) => [v, v, v, 255],
                None => BLACK,
            };
        }
    }
    buffer.mark_dirty();
}
