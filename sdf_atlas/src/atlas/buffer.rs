// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atlas pixel storage and slot grid layout.

use core::fmt::{Debug, Formatter};
use core::ops::Range;

/// One RGBA8 atlas pixel.
pub type Pixel = [u8; 4];

/// Opaque black, used for cell pixels not covered by a rasterized bitmap.
pub const BLACK: Pixel = [0, 0, 0, 255];

/// Grid of equally sized square cells covering an atlas.
///
/// Slots are numbered in row-major order, so the row and column of a slot
/// depend on the current number of columns and change when the atlas is
/// resized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasLayout {
    /// Atlas width in pixels.
    pub width: u32,
    /// Atlas height in pixels.
    pub height: u32,
    /// Cell edge length in pixels.
    pub cell_size: u32,
    /// Number of cells per row.
    pub columns: u32,
    /// Number of cell rows.
    pub rows: u32,
}

impl AtlasLayout {
    /// Computes the grid for an atlas of the given dimensions.
    pub fn new(width: u32, height: u32, cell_size: u32) -> Self {
        debug_assert!(cell_size > 0, "cell size must be non-zero");
        Self {
            width,
            height,
            cell_size,
            columns: width / cell_size,
            rows: height / cell_size,
        }
    }

    /// Total number of slots.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.columns * self.rows
    }

    /// Size of one cell in texture coordinates, as (width, height).
    #[inline]
    pub fn uv_size(&self) -> (f32, f32) {
        (
            self.cell_size as f32 / self.width as f32,
            self.cell_size as f32 / self.height as f32,
        )
    }

    /// Returns the `(row, col)` of a slot.
    #[inline]
    pub fn cell_of(&self, slot: u32) -> (u32, u32) {
        (slot / self.columns, slot % self.columns)
    }

    /// Whether `slot` lies within this grid.
    #[inline]
    pub fn contains(&self, slot: u32) -> bool {
        slot < self.capacity()
    }

    /// Index of the top-left pixel of a slot's cell.
    #[inline]
    pub fn cell_offset(&self, slot: u32) -> usize {
        let (row, col) = self.cell_of(slot);
        let width = self.width as usize;
        let cell = self.cell_size as usize;
        width * row as usize * cell + col as usize * cell
    }

    /// Number of pixels in the atlas.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Shape of a cell block and the row strides of the buffers it moves between.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockShape {
    /// Pixels per block row.
    pub width: usize,
    /// Number of block rows.
    pub height: usize,
    /// Row stride of the source buffer.
    pub old_stride: usize,
    /// Row stride of the destination buffer.
    pub new_stride: usize,
}

/// Where one slot's cell lives before and after a layout change.
///
/// The block is not contiguous in either buffer, and the strides differ, so it
/// has to be moved one block row at a time. See [`BlockRemap::rows`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRemap {
    /// Top-left pixel index in the old buffer.
    pub old_offset: usize,
    /// Top-left pixel index in the new buffer.
    pub new_offset: usize,
    /// Block shape and strides.
    pub shape: BlockShape,
}

impl BlockRemap {
    /// Yields `(old_range, new_range)` pixel index ranges, one per block row.
    pub fn rows(&self) -> impl Iterator<Item = (Range<usize>, Range<usize>)> + '_ {
        let shape = self.shape;
        (0..shape.height).map(move |r| {
            let src = self.old_offset + r * shape.old_stride;
            let dst = self.new_offset + r * shape.new_stride;
            (src..src + shape.width, dst..dst + shape.width)
        })
    }
}

/// Maps a slot from `old` to `new`.
///
/// The slot keeps its ordinal position; only its row and column change with
/// the column count. Returns `None` if the layouts use different cell sizes
/// or the slot does not exist in both.
pub fn remap_block(old: &AtlasLayout, new: &AtlasLayout, slot: u32) -> Option<BlockRemap> {
    if old.cell_size != new.cell_size || !old.contains(slot) || !new.contains(slot) {
        return None;
    }
    let cell = old.cell_size as usize;
    Some(BlockRemap {
        old_offset: old.cell_offset(slot),
        new_offset: new.cell_offset(slot),
        shape: BlockShape {
            width: cell,
            height: cell,
            old_stride: old.width as usize,
            new_stride: new.width as usize,
        },
    })
}

/// The atlas pixels that get uploaded to the GPU.
pub struct AtlasBuffer {
    layout: AtlasLayout,
    pixels: Vec<Pixel>,
    dirty: bool,
}

impl AtlasBuffer {
    /// Creates a transparent buffer for `layout`.
    pub fn new(layout: AtlasLayout) -> Self {
        Self {
            layout,
            pixels: vec![[0; 4]; layout.pixel_count()],
            dirty: true,
        }
    }

    /// The grid layout of this buffer.
    #[inline]
    pub fn layout(&self) -> &AtlasLayout {
        &self.layout
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.layout.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.layout.height
    }

    /// All pixels in row-major order.
    #[inline]
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    #[inline]
    pub(crate) fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    /// The pixels as tightly packed RGBA8 bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Whether the pixels changed since the last upload.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clears the dirty flag, returning its previous value.
    #[inline]
    pub fn take_dirty(&mut self) -> bool {
        core::mem::replace(&mut self.dirty, false)
    }

    /// Copies out the pixels of one slot's cell, row by row.
    pub fn cell_pixels(&self, slot: u32) -> Vec<Pixel> {
        let layout = &self.layout;
        if !layout.contains(slot) {
            return Vec::new();
        }
        let cell = layout.cell_size as usize;
        let stride = layout.width as usize;
        let origin = layout.cell_offset(slot);
        let mut out = Vec::with_capacity(cell * cell);
        for r in 0..cell {
            let start = origin + r * stride;
            out.extend_from_slice(&self.pixels[start..start + cell]);
        }
        out
    }

    /// Builds a buffer for `layout` holding the cells of `slots` at their
    /// positions under the new grid.
    pub fn remapped(&self, layout: AtlasLayout, slots: impl IntoIterator<Item = u32>) -> Self {
        let mut next = Self::new(layout);
        for slot in slots {
            let Some(remap) = remap_block(&self.layout, &layout, slot) else {
                log::warn!("slot {slot} does not fit the new atlas layout; dropping its pixels");
                continue;
            };
            for (src, dst) in remap.rows() {
                next.pixels[dst].copy_from_slice(&self.pixels[src]);
            }
        }
        next
    }

    /// Writes the atlas to a PNG file, for debugging.
    #[cfg(feature = "png")]
    pub fn save_png(&self, path: &std::path::Path) -> std::io::Result<()> {
        use std::fs::File;
        use std::io::BufWriter;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let w = BufWriter::new(file);

        let mut encoder = png::Encoder::new(w, self.width(), self.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        writer
            .write_image_data(self.as_bytes())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        Ok(())
    }
}

impl Debug for AtlasBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AtlasBuffer")
            .field("layout", &self.layout)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_grid() {
        let layout = AtlasLayout::new(512, 512, 64);
        assert_eq!(layout.columns, 8);
        assert_eq!(layout.rows, 8);
        assert_eq!(layout.capacity(), 64);
        assert_eq!(layout.uv_size(), (0.125, 0.125));
        assert_eq!(layout.cell_of(9), (1, 1));
    }

    #[test]
    fn layout_ignores_partial_cells() {
        let layout = AtlasLayout::new(500, 130, 64);
        assert_eq!(layout.columns, 7);
        assert_eq!(layout.rows, 2);
    }

    #[test]
    fn remap_block_moves_rows_between_strides() {
        let old = AtlasLayout::new(4, 4, 2);
        let new = AtlasLayout::new(8, 4, 2);
        // Slot 2 is at row 1, col 0 in the old grid and row 0, col 2 in the new one.
        let remap = remap_block(&old, &new, 2).unwrap();
        assert_eq!(remap.old_offset, 8);
        assert_eq!(remap.new_offset, 4);
        let rows: Vec<_> = remap.rows().collect();
        assert_eq!(rows, vec![(8..10, 4..6), (12..14, 12..14)]);
    }

    #[test]
    fn remap_block_rejects_missing_slots() {
        let old = AtlasLayout::new(4, 4, 2);
        let new = AtlasLayout::new(8, 4, 2);
        assert!(remap_block(&old, &new, 4).is_none());
        assert!(remap_block(&new, &old, 5).is_none());
        let other_cell = AtlasLayout::new(8, 4, 4);
        assert!(remap_block(&old, &other_cell, 0).is_none());
    }

    #[test]
    fn remapped_buffer_keeps_cell_contents() {
        let old_layout = AtlasLayout::new(4, 4, 2);
        let mut old = AtlasBuffer::new(old_layout);
        for (i, px) in old.pixels_mut().iter_mut().enumerate() {
            *px = [i as u8, 0, 0, 255];
        }
        let before: Vec<_> = (0..4).map(|slot| old.cell_pixels(slot)).collect();

        let grown = old.remapped(AtlasLayout::new(8, 4, 2), 0..4);
        for (slot, pixels) in before.iter().enumerate() {
            assert_eq!(&grown.cell_pixels(slot as u32), pixels);
        }
        assert!(grown.is_dirty());
    }

    #[test]
    fn dirty_flag_round_trip() {
        let mut buffer = AtlasBuffer::new(AtlasLayout::new(4, 4, 2));
        assert!(buffer.take_dirty());
        assert!(!buffer.is_dirty());
        buffer.mark_dirty();
        assert!(buffer.is_dirty());
    }

    #[test]
    fn bytes_are_rgba() {
        let mut buffer = AtlasBuffer::new(AtlasLayout::new(2, 2, 2));
        buffer.pixels_mut()[1] = [1, 2, 3, 4];
        assert_eq!(&buffer.as_bytes()[4..8], &[1, 2, 3, 4]);
        assert_eq!(buffer.as_bytes().len(), 16);
    }
}
