// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Signed distance field generation.
//!
//! - [`FontCache`] keeps font file contents in memory, keyed by path.
//! - [`SdfRasterizer`] turns one codepoint of a font into an [`SdfBitmap`];
//!   [`OutlineRasterizer`] is the built-in implementation on top of `skrifa`.
//! - [`write_cell`] copies a bitmap into an atlas cell.
//! - [`SdfGenerator`] ties these together and runs generations on a
//!   background thread, one at a time.

mod font_cache;
mod outline;
mod write;

use core::fmt;
use std::io;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

pub use font_cache::{FontCache, read_font};
pub use outline::{OutlineRasterizer, sdf_from_path};
pub use write::write_cell;

use crate::atlas::IconKey;

/// Distance value that marks the glyph outline.
pub const ON_EDGE_VALUE: u8 = 128;

/// Pixels of distance field added around each glyph outline.
pub const SDF_PADDING: u32 = 3;

/// Cells up to this size use [`SMALL_CELL_DISTANCE_SCALE`].
pub const SMALL_CELL_MAX: u32 = 64;

/// Distance scale for cells of at most [`SMALL_CELL_MAX`] pixels.
pub const SMALL_CELL_DISTANCE_SCALE: f32 = 100.0;

/// Distance scale for larger cells. Lower values give a softer falloff, which
/// avoids banding on big glyphs.
pub const LARGE_CELL_DISTANCE_SCALE: f32 = 80.0;

/// Parameters passed to an [`SdfRasterizer`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SdfParams {
    /// Target distance from ascender to descender, in pixels.
    pub pixel_height: f32,
    /// Padding around the outline, in pixels.
    pub padding: u32,
    /// Value written exactly on the outline.
    pub on_edge_value: u8,
    /// How much the value changes per pixel of distance from the outline.
    pub distance_scale: f32,
}

impl SdfParams {
    /// The fixed parameters used for atlas cells of `cell_size` pixels.
    pub fn for_cell_size(cell_size: u32) -> Self {
        let distance_scale = if cell_size <= SMALL_CELL_MAX {
            SMALL_CELL_DISTANCE_SCALE
        } else {
            LARGE_CELL_DISTANCE_SCALE
        };
        Self {
            pixel_height: cell_size as f32,
            padding: SDF_PADDING,
            on_edge_value: ON_EDGE_VALUE,
            distance_scale,
        }
    }
}

/// Single channel distance field for one glyph.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct SdfBitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Horizontal offset of the bitmap's left edge from the glyph origin.
    pub x_offset: i32,
    /// Vertical offset of the bitmap's top edge from the glyph origin (y down).
    pub y_offset: i32,
    /// Row-major distance values, `width * height` bytes.
    pub data: Vec<u8>,
}

impl SdfBitmap {
    /// A bitmap with no pixels, meaning the glyph could not be produced.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a bitmap from row-major data.
    pub fn from_data(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize,
            "bitmap data does not match its dimensions"
        );
        Self {
            width,
            height,
            x_offset: 0,
            y_offset: 0,
            data,
        }
    }

    /// Whether the bitmap has zero width or height.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Value at `(x, y)`, or `None` outside the bitmap.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

impl fmt::Debug for SdfBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdfBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("x_offset", &self.x_offset)
            .field("y_offset", &self.y_offset)
            .finish_non_exhaustive()
    }
}

/// Produces a distance field for one codepoint of a font.
///
/// An empty bitmap means the glyph is absent from the font or the font
/// could not be read; it is not retried.
pub trait SdfRasterizer: Send + Sync {
    /// Rasterizes `codepoint` from the font file contents `font`.
    fn rasterize(&self, font: &[u8], codepoint: u32, params: &SdfParams) -> SdfBitmap;
}

impl<F> SdfRasterizer for F
where
    F: Fn(&[u8], u32, &SdfParams) -> SdfBitmap + Send + Sync,
{
    fn rasterize(&self, font: &[u8], codepoint: u32, params: &SdfParams) -> SdfBitmap {
        self(font, codepoint, params)
    }
}

/// Errors raised while generating a distance field.
#[derive(Debug)]
pub enum SdfError {
    /// The font file could not be read.
    FontLoad {
        /// Path of the font file.
        path: Arc<Path>,
        /// The underlying I/O error.
        source: io::Error,
    },
}

impl fmt::Display for SdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FontLoad { path, source } => {
                write!(f, "failed to load font {}: {source}", path.display())
            }
        }
    }
}

impl core::error::Error for SdfError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::FontLoad { source, .. } => Some(source),
        }
    }
}

/// Loads fonts and rasterizes icons, off the draw thread.
#[derive(Clone)]
pub struct SdfGenerator {
    fonts: Arc<Mutex<FontCache>>,
    rasterizer: Arc<dyn SdfRasterizer>,
}

impl SdfGenerator {
    /// Creates a generator using `rasterizer`.
    pub fn new(rasterizer: impl SdfRasterizer + 'static) -> Self {
        Self {
            fonts: Arc::new(Mutex::new(FontCache::new())),
            rasterizer: Arc::new(rasterizer),
        }
    }

    /// Makes in-memory font data available under `path`, so it is never read
    /// from disk.
    pub fn register_font(&self, path: impl AsRef<Path>, data: peniko::Blob<u8>) {
        self.font_cache().insert(Arc::from(path.as_ref()), data);
    }

    /// Drops every cached font.
    pub fn clear_fonts(&self) {
        self.font_cache().clear();
    }

    /// Number of cached fonts.
    pub fn font_count(&self) -> usize {
        self.font_cache().len()
    }

    fn font_cache(&self) -> std::sync::MutexGuard<'_, FontCache> {
        self.fonts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads the font for `key` and rasterizes its codepoint on the calling
    /// thread.
    pub fn generate(&self, key: &IconKey, params: &SdfParams) -> Result<SdfBitmap, SdfError> {
        // The lock is only held for lookups; reading and rasterizing happen
        // without it.
        let cached = self.font_cache().get(&key.font);
        let font = match cached {
            Some(font) => font,
            None => {
                let font = read_font(&key.font)?;
                self.font_cache().insert_loaded(key.font.clone(), font)
            }
        };
        Ok(self.rasterizer.rasterize(font.data(), key.codepoint, params))
    }

    /// Starts generating `key` for cells of `cell_size` pixels on a
    /// background thread.
    pub(crate) fn spawn(&self, key: IconKey, cell_size: u32) -> io::Result<Generation> {
        let params = SdfParams::for_cell_size(cell_size);
        let (sender, receiver) = mpsc::channel();
        let generator = self.clone();
        let job_key = key.clone();
        thread::Builder::new()
            .name("sdf-generator".into())
            .spawn(move || {
                let result = generator.generate(&job_key, &params);
                // The cache may have been dropped meanwhile; nobody is waiting then.
                let _ = sender.send(result);
            })?;
        Ok(Generation {
            key,
            cell_size,
            receiver,
        })
    }
}

impl Default for SdfGenerator {
    fn default() -> Self {
        Self::new(OutlineRasterizer::default())
    }
}

impl fmt::Debug for SdfGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdfGenerator")
            .field("fonts", &self.font_count())
            .finish_non_exhaustive()
    }
}

/// The single generation in flight, keyed by the icon it produces.
pub(crate) struct Generation {
    pub(crate) key: IconKey,
    pub(crate) cell_size: u32,
    receiver: Receiver<Result<SdfBitmap, SdfError>>,
}

/// State of a [`Generation`].
pub(crate) enum Completion {
    Pending,
    Done(Result<SdfBitmap, SdfError>),
    /// The worker exited without sending a result.
    Lost,
}

impl Generation {
    pub(crate) fn try_complete(&self) -> Completion {
        match self.receiver.try_recv() {
            Ok(result) => Completion::Done(result),
            Err(TryRecvError::Empty) => Completion::Pending,
            Err(TryRecvError::Disconnected) => Completion::Lost,
        }
    }

    pub(crate) fn wait(&self) -> Completion {
        match self.receiver.recv() {
            Ok(result) => Completion::Done(result),
            Err(_) => Completion::Lost,
        }
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generation")
            .field("key", &self.key)
            .field("cell_size", &self.cell_size)
            .finish_non_exhaustive()
    }
}
