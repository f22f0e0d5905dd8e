// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SDF Atlas caches signed distance field icons taken from icon fonts in a
//! single growable texture atlas.
//!
//! Icons are requested by font path and codepoint every frame through
//! [`IconCache::request_draw`]. Missing icons are rasterized on a background
//! thread, one at a time, and copied into a square cell of the atlas. When
//! the atlas is full it grows, moving every live cell to its place in the
//! larger grid, unless the least recently drawn icon has been idle long
//! enough to be evicted instead.
//!
//! ## Features
//!
//! - `png`: Enables [`AtlasBuffer::save_png`](atlas::AtlasBuffer) for dumping
//!   the atlas while debugging.

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod atlas;
pub mod renderers;
pub mod sdf;

mod clock;
mod error;

pub use atlas::{AtlasConfig, IconCache, IconCacheStats, IconDrawInfo, IconKey, IconStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::IconCacheError;
pub use renderers::{IconMaterial, QuadParams, QuadRenderer, TextureSink, draw_icon};
pub use sdf::{SdfBitmap, SdfError, SdfGenerator, SdfParams, SdfRasterizer};

pub use peniko;
