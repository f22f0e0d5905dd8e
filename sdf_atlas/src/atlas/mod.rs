// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Icon atlas cache.
//!
//! This module provides a cache that:
//! - Gives every (font, codepoint) pair a square cell in one RGBA texture
//! - Generates missing icons on a background thread, one at a time
//! - Grows the atlas before evicting icons that are still in use
//! - Moves live cells into place when the atlas grows
//! - Reports icons as drawable only once their pixels are valid
//!
//! [`IconCache`] is the entry point. [`SlotAllocator`] holds the placement
//! policy and can be used on its own, and [`remap_block`] describes how a
//! cell moves between two layouts.

mod allocator;
mod buffer;
pub(crate) mod cache;
mod config;
pub(crate) mod key;
mod region;

pub use allocator::{Reconfigured, SlotAllocator, SlotAssignment, SlotOutcome};
pub use buffer::{AtlasBuffer, AtlasLayout, BLACK, BlockRemap, BlockShape, Pixel, remap_block};
pub use cache::{IconCache, IconCacheStats};
pub use config::{AtlasConfig, ConfigError};
pub use key::IconKey;
pub use region::{IconDrawInfo, IconEntry, IconStatus};
