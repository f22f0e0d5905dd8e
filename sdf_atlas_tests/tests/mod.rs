// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate contains the integration test suite for `sdf_atlas`.
//!
//! - The `util` module contains the shared test environment: a cache with a
//!   synthetic rasterizer, an in-memory font and a manual clock.
//! - As in the other test suites, this `mod.rs` file is the single entry
//!   point so that shared utilities can be reused across modules.
//! - Put the topic of a test at the start of its name, e.g.
//!   `eviction_reuses_idle_slot` rather than `reuses_idle_slot_on_eviction`.

#![allow(missing_docs, reason = "we don't need docs for testing")]
#![allow(clippy::cast_possible_truncation, reason = "not critical for testing")]

mod state;
mod util;
