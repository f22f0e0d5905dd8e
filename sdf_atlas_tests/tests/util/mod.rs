// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility functions and types shared across tests.

use std::sync::Arc;

use sdf_atlas::atlas::Pixel;
use sdf_atlas::{
    AtlasConfig, IconCache, IconDrawInfo, IconKey, IconStatus, ManualClock, SdfBitmap,
    SdfGenerator, SdfParams,
};

/// Path under which the synthetic font is registered.
pub(crate) const FONT: &str = "test-icons.ttf";

/// Codepoint the synthetic rasterizer treats as missing from the font.
pub(crate) const MISSING: u32 = 0xFFFF;

/// A real TrueType font with two outlines, described in `assets/fonts/README.md`.
pub(crate) const ICON_FONT: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/assets/fonts/sdf_test_icons.ttf");

/// Square glyph of [`ICON_FONT`].
pub(crate) const SQUARE: u32 = 0xE000;

/// "T" glyph of [`ICON_FONT`].
pub(crate) const TEE: u32 = 0xE001;

/// Grey level the synthetic rasterizer fills an icon's cell with.
pub(crate) fn cell_value(codepoint: u32) -> u8 {
    (codepoint & 0xff) as u8
}

/// The pixel every cell pixel of a generated icon ends up as.
pub(crate) fn cell_pixel(codepoint: u32) -> Pixel {
    let v = cell_value(codepoint);
    [v, v, v, 255]
}

fn fill_cell(_: &[u8], codepoint: u32, params: &SdfParams) -> SdfBitmap {
    if codepoint == MISSING {
        return SdfBitmap::empty();
    }
    let size = params.pixel_height as u32;
    SdfBitmap::from_data(
        size,
        size,
        vec![cell_value(codepoint); (size * size) as usize],
    )
}

/// A small configuration: 2 pixel cells, 4x4 growing to 8x8, 10 s timeout.
pub(crate) fn small_config() -> AtlasConfig {
    AtlasConfig {
        cell_size: 2,
        min_width: 4,
        min_height: 4,
        max_width: 8,
        max_height: 8,
        idle_timeout: 10.0,
    }
}

pub(crate) fn key(codepoint: u32) -> IconKey {
    IconKey::new(FONT, codepoint)
}

/// An icon cache driven by a manual clock and a synthetic rasterizer.
pub(crate) struct TestEnv {
    pub(crate) cache: IconCache<ManualClock>,
    pub(crate) clock: ManualClock,
}

impl TestEnv {
    pub(crate) fn new(config: AtlasConfig) -> Self {
        let generator = SdfGenerator::new(fill_cell);
        generator.register_font(FONT, peniko::Blob::new(Arc::new(vec![0_u8; 4])));
        let clock = ManualClock::new(0.0);
        let cache = IconCache::new(config)
            .expect("valid test configuration")
            .with_generator(generator)
            .with_clock(clock.clone());
        Self { cache, clock }
    }

    pub(crate) fn request(&mut self, codepoint: u32) -> Option<IconDrawInfo> {
        self.cache
            .request_draw(FONT, codepoint)
            .expect("request should succeed")
    }

    /// Requests an icon, waits for its generation and requests it again so
    /// that it is drawn at the current time.
    pub(crate) fn make_ready(&mut self, codepoint: u32) -> IconDrawInfo {
        if let Some(info) = self.request(codepoint) {
            return info;
        }
        self.cache
            .wait_for_generation()
            .expect("generation should succeed");
        self.request(codepoint)
            .expect("icon should be drawable after its generation")
    }

    pub(crate) fn status(&self, codepoint: u32) -> Option<IconStatus> {
        self.cache.entry(&key(codepoint)).map(|entry| entry.status)
    }

    pub(crate) fn slot(&self, codepoint: u32) -> Option<u32> {
        self.cache.entry(&key(codepoint)).map(|entry| entry.slot)
    }

    /// Asserts that the cell of `codepoint` holds its generated pixels.
    pub(crate) fn assert_cell(&self, codepoint: u32) {
        let slot = self.slot(codepoint).expect("icon should be cached");
        let expected = cell_pixel(codepoint);
        let pixels = self.cache.buffer().cell_pixels(slot);
        assert!(
            pixels.iter().all(|&p| p == expected),
            "cell of codepoint {codepoint:#x} in slot {slot} does not hold its icon"
        );
    }

    /// Asserts that at most one entry among `codepoints` is generating, and
    /// that it is the in-flight key if there is one.
    pub(crate) fn assert_single_generation(&self, codepoints: impl IntoIterator<Item = u32>) {
        let generating: Vec<u32> = codepoints
            .into_iter()
            .filter(|&c| self.status(c) == Some(IconStatus::Generating))
            .collect();
        assert!(
            generating.len() <= 1,
            "several icons generating: {generating:?}"
        );
        if let Some(&c) = generating.first() {
            assert_eq!(self.cache.generating_key(), Some(&key(c)));
        }
    }
}
