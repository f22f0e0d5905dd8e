// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interfaces to the GPU side and the per-icon drawing glue.
//!
//! The cache never talks to a graphics API directly. It hands the atlas to a
//! [`TextureSink`] and describes each icon as a textured quad for a
//! [`QuadRenderer`]. [`IconMaterial`] remembers which cell an icon is shown
//! from, so that an icon keeps its previous image while a replacement is
//! generated instead of flickering.

use peniko::color::{AlphaColor, Srgb};

use crate::atlas::{AtlasLayout, IconCache, IconKey};
use crate::clock::Clock;
use crate::error::IconCacheError;

/// Receives the atlas texture.
pub trait TextureSink {
    /// Replaces the whole texture with `rgba`, tightly packed RGBA8 rows of
    /// `width` pixels.
    fn upload(&mut self, width: u32, height: u32, rgba: &[u8]);
}

/// Draws textured quads sampling one atlas cell.
pub trait QuadRenderer {
    /// Placement of the quad, in whatever space the renderer uses.
    type Transform;

    /// Draws one quad.
    fn draw_quad(&mut self, params: &QuadParams, transform: &Self::Transform);
}

/// Per-quad parameters for a [`QuadRenderer`].
#[derive(Clone, Copy, Debug)]
pub struct QuadParams {
    /// Slot index of the sampled cell.
    pub slot: u32,
    /// Grid row of the cell.
    pub row: u32,
    /// Grid column of the cell.
    pub col: u32,
    /// Cell width in texture coordinates.
    pub uv_width: f32,
    /// Cell height in texture coordinates.
    pub uv_height: f32,
    /// Colour the distance field is filled with.
    pub tint: AlphaColor<Srgb>,
}

impl QuadParams {
    /// Top-left texture coordinate of the cell.
    #[inline]
    pub fn uv_origin(&self) -> (f32, f32) {
        (
            self.col as f32 * self.uv_width,
            self.row as f32 * self.uv_height,
        )
    }
}

/// An icon as drawn by one element of the scene.
///
/// The material only switches to a new cell once the cache reports that
/// cell as drawable. Until then it keeps showing the cell it had, or
/// nothing if it never had one.
#[derive(Clone, Debug)]
pub struct IconMaterial {
    key: IconKey,
    slot: Option<u32>,
    /// Colour the icon is drawn with.
    pub tint: AlphaColor<Srgb>,
}

impl IconMaterial {
    /// Creates a material for `key` that has nothing to show yet.
    pub fn new(key: IconKey, tint: AlphaColor<Srgb>) -> Self {
        Self {
            key,
            slot: None,
            tint,
        }
    }

    /// The icon this material wants to show.
    #[inline]
    pub fn key(&self) -> &IconKey {
        &self.key
    }

    /// Switches to another icon. The current cell stays on screen until the
    /// new icon is ready.
    pub fn set_key(&mut self, key: IconKey) {
        self.key = key;
    }

    /// The slot currently shown, if any.
    #[inline]
    pub fn slot(&self) -> Option<u32> {
        self.slot
    }

    /// Requests the icon from `cache` and retargets the material if it is
    /// drawable. Returns whether the material now shows its own icon.
    pub fn update<C: Clock>(&mut self, cache: &mut IconCache<C>) -> Result<bool, IconCacheError> {
        match cache.request_draw_key(self.key.clone())? {
            Some(info) => {
                self.slot = Some(info.slot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Quad parameters for the shown slot under `layout`.
    ///
    /// Row and column are derived from the layout every time because the
    /// atlas may have grown since the slot was assigned.
    pub fn quad_params(&self, layout: &AtlasLayout) -> Option<QuadParams> {
        let slot = self.slot.filter(|&slot| layout.contains(slot))?;
        let (row, col) = layout.cell_of(slot);
        let (uv_width, uv_height) = layout.uv_size();
        Some(QuadParams {
            slot,
            row,
            col,
            uv_width,
            uv_height,
            tint: self.tint,
        })
    }
}

/// Updates `material` from `cache` and draws it with `renderer`.
///
/// Issues at most one quad. Returns whether a quad was drawn.
pub fn draw_icon<C, R>(
    cache: &mut IconCache<C>,
    material: &mut IconMaterial,
    renderer: &mut R,
    transform: &R::Transform,
) -> Result<bool, IconCacheError>
where
    C: Clock,
    R: QuadRenderer + ?Sized,
{
    material.update(cache)?;
    let Some(params) = material.quad_params(cache.layout()) else {
        return Ok(false);
    };
    renderer.draw_quad(&params, transform);
    Ok(true)
}
