// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Icon cache key.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Unique identifier for a cached icon.
///
/// Two requests with the same font file and codepoint always resolve to the
/// same cache entry. The path is reference counted so that keys are cheap to
/// clone into the generation worker.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IconKey {
    /// Path of the font file the icon is taken from.
    pub font: Arc<Path>,
    /// Unicode codepoint of the icon within the font.
    pub codepoint: u32,
}

impl IconKey {
    /// Creates a new key.
    pub fn new(font: impl AsRef<Path>, codepoint: u32) -> Self {
        Self {
            font: Arc::from(font.as_ref()),
            codepoint,
        }
    }

    /// Creates a key that shares an already interned font path.
    #[inline]
    pub fn with_font(font: Arc<Path>, codepoint: u32) -> Self {
        Self { font, codepoint }
    }
}

impl From<(PathBuf, u32)> for IconKey {
    fn from((font, codepoint): (PathBuf, u32)) -> Self {
        Self {
            font: Arc::from(font),
            codepoint,
        }
    }
}

impl From<(&str, u32)> for IconKey {
    fn from((font, codepoint): (&str, u32)) -> Self {
        Self::new(font, codepoint)
    }
}

impl From<(&str, char)> for IconKey {
    fn from((font, ch): (&str, char)) -> Self {
        Self::new(font, u32::from(ch))
    }
}
