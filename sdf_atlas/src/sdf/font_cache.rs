// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cache for font data.

use core::fmt::{Debug, Formatter};
use hashbrown::HashMap;
use peniko::Blob;
use std::path::Path;
use std::sync::Arc;

use super::SdfError;

/// Font file contents keyed by path.
///
/// Fonts are loaded on first use and kept until [`clear`](Self::clear). Icon
/// fonts are small and a handful of them are reused for every icon, so there
/// is no eviction.
#[derive(Default)]
pub struct FontCache {
    fonts: HashMap<Arc<Path>, Entry>,
}

enum Entry {
    /// Read from the file system; dropped by `clear`.
    Loaded(Blob<u8>),
    /// Supplied by the application; survives `clear`.
    Registered(Blob<u8>),
}

impl Entry {
    fn blob(&self) -> &Blob<u8> {
        match self {
            Self::Loaded(blob) | Self::Registered(blob) => blob,
        }
    }
}

impl FontCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the data for `path`, reading the file if it is not cached yet.
    pub fn load(&mut self, path: &Arc<Path>) -> Result<Blob<u8>, SdfError> {
        if let Some(blob) = self.get(path) {
            return Ok(blob);
        }
        let blob = read_font(path)?;
        Ok(self.insert_loaded(path.clone(), blob))
    }

    /// Returns the cached data for `path`, if any.
    pub fn get(&self, path: &Path) -> Option<Blob<u8>> {
        self.fonts.get(path).map(|entry| entry.blob().clone())
    }

    /// Caches data read from disk for `path` and returns the data now cached.
    ///
    /// Data that is already cached wins, so concurrent loads of one path agree.
    pub fn insert_loaded(&mut self, path: Arc<Path>, data: Blob<u8>) -> Blob<u8> {
        let entry = self.fonts.entry(path).or_insert_with_key(|path| {
            log::debug!("loaded font {}", path.display());
            Entry::Loaded(data)
        });
        entry.blob().clone()
    }

    /// Serves `data` for `path` without touching the file system.
    pub fn insert(&mut self, path: Arc<Path>, data: Blob<u8>) {
        self.fonts.insert(path, Entry::Registered(data));
    }

    /// Whether data for `path` is cached.
    pub fn contains(&self, path: &Path) -> bool {
        self.fonts.contains_key(path)
    }

    /// Number of cached fonts.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Drops fonts read from disk. Registered fonts are kept.
    pub fn clear(&mut self) {
        self.fonts.retain(|_, entry| matches!(entry, Entry::Registered(_)));
    }
}

impl Debug for FontCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FontCache").field("fonts", &self.fonts.len()).finish()
    }
}

/// Reads a font file without caching it.
pub fn read_font(path: &Arc<Path>) -> Result<Blob<u8>, SdfError> {
    let data = std::fs::read(path).map_err(|source| SdfError::FontLoad {
        path: path.clone(),
        source,
    })?;
    Ok(Blob::new(Arc::new(data)))
}
