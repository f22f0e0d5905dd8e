// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slot assignment with grow-before-evict policy.

use core::fmt::{Debug, Formatter};
use hashbrown::HashMap;

use super::buffer::{AtlasBuffer, AtlasLayout};
use super::config::{AtlasConfig, ConfigError};
use super::key::IconKey;
use super::region::IconEntry;

/// How a slot was obtained by [`SlotAllocator::insert`].
#[derive(Clone, Debug, PartialEq)]
pub enum SlotOutcome {
    /// A never used slot was free.
    Fresh,
    /// The atlas was full and the least recently drawn icon was removed.
    Evicted {
        /// Key of the removed icon.
        key: IconKey,
        /// Seconds since the removed icon was last drawn.
        idle: f64,
    },
    /// The atlas was full and was enlarged.
    Grew {
        /// Dimensions before growing.
        from: (u32, u32),
        /// Dimensions after growing.
        to: (u32, u32),
    },
}

/// Result of [`SlotAllocator::insert`].
#[derive(Clone, Debug, PartialEq)]
pub struct SlotAssignment {
    /// The slot given to the new key.
    pub slot: u32,
    /// How the slot was found.
    pub outcome: SlotOutcome,
}

/// Result of [`SlotAllocator::reconfigure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconfigured {
    /// Every entry was dropped and the atlas is back at its minimum size.
    Reset,
    /// Entries were kept and moved into a resized atlas.
    Resized,
    /// Entries and dimensions are unchanged.
    Unchanged,
}

/// Owns the atlas pixels and decides which cell each icon occupies.
///
/// While free slots remain, keys get the next never used slot. Once the atlas
/// is full, the least recently drawn icon is evicted if it has been idle
/// longer than [`AtlasConfig::idle_timeout`] or the atlas cannot grow any
/// further; otherwise the atlas grows and the new key gets a new slot.
/// Growing is a one-off pixel copy, while evicting an icon that is still in
/// use means rasterizing it again later.
pub struct SlotAllocator {
    config: AtlasConfig,
    buffer: AtlasBuffer,
    entries: HashMap<IconKey, IconEntry>,
    next_slot: u32,
}

impl SlotAllocator {
    /// Creates an empty allocator with an atlas of the minimum configured size.
    pub fn new(config: AtlasConfig) -> Result<Self, ConfigError> {
        let config = config.normalized()?;
        Ok(Self {
            buffer: AtlasBuffer::new(min_layout(&config)),
            config,
            entries: HashMap::new(),
            next_slot: 0,
        })
    }

    /// The normalized configuration.
    #[inline]
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// The current grid layout.
    #[inline]
    pub fn layout(&self) -> &AtlasLayout {
        self.buffer.layout()
    }

    /// The atlas pixels.
    #[inline]
    pub fn buffer(&self) -> &AtlasBuffer {
        &self.buffer
    }

    #[inline]
    pub(crate) fn buffer_mut(&mut self) -> &mut AtlasBuffer {
        &mut self.buffer
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no live entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry.
    #[inline]
    pub fn get(&self, key: &IconKey) -> Option<&IconEntry> {
        self.entries.get(key)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, key: &IconKey) -> Option<&mut IconEntry> {
        self.entries.get_mut(key)
    }

    /// Iterates over all live entries.
    pub fn entries(&self) -> impl Iterator<Item = (&IconKey, &IconEntry)> {
        self.entries.iter()
    }

    /// Creates a `Waiting` entry for `key` in a slot chosen by the
    /// grow-before-evict policy.
    ///
    /// `key` must not already be present.
    pub fn insert(&mut self, key: IconKey, now: f64) -> SlotAssignment {
        debug_assert!(
            !self.entries.contains_key(&key),
            "insert called for a key that already has a slot"
        );
        let capacity = self.layout().capacity();
        let (slot, outcome) = if self.entries.len() < capacity as usize && self.next_slot < capacity
        {
            let slot = self.next_slot;
            self.next_slot += 1;
            (slot, SlotOutcome::Fresh)
        } else {
            self.reclaim_or_grow(now)
        };
        let entry = IconEntry::new(slot, self.layout(), now);
        self.entries.insert(key, entry);
        SlotAssignment { slot, outcome }
    }

    /// The live entry with the smallest `last_drawn` time.
    pub fn oldest(&self) -> Option<(&IconKey, &IconEntry)> {
        self.entries
            .iter()
            .min_by(|a, b| a.1.last_drawn.total_cmp(&b.1.last_drawn))
    }

    fn reclaim_or_grow(&mut self, now: f64) -> (u32, SlotOutcome) {
        let oldest = self.oldest().map(|(key, entry)| (key.clone(), *entry));
        if let Some((key, entry)) = oldest {
            let idle = now - entry.last_drawn;
            if idle > self.config.idle_timeout || !self.can_grow() {
                self.entries.remove(&key);
                log::debug!(
                    "evicting icon {:?}:{:#x} from slot {} after {idle:.1}s idle",
                    key.font,
                    key.codepoint,
                    entry.slot
                );
                return (entry.slot, SlotOutcome::Evicted { key, idle });
            }
        }

        let from = (self.buffer.width(), self.buffer.height());
        self.grow();
        let to = (self.buffer.width(), self.buffer.height());
        let slot = self.next_slot;
        self.next_slot += 1;
        (slot, SlotOutcome::Grew { from, to })
    }

    /// Dimensions the atlas would have after the next [`grow`](Self::grow),
    /// or `None` if it is already as large as the configuration allows.
    ///
    /// Square atlases double their width; otherwise the shorter side catches
    /// up with the longer one. If that side is capped, the other side doubles
    /// instead. Both sides are clamped to the configured maximum and a step
    /// only counts if it adds slots.
    pub fn next_dimensions(&self) -> Option<(u32, u32)> {
        let layout = self.layout();
        let (w, h) = (layout.width, layout.height);
        let (max_w, max_h) = (self.config.max_width, self.config.max_height);
        let preferred = match w.cmp(&h) {
            core::cmp::Ordering::Equal => (w.saturating_mul(2).min(max_w), h),
            core::cmp::Ordering::Greater => (w, w.min(max_h)),
            core::cmp::Ordering::Less => (h.min(max_w), h),
        };
        let widen = (w.saturating_mul(2).min(max_w), h);
        let heighten = (w, h.saturating_mul(2).min(max_h));
        let capacity = layout.capacity();
        [preferred, widen, heighten]
            .into_iter()
            .find(|&(nw, nh)| AtlasLayout::new(nw, nh, layout.cell_size).capacity() > capacity)
    }

    /// Whether the atlas can still grow.
    #[inline]
    pub fn can_grow(&self) -> bool {
        self.next_dimensions().is_some()
    }

    /// Enlarges the atlas by one step and moves every live cell to its
    /// position in the new grid. Returns `false` if already at the maximum.
    pub fn grow(&mut self) -> bool {
        let Some((width, height)) = self.next_dimensions() else {
            return false;
        };
        self.resize(width, height);
        true
    }

    fn resize(&mut self, width: u32, height: u32) {
        let old = *self.layout();
        let layout = AtlasLayout::new(width, height, old.cell_size);
        let buffer = self
            .buffer
            .remapped(layout, self.entries.values().map(|entry| entry.slot));
        self.buffer = buffer;
        for entry in self.entries.values_mut() {
            entry.relayout(&layout);
        }
        log::debug!(
            "resized icon atlas from {}x{} to {}x{} ({} -> {} slots)",
            old.width,
            old.height,
            width,
            height,
            old.capacity(),
            layout.capacity()
        );
    }

    /// Applies a new configuration.
    ///
    /// With `reset_all`, or when the cell size changes, every entry is dropped
    /// and the atlas returns to the minimum size. Otherwise entries are kept
    /// and the atlas is clamped into the new size limits; if that would cut
    /// off live slots, a reset happens instead. An invalid configuration
    /// leaves everything unchanged.
    pub fn reconfigure(
        &mut self,
        config: AtlasConfig,
        reset_all: bool,
    ) -> Result<Reconfigured, ConfigError> {
        let config = config.normalized()?;
        let reset = reset_all || config.cell_size != self.config.cell_size;
        self.config = config;
        if reset {
            self.clear();
            return Ok(Reconfigured::Reset);
        }

        let layout = *self.layout();
        let width = layout.width.clamp(config.min_width, config.max_width);
        let height = layout.height.clamp(config.min_height, config.max_height);
        if (width, height) == (layout.width, layout.height) {
            return Ok(Reconfigured::Unchanged);
        }

        let resized = AtlasLayout::new(width, height, layout.cell_size);
        if !self.entries.values().all(|entry| resized.contains(entry.slot)) {
            log::debug!("icon atlas shrank below its live slots; resetting");
            self.clear();
            return Ok(Reconfigured::Reset);
        }
        self.resize(width, height);
        self.next_slot = self
            .entries
            .values()
            .map(|entry| entry.slot + 1)
            .max()
            .unwrap_or(0);
        Ok(Reconfigured::Resized)
    }

    /// Drops every entry and returns the atlas to its minimum size.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_slot = 0;
        self.buffer = AtlasBuffer::new(min_layout(&self.config));
    }
}

impl Debug for SlotAllocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SlotAllocator")
            .field("config", &self.config)
            .field("layout", self.layout())
            .field("entries", &self.entries.len())
            .field("next_slot", &self.next_slot)
            .finish_non_exhaustive()
    }
}

fn min_layout(config: &AtlasConfig) -> AtlasLayout {
    AtlasLayout::new(config.min_width, config.min_height, config.cell_size)
}
