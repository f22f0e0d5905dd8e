// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Icon cache façade tying slot allocation, generation and drawing together.

use core::fmt::{Debug, Formatter};
use std::path::Path;

use super::allocator::{Reconfigured, SlotAllocator, SlotOutcome};
use super::buffer::{AtlasBuffer, AtlasLayout};
use super::config::AtlasConfig;
use super::key::IconKey;
use super::region::{IconDrawInfo, IconEntry, IconStatus};
use crate::clock::{Clock, SystemClock};
use crate::error::IconCacheError;
use crate::renderers::TextureSink;
use crate::sdf::{Completion, Generation, SdfGenerator, write_cell};

/// Caches signed distance field icons in a growable texture atlas.
///
/// Every frame, renderers call [`request_draw`](Self::request_draw) for the
/// icons they show. Unknown icons get a slot right away and are generated on
/// a background thread, one at a time; until their pixels are in the atlas
/// the request returns `None` and the renderer keeps showing whatever it
/// showed before. Finished generations are applied on the calling thread at
/// the start of the next request, so the atlas has a single writer.
///
/// The atlas buffer should be handed to the GPU with
/// [`upload_if_dirty`](Self::upload_if_dirty) once per frame.
pub struct IconCache<C: Clock = SystemClock> {
    allocator: SlotAllocator,
    generator: SdfGenerator,
    in_flight: Option<Generation>,
    clock: C,
    stats: Counters,
}

impl IconCache {
    /// Creates a cache that rasterizes font outlines and reads wall time.
    pub fn new(config: AtlasConfig) -> Result<Self, IconCacheError> {
        Ok(Self {
            allocator: SlotAllocator::new(config)?,
            generator: SdfGenerator::default(),
            in_flight: None,
            clock: SystemClock::new(),
            stats: Counters::default(),
        })
    }
}

impl<C: Clock> IconCache<C> {
    /// Replaces the generator, for custom rasterizers or preloaded fonts.
    pub fn with_generator(mut self, generator: SdfGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Replaces the time source.
    pub fn with_clock<D: Clock>(self, clock: D) -> IconCache<D> {
        IconCache {
            allocator: self.allocator,
            generator: self.generator,
            in_flight: self.in_flight,
            clock,
            stats: self.stats,
        }
    }

    /// The generator, for registering in-memory fonts.
    #[inline]
    pub fn generator(&self) -> &SdfGenerator {
        &self.generator
    }

    /// The active configuration.
    #[inline]
    pub fn config(&self) -> &AtlasConfig {
        self.allocator.config()
    }

    /// The current grid layout.
    #[inline]
    pub fn layout(&self) -> &AtlasLayout {
        self.allocator.layout()
    }

    /// The atlas pixels.
    #[inline]
    pub fn buffer(&self) -> &AtlasBuffer {
        self.allocator.buffer()
    }

    /// Looks up the entry for an icon.
    #[inline]
    pub fn entry(&self, key: &IconKey) -> Option<&IconEntry> {
        self.allocator.get(key)
    }

    /// Number of cached icons, in any state.
    #[inline]
    pub fn len(&self) -> usize {
        self.allocator.len()
    }

    /// Whether no icons are cached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.allocator.is_empty()
    }

    /// Whether a generation is in flight.
    #[inline]
    pub fn is_generating(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The icon being generated, if any.
    #[inline]
    pub fn generating_key(&self) -> Option<&IconKey> {
        self.in_flight.as_ref().map(|generation| &generation.key)
    }

    /// Applies a new configuration.
    ///
    /// Changing the cell size drops every icon and the cached fonts read from
    /// disk. Other changes keep the icons and only clamp the atlas into the
    /// new size limits.
    pub fn configure(&mut self, config: AtlasConfig) -> Result<Reconfigured, IconCacheError> {
        let cell_size = self.config().cell_size;
        let result = self.allocator.reconfigure(config, false)?;
        if self.config().cell_size != cell_size {
            self.generator.clear_fonts();
        }
        log::debug!("icon cache reconfigured: {result:?}");
        Ok(result)
    }

    /// Changes the cell size, keeping the other settings.
    pub fn set_cell_size(&mut self, cell_size: u32) -> Result<Reconfigured, IconCacheError> {
        self.configure(AtlasConfig {
            cell_size,
            ..*self.config()
        })
    }

    /// Drops every icon and the cached fonts read from disk, and returns the
    /// atlas to its minimum size.
    ///
    /// A generation in flight is left to finish; its result is discarded.
    pub fn clear_cache(&mut self) {
        self.allocator.clear();
        self.generator.clear_fonts();
        log::debug!("icon cache cleared");
    }

    /// Applies the in-flight generation if it has finished.
    ///
    /// Returns whether a generation was completed. Errors from generating an
    /// icon that is still cached are returned once. The icon is marked
    /// [`failed`](IconEntry::failed) and is not generated again while it
    /// stays cached.
    pub fn poll(&mut self) -> Result<bool, IconCacheError> {
        let Some(generation) = &self.in_flight else {
            return Ok(false);
        };
        let completion = generation.try_complete();
        self.complete(completion)
    }

    /// Blocks until the in-flight generation finishes and applies it.
    ///
    /// Returns `false` immediately if nothing is in flight.
    pub fn wait_for_generation(&mut self) -> Result<bool, IconCacheError> {
        let Some(generation) = &self.in_flight else {
            return Ok(false);
        };
        let completion = generation.wait();
        self.complete(completion)
    }

    fn complete(&mut self, completion: Completion) -> Result<bool, IconCacheError> {
        let result = match completion {
            Completion::Pending => return Ok(false),
            Completion::Lost => Err(IconCacheError::WorkerLost),
            Completion::Done(result) => result.map_err(IconCacheError::from),
        };
        let Some(generation) = self.in_flight.take() else {
            return Ok(false);
        };
        self.stats.generations += 1;
        let key = generation.key;
        let cell_size = self.config().cell_size;

        let entry = self
            .allocator
            .get_mut(&key)
            .filter(|entry| entry.status == IconStatus::Generating);
        let Some(entry) = entry.filter(|_| generation.cell_size == cell_size) else {
            match result {
                Ok(_) => log::debug!(
                    "discarding generated icon {}:{:#x}; it left the cache",
                    key.font.display(),
                    key.codepoint
                ),
                Err(err) => log::warn!(
                    "ignoring failure for icon {}:{:#x} that left the cache: {err}",
                    key.font.display(),
                    key.codepoint
                ),
            }
            return Ok(true);
        };

        let bitmap = match result {
            Ok(bitmap) => bitmap,
            Err(err) => {
                entry.status = IconStatus::Waiting;
                entry.failed = true;
                return Err(err);
            }
        };
        if bitmap.is_empty() {
            entry.status = IconStatus::Waiting;
            entry.unrenderable = true;
            log::warn!(
                "icon {}:{:#x} produced an empty bitmap; it will not be drawn",
                key.font.display(),
                key.codepoint
            );
            return Ok(true);
        }
        entry.status = IconStatus::ReadyToDraw;
        let slot = entry.slot;
        write_cell(self.allocator.buffer_mut(), slot, &bitmap);
        log::trace!(
            "icon {}:{:#x} ready in slot {slot}",
            key.font.display(),
            key.codepoint
        );
        Ok(true)
    }

    /// Requests the icon for `codepoint` in the font at `font`.
    ///
    /// See [`request_draw_key`](Self::request_draw_key).
    pub fn request_draw(
        &mut self,
        font: impl AsRef<Path>,
        codepoint: u32,
    ) -> Result<Option<IconDrawInfo>, IconCacheError> {
        self.request_draw_key(IconKey::new(font, codepoint))
    }

    /// Requests an icon for drawing this frame.
    ///
    /// Returns the icon's position in the atlas once its pixels are valid,
    /// and `None` while it is waiting for or undergoing generation. Unknown
    /// icons are given a slot, which may grow the atlas or evict the least
    /// recently drawn icon. If nothing is being generated, a waiting icon
    /// starts generating.
    ///
    /// Errors concern the requested icon only. If its generation failed, the
    /// failure is returned by the request that observes it and every later
    /// request answers [`IconCacheError::GenerationFailed`]. Failures of other
    /// icons found while polling are logged and left on their entries.
    pub fn request_draw_key(
        &mut self,
        key: IconKey,
    ) -> Result<Option<IconDrawInfo>, IconCacheError> {
        let generating = self.generating_key().cloned();
        let failure = match self.poll() {
            Ok(_) => None,
            Err(err) if generating.as_ref() == Some(&key) => Some(err),
            Err(err) => {
                log::warn!("{err}");
                None
            }
        };
        let now = self.clock.now();

        if self.allocator.get(&key).is_none() {
            self.stats.misses += 1;
            let assignment = self.allocator.insert(key.clone(), now);
            match assignment.outcome {
                SlotOutcome::Fresh => {}
                SlotOutcome::Evicted { .. } => self.stats.evictions += 1,
                SlotOutcome::Grew { .. } => self.stats.grows += 1,
            }
        }

        let layout = *self.allocator.layout();
        let cell_size = layout.cell_size;
        let Some(entry) = self.allocator.get_mut(&key) else {
            return Ok(None);
        };
        if entry.failed {
            return Err(failure.unwrap_or(IconCacheError::GenerationFailed(key)));
        }
        match entry.status {
            IconStatus::Waiting => {
                if !entry.unrenderable && self.in_flight.is_none() {
                    let generation = self
                        .generator
                        .spawn(key, cell_size)
                        .map_err(IconCacheError::Spawn)?;
                    entry.status = IconStatus::Generating;
                    self.in_flight = Some(generation);
                }
                Ok(None)
            }
            IconStatus::Generating => Ok(None),
            IconStatus::ReadyToDraw | IconStatus::Drawing => {
                let info = IconDrawInfo::new(entry, &layout);
                entry.status = IconStatus::Drawing;
                entry.last_drawn = now;
                self.stats.hits += 1;
                Ok(Some(info))
            }
        }
    }

    /// Uploads the atlas to `sink` if it changed since the last upload.
    ///
    /// Returns whether an upload happened.
    pub fn upload_if_dirty(&mut self, sink: &mut impl TextureSink) -> bool {
        let buffer = self.allocator.buffer_mut();
        if !buffer.take_dirty() {
            return false;
        }
        sink.upload(buffer.width(), buffer.height(), buffer.as_bytes());
        true
    }

    /// Snapshot of the cache's size and activity counters.
    pub fn stats(&self) -> IconCacheStats {
        let layout = self.layout();
        IconCacheStats {
            entries: self.allocator.len(),
            capacity: layout.capacity(),
            width: layout.width,
            height: layout.height,
            generations: self.stats.generations,
            evictions: self.stats.evictions,
            grows: self.stats.grows,
            hits: self.stats.hits,
            misses: self.stats.misses,
        }
    }

    /// Resets the activity counters.
    pub fn clear_stats(&mut self) {
        self.stats = Counters::default();
    }
}

impl<C: Clock> Debug for IconCache<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IconCache")
            .field("allocator", &self.allocator)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Counters {
    generations: u64,
    evictions: u64,
    grows: u64,
    hits: u64,
    misses: u64,
}

/// Size and activity of an [`IconCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IconCacheStats {
    /// Cached icons, in any state.
    pub entries: usize,
    /// Slots in the current atlas.
    pub capacity: u32,
    /// Atlas width in pixels.
    pub width: u32,
    /// Atlas height in pixels.
    pub height: u32,
    /// Generations completed, including discarded ones.
    pub generations: u64,
    /// Icons evicted to make room.
    pub evictions: u64,
    /// Times the atlas grew.
    pub grows: u64,
    /// Requests answered with draw info.
    pub hits: u64,
    /// Requests for icons that had no slot.
    pub misses: u64,
}
