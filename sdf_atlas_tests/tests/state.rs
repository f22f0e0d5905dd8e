// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entry state machine and the single generation in flight.

use std::collections::HashSet;

use sdf_atlas::{AtlasConfig, IconCacheError, IconKey, IconStatus, SdfError};

use crate::util::{FONT, MISSING, TestEnv, key, small_config};

#[test]
fn state_same_key_twice() {
    let mut env = TestEnv::new(AtlasConfig::default());
    assert_eq!(env.request(0xE001), None);
    assert_eq!(env.status(0xE001), Some(IconStatus::Generating));

    env.cache.wait_for_generation().unwrap();
    assert_eq!(env.status(0xE001), Some(IconStatus::ReadyToDraw));

    let info = env.request(0xE001).unwrap();
    assert_eq!(info.status, IconStatus::ReadyToDraw);
    assert_eq!(env.status(0xE001), Some(IconStatus::Drawing));
    assert_eq!(info.uv_size, (0.125, 0.125));
    assert_eq!(info.uv_origin(), (0.0, 0.0));

    let info = env.request(0xE001).unwrap();
    assert_eq!(info.status, IconStatus::Drawing);
    assert_eq!(env.cache.len(), 1);
}

#[test]
fn state_unique_slots_for_distinct_keys() {
    let mut env = TestEnv::new(AtlasConfig::default());
    // Nothing idles, so the atlas grows to 2048x1024 without evicting.
    let codepoints: Vec<u32> = (0..500).map(|i| 0xE000 + i).collect();
    for &c in &codepoints {
        env.request(c);
    }
    let slots: Vec<u32> = codepoints.iter().map(|&c| env.slot(c).unwrap()).collect();
    assert_eq!(slots.iter().collect::<HashSet<_>>().len(), slots.len());
    assert!(slots.iter().all(|&s| s < env.cache.layout().capacity()));
    assert_eq!(env.cache.layout().capacity(), 512);
    assert_eq!(env.cache.stats().evictions, 0);
    env.cache.wait_for_generation().unwrap();
}

#[test]
fn state_at_most_one_generating() {
    let mut env = TestEnv::new(small_config());
    let codepoints = 1..=12_u32;
    for round in 0..6 {
        env.clock.set(f64::from(round) * 4.0);
        for c in codepoints.clone() {
            env.request(c);
            env.assert_single_generation(codepoints.clone());
        }
        if round % 2 == 0 {
            env.cache.wait_for_generation().unwrap();
            env.assert_single_generation(codepoints.clone());
        }
    }
    env.cache.wait_for_generation().unwrap();
}

#[test]
fn state_icons_generate_in_turn() {
    let mut env = TestEnv::new(small_config());
    for c in 1..=3 {
        env.request(c);
    }
    while env.cache.wait_for_generation().unwrap() {
        for c in 1..=3 {
            env.request(c);
        }
    }
    assert_eq!(env.cache.stats().generations, 3);
    for c in 1..=3 {
        assert!(env.request(c).is_some());
        assert_eq!(env.status(c), Some(IconStatus::Drawing));
        env.assert_cell(c);
    }
}

#[test]
fn state_missing_glyph_is_never_drawable() {
    let mut env = TestEnv::new(small_config());
    assert_eq!(env.request(MISSING), None);
    env.cache.wait_for_generation().unwrap();

    let entry = *env.cache.entry(&key(MISSING)).unwrap();
    assert_eq!(entry.status, IconStatus::Waiting);
    assert!(entry.unrenderable);
    assert!(
        env.cache
            .buffer()
            .cell_pixels(entry.slot)
            .iter()
            .all(|&p| p == [0; 4]),
        "nothing is written for an empty bitmap"
    );

    for _ in 0..3 {
        assert_eq!(env.request(MISSING), None);
        assert!(!env.cache.is_generating());
    }
    assert_eq!(env.make_ready(7).slot, 1);
}

#[test]
fn state_missing_font_is_an_error() {
    let mut env = TestEnv::new(small_config());
    let missing = IconKey::new("/no/such/dir/icons.ttf", 0xE000);
    assert_eq!(env.cache.request_draw_key(missing.clone()).unwrap(), None);

    let err = env.cache.wait_for_generation().unwrap_err();
    let IconCacheError::Sdf(SdfError::FontLoad { path, .. }) = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(path, &missing.font);
    let entry = *env.cache.entry(&missing).unwrap();
    assert_eq!(entry.status, IconStatus::Waiting);
    assert!(entry.failed);
    assert!(matches!(
        env.cache.request_draw_key(missing.clone()),
        Err(IconCacheError::GenerationFailed(_))
    ));
    assert!(!env.cache.is_generating());

    // Other icons are unaffected.
    let info = env.make_ready(5);
    assert_eq!(info.status, IconStatus::ReadyToDraw);
    assert_eq!(env.cache.generator().font_count(), 1);
    assert!(env.cache.entry(&IconKey::new(FONT, 5)).is_some());
}

#[test]
fn state_failed_font_does_not_block_other_icons() {
    let mut env = TestEnv::new(small_config());
    let missing = IconKey::new("/no/such/dir/icons.ttf", 0xE000);
    assert_eq!(env.cache.request_draw_key(missing.clone()).unwrap(), None);

    // Valid icons are drawn after the broken one every frame.
    let mut frames = 0;
    loop {
        let failed = env.cache.request_draw_key(missing.clone());
        assert!(!matches!(failed, Ok(Some(_))));
        let drawn = (1..=4)
            .filter(|&c| {
                env.cache
                    .request_draw(FONT, c)
                    .expect("valid icons are never refused")
                    .is_some()
            })
            .count();
        if drawn == 4 {
            break;
        }
        frames += 1;
        assert!(frames < 10_000, "valid icons never became drawable");
        std::thread::sleep(std::time::Duration::from_millis(1));
    }

    for c in 1..=4 {
        env.assert_cell(c);
    }
    // One failed generation, never repeated.
    assert_eq!(env.cache.stats().generations, 5);
    assert!(env.cache.entry(&missing).unwrap().failed);
}

#[test]
fn state_failed_icon_is_retried_after_clear() {
    let mut env = TestEnv::new(small_config());
    let missing = IconKey::new("/no/such/dir/icons.ttf", 0xE000);
    env.cache.request_draw_key(missing.clone()).unwrap();
    assert!(env.cache.wait_for_generation().is_err());

    env.cache.clear_cache();
    assert_eq!(env.cache.request_draw_key(missing.clone()).unwrap(), None);
    assert_eq!(env.cache.generating_key(), Some(&missing));
    assert!(env.cache.wait_for_generation().is_err());
}

#[test]
fn state_clear_cache_resets_everything() {
    let mut env = TestEnv::new(small_config());
    for c in 1..=5 {
        env.make_ready(c);
    }
    assert_eq!(env.cache.layout().width, 8);
    env.cache.clear_cache();
    assert!(env.cache.is_empty());
    assert_eq!(env.cache.layout().width, 4);
    assert!(env.cache.buffer().pixels().iter().all(|&p| p == [0; 4]));

    let info = env.make_ready(3);
    assert_eq!(info.slot, 0);
}

#[test]
fn state_reconfigure_keeps_icons() {
    let mut env = TestEnv::new(small_config());
    for c in 1..=3 {
        env.make_ready(c);
    }
    let config = AtlasConfig {
        min_width: 8,
        idle_timeout: 30.0,
        ..small_config()
    };
    env.cache.configure(config).unwrap();
    assert_eq!(env.cache.layout().width, 8);
    for c in 1..=3 {
        assert_eq!(env.status(c), Some(IconStatus::Drawing));
        env.assert_cell(c);
    }
}

#[test]
fn state_odd_cell_size_is_rounded_up() {
    let mut env = TestEnv::new(small_config());
    env.cache.set_cell_size(3).unwrap();
    assert_eq!(env.cache.config().cell_size, 4);
    assert_eq!(env.make_ready(1).uv_size, (1.0, 1.0));
    env.assert_cell(1);
}
