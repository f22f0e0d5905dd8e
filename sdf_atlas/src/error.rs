// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;
use std::io;

use crate::atlas::{ConfigError, IconKey};
use crate::sdf::SdfError;

/// Errors returned by [`IconCache`](crate::atlas::IconCache).
#[derive(Debug)]
pub enum IconCacheError {
    /// The atlas configuration was rejected.
    Config(ConfigError),
    /// Generating a distance field failed.
    Sdf(SdfError),
    /// The generation thread could not be started.
    Spawn(io::Error),
    /// The generation thread exited without producing a result.
    WorkerLost,
    /// An earlier generation of this icon failed. It stays unavailable until
    /// it leaves the cache.
    GenerationFailed(IconKey),
}

impl fmt::Display for IconCacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid atlas configuration: {err}"),
            Self::Sdf(err) => write!(f, "icon generation failed: {err}"),
            Self::Spawn(err) => write!(f, "failed to start generation thread: {err}"),
            Self::WorkerLost => f.write_str("generation thread exited without a result"),
            Self::GenerationFailed(key) => write!(
                f,
                "icon {}:{:#x} failed to generate and is not retried",
                key.font.display(),
                key.codepoint
            ),
        }
    }
}

impl core::error::Error for IconCacheError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Sdf(err) => Some(err),
            Self::Spawn(err) => Some(err),
            Self::WorkerLost | Self::GenerationFailed(_) => None,
        }
    }
}

impl From<ConfigError> for IconCacheError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<SdfError> for IconCacheError {
    fn from(err: SdfError) -> Self {
        Self::Sdf(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::error::Error;

    #[test]
    fn display_and_source() {
        let err = IconCacheError::from(ConfigError::ZeroCellSize);
        assert!(err.to_string().starts_with("invalid atlas configuration"));
        assert!(err.source().is_some());
        assert!(IconCacheError::WorkerLost.source().is_none());
    }

    #[test]
    fn failed_generation_names_icon() {
        let err = IconCacheError::GenerationFailed(IconKey::new("icons.ttf", 0xE001));
        assert_eq!(
            err.to_string(),
            "icon icons.ttf:0xe001 failed to generate and is not retried"
        );
        assert!(err.source().is_none());
    }
}
