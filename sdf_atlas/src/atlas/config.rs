// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atlas configuration.

use core::fmt;

/// Configuration for an icon atlas.
///
/// Dimensions are in pixels. The atlas starts at the minimum dimensions and
/// grows towards the maximum dimensions as more icons are requested.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasConfig {
    /// Square size of one icon cell in pixels. Always even after normalization.
    pub cell_size: u32,
    /// Initial atlas width.
    pub min_width: u32,
    /// Initial atlas height.
    pub min_height: u32,
    /// Largest width the atlas may grow to.
    pub max_width: u32,
    /// Largest height the atlas may grow to.
    pub max_height: u32,
    /// Seconds an icon must go undrawn before it may be evicted instead of
    /// growing the atlas.
    pub idle_timeout: f64,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            cell_size: 64,
            min_width: 512,
            min_height: 512,
            max_width: 2048,
            max_height: 1024,
            idle_timeout: 60.0,
        }
    }
}

impl AtlasConfig {
    /// Returns a copy with the cell size rounded up to an even number, or
    /// an error if the configuration cannot describe a usable atlas.
    pub fn normalized(mut self) -> Result<Self, ConfigError> {
        if self.cell_size == 0 {
            return Err(ConfigError::ZeroCellSize);
        }
        if self.cell_size % 2 == 1 {
            self.cell_size += 1;
        }
        if self.min_width > self.max_width || self.min_height > self.max_height {
            return Err(ConfigError::MinExceedsMax {
                min: (self.min_width, self.min_height),
                max: (self.max_width, self.max_height),
            });
        }
        if self.min_width < self.cell_size || self.min_height < self.cell_size {
            return Err(ConfigError::CellLargerThanAtlas {
                cell_size: self.cell_size,
                min: (self.min_width, self.min_height),
            });
        }
        if !self.idle_timeout.is_finite() || self.idle_timeout < 0.0 {
            return Err(ConfigError::InvalidTimeout(self.idle_timeout));
        }
        Ok(self)
    }
}

/// Reasons an [`AtlasConfig`] is rejected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigError {
    /// The cell size is zero.
    ZeroCellSize,
    /// A minimum dimension is larger than its maximum.
    MinExceedsMax {
        /// Minimum (width, height).
        min: (u32, u32),
        /// Maximum (width, height).
        max: (u32, u32),
    },
    /// A single cell does not fit in the minimum atlas.
    CellLargerThanAtlas {
        /// Normalized cell size.
        cell_size: u32,
        /// Minimum (width, height).
        min: (u32, u32),
    },
    /// The idle timeout is negative or not finite.
    InvalidTimeout(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCellSize => write!(f, "cell size must be greater than zero"),
            Self::MinExceedsMax { min, max } => write!(
                f,
                "minimum atlas size {}x{} exceeds maximum {}x{}",
                min.0, min.1, max.0, max.1
            ),
            Self::CellLargerThanAtlas { cell_size, min } => write!(
                f,
                "cell size {cell_size} does not fit in minimum atlas size {}x{}",
                min.0, min.1
            ),
            Self::InvalidTimeout(timeout) => write!(f, "invalid idle timeout {timeout}"),
        }
    }
}

impl core::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_cell_size_is_rounded_up() {
        let config = AtlasConfig {
            cell_size: 63,
            ..AtlasConfig::default()
        };
        assert_eq!(config.normalized().unwrap().cell_size, 64);
    }

    #[test]
    fn even_cell_size_is_kept() {
        let config = AtlasConfig::default().normalized().unwrap();
        assert_eq!(config.cell_size, 64);
    }

    #[test]
    fn zero_cell_size_is_rejected() {
        let config = AtlasConfig {
            cell_size: 0,
            ..AtlasConfig::default()
        };
        assert_eq!(config.normalized(), Err(ConfigError::ZeroCellSize));
    }

    #[test]
    fn min_above_max_is_rejected() {
        let config = AtlasConfig {
            min_width: 4096,
            ..AtlasConfig::default()
        };
        assert!(matches!(
            config.normalized(),
            Err(ConfigError::MinExceedsMax { .. })
        ));
    }

    #[test]
    fn cell_must_fit_minimum_atlas() {
        let config = AtlasConfig {
            cell_size: 1024,
            ..AtlasConfig::default()
        };
        assert!(matches!(
            config.normalized(),
            Err(ConfigError::CellLargerThanAtlas { .. })
        ));
    }

    #[test]
    fn negative_timeout_is_rejected() {
        let config = AtlasConfig {
            idle_timeout: -1.0,
            ..AtlasConfig::default()
        };
        assert_eq!(config.normalized(), Err(ConfigError::InvalidTimeout(-1.0)));
    }
}
