//! Tile pyramid configuration.

use super::error::BuilderError;

/// Default lowest zoom served.
pub const DEFAULT_MINZOOM: u8 = 0;

/// Default zoom at which full detail is preserved.
pub const DEFAULT_MAXZOOM: u8 = 20;

/// Hard ceiling for `maxzoom`.
pub const MAX_ZOOM_LIMIT: u8 = 20;

/// Default depth of the eager initial build.
pub const DEFAULT_INDEX_MAXZOOM: u8 = 4;

/// Default point count below which the eager build stops splitting.
pub const DEFAULT_INDEX_MAX_POINTS: usize = 100_000;

/// Default simplification tolerance in tile pixels.
pub const DEFAULT_TOLERANCE: f64 = 3.0;

/// Default tile extent.
pub const DEFAULT_EXTENT: u32 = 8192;

/// Largest accepted tile extent. Keeps buffered tile coordinates within `i32`.
pub const MAX_EXTENT: u32 = 1 << 16;

/// Default clip buffer in tile pixels.
pub const DEFAULT_BUFFER: u32 = 64;

/// How output feature ids are assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IdStrategy {
    /// Keep the input feature's `id`.
    #[default]
    Keep,
    /// Number features by their position in the input.
    Generate,
    /// Use the named numeric property as the id.
    Promote(String),
}

/// Configuration for a [`TilePyramid`](super::TilePyramid).
///
/// # Example
///
/// ```
/// use s2tiles::pyramid::BuilderConfig;
///
/// let config = BuilderConfig::new()
///     .with_maxzoom(14)
///     .with_index_maxzoom(5)
///     .with_buffer(0);
/// assert!(config.validate().is_ok());
///
/// let bad = BuilderConfig::new().with_maxzoom(21);
/// assert!(bad.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderConfig {
    minzoom: u8,
    maxzoom: u8,
    index_maxzoom: u8,
    index_max_points: usize,
    tolerance: f64,
    extent: u32,
    buffer: u32,
    generate_id: bool,
    promote_id: Option<String>,
}

impl BuilderConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_minzoom(mut self, minzoom: u8) -> Self {
        self.minzoom = minzoom;
        self
    }

    /// Set the deepest zoom. Tiles at this zoom keep every vertex.
    pub fn with_maxzoom(mut self, maxzoom: u8) -> Self {
        self.maxzoom = maxzoom;
        self
    }

    /// Set how deep the eager build descends before tiles are only split on demand.
    pub fn with_index_maxzoom(mut self, index_maxzoom: u8) -> Self {
        self.index_maxzoom = index_maxzoom;
        self
    }

    /// Set the point count under which the eager build leaves a tile unsplit.
    pub fn with_index_max_points(mut self, points: usize) -> Self {
        self.index_max_points = points;
        self
    }

    /// Set the simplification tolerance in tile pixels (0 disables simplification).
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_extent(mut self, extent: u32) -> Self {
        self.extent = extent;
        self
    }

    /// Set the clip buffer around each tile, in tile pixels.
    pub fn with_buffer(mut self, buffer: u32) -> Self {
        self.buffer = buffer;
        self
    }

    /// Number output features by input position.
    pub fn with_generate_id(mut self, generate: bool) -> Self {
        self.generate_id = generate;
        self
    }

    /// Take output feature ids from the named property.
    pub fn with_promote_id(mut self, key: impl Into<String>) -> Self {
        self.promote_id = Some(key.into());
        self
    }

    pub fn minzoom(&self) -> u8 {
        self.minzoom
    }

    pub fn maxzoom(&self) -> u8 {
        self.maxzoom
    }

    pub fn index_maxzoom(&self) -> u8 {
        self.index_maxzoom
    }

    pub fn index_max_points(&self) -> usize {
        self.index_max_points
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn extent(&self) -> u32 {
        self.extent
    }

    pub fn buffer(&self) -> u32 {
        self.buffer
    }

    /// Resolved id strategy. Only meaningful after [`validate`](Self::validate).
    pub fn id_strategy(&self) -> IdStrategy {
        match (&self.promote_id, self.generate_id) {
            (Some(key), _) => IdStrategy::Promote(key.clone()),
            (None, true) => IdStrategy::Generate,
            (None, false) => IdStrategy::Keep,
        }
    }

    /// Check the configuration for consistency.
    ///
    /// `index_maxzoom` may exceed `maxzoom`; the eager build never descends
    /// past `maxzoom` either way.
    pub fn validate(&self) -> Result<(), BuilderError> {
        if self.maxzoom > MAX_ZOOM_LIMIT {
            return Err(BuilderError::MaxZoomOutOfRange {
                value: self.maxzoom,
                max: MAX_ZOOM_LIMIT,
            });
        }
        if self.minzoom > self.maxzoom {
            return Err(BuilderError::MinZoomAboveMaxZoom {
                minzoom: self.minzoom,
                maxzoom: self.maxzoom,
            });
        }
        if self.index_maxzoom > MAX_ZOOM_LIMIT {
            return Err(BuilderError::IndexMaxZoomOutOfRange {
                index_maxzoom: self.index_maxzoom,
                max: MAX_ZOOM_LIMIT,
            });
        }
        if self.generate_id && self.promote_id.is_some() {
            return Err(BuilderError::ConflictingIdStrategy);
        }
        if self.extent == 0 || self.extent > MAX_EXTENT {
            return Err(BuilderError::InvalidExtent {
                extent: self.extent,
                max: MAX_EXTENT,
            });
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(BuilderError::InvalidTolerance(self.tolerance));
        }
        if self.buffer >= self.extent {
            return Err(BuilderError::InvalidBuffer {
                buffer: self.buffer,
                extent: self.extent,
            });
        }
        Ok(())
    }

    /// Squared simplification threshold in S,T units for `zoom`.
    pub(crate) fn sq_tolerance_at(&self, zoom: u8) -> f64 {
        let tolerance = self.tolerance / ((1u64 << zoom) as f64 * self.extent as f64);
        tolerance * tolerance
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            minzoom: DEFAULT_MINZOOM,
            maxzoom: DEFAULT_MAXZOOM,
            index_maxzoom: DEFAULT_INDEX_MAXZOOM,
            index_max_points: DEFAULT_INDEX_MAX_POINTS,
            tolerance: DEFAULT_TOLERANCE,
            extent: DEFAULT_EXTENT,
            buffer: DEFAULT_BUFFER,
            generate_id: false,
            promote_id: None,
        }
    }
}
