use crate::data_structures::hash::bucket_directory::MAX_BUCKETS;
use crate::error::CollectionError;

pub const DEFAULT_INITIAL_BUCKETS: u64 = 2;

/// Average number of elements per bucket above which the bucket count doubles.
pub const DEFAULT_MAX_LOAD: u64 = 2;

/// Sizing knobs for a split-ordered hash collection.
///
/// ```rust
/// use coral_core::data_structures::SplitOrderedConfig;
///
/// let config = SplitOrderedConfig::default()
///     .initial_buckets(64)
///     .max_load(4);
/// assert!(config.validate().is_ok());
/// ```
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitOrderedConfig {
    pub initial_buckets: u64,
    pub max_load: u64,
    pub max_buckets: u64,
}

impl Default for SplitOrderedConfig {
    fn default() -> Self {
        SplitOrderedConfig {
            initial_buckets: DEFAULT_INITIAL_BUCKETS,
            max_load: DEFAULT_MAX_LOAD,
            max_buckets: MAX_BUCKETS,
        }
    }
}

impl SplitOrderedConfig {
    pub fn initial_buckets(mut self, initial_buckets: u64) -> Self {
        self.initial_buckets = initial_buckets;
        self
    }

    pub fn max_load(mut self, max_load: u64) -> Self {
        self.max_load = max_load;
        self
    }

    pub fn max_buckets(mut self, max_buckets: u64) -> Self {
        self.max_buckets = max_buckets;
        self
    }

    /// Initial bucket count able to hold `capacity` elements without resizing.
    pub fn with_capacity(capacity: usize) -> Self {
        let config = Self::default();
        let wanted = (capacity as u64).div_ceil(config.max_load);
        config.initial_buckets(wanted.next_power_of_two().clamp(DEFAULT_INITIAL_BUCKETS, MAX_BUCKETS))
    }

    pub fn validate(&self) -> Result<(), CollectionError> {
        if !self.initial_buckets.is_power_of_two() {
            return Err(CollectionError::InvalidArgument(
                "initial bucket count must be a non-zero power of two",
            ));
        }
        if !self.max_buckets.is_power_of_two() || self.max_buckets > MAX_BUCKETS {
            return Err(CollectionError::InvalidArgument(
                "max bucket count must be a power of two no larger than 2^32",
            ));
        }
        if self.max_buckets < self.initial_buckets {
            return Err(CollectionError::InvalidArgument(
                "max bucket count is below the initial bucket count",
            ));
        }
        if self.max_load == 0 {
            return Err(CollectionError::InvalidArgument("max load must be positive"));
        }
        Ok(())
    }
}
