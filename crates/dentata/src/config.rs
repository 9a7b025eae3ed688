use dentata_util::DeepEqual;
use serde::{Deserialize, Serialize};

/// Store tuning knobs.
///
/// Deserializable from any serde format; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of memoized container comparisons before the equality
    /// cache is cleared. Zero disables memoization.
    pub equality_cache_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            equality_cache_capacity: DeepEqual::DEFAULT_CAPACITY,
        }
    }
}

impl StoreConfig {
    pub(crate) fn equality(&self) -> DeepEqual {
        DeepEqual::with_capacity(self.equality_cache_capacity)
    }
}
