use serde::{Deserialize, Serialize};

/// Cache tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of compiled programs kept per function. Inserting
    /// beyond this evicts the least recently used signature.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}
