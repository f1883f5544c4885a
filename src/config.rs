//! Index configuration
//!
//! Defaults reproduce the classic blackboard geometry: 512-entry blocks,
//! a 512-block directory, merge below 16 entries into partners below 256.
//! Values can come from a TOML file and be overridden from the environment.
//!
//! ```toml
//! capacity = 20000
//! block_capacity = 512
//! ```

use crate::error::{Error, Result};
use crate::index::block::BLOCK_CAPACITY;
use crate::index::master::{MASTER_CAPACITY, MERGE_PARTNER_LIMIT, MERGE_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Default number of variable slots
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Sizing of the slot table and the two-level index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Number of slots in the variable table
    pub capacity: usize,
    /// Entries per block before a split
    pub block_capacity: usize,
    /// Maximum number of blocks in the directory
    pub master_capacity: usize,
    /// Blocks below this size try to merge after a removal
    pub merge_threshold: usize,
    /// Blocks at or above this size never take part in a merge
    pub merge_partner_limit: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            block_capacity: BLOCK_CAPACITY,
            master_capacity: MASTER_CAPACITY,
            merge_threshold: MERGE_THRESHOLD,
            merge_partner_limit: MERGE_PARTNER_LIMIT,
        }
    }
}

impl IndexConfig {
    /// Default geometry with `capacity` slots
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| Error::Config(format!("Failed to parse index config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }

    /// Defaults overridden by `BBINDEX_*` environment variables
    pub fn from_env() -> Self {
        Self::default().overridden_from_env()
    }

    /// Apply `BBINDEX_CAPACITY`, `BBINDEX_BLOCK_CAPACITY` and
    /// `BBINDEX_MASTER_CAPACITY` on top of `self`
    pub fn overridden_from_env(mut self) -> Self {
        if let Some(value) = env_usize("BBINDEX_CAPACITY") {
            self.capacity = value;
        }
        if let Some(value) = env_usize("BBINDEX_BLOCK_CAPACITY") {
            self.block_capacity = value;
        }
        if let Some(value) = env_usize("BBINDEX_MASTER_CAPACITY") {
            self.master_capacity = value;
        }
        self
    }

    /// Reject geometries the index cannot honour
    ///
    /// A merged block holds at most `merge_partner_limit - 1 +
    /// merge_threshold - 1` entries, which must fit in one block.
    pub fn validate(&self) -> Result<()> {
        if self.capacity > i32::MAX as usize {
            return Err(Error::Config(format!(
                "capacity {} exceeds {}",
                self.capacity,
                i32::MAX
            )));
        }
        if self.block_capacity < 2 {
            return Err(Error::Config(format!(
                "block_capacity must be at least 2, got {}",
                self.block_capacity
            )));
        }
        if self.master_capacity == 0 {
            return Err(Error::Config("master_capacity must not be 0".to_string()));
        }
        if self.merge_threshold == 0 || self.merge_partner_limit < self.merge_threshold {
            return Err(Error::Config(format!(
                "merge_threshold {} must be non-zero and not above merge_partner_limit {}",
                self.merge_threshold, self.merge_partner_limit
            )));
        }
        if (self.merge_partner_limit - 1).saturating_add(self.merge_threshold - 1) > self.block_capacity {
            return Err(Error::Config(format!(
                "merge_partner_limit {} + merge_threshold {} overflow a block of {}",
                self.merge_partner_limit, self.merge_threshold, self.block_capacity
            )));
        }
        Ok(())
    }
}

fn env_usize(key: &str) -> Option<usize> {
    let value = std::env::var(key).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(key, value = %value, "Ignoring non-numeric environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IndexConfig::default();
        assert_eq!(config.block_capacity, 512);
        assert_eq!(config.master_capacity, 512);
        assert_eq!(config.merge_threshold, 16);
        assert_eq!(config.merge_partner_limit, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() -> Result<()> {
        let config = IndexConfig::from_toml_str("capacity = 1000\n")?;
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.block_capacity, 512);
        Ok(())
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            IndexConfig::from_toml_str("capacity = \"many\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_merge_geometry_must_fit() {
        let config = IndexConfig {
            block_capacity: 64,
            ..IndexConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = IndexConfig {
            block_capacity: 8,
            merge_threshold: 2,
            merge_partner_limit: 4,
            ..IndexConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tiny_block_rejected() {
        let config = IndexConfig {
            block_capacity: 1,
            merge_threshold: 1,
            merge_partner_limit: 1,
            ..IndexConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() -> Result<()> {
        let path = std::env::temp_dir().join(format!("bbindex_config_{}.toml", std::process::id()));
        std::fs::write(&path, "capacity = 77\nmaster_capacity = 16\n").unwrap();

        let config = IndexConfig::from_file(&path)?;
        assert_eq!(config.capacity, 77);
        assert_eq!(config.master_capacity, 16);

        std::fs::remove_file(path).ok();
        Ok(())
    }
}
