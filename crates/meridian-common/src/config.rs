//! Cluster configuration consumed by the execution layer.
//!
//! The configuration reports the cluster shape (`num_partitions`,
//! `num_regions`, the local position) and carries exactly one active
//! partitioning variant with its per-family sizing block. Sharders,
//! metadata initializers, loaders, and workload generators are all
//! selected from and parameterized by this structure.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MeridianError, MeridianResult};
use crate::types::{PartitionId, RegionId, ReplicaId};

/// The active data-placement scheme and its sizing parameters.
///
/// Exactly one variant is active per process; the matching sharder and
/// metadata initializer pair is derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum Partitioning {
    /// FNV hash over a fixed-length key prefix.
    Hash {
        /// Number of leading key bytes fed to the hash (whole key if shorter).
        partition_key_num_bytes: usize,
    },
    /// Decimal-text integer keys, `id % P`.
    Simple,
    /// Decimal-text integer keys, `(id / R) % P`.
    Simple2,
    /// Little-endian `i32` warehouse keys, `(w_id - 1) % P`.
    Tpcc,
    /// DeathStar Hotel keys: formatted usernames or raw `u32` ids.
    Dsh {
        /// Total users across the cluster.
        num_users: u32,
        /// Total hotels across the cluster.
        num_hotels: u32,
        /// Upper bound for generated hotel coordinates.
        max_coord: f64,
    },
    /// Little-endian `u64` keys with the city index in the top 16 bits.
    Movr,
    /// Products/parts/suppliers with `(id - 1) % P` placement.
    Pps {
        /// Total products across the cluster.
        products: u32,
        /// Total parts across the cluster.
        parts: u32,
        /// Total suppliers across the cluster.
        suppliers: u32,
    },
    /// 12-digit decimal key prefixes, `id % P`.
    Movie,
    /// 24-byte client names hashed with MurmurHash3, or raw `i32` ids.
    Smallbank {
        /// Total bank clients across the cluster.
        clients: u32,
    },
}

/// Cluster configuration for one process.
///
/// # Example
///
/// ```rust
/// use meridian_common::{Configuration, Partitioning};
///
/// let config = Configuration::for_testing(4, 3, Partitioning::Simple);
/// assert_eq!(config.num_partitions, 4);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    /// Number of partitions per region.
    pub num_partitions: u32,

    /// Number of regions in the cluster.
    pub num_regions: u32,

    /// Partition owned by this process.
    pub local_partition: PartitionId,

    /// Region this process runs in.
    pub local_region: RegionId,

    /// Replica of the local region this process belongs to.
    #[serde(default)]
    pub local_replica: ReplicaId,

    /// Replica count per region, indexed by region id. Empty means one
    /// replica everywhere.
    #[serde(default)]
    pub replicas_per_region: Vec<u32>,

    /// The single active partitioning variant.
    pub partitioning: Partitioning,
}

impl Configuration {
    /// Loads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> MeridianResult<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Creates a minimal configuration for tests: partition 0 of region 0.
    #[must_use]
    pub fn for_testing(num_partitions: u32, num_regions: u32, partitioning: Partitioning) -> Self {
        Self {
            num_partitions,
            num_regions,
            local_partition: 0,
            local_region: 0,
            local_replica: 0,
            replicas_per_region: Vec::new(),
            partitioning,
        }
    }

    /// Returns the same configuration viewed from another partition.
    #[must_use]
    pub fn at_partition(mut self, partition: PartitionId) -> Self {
        self.local_partition = partition;
        self
    }

    /// Returns the same configuration viewed from another region.
    #[must_use]
    pub fn at_region(mut self, region: RegionId) -> Self {
        self.local_region = region;
        self
    }

    /// Number of replicas of the given region.
    #[must_use]
    pub fn num_replicas(&self, region: RegionId) -> u32 {
        self.replicas_per_region
            .get(region as usize)
            .copied()
            .unwrap_or(1)
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> MeridianResult<()> {
        if self.num_partitions == 0 {
            return Err(MeridianError::InvalidConfig(
                "num_partitions must be positive".into(),
            ));
        }
        if self.num_regions == 0 {
            return Err(MeridianError::InvalidConfig(
                "num_regions must be positive".into(),
            ));
        }
        if self.local_partition >= self.num_partitions {
            return Err(MeridianError::InvalidConfig(format!(
                "local_partition {} out of range [0, {})",
                self.local_partition, self.num_partitions
            )));
        }
        if self.local_region >= self.num_regions {
            return Err(MeridianError::InvalidConfig(format!(
                "local_region {} out of range [0, {})",
                self.local_region, self.num_regions
            )));
        }
        if let Partitioning::Hash {
            partition_key_num_bytes,
        } = self.partitioning
        {
            if partition_key_num_bytes == 0 {
                return Err(MeridianError::InvalidConfig(
                    "partition_key_num_bytes must be positive".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_out_of_range_partition() {
        let mut config = Configuration::for_testing(2, 2, Partitioning::Simple);
        config.local_partition = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_num_replicas_defaults_to_one() {
        let config = Configuration::for_testing(2, 2, Partitioning::Simple);
        assert_eq!(config.num_replicas(0), 1);
        assert_eq!(config.num_replicas(1), 1);
    }

    #[test]
    fn test_json_round_trip() {
        let config = Configuration::for_testing(
            4,
            3,
            Partitioning::Pps {
                products: 480,
                parts: 960,
                suppliers: 48,
            },
        );
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Configuration = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.num_partitions, 4);
        assert_eq!(parsed.partitioning, config.partitioning);
    }

    #[test]
    fn test_partitioning_json_shape() {
        let json = r#"{
            "num_partitions": 2,
            "num_regions": 2,
            "local_partition": 1,
            "local_region": 0,
            "partitioning": {"scheme": "smallbank", "clients": 100}
        }"#;
        let config: Configuration = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
        assert_eq!(
            config.partitioning,
            Partitioning::Smallbank { clients: 100 }
        );
    }
}
