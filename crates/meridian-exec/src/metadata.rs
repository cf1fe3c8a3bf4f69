//! Key-to-home-region mapping.
//!
//! Each partitioning family pairs its sharder with a metadata initializer;
//! the pair must agree with the family's loader on placement. The general
//! pattern is column arithmetic: the sharder takes `id mod P` (or a
//! one-based variant), the initializer takes `(id / P) mod R` over the
//! same id.

use meridian_common::config::{Configuration, Partitioning};
use meridian_common::hash::murmur_hash_3;
use meridian_common::{Key, RegionId};

use crate::sharder::movie_key_id;

/// Assigns the home region of every key of one family.
#[derive(Debug, Clone)]
pub enum MetadataInitializer {
    /// Every key is mastered by one fixed region.
    Constant {
        /// The home region.
        home: RegionId,
    },
    /// Decimal text keys: `(id / P) % R`.
    Simple {
        /// Partitions per region.
        num_partitions: u32,
        /// Regions in the cluster.
        num_regions: u32,
    },
    /// Decimal text keys under the transposed layout: `id % R`.
    Simple2 {
        /// Regions in the cluster.
        num_regions: u32,
    },
    /// LE `i32` warehouse keys: `((w_id - 1) / P) % R`.
    Tpcc {
        /// Partitions per region.
        num_partitions: u32,
        /// Regions in the cluster.
        num_regions: u32,
    },
    /// DSH keys (formatted usernames or LE ids): `(id / P) % R`.
    Dsh {
        /// Partitions per region.
        num_partitions: u32,
        /// Regions in the cluster.
        num_regions: u32,
    },
    /// LE `u64` keys: `(city_index / P) % R`.
    Movr {
        /// Partitions per region.
        num_partitions: u32,
        /// Regions in the cluster.
        num_regions: u32,
    },
    /// LE `i32` keys: `((id - 1) / P) % R`.
    Pps {
        /// Partitions per region.
        num_partitions: u32,
        /// Regions in the cluster.
        num_regions: u32,
    },
    /// Movie keys: `(id / P) % R` over the 12-digit prefix or review id.
    Movie {
        /// Partitions per region.
        num_partitions: u32,
        /// Regions in the cluster.
        num_regions: u32,
    },
    /// SmallBank keys: murmur-hash placement for 26-byte name keys,
    /// `(id / P) % R` for id keys.
    SmallBank {
        /// Partitions per region.
        num_partitions: u32,
        /// Regions in the cluster.
        num_regions: u32,
    },
}

impl MetadataInitializer {
    /// Builds the initializer matching the configuration's partitioning.
    ///
    /// Hash partitioning has no placement structure to derive homes from,
    /// so it masters everything at region 0.
    #[must_use]
    pub fn from_config(config: &Configuration) -> Self {
        let num_partitions = config.num_partitions;
        let num_regions = config.num_regions;
        match config.partitioning {
            Partitioning::Hash { .. } => Self::Constant { home: 0 },
            Partitioning::Simple => Self::Simple {
                num_partitions,
                num_regions,
            },
            Partitioning::Simple2 => Self::Simple2 { num_regions },
            Partitioning::Tpcc => Self::Tpcc {
                num_partitions,
                num_regions,
            },
            Partitioning::Dsh { .. } => Self::Dsh {
                num_partitions,
                num_regions,
            },
            Partitioning::Movr => Self::Movr {
                num_partitions,
                num_regions,
            },
            Partitioning::Pps { .. } => Self::Pps {
                num_partitions,
                num_regions,
            },
            Partitioning::Movie => Self::Movie {
                num_partitions,
                num_regions,
            },
            Partitioning::Smallbank { .. } => Self::SmallBank {
                num_partitions,
                num_regions,
            },
        }
    }

    /// The home region of `key`, in `[0, num_regions)`.
    #[must_use]
    pub fn compute_home(&self, key: &Key) -> RegionId {
        match *self {
            Self::Constant { home } => home,
            Self::Simple {
                num_partitions,
                num_regions,
            } => {
                let id = parse_decimal_prefix(key);
                ((id / i64::from(num_partitions)).rem_euclid(i64::from(num_regions))) as u32
            }
            Self::Simple2 { num_regions } => {
                (parse_decimal_prefix(key).rem_euclid(i64::from(num_regions))) as u32
            }
            Self::Tpcc {
                num_partitions,
                num_regions,
            } => {
                let w_id = key.read_i32_le().unwrap_or(0);
                ((w_id - 1).div_euclid(num_partitions as i32)).rem_euclid(num_regions as i32) as u32
            }
            Self::Dsh {
                num_partitions,
                num_regions,
            } => {
                let id = if key.len() == 22 {
                    dsh_username_id(key)
                } else {
                    key.read_i32_le().unwrap_or(0) as u32
                };
                (id / num_partitions) % num_regions
            }
            Self::Movr {
                num_partitions,
                num_regions,
            } => {
                let city_index = (key.read_u64_le().unwrap_or(0) >> 48) as u32;
                (city_index / num_partitions) % num_regions
            }
            Self::Pps {
                num_partitions,
                num_regions,
            } => {
                let id = key.read_i32_le().unwrap_or(0);
                ((id - 1).div_euclid(num_partitions as i32)).rem_euclid(num_regions as i32) as u32
            }
            Self::Movie {
                num_partitions,
                num_regions,
            } => {
                let id = movie_key_id(key);
                ((id / i64::from(num_partitions)).rem_euclid(i64::from(num_regions))) as u32
            }
            Self::SmallBank {
                num_partitions,
                num_regions,
            } => {
                if key.len() == 26 {
                    (murmur_hash_3(&key[..24]) / num_partitions) % num_regions
                } else {
                    let id = key.read_i32_le().unwrap_or(0).max(0) as u32;
                    (id / num_partitions) % num_regions
                }
            }
        }
    }
}

fn parse_decimal_prefix(key: &Key) -> i64 {
    let mut value: i64 = 0;
    for &b in key.iter() {
        if !b.is_ascii_digit() {
            break;
        }
        value = value.wrapping_mul(10).wrapping_add(i64::from(b - b'0'));
    }
    value
}

fn dsh_username_id(key: &Key) -> u32 {
    let len = parse_decimal_slice(&key[..2]).clamp(0, 18) as usize;
    parse_decimal_slice(&key[20 - len..20]).max(0) as u32
}

fn parse_decimal_slice(bytes: &[u8]) -> i64 {
    let mut value: i64 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            break;
        }
        value = value.wrapping_mul(10).wrapping_add(i64::from(b - b'0'));
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pps_home_is_one_based() {
        let init = MetadataInitializer::Pps {
            num_partitions: 4,
            num_regions: 3,
        };
        // Products 1..=4 belong to region 0, 5..=8 to region 1.
        for id in 1..=4i32 {
            let key = Key::from_vec(id.to_le_bytes().to_vec());
            assert_eq!(init.compute_home(&key), 0);
        }
        let key = Key::from_vec(5i32.to_le_bytes().to_vec());
        assert_eq!(init.compute_home(&key), 1);
    }

    #[test]
    fn test_simple_home() {
        let init = MetadataInitializer::Simple {
            num_partitions: 3,
            num_regions: 4,
        };
        assert_eq!(init.compute_home(&Key::from_bytes(b"10")), 3);
        assert_eq!(init.compute_home(&Key::from_bytes(b"12")), 0);
    }

    #[test]
    fn test_smallbank_name_home_matches_id_rule_shape() {
        let init = MetadataInitializer::SmallBank {
            num_partitions: 4,
            num_regions: 3,
        };
        let name = format!("{:<24}", "Client0");
        let mut raw = name.clone().into_bytes();
        raw.extend_from_slice(&0u16.to_le_bytes());
        let expected = (murmur_hash_3(name.as_bytes()) / 4) % 3;
        assert_eq!(init.compute_home(&Key::from_vec(raw)), expected);

        let id_key = Key::from_vec(17i32.to_le_bytes().to_vec());
        assert_eq!(init.compute_home(&id_key), (17 / 4) % 3);
    }

    #[test]
    fn test_dsh_username_home() {
        let init = MetadataInitializer::Dsh {
            num_partitions: 4,
            num_regions: 3,
        };
        let mut formatted = crate::dsh::format_uname("37").into_bytes();
        formatted.extend_from_slice(&0u16.to_le_bytes());
        assert_eq!(init.compute_home(&Key::from_vec(formatted)), (37 / 4) % 3);
    }
}
