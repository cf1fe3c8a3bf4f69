//! Key-to-partition mapping.
//!
//! One sharder variant is active per process, selected from the
//! configuration's partitioning scheme. Sharders are total functions of
//! the key bytes: malformed keys still map to some partition, it is the
//! caller's job to feed keys of the declared shape.

use meridian_common::config::{Configuration, Partitioning};
use meridian_common::hash::{fnv_hash_32, murmur_hash_3};
use meridian_common::{Key, PartitionId};

/// Parses the run of ASCII digits starting at `bytes[0]`, with an optional
/// leading minus sign. Returns 0 when the input has no leading number.
fn parse_decimal(bytes: &[u8]) -> i64 {
    let (negative, digits) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        _ => (false, bytes),
    };
    let mut value: i64 = 0;
    let mut seen = false;
    for &b in digits {
        if !b.is_ascii_digit() {
            break;
        }
        seen = true;
        value = value.wrapping_mul(10).wrapping_add(i64::from(b - b'0'));
    }
    if !seen {
        return 0;
    }
    if negative {
        -value
    } else {
        value
    }
}

fn read_i32_le(key: &Key) -> i32 {
    key.read_i32_le().unwrap_or(0)
}

/// Reads the user id out of a 22-byte formatted DSH username key: the
/// first two bytes are the decimal length `L` of the raw name, which sits
/// right-aligned at offset `20 - L .. 20`.
fn dsh_username_id(key: &Key) -> u32 {
    let len = parse_decimal(&key[..2]).clamp(0, 18) as usize;
    parse_decimal(&key[20 - len..20]).max(0) as u32
}

/// The active partitioning scheme.
#[derive(Debug, Clone)]
enum Scheme {
    /// FNV over a fixed-length key prefix.
    Hash { partition_key_num_bytes: usize },
    /// Decimal text keys, `id % P`.
    Simple,
    /// Decimal text keys, `(id / R) % P`.
    Simple2 { num_regions: u32 },
    /// LE `i32` warehouse keys, `(w_id - 1) % P`.
    Tpcc,
    /// Formatted usernames or LE `u32` ids, `id % P`.
    Dsh,
    /// LE `u64` keys, city index in the top 16 bits.
    Movr,
    /// LE `i32` keys, `(id - 1) % P`.
    Pps,
    /// 12-digit decimal prefix (text keys) or LE `i64` (review keys).
    Movie,
    /// Murmur-hashed 24-byte names or LE `i32` ids.
    SmallBank,
}

/// Maps keys to partitions for one process.
#[derive(Debug, Clone)]
pub struct Sharder {
    scheme: Scheme,
    num_partitions: u32,
    local_partition: PartitionId,
}

impl Sharder {
    /// Builds the sharder matching the configuration's partitioning.
    #[must_use]
    pub fn from_config(config: &Configuration) -> Self {
        let scheme = match config.partitioning {
            Partitioning::Hash {
                partition_key_num_bytes,
            } => Scheme::Hash {
                partition_key_num_bytes,
            },
            Partitioning::Simple => Scheme::Simple,
            Partitioning::Simple2 => Scheme::Simple2 {
                num_regions: config.num_regions,
            },
            Partitioning::Tpcc => Scheme::Tpcc,
            Partitioning::Dsh { .. } => Scheme::Dsh,
            Partitioning::Movr => Scheme::Movr,
            Partitioning::Pps { .. } => Scheme::Pps,
            Partitioning::Movie => Scheme::Movie,
            Partitioning::Smallbank { .. } => Scheme::SmallBank,
        };
        Self {
            scheme,
            num_partitions: config.num_partitions,
            local_partition: config.local_partition,
        }
    }

    /// Total number of partitions.
    #[must_use]
    pub fn num_partitions(&self) -> u32 {
        self.num_partitions
    }

    /// The partition owned by this process.
    #[must_use]
    pub fn local_partition(&self) -> PartitionId {
        self.local_partition
    }

    /// Whether `key` lives on the local partition.
    #[must_use]
    pub fn is_local_key(&self, key: &Key) -> bool {
        self.compute_partition(key) == self.local_partition
    }

    /// The partition of `key`, in `[0, num_partitions)`.
    #[must_use]
    pub fn compute_partition(&self, key: &Key) -> PartitionId {
        let p = self.num_partitions;
        match &self.scheme {
            Scheme::Hash {
                partition_key_num_bytes,
            } => {
                let end = (*partition_key_num_bytes).min(key.len());
                fnv_hash_32(&key[..end]) % p
            }
            Scheme::Simple => (parse_decimal(key).rem_euclid(i64::from(p))) as u32,
            Scheme::Simple2 { num_regions } => {
                let column = parse_decimal(key) / i64::from(*num_regions);
                (column.rem_euclid(i64::from(p))) as u32
            }
            Scheme::Tpcc => {
                let w_id = read_i32_le(key);
                (w_id - 1).rem_euclid(p as i32) as u32
            }
            Scheme::Dsh => {
                let id = if key.len() == 22 {
                    dsh_username_id(key)
                } else {
                    key.read_i32_le().unwrap_or(0) as u32
                };
                id % p
            }
            Scheme::Movr => {
                let global_id = key.read_u64_le().unwrap_or(0);
                let city_index = (global_id >> 48) as u32;
                city_index % p
            }
            Scheme::Pps => {
                let id = read_i32_le(key);
                (id - 1).rem_euclid(p as i32) as u32
            }
            Scheme::Movie => (movie_key_id(key).rem_euclid(i64::from(p))) as u32,
            Scheme::SmallBank => {
                if key.len() == 26 {
                    murmur_hash_3(&key[..24]) % p
                } else {
                    read_i32_le(key).rem_euclid(p as i32) as u32
                }
            }
        }
    }
}

/// Extracts the placement id of a Movie key: user and movie keys carry a
/// 12-digit decimal prefix, review keys are a raw little-endian `i64`.
pub(crate) fn movie_key_id(key: &Key) -> i64 {
    if key.len() >= 12 && key[..12].iter().all(u8::is_ascii_digit) {
        parse_decimal(&key[..12])
    } else {
        let raw: Option<[u8; 8]> = key.get(..8).and_then(|s| s.try_into().ok());
        raw.map_or(0, i64::from_le_bytes)
    }
}
