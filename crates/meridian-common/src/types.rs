//! Key and identifier types for Meridian.
//!
//! Keys are opaque byte strings; their interpretation (integer, fixed-width
//! text, composite) is workload-specific. Partition and region identifiers
//! are plain integers because the placement algebra is arithmetic on them
//! everywhere.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Horizontal shard within a region; one process owns one partition.
pub type PartitionId = u32;

/// Region that masters a key (its "home").
pub type RegionId = u32;

/// Replica of a region. Only meaningful for single-region (Calvin-style)
/// configurations, where replicas stand in for regions in the workload layer.
pub type ReplicaId = u32;

/// Client-side transaction identifier.
pub type TxnId = u64;

/// An opaque database key.
///
/// Keys identify records and are total inputs to every sharder and metadata
/// initializer. They are cheap to clone.
///
/// # Example
///
/// ```rust
/// use meridian_common::Key;
///
/// let key = Key::from_bytes(b"part:1234");
/// assert_eq!(key.len(), 9);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key(Bytes);

impl Key {
    /// Creates an empty key.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self(Bytes::new())
    }

    /// Creates a key from a byte slice.
    #[inline]
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }

    /// Creates a key from owned bytes.
    #[inline]
    #[must_use]
    pub fn from_vec(vec: Vec<u8>) -> Self {
        Self(Bytes::from(vec))
    }

    /// Creates a key from a `Bytes` instance.
    #[inline]
    #[must_use]
    pub const fn from_raw(bytes: Bytes) -> Self {
        Self(bytes)
    }

    /// Returns the length of the key in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the key is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the key as a byte slice.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the underlying `Bytes`.
    #[inline]
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Reads a little-endian `i32` from the first four key bytes.
    ///
    /// Returns `None` when the key is shorter than four bytes. Several
    /// sharders interpret integer-keyed tables this way.
    #[must_use]
    pub fn read_i32_le(&self) -> Option<i32> {
        let prefix: [u8; 4] = self.0.get(..4)?.try_into().ok()?;
        Some(i32::from_le_bytes(prefix))
    }

    /// Reads a little-endian `u64` from the first eight key bytes.
    #[must_use]
    pub fn read_u64_le(&self) -> Option<u64> {
        let prefix: [u8; 8] = self.0.get(..8)?.try_into().ok()?;
        Some(u64::from_le_bytes(prefix))
    }
}

impl Deref for Key {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for Key {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Key {
    fn from(vec: Vec<u8>) -> Self {
        Self::from_vec(vec)
    }
}

impl From<&[u8]> for Key {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keys mix text and raw little-endian integers; print text where
        // possible and hex escapes elsewhere.
        write!(f, "Key(\"")?;
        for &b in self.0.iter() {
            if (0x20..0x7f).contains(&b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        write!(f, "\")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_basics() {
        let key = Key::from_bytes(b"abc");
        assert_eq!(key.len(), 3);
        assert!(!key.is_empty());
        assert_eq!(key.as_bytes(), b"abc");
        assert!(Key::empty().is_empty());
    }

    #[test]
    fn test_read_i32_le() {
        let key = Key::from_vec(17i32.to_le_bytes().to_vec());
        assert_eq!(key.read_i32_le(), Some(17));
        assert_eq!(Key::from_bytes(b"ab").read_i32_le(), None);
    }

    #[test]
    fn test_read_u64_le() {
        let raw = (7u64 << 48).to_le_bytes().to_vec();
        assert_eq!(Key::from_vec(raw).read_u64_le(), Some(7u64 << 48));
    }
}
