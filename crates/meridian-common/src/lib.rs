//! # meridian-common
//!
//! Common types, errors, and utilities for Meridian.
//!
//! This crate provides the foundational pieces used across all Meridian
//! components:
//!
//! - **Types**: the opaque [`Key`] byte string and the integer identifiers
//!   for partitions, regions, replicas, and transactions
//! - **Config**: the [`Configuration`] consumed by sharders, loaders, and
//!   workload generators, including the active partitioning variant
//! - **Errors**: unified error handling with [`MeridianError`]
//! - **Hash**: the bit-exact FNV and MurmurHash3 primitives that the
//!   hash-based sharders and metadata initializers are built on

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod hash;
pub mod types;

pub use config::{Configuration, Partitioning};
pub use error::{MeridianError, MeridianResult};
pub use types::{Key, PartitionId, RegionId, ReplicaId, TxnId};
