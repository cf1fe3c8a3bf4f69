//! # meridian-workload
//!
//! Deterministic workload generators for the four benchmark families.
//!
//! A generator produces a stream of key-annotated wire transactions plus
//! an out-of-band [`TransactionProfile`] describing the intended
//! placement (single/multi-home, single/multi-partition) and the
//! dependency phase. Dependent transactions (PPS `order_product`, every
//! SmallBank operation) are driven by feeding executed first-phase
//! results back through [`Workload::on_result`]; the generator emits the
//! follow-up on its next call.
//!
//! With a fixed seed and identical configuration a generator produces a
//! byte-identical transaction stream.

#![warn(clippy::all)]

pub mod dsh;
pub mod movie;
pub mod params;
pub mod pps;
pub mod profile;
pub mod smallbank;
pub mod sunflower;
mod util;

pub use dsh::DshWorkload;
pub use movie::MovieWorkload;
pub use params::WorkloadParams;
pub use pps::PpsWorkload;
pub use profile::{DependencyType, TransactionProfile, TransactionType};
pub use smallbank::SmallBankWorkload;
pub use sunflower::SunflowerSchedule;

use meridian_proto::Transaction;

/// A source of benchmark transactions.
pub trait Workload {
    /// Short family name ("pps", "smallbank", "dsh", "movie").
    fn name(&self) -> &'static str;

    /// Produces the next transaction and its profile.
    fn next_transaction(&mut self) -> (Transaction, TransactionProfile);

    /// Feeds an executed transaction back to the generator. First-phase
    /// results of dependent transactions must be delivered here so the
    /// follow-up phase can be produced.
    fn on_result(&mut self, _txn: &Transaction, _profile: &TransactionProfile) {}

    /// Advances time-varying behavior (the sunflower shift). `elapsed`
    /// and `duration` are in the same unit, typically seconds.
    fn refresh_sunflower(&mut self, _duration: i64, _elapsed: i64) {}

    /// Logs the generator's counters.
    fn log_statistics(&self) {}
}

/// Effective region count for workload placement.
///
/// Calvin-style single-region deployments substitute replicas for regions
/// so the same workload shapes apply; the substitution happens here, once.
#[must_use]
pub fn effective_regions(config: &meridian_common::Configuration) -> u32 {
    if config.num_regions == 1 {
        config.num_replicas(config.local_region).max(1)
    } else {
        config.num_regions
    }
}
