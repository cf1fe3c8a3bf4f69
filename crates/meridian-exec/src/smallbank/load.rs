//! SmallBank bootstrap loader.
//!
//! Account rows are placed by the murmur hash of the 24-byte client name;
//! checking and savings rows are placed by the raw customer id. A name's
//! hash placement and its id placement usually differ, which is exactly
//! what lets the workload generator classify accounts into the four
//! SH/MH x SP/MP pools.
//!
//! Workers split the id space into disjoint ranges. Balances are drawn
//! from a per-id generator so the final state is identical for any thread
//! count.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use meridian_common::hash::murmur_hash_3;

use crate::adapter::StorageAdapter;
use crate::scalar::Scalar;
use crate::table::Table;

use super::schema::{AccountsSchema, CheckingSchema, SavingsSchema};
use super::{account_name, ACCOUNT_NAME_WIDTH};

/// Sizing and placement parameters of the SmallBank loader.
#[derive(Debug, Clone)]
pub struct SmallBankLoadParams {
    /// Total bank clients across the cluster.
    pub num_clients: u32,
    /// Regions in the cluster.
    pub num_regions: u32,
    /// Partitions per region.
    pub num_partitions: u32,
    /// Partition this loader populates.
    pub local_partition: u32,
    /// Worker threads; ranges are disjoint so any count yields the same state.
    pub num_threads: u32,
    /// Base PRNG seed for the generated balances.
    pub seed: u64,
}

/// Populates the SmallBank tables for one partition.
pub fn load_tables(adapter: &Arc<dyn StorageAdapter>, params: &SmallBankLoadParams) {
    info!(
        clients = params.num_clients,
        partition = params.local_partition,
        threads = params.num_threads,
        "loading smallbank tables"
    );

    let num_threads = params.num_threads.max(1);
    let range = params.num_clients / num_threads + 1;
    std::thread::scope(|scope| {
        for worker in 0..num_threads {
            let from = worker * range;
            let to = ((worker + 1) * range).min(params.num_clients);
            let adapter = Arc::clone(adapter);
            let params = params.clone();
            scope.spawn(move || load_range(&adapter, &params, from, to));
        }
    });
}

fn load_range(adapter: &Arc<dyn StorageAdapter>, params: &SmallBankLoadParams, from: u32, to: u32) {
    let accounts = Table::<AccountsSchema>::new(Arc::clone(adapter));
    let checking = Table::<CheckingSchema>::new(Arc::clone(adapter));
    let savings = Table::<SavingsSchema>::new(Arc::clone(adapter));

    for id in from..to {
        let name = account_name(id);
        let name_hash = murmur_hash_3(name.as_bytes());

        if name_hash % params.num_partitions == params.local_partition {
            accounts.insert(&[
                Scalar::fixed_text(&name, ACCOUNT_NAME_WIDTH),
                Scalar::Int32(id as i32),
            ]);
        }

        if id % params.num_partitions == params.local_partition {
            let mut balance_rng = StdRng::seed_from_u64(params.seed.wrapping_add(u64::from(id)));
            let checking_balance: i32 = balance_rng.gen_range(100..=10000);
            let savings_balance: i32 = balance_rng.gen_range(100..=10000);
            checking.insert(&[Scalar::Int32(id as i32), Scalar::Int32(checking_balance)]);
            savings.insert(&[Scalar::Int32(id as i32), Scalar::Int32(savings_balance)]);
        }
    }
}
