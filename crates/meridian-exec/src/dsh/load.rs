//! DSH bootstrap loader.
//!
//! Users and hotels are striped over partitions by raw id (`id % P`);
//! reservations and counts appear only at run time.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::adapter::StorageAdapter;
use crate::scalar::Scalar;
use crate::table::Table;

use super::schema::{HotelSchema, UserSchema};
use super::util::format_uname;
use super::{MAX_HOTEL_CAPACITY, MAX_HOTEL_PRICE, MIN_HOTEL_CAPACITY};

/// Sizing and placement parameters of the DSH loader.
#[derive(Debug, Clone)]
pub struct DshLoadParams {
    /// Total users across the cluster.
    pub num_users: u32,
    /// Total hotels across the cluster.
    pub num_hotels: u32,
    /// Partitions per region.
    pub num_partitions: u32,
    /// Partition this loader populates.
    pub local_partition: u32,
    /// Upper bound for generated coordinates.
    pub max_coord: f64,
    /// PRNG seed; identical seeds produce identical tables.
    pub seed: u64,
}

/// Populates the DSH tables for one partition.
pub fn load_tables(adapter: &Arc<dyn StorageAdapter>, params: &DshLoadParams) {
    info!(
        users = params.num_users,
        hotels = params.num_hotels,
        partition = params.local_partition,
        "loading dsh tables"
    );

    let users = Table::<UserSchema>::new(Arc::clone(adapter));
    let mut id = params.local_partition;
    while id < params.num_users {
        // Passwords mirror the user id; login checks are self-contained.
        users.insert(&[
            Scalar::fixed_text(&format_uname(&id.to_string()), 20),
            Scalar::var_text(&id.to_string(), 60),
        ]);
        id += params.num_partitions;
    }

    let hotels = Table::<HotelSchema>::new(Arc::clone(adapter));
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut id = params.local_partition;
    while id < params.num_hotels {
        hotels.insert(&[
            Scalar::Int32(id as i32),
            Scalar::Float64(rng.gen_range(0.0..params.max_coord)),
            Scalar::Float64(rng.gen_range(0.0..params.max_coord)),
            Scalar::Float64(rng.gen_range(0.0..5.0)),
            Scalar::Float64(rng.gen_range(0.0..MAX_HOTEL_PRICE)),
            Scalar::Int32(rng.gen_range(MIN_HOTEL_CAPACITY..=MAX_HOTEL_CAPACITY) as i32),
        ]);
        id += params.num_partitions;
    }
}
