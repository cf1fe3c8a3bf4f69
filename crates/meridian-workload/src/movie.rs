//! Movie workload generator.
//!
//! Every transaction is a `new_review` joining one user row and one
//! movie row with a fresh review row. The generator controls placement
//! by choosing the review id and the movie title from candidate pools
//! with the same or a different home/partition as the chosen user, so a
//! multi-home or multi-partition roll is realized exactly.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use meridian_common::config::Partitioning;
use meridian_common::{Configuration, MeridianError, MeridianResult, RegionId, ReplicaId, TxnId};
use meridian_exec::adapter::{KeyGenAdapter, StorageAdapter};
use meridian_exec::metadata::MetadataInitializer;
use meridian_exec::movie::{title_for, username_for, NewReview, MOVIES, NUM_USERS};
use meridian_exec::txn::TransactionBody;
use meridian_proto::Transaction;

use crate::params::WorkloadParams;
use crate::profile::TransactionProfile;
use crate::util::nurand;
use crate::Workload;

const PARTITION: &str = "sp_partition";
const HOMES: &str = "homes";
const SKEW: &str = "skew";
const MH_CHANCE: &str = "mh";
const MP_CHANCE: &str = "mp";
const SUNFLOWER: &str = "sunflower";
const SF_FRACTION: &str = "sf_fraction";
const SF_HOME: &str = "sf_home";

const DEFAULT_PARAMS: &[(&str, &str)] = &[
    (PARTITION, "-1"),
    (HOMES, "2"),
    (SKEW, "0.0"),
    (MH_CHANCE, "25"),
    (MP_CHANCE, "50"),
    (SUNFLOWER, "0"),
    (SF_FRACTION, "0.9"),
    (SF_HOME, "0"),
];

const TEXT_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const REVIEW_TEXT_LEN: usize = 256;

#[derive(Debug, Default)]
struct MovieStats {
    total: u64,
    multi_home: u64,
    single_home: u64,
    multi_partition: u64,
    single_partition: u64,
}

/// Generator for the movie family.
pub struct MovieWorkload {
    params: WorkloadParams,
    local_region: RegionId,
    num_regions: u32,
    num_partitions: u32,
    skew: f64,
    initializer: MetadataInitializer,
    rng: StdRng,
    client_txn_id_counter: TxnId,
    stats: MovieStats,
}

impl MovieWorkload {
    /// Builds a generator for one client at the given region/replica.
    pub fn new(
        config: &Configuration,
        region: RegionId,
        replica: ReplicaId,
        params_str: &str,
        seed: u64,
    ) -> MeridianResult<Self> {
        if config.partitioning != Partitioning::Movie {
            return Err(MeridianError::InvalidConfig(
                "movie workload requires movie partitioning".into(),
            ));
        }
        let params = WorkloadParams::new(DEFAULT_PARAMS, params_str)?;
        let local_region = if config.num_regions == 1 { replica } else { region };

        Ok(Self {
            skew: params.get_f64(SKEW),
            params,
            local_region,
            num_regions: config.num_regions,
            num_partitions: config.num_partitions,
            initializer: MetadataInitializer::from_config(config),
            rng: StdRng::seed_from_u64(seed),
            client_txn_id_counter: 0,
            stats: MovieStats::default(),
        })
    }

    fn home_of(&self, id: i64) -> i64 {
        (id / i64::from(self.num_partitions)) % i64::from(self.num_regions)
    }

    fn partition_of(&self, id: i64) -> i64 {
        id % i64::from(self.num_partitions)
    }

    fn pick_from(&mut self, candidates: &[i64]) -> i64 {
        debug_assert!(!candidates.is_empty());
        let max_index = candidates.len() as i64 - 1;
        let a = (self.skew * max_index as f64) as i64;
        candidates[nurand(&mut self.rng, a, 0, max_index) as usize]
    }

    /// A random id in `[min_id, max_id]` homed at `home`.
    fn random_id_for_home(&mut self, home: i64, min_id: i64, max_id: i64) -> i64 {
        let candidates: Vec<i64> = (min_id..=max_id)
            .filter(|&id| self.home_of(id) == home)
            .collect();
        if candidates.is_empty() {
            return min_id;
        }
        self.pick_from(&candidates)
    }

    /// A random id in `[min_id, max_id]` whose placement relates to `id`
    /// as requested. Falls back to the full range when no candidate has
    /// the requested relation (small pools cannot span every partition).
    fn related_id(
        &mut self,
        id: i64,
        min_id: i64,
        max_id: i64,
        same_home: bool,
        same_partition: bool,
    ) -> i64 {
        let home = self.home_of(id);
        let partition = self.partition_of(id);
        let candidates: Vec<i64> = (min_id..=max_id)
            .filter(|&other| {
                (self.home_of(other) == home) == same_home
                    && (self.partition_of(other) == partition) == same_partition
            })
            .collect();
        if candidates.is_empty() {
            let all: Vec<i64> = (min_id..=max_id).collect();
            return self.pick_from(&all);
        }
        self.pick_from(&candidates)
    }

    fn new_review_txn(
        &mut self,
        txn: &mut Transaction,
        profile: &mut TransactionProfile,
        sunflower: bool,
        sunflower_home: i64,
        multi_home: bool,
        multi_partition: bool,
    ) {
        let max_user = i64::from(NUM_USERS);
        let max_title = MOVIES.len() as i64 - 1;

        let user_id = if sunflower {
            self.random_id_for_home(sunflower_home, 1, max_user)
        } else if multi_home {
            nurand(&mut self.rng, (self.skew * max_user as f64) as i64, 1, max_user)
        } else {
            self.random_id_for_home(i64::from(self.local_region), 1, max_user)
        };

        let spans_homes = multi_home && self.num_regions > 1;
        let spans_partitions = multi_partition && self.num_partitions > 1;
        let review_id = self.related_id(user_id, 0, max_user, !spans_homes, !spans_partitions);
        let title_index = self.related_id(user_id, 0, max_title, !spans_homes, !spans_partitions);

        let rating = self.rng.gen_range(0..=10);
        let text: String = (0..REVIEW_TEXT_LEN)
            .map(|_| TEXT_CHARSET[self.rng.gen_range(0..TEXT_CHARSET.len())] as char)
            .collect();
        let username = username_for(user_id);
        let title = title_for(title_index);
        let req_id = review_id;
        let timestamp = review_id;

        if self.home_of(review_id) != self.home_of(user_id) {
            profile.is_multi_home = true;
            self.stats.multi_home += 1;
        } else {
            self.stats.single_home += 1;
        }
        if self.partition_of(review_id) != self.partition_of(user_id) {
            profile.is_multi_partition = true;
            self.stats.multi_partition += 1;
        } else {
            self.stats.single_partition += 1;
        }

        let adapter = Arc::new(KeyGenAdapter::new());
        let dyn_adapter: Arc<dyn StorageAdapter> = adapter.clone();
        let mut body = NewReview::new(
            &dyn_adapter,
            req_id,
            rating,
            &username,
            &title,
            timestamp,
            review_id,
            &text,
        );
        body.read();
        body.write();
        adapter.finalize(txn, &self.initializer);

        txn.add_procedure(vec![
            "new_review".to_string(),
            req_id.to_string(),
            rating.to_string(),
            username,
            title,
            timestamp.to_string(),
            review_id.to_string(),
            text,
        ]);
    }
}

impl Workload for MovieWorkload {
    fn name(&self) -> &'static str {
        "movie"
    }

    fn next_transaction(&mut self) -> (Transaction, TransactionProfile) {
        let mut profile = TransactionProfile {
            client_txn_id: self.client_txn_id_counter,
            ..TransactionProfile::default()
        };

        let multi_home = self
            .rng
            .gen_range(0.0..1.0)
            < f64::from(self.params.get_i32(MH_CHANCE)) / 100.0;
        let multi_partition = self
            .rng
            .gen_range(0.0..1.0)
            < f64::from(self.params.get_i32(MP_CHANCE)) / 100.0;

        let sunflower = self.params.get_i32(SUNFLOWER) == 1;
        let sunflower_home = i64::from(self.params.get_i32(SF_HOME));
        // The user's home follows the sunflower target for the configured
        // fraction of traffic and the opposite home otherwise; this is a
        // two-home pattern.
        let sunflower_home = if self.rng.gen_range(0.0..1.0) < self.params.get_f64(SF_FRACTION)
            || self.num_regions == 1
        {
            sunflower_home
        } else {
            (sunflower_home - 1).abs()
        };

        let mut txn = Transaction::default();
        self.new_review_txn(
            &mut txn,
            &mut profile,
            sunflower,
            sunflower_home,
            multi_home,
            multi_partition,
        );
        self.stats.total += 1;

        txn.set_id(self.client_txn_id_counter);
        self.client_txn_id_counter += 1;
        (txn, profile)
    }

    fn log_statistics(&self) {
        let s = &self.stats;
        info!(
            total = s.total,
            multi_home = s.multi_home,
            single_home = s.single_home,
            multi_partition = s.multi_partition,
            single_partition = s.single_partition,
            "movie workload statistics"
        );
    }
}
