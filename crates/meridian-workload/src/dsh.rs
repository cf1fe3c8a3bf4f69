//! DSH workload generator.
//!
//! Users and hotels are indexed jointly by `(partition, home)` using the
//! same arithmetic as the loader and sharder, so a multi-partition or
//! multi-home roll translates directly into drawing ids from a different
//! cell of the index. The hot set is the leading slice of each cell;
//! sunflower shifts re-weight the region draw over time from a stepwise
//! CSV schedule.

use std::collections::HashMap;
use std::sync::Arc;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use meridian_common::config::Partitioning;
use meridian_common::{Configuration, MeridianError, MeridianResult, RegionId, ReplicaId, TxnId};
use meridian_exec::adapter::{KeyGenAdapter, StorageAdapter};
use meridian_exec::dsh::{
    format_date, Recommend, RecommendationType, Reservation, Search, UserLogin, MAX_STAY,
    RECOMMENDATION_READ_SIZE,
};
use meridian_exec::metadata::MetadataInitializer;
use meridian_exec::txn::TransactionBody;
use meridian_proto::Transaction;

use crate::params::WorkloadParams;
use crate::profile::TransactionProfile;
use crate::sunflower::SunflowerSchedule;
use crate::{effective_regions, Workload};

const TXN_MIX: &str = "mix";
const HOT: &str = "hot";
const HOT_CHANCE: &str = "hot_chance";
const MH_CHANCE: &str = "mh";
const MP_CHANCE: &str = "mp";
const SUNFLOWER_FILE: &str = "sf";
const DURATION: &str = "duration";

const DEFAULT_PARAMS: &[(&str, &str)] = &[
    // search : recommend : login : reserve
    (TXN_MIX, "120:68:1:1"),
    (HOT, "-1.0"),
    (HOT_CHANCE, "0.0"),
    (MH_CHANCE, ".25"),
    (MP_CHANCE, ".25"),
    (SUNFLOWER_FILE, ""),
    (DURATION, "60"),
];

const DATE_RANGE_START: (u32, u32, u32) = (1, 1, 2020);
const DATE_RANGE_END: (u32, u32, u32) = (31, 6, 2020);
const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

#[derive(Debug, Default)]
struct DshStats {
    total: u64,
    search: u64,
    recommend: u64,
    login: u64,
    reserve: u64,
    multi_home: u64,
}

/// Generator for the DSH family.
pub struct DshWorkload {
    local_region: RegionId,
    num_regions: u32,
    num_partitions: u32,
    max_coord: f64,
    initializer: MetadataInitializer,
    txn_mix: WeightedIndex<i32>,

    /// `[partition][home] -> user ids`.
    user_index: Vec<Vec<Vec<u32>>>,
    /// `[partition][home] -> hotel ids`.
    hotel_index: Vec<Vec<Vec<u32>>>,
    num_hot_users: usize,
    num_hot_hotels: usize,
    hot_chance: f64,
    hot_active: bool,
    mh_chance: f64,
    mp_chance: f64,

    sunflower: Option<SunflowerSchedule>,
    duration_txns: i64,

    rng: StdRng,
    client_txn_id_counter: TxnId,
    stats: DshStats,
}

impl DshWorkload {
    /// Builds a generator for one client at the given region/replica.
    pub fn new(
        config: &Configuration,
        region: RegionId,
        replica: ReplicaId,
        params_str: &str,
        seed: u64,
    ) -> MeridianResult<Self> {
        let Partitioning::Dsh {
            num_users,
            num_hotels,
            max_coord,
        } = config.partitioning
        else {
            return Err(MeridianError::InvalidConfig(
                "dsh workload requires dsh partitioning".into(),
            ));
        };

        let params = WorkloadParams::new(DEFAULT_PARAMS, params_str)?;
        let mix = params.get_i32_list(TXN_MIX)?;
        if mix.len() != 4 {
            return Err(MeridianError::InvalidParameter(
                "there must be exactly 4 values for txn mix".into(),
            ));
        }
        let txn_mix = WeightedIndex::new(mix.iter().map(|&w| w.max(0)))
            .map_err(|e| MeridianError::InvalidParameter(format!("bad txn mix: {e}")))?;

        let num_regions = effective_regions(config);
        let num_partitions = config.num_partitions;
        let local_region = if config.num_regions == 1 { replica } else { region };

        let index_of = |total: u32| {
            let mut index =
                vec![vec![Vec::new(); num_regions as usize]; num_partitions as usize];
            for id in 0..total {
                let partition = (id % num_partitions) as usize;
                let home = ((id / num_partitions) % num_regions) as usize;
                index[partition][home].push(id);
            }
            index
        };
        let user_index = index_of(num_users);
        let hotel_index = index_of(num_hotels);

        let sunflower_path = params.get_string(SUNFLOWER_FILE);
        let sunflower = if sunflower_path.is_empty() {
            None
        } else {
            Some(SunflowerSchedule::from_file(&sunflower_path, num_regions)?)
        };

        let hot_chance = params.get_f64(HOT_CHANCE);
        let hot_active = hot_chance > 0.0;
        let (num_hot_users, num_hot_hotels) = if hot_active {
            let hot_fraction = params.get_f64(HOT).max(0.0);
            let machines = f64::from(num_regions * num_partitions);
            let hot_users = (hot_fraction * f64::from(num_users) / machines) as usize;
            let hot_hotels = (hot_fraction * f64::from(num_hotels) / machines) as usize;
            if hot_hotels < RECOMMENDATION_READ_SIZE {
                warn!("not enough hot hotels for a full read, skew is slightly inaccurate");
            }
            info!(hot_users, hot_hotels, "dsh hot set sized");
            (hot_users, hot_hotels)
        } else {
            (0, 0)
        };

        Ok(Self {
            local_region,
            num_regions,
            num_partitions,
            max_coord,
            initializer: MetadataInitializer::from_config(config),
            txn_mix,
            user_index,
            hotel_index,
            num_hot_users,
            num_hot_hotels,
            hot_chance,
            hot_active,
            mh_chance: params.get_f64(MH_CHANCE),
            mp_chance: params.get_f64(MP_CHANCE),
            sunflower,
            duration_txns: i64::from(params.get_i32(DURATION)),
            rng: StdRng::seed_from_u64(seed),
            client_txn_id_counter: 0,
            stats: DshStats::default(),
        })
    }

    fn elapsed_fraction(&self) -> f64 {
        if self.duration_txns <= 0 {
            return 0.0;
        }
        self.stats.total as f64 / self.duration_txns as f64
    }

    /// Home used for "local" picks; under an active sunflower schedule
    /// even local traffic follows the shifting weights.
    fn local_home(&mut self) -> u32 {
        if let Some(schedule) = &self.sunflower {
            let weights = schedule.weights_at(self.elapsed_fraction());
            if let Ok(dist) = WeightedIndex::new(weights) {
                return dist.sample(&mut self.rng) as u32;
            }
        }
        self.local_region
    }

    fn random_home(&mut self) -> u32 {
        if let Some(schedule) = &self.sunflower {
            let weights = schedule.weights_at(self.elapsed_fraction());
            if let Ok(dist) = WeightedIndex::new(weights) {
                return dist.sample(&mut self.rng) as u32;
            }
        }
        self.rng.gen_range(0..self.num_regions)
    }

    /// Position of one pick within a `(partition, home)` cell: hot picks
    /// land in the cell's leading hot slice, cold picks in the rest.
    fn pick_position(&mut self, pool_len: usize, hot_count: usize) -> usize {
        debug_assert!(pool_len > 0, "empty (partition, home) pool");
        let hot_len = hot_count.min(pool_len).max(1);
        if self.hot_active && self.rng.gen_bool(self.hot_chance.clamp(0.0, 1.0)) {
            self.rng.gen_range(0..hot_len)
        } else {
            let cold_start = hot_count.min(pool_len - 1);
            self.rng.gen_range(cold_start..pool_len)
        }
    }

    fn sample_user(&mut self, partition: usize, home: usize) -> u32 {
        let pool_len = self.user_index[partition][home].len();
        let at = self.pick_position(pool_len, self.num_hot_users);
        self.user_index[partition][home][at]
    }

    fn sample_hotel(&mut self, partition: usize, home: usize) -> u32 {
        let pool_len = self.hotel_index[partition][home].len();
        let at = self.pick_position(pool_len, self.num_hot_hotels);
        self.hotel_index[partition][home][at]
    }

    /// `count` hotel ids honoring the rolled mh/mp placement; hot draws
    /// come from a per-cell shuffled hot prefix so one read set does not
    /// repeat hot ids.
    fn sample_hotels(&mut self, count: usize, profile: &mut TransactionProfile) -> Vec<u32> {
        let is_mh = self.rng.gen_bool(self.mh_chance.clamp(0.0, 1.0));
        let is_mp = self.rng.gen_bool(self.mp_chance.clamp(0.0, 1.0));
        profile.is_multi_home = is_mh;
        profile.is_multi_partition = is_mp;

        let base_partition = self.rng.gen_range(0..self.num_partitions) as usize;
        let base_home = self.local_home() as usize;
        let hot_size = self.num_hot_hotels.max(count);

        let mut shuffled_hot: HashMap<(usize, usize), Vec<u32>> = HashMap::new();
        let mut hot_cursor: HashMap<(usize, usize), usize> = HashMap::new();

        let mut picks = Vec::with_capacity(count);
        for _ in 0..count {
            let partition = if is_mp {
                self.rng.gen_range(0..self.num_partitions) as usize
            } else {
                base_partition
            };
            let home = if is_mh {
                self.random_home() as usize
            } else {
                base_home
            };

            let pool_len = self.hotel_index[partition][home].len();
            if pool_len == 0 {
                continue;
            }
            if self.hot_active && self.rng.gen_bool(self.hot_chance.clamp(0.0, 1.0)) {
                let key = (partition, home);
                if !shuffled_hot.contains_key(&key) {
                    let mut prefix: Vec<u32> =
                        self.hotel_index[partition][home][..hot_size.min(pool_len)].to_vec();
                    prefix.shuffle(&mut self.rng);
                    shuffled_hot.insert(key, prefix);
                }
                let hot_pool = &shuffled_hot[&key];
                let cursor = hot_cursor.entry(key).or_insert(0);
                picks.push(hot_pool[*cursor % hot_pool.len()]);
                *cursor += 1;
            } else {
                let cold_start = hot_size.min(pool_len - 1);
                let at = self.rng.gen_range(cold_start..pool_len);
                picks.push(self.hotel_index[partition][home][at]);
            }
        }
        picks
    }

    /// A random stay of 1..=MAX_STAY nights within the generation window.
    fn random_date_range(&mut self) -> (String, String) {
        let (start, end) = (DATE_RANGE_START, DATE_RANGE_END);
        let year = self.rng.gen_range(start.2..=end.2);
        let month_lo = if year == start.2 { start.1 } else { 1 };
        let month_hi = if year == end.2 { end.1 } else { 12 };
        let month = self.rng.gen_range(month_lo..=month_hi);
        let day_lo = if year == start.2 && month == start.1 {
            start.0
        } else {
            1
        };
        let day_hi = if year == end.2 && month == end.1 {
            end.0
        } else {
            DAYS_IN_MONTH[(month - 1) as usize]
        };
        let day = self.rng.gen_range(day_lo..=day_hi);
        let stay = self.rng.gen_range(1..=MAX_STAY as u32);

        let mut out_day = day + stay;
        let mut out_month = month;
        let mut out_year = year;
        if out_day > DAYS_IN_MONTH[(month - 1) as usize] {
            out_day -= DAYS_IN_MONTH[(month - 1) as usize];
            out_month += 1;
            if out_month > 12 {
                out_month = 1;
                out_year += 1;
            }
        }
        (
            format_date(day, month, year),
            format_date(out_day, out_month, out_year),
        )
    }

    fn keygen_adapter() -> (Arc<KeyGenAdapter>, Arc<dyn StorageAdapter>) {
        let adapter = Arc::new(KeyGenAdapter::new());
        let dyn_adapter: Arc<dyn StorageAdapter> = adapter.clone();
        (adapter, dyn_adapter)
    }

    fn user_login_txn(&mut self, txn: &mut Transaction) {
        let partition = self.rng.gen_range(0..self.num_partitions) as usize;
        // A foreign region, used when the mh roll sends the login away.
        let mut foreign = self.rng.gen_range(0..self.num_regions.max(2) - 1);
        if foreign >= self.local_region {
            foreign += 1;
        }
        let is_foreign = self.rng.gen_bool(self.mh_chance.clamp(0.0, 1.0));
        let home = if is_foreign {
            (foreign % self.num_regions) as usize
        } else {
            self.local_home() as usize
        };

        let user_id = self.sample_user(partition, home);
        let uname = user_id.to_string();

        let (adapter, dyn_adapter) = Self::keygen_adapter();
        let mut body = UserLogin::new(&dyn_adapter, &uname, &uname);
        body.execute();
        adapter.finalize(txn, &self.initializer);
        txn.add_procedure(vec!["user_login".to_string(), uname.clone(), uname]);
    }

    fn search_txn(&mut self, txn: &mut Transaction, profile: &mut TransactionProfile) {
        let hotels = self.sample_hotels(RECOMMENDATION_READ_SIZE, profile);
        let (in_date, out_date) = self.random_date_range();
        let lat = self.rng.gen_range(0.0..(self.max_coord - 1.0).max(1.0));
        let lon = self.rng.gen_range(0.0..(self.max_coord - 1.0).max(1.0));

        let hotel_ids: Vec<i32> = hotels.iter().map(|&h| h as i32).collect();
        let (adapter, dyn_adapter) = Self::keygen_adapter();
        let mut body = Search::new(&dyn_adapter, &in_date, &out_date, lat, lon, &hotel_ids);
        body.execute();
        adapter.finalize(txn, &self.initializer);

        let mut args = vec![
            "search".to_string(),
            in_date,
            out_date,
            lat.to_string(),
            lon.to_string(),
        ];
        args.extend(hotel_ids.iter().map(ToString::to_string));
        txn.add_procedure(args);
    }

    fn recommend_txn(&mut self, txn: &mut Transaction, profile: &mut TransactionProfile) {
        let hotels = self.sample_hotels(RECOMMENDATION_READ_SIZE, profile);
        let recommendation_type = match self.rng.gen_range(0..3u32) {
            0 => RecommendationType::Distance,
            1 => RecommendationType::Rating,
            _ => RecommendationType::Price,
        };
        let (mut lat, mut lon) = (0.0, 0.0);
        if recommendation_type == RecommendationType::Distance {
            lat = self.rng.gen_range(0.0..(self.max_coord - 1.0).max(1.0));
            lon = self.rng.gen_range(0.0..(self.max_coord - 1.0).max(1.0));
        }

        let hotel_ids: Vec<i32> = hotels.iter().map(|&h| h as i32).collect();
        let (adapter, dyn_adapter) = Self::keygen_adapter();
        let mut body = Recommend::new(&dyn_adapter, recommendation_type, lat, lon, &hotel_ids);
        body.execute();
        adapter.finalize(txn, &self.initializer);

        let mut args = vec![
            "recommendation".to_string(),
            recommendation_type.as_str().to_string(),
            lat.to_string(),
            lon.to_string(),
        ];
        args.extend(hotel_ids.iter().map(ToString::to_string));
        txn.add_procedure(args);
    }

    fn reservation_txn(&mut self, txn: &mut Transaction, profile: &mut TransactionProfile) {
        let is_mh = self.rng.gen_bool(self.mh_chance.clamp(0.0, 1.0));
        let is_mp = self.rng.gen_bool(self.mp_chance.clamp(0.0, 1.0));
        profile.is_multi_home = is_mh;
        profile.is_multi_partition = is_mp;

        let p = self.num_partitions as usize;
        let (hotel_partition, user_partition) = if is_mp && p > 1 {
            let mut partitions: Vec<usize> = (0..p).collect();
            partitions.shuffle(&mut self.rng);
            (partitions[0], partitions[1])
        } else {
            let partition = self.rng.gen_range(0..p);
            (partition, partition)
        };

        let r = self.num_regions as usize;
        let (hotel_home, user_home) = if is_mh && r > 1 {
            let mut regions: Vec<usize> = (0..r).collect();
            regions.shuffle(&mut self.rng);
            (regions[0], regions[1])
        } else {
            let home = self.local_home() as usize;
            (home, home)
        };

        let user_id = self.sample_user(user_partition, user_home);
        let hotel_id = self.sample_hotel(hotel_partition, hotel_home);

        let uname = user_id.to_string();
        let (in_date, out_date) = self.random_date_range();
        let num_rooms = self.rng.gen_range(0..=4);

        let (adapter, dyn_adapter) = Self::keygen_adapter();
        let mut body = Reservation::new(
            &dyn_adapter,
            &uname,
            &uname,
            &in_date,
            &out_date,
            hotel_id as i32,
            &uname,
            num_rooms,
        );
        body.execute();
        adapter.finalize(txn, &self.initializer);

        txn.add_procedure(vec![
            "reservation".to_string(),
            uname.clone(),
            uname.clone(),
            in_date,
            out_date,
            hotel_id.to_string(),
            num_rooms.to_string(),
            uname,
        ]);
    }
}

impl Workload for DshWorkload {
    fn name(&self) -> &'static str {
        "dsh"
    }

    fn next_transaction(&mut self) -> (Transaction, TransactionProfile) {
        let mut profile = TransactionProfile {
            client_txn_id: self.client_txn_id_counter,
            ..TransactionProfile::default()
        };
        let mut txn = Transaction::default();

        match self.txn_mix.sample(&mut self.rng) {
            0 => {
                self.search_txn(&mut txn, &mut profile);
                self.stats.search += 1;
            }
            1 => {
                self.recommend_txn(&mut txn, &mut profile);
                self.stats.recommend += 1;
            }
            2 => {
                self.user_login_txn(&mut txn);
                self.stats.login += 1;
            }
            _ => {
                self.reservation_txn(&mut txn, &mut profile);
                self.stats.reserve += 1;
            }
        }

        if profile.is_multi_home {
            self.stats.multi_home += 1;
        }
        self.stats.total += 1;

        txn.set_id(self.client_txn_id_counter);
        self.client_txn_id_counter += 1;
        (txn, profile)
    }

    fn log_statistics(&self) {
        let s = &self.stats;
        info!(
            total = s.total,
            search = s.search,
            recommend = s.recommend,
            login = s.login,
            reserve = s.reserve,
            multi_home = s.multi_home,
            "dsh workload statistics"
        );
    }
}
