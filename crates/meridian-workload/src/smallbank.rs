//! SmallBank workload generator.
//!
//! An account has two placements: its Accounts row goes where the murmur
//! hash of the name says, its Checking/Savings rows go where the raw
//! customer id says. An operation touching both is multi-partition or
//! multi-home exactly when those two placements disagree, so the
//! constructor classifies every account into SH/MH x SP/MP pools once
//! and the generator draws from the pool matching the rolled placement.
//!
//! Every operation is dependent: a `getCustomerIdByName` first phase
//! resolves the id, the fed-back result drives the operation itself.
//! `amalgamate` resolves two names and is three-phased.

use std::sync::Arc;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use meridian_common::config::Partitioning;
use meridian_common::hash::murmur_hash_3;
use meridian_common::{Configuration, MeridianError, MeridianResult, RegionId, ReplicaId, TxnId};
use meridian_exec::adapter::{KeyGenAdapter, StorageAdapter};
use meridian_exec::metadata::MetadataInitializer;
use meridian_exec::smallbank::{
    account_name, Amalgamate, Balance, DepositChecking, GetCustomerIdByName, TransactionSaving,
    Writecheck,
};
use meridian_exec::txn::TransactionBody;
use meridian_proto::Transaction;

use crate::params::WorkloadParams;
use crate::profile::{DependencyType, TransactionProfile, TransactionType};
use crate::util::{nurand, placement_choice, roll_pct, skewed_pick};
use crate::{effective_regions, Workload};

const MH: &str = "mh";
const MP: &str = "mp";
const TXN_MIX: &str = "mix";
const HOT: &str = "hot";
const SUNFLOWER_TARGET_REGIONS: &str = "sunflower_target_regions";
const SUNFLOWER_TARGET_PROBABILITIES: &str = "sunflower_target_probabilities";

const DEFAULT_PARAMS: &[(&str, &str)] = &[
    (MH, "50"),
    (MP, "50"),
    // balance : depositChecking : transactionSaving : amalgamate : writecheck
    (TXN_MIX, "40:25:15:5:15"),
    (HOT, "0.0"),
    (SUNFLOWER_TARGET_REGIONS, ""),
    (SUNFLOWER_TARGET_PROBABILITIES, ""),
];

#[derive(Debug, Default, Clone, Copy)]
struct TxnCounters {
    total: u64,
    sh: u64,
    mh: u64,
    sp: u64,
    mp: u64,
}

impl TxnCounters {
    fn track(&mut self, choice: u8) {
        match choice {
            1 => {
                self.sh += 1;
                self.sp += 1;
            }
            2 => {
                self.mh += 1;
                self.mp += 1;
            }
            3 => {
                self.mh += 1;
                self.sp += 1;
            }
            _ => {
                self.sh += 1;
                self.mp += 1;
            }
        }
    }
}

#[derive(Debug, Default)]
struct SmallBankStats {
    balance: TxnCounters,
    deposit: TxnCounters,
    saving: TxnCounters,
    amalgamate: TxnCounters,
    writecheck: TxnCounters,
    sent_sunflower: u64,
}

/// Generator for the SmallBank family.
pub struct SmallBankWorkload {
    params: WorkloadParams,
    local_region: RegionId,
    num_regions: u32,
    num_partitions: u32,
    initializer: MetadataInitializer,
    txn_mix: WeightedIndex<i32>,

    client_names_by_id: Vec<String>,
    sh_sp_accounts_by_region: Vec<Vec<String>>,
    sh_mp_accounts_by_region: Vec<Vec<String>>,
    mh_mp_account_names: Vec<String>,
    mh_sp_account_names: Vec<String>,
    /// `[partition][home] -> client ids`, by the id placement rule.
    client_partition_map: Vec<Vec<Vec<u32>>>,

    region_mix: Vec<u32>,
    probability_mix: Vec<u32>,
    sunflower_index: usize,

    rng: StdRng,
    client_txn_id_counter: TxnId,
    pending: Option<(TransactionType, Transaction)>,
    previous_amalgamate: Option<Transaction>,
    stats: SmallBankStats,
}

impl SmallBankWorkload {
    /// Builds a generator for one client at the given region/replica.
    pub fn new(
        config: &Configuration,
        region: RegionId,
        replica: ReplicaId,
        params_str: &str,
        seed: u64,
    ) -> MeridianResult<Self> {
        let Partitioning::Smallbank { clients } = config.partitioning else {
            return Err(MeridianError::InvalidConfig(
                "smallbank workload requires smallbank partitioning".into(),
            ));
        };

        let params = WorkloadParams::new(DEFAULT_PARAMS, params_str)?;
        let mix = params.get_i32_list(TXN_MIX)?;
        if mix.len() != 5 {
            return Err(MeridianError::InvalidParameter(
                "there must be exactly 5 values for txn mix".into(),
            ));
        }
        let txn_mix = WeightedIndex::new(mix.iter().map(|&w| w.max(0)))
            .map_err(|e| MeridianError::InvalidParameter(format!("bad txn mix: {e}")))?;

        let num_regions = effective_regions(config);
        let num_partitions = config.num_partitions;
        let local_region = if config.num_regions == 1 { replica } else { region };

        let mut client_names_by_id = Vec::with_capacity(clients as usize);
        let mut sh_sp_accounts_by_region = vec![Vec::new(); num_regions as usize];
        let mut sh_mp_accounts_by_region = vec![Vec::new(); num_regions as usize];
        let mut mh_mp_account_names = Vec::new();
        let mut mh_sp_account_names = Vec::new();
        let mut client_partition_map =
            vec![vec![Vec::new(); num_regions as usize]; num_partitions as usize];

        for id in 0..clients {
            let name = account_name(id);
            let name_hash = murmur_hash_3(name.as_bytes());
            let name_partition = name_hash % num_partitions;
            let name_home = (name_hash / num_partitions) % num_regions;
            let id_partition = id % num_partitions;
            let id_home = (id / num_partitions) % num_regions;

            let same_partition = name_partition == id_partition;
            let same_home = name_home == id_home;
            match (same_partition, same_home) {
                (true, true) => sh_sp_accounts_by_region[name_home as usize].push(name.clone()),
                (false, false) => mh_mp_account_names.push(name.clone()),
                (false, true) => sh_mp_accounts_by_region[name_home as usize].push(name.clone()),
                (true, false) => mh_sp_account_names.push(name.clone()),
            }
            client_partition_map[id_partition as usize][id_home as usize].push(id);
            client_names_by_id.push(name);
        }

        for region in 0..num_regions as usize {
            info!(
                region,
                sh_sp = sh_sp_accounts_by_region[region].len(),
                sh_mp = sh_mp_accounts_by_region[region].len(),
                "smallbank account pools"
            );
        }
        info!(
            mh_mp = mh_mp_account_names.len(),
            mh_sp = mh_sp_account_names.len(),
            "smallbank cross-placement pools"
        );

        let region_mix;
        let probability_mix;
        let sunflower = params.get_string(SUNFLOWER_TARGET_REGIONS);
        if sunflower.is_empty() {
            region_mix = Vec::new();
            probability_mix = Vec::new();
        } else {
            region_mix = params
                .get_i32_list(SUNFLOWER_TARGET_REGIONS)?
                .into_iter()
                .map(|r| r.max(0) as u32)
                .collect();
            probability_mix = params
                .get_i32_list(SUNFLOWER_TARGET_PROBABILITIES)?
                .into_iter()
                .map(|p| p.clamp(0, 100) as u32)
                .collect();
            if region_mix.len() != probability_mix.len() || region_mix.is_empty() {
                return Err(MeridianError::InvalidParameter(
                    "sunflower regions and probabilities must pair up".into(),
                ));
            }
        }

        Ok(Self {
            params,
            local_region,
            num_regions,
            num_partitions,
            initializer: MetadataInitializer::from_config(config),
            txn_mix,
            client_names_by_id,
            sh_sp_accounts_by_region,
            sh_mp_accounts_by_region,
            mh_mp_account_names,
            mh_sp_account_names,
            client_partition_map,
            region_mix,
            probability_mix,
            sunflower_index: 0,
            rng: StdRng::seed_from_u64(seed),
            client_txn_id_counter: 0,
            pending: None,
            previous_amalgamate: None,
            stats: SmallBankStats::default(),
        })
    }

    fn sunflower_enabled(&self) -> bool {
        !self.region_mix.is_empty()
    }

    fn keygen_adapter() -> (Arc<KeyGenAdapter>, Arc<dyn StorageAdapter>) {
        let adapter = Arc::new(KeyGenAdapter::new());
        let dyn_adapter: Arc<dyn StorageAdapter> = adapter.clone();
        (adapter, dyn_adapter)
    }

    /// Customer id carried in the first value cell of an executed
    /// `getCustomerIdByName`.
    fn decode_customer_id(txn: &Transaction) -> i32 {
        txn.keys
            .first()
            .and_then(|entry| entry.value().get(..4))
            .and_then(|raw| raw.try_into().ok())
            .map_or(0, i32::from_le_bytes)
    }

    fn pick_account_name(&mut self, choice: u8) -> String {
        let skew = self.params.get_f64(HOT);
        let sunflower_roll = self.sunflower_enabled()
            && roll_pct(
                &mut self.rng,
                f64::from(self.probability_mix[self.sunflower_index]),
            );
        if sunflower_roll {
            self.stats.sent_sunflower += 1;
        }
        let region = if sunflower_roll {
            self.region_mix[self.sunflower_index].min(self.num_regions - 1)
        } else {
            self.local_region
        } as usize;

        let pool: &[String] = match choice {
            1 => &self.sh_sp_accounts_by_region[region],
            2 => &self.mh_mp_account_names,
            3 => &self.mh_sp_account_names,
            _ => &self.sh_mp_accounts_by_region[region],
        };
        if pool.is_empty() {
            // Tiny clusters can leave a placement pool empty; degrade to a
            // uniform pick rather than refusing to generate.
            let index = self.rng.gen_range(0..self.client_names_by_id.len());
            return self.client_names_by_id[index].clone();
        }
        skewed_pick(&mut self.rng, pool, skew).clone()
    }

    fn get_customer_id_txn(&mut self, txn: &mut Transaction, name: &str) {
        let (adapter, dyn_adapter) = Self::keygen_adapter();
        let mut body = GetCustomerIdByName::new(&dyn_adapter, name);
        body.read();
        adapter.finalize(txn, &self.initializer);
        txn.add_procedure(vec!["getCustomerIdByName".to_string(), name.to_string()]);
    }

    fn first_phase(
        &mut self,
        txn: &mut Transaction,
        profile: &mut TransactionProfile,
        txn_type: TransactionType,
    ) {
        let choice = placement_choice(
            &mut self.rng,
            self.params.get_f64(MH),
            self.params.get_f64(MP),
        );
        match txn_type {
            TransactionType::Balance => self.stats.balance.track(choice),
            TransactionType::DepositChecking => self.stats.deposit.track(choice),
            TransactionType::TransactionSaving => self.stats.saving.track(choice),
            TransactionType::Writecheck => self.stats.writecheck.track(choice),
            _ => {}
        }
        let name = self.pick_account_name(choice);
        self.get_customer_id_txn(txn, &name);
        profile.transaction_type = txn_type;
        profile.dependency_type = DependencyType::FirstPhase;
    }

    fn balance_second_phase(&mut self, txn: &mut Transaction, customer_id: i32) {
        let name = self.client_names_by_id[customer_id.max(0) as usize].clone();
        let (adapter, dyn_adapter) = Self::keygen_adapter();
        let mut body = Balance::new(&dyn_adapter, &name, customer_id);
        body.read();
        body.write();
        adapter.finalize(txn, &self.initializer);
        txn.add_procedure(vec![
            "balance".to_string(),
            name,
            customer_id.to_string(),
        ]);
        self.stats.balance.total += 1;
    }

    fn deposit_second_phase(&mut self, txn: &mut Transaction, customer_id: i32) {
        let amount = self.rng.gen_range(100..=10000);
        let name = self.client_names_by_id[customer_id.max(0) as usize].clone();
        let (adapter, dyn_adapter) = Self::keygen_adapter();
        let mut body = DepositChecking::new(&dyn_adapter, &name, customer_id, amount);
        body.read();
        body.write();
        adapter.finalize(txn, &self.initializer);
        txn.add_procedure(vec![
            "depositChecking".to_string(),
            name,
            customer_id.to_string(),
            amount.to_string(),
        ]);
        self.stats.deposit.total += 1;
    }

    fn saving_second_phase(&mut self, txn: &mut Transaction, customer_id: i32) {
        let amount = self.rng.gen_range(100..=10000);
        let name = self.client_names_by_id[customer_id.max(0) as usize].clone();
        let (adapter, dyn_adapter) = Self::keygen_adapter();
        let mut body = TransactionSaving::new(&dyn_adapter, &name, customer_id, amount);
        body.read();
        body.write();
        adapter.finalize(txn, &self.initializer);
        txn.add_procedure(vec![
            "transactionSaving".to_string(),
            name,
            customer_id.to_string(),
            amount.to_string(),
        ]);
        self.stats.saving.total += 1;
    }

    fn writecheck_second_phase(&mut self, txn: &mut Transaction, customer_id: i32) {
        let amount = self.rng.gen_range(100..=10000);
        let name = self.client_names_by_id[customer_id.max(0) as usize].clone();
        let (adapter, dyn_adapter) = Self::keygen_adapter();
        let mut body = Writecheck::new(&dyn_adapter, &name, customer_id, amount);
        body.read();
        body.write();
        adapter.finalize(txn, &self.initializer);
        txn.add_procedure(vec![
            "writecheck".to_string(),
            name,
            customer_id.to_string(),
            amount.to_string(),
        ]);
        self.stats.writecheck.total += 1;
    }

    fn pick_client_index(&mut self, partition: usize, home: usize) -> Option<u32> {
        let pool = &self.client_partition_map[partition][home];
        if pool.is_empty() {
            return None;
        }
        let skew = self.params.get_f64(HOT);
        let a = (skew * pool.len() as f64) as i64;
        let index = nurand(&mut self.rng, a, 0, pool.len() as i64 - 1) as usize;
        Some(pool[index])
    }

    /// Amalgamate phase 1: resolve a source account homed at this region.
    fn amalgamate_pick_source(&mut self, txn: &mut Transaction, profile: &mut TransactionProfile) {
        let home = self.local_region as usize;
        let mut partition = self.rng.gen_range(0..self.num_partitions as usize);
        for _ in 0..self.num_partitions as usize {
            if !self.client_partition_map[partition][home].is_empty() {
                break;
            }
            partition = (partition + 1) % self.num_partitions as usize;
        }
        let src_id = self
            .pick_client_index(partition, home)
            .unwrap_or(self.local_region % self.num_partitions);
        let name = self.client_names_by_id[src_id as usize].clone();
        self.get_customer_id_txn(txn, &name);
        profile.transaction_type = TransactionType::Amalgamate;
        profile.dependency_type = DependencyType::FirstPhase;
    }

    /// Amalgamate phase 2: resolve a destination account whose placement
    /// honors the rolled mh/mp relative to the source.
    fn amalgamate_pick_destination(
        &mut self,
        txn: &mut Transaction,
        profile: &mut TransactionProfile,
        src_id: i32,
    ) {
        let p = self.num_partitions as usize;
        let r = self.num_regions as usize;
        let src_id = src_id.max(0) as u32;
        let partition1 = (src_id % self.num_partitions) as usize;
        let home1 = ((src_id / self.num_partitions) % self.num_regions) as usize;

        let is_mh = roll_pct(&mut self.rng, self.params.get_f64(MH));
        let is_mp = roll_pct(&mut self.rng, self.params.get_f64(MP));

        let partition2 = if is_mp && p > 1 {
            let mut partition = self.rng.gen_range(0..p);
            while partition == partition1 {
                partition = self.rng.gen_range(0..p);
            }
            partition
        } else {
            partition1
        };

        let other_homes: Vec<usize> = (0..r)
            .filter(|&h| h != home1 && !self.client_partition_map[partition2][h].is_empty())
            .collect();
        let home2 = if is_mh && !other_homes.is_empty() {
            other_homes[self.rng.gen_range(0..other_homes.len())]
        } else {
            home1
        };

        if is_mp {
            self.stats.amalgamate.mp += 1;
        } else {
            self.stats.amalgamate.sp += 1;
        }
        if is_mh && !other_homes.is_empty() {
            self.stats.amalgamate.mh += 1;
        } else {
            self.stats.amalgamate.sh += 1;
        }

        let pool_len = self.client_partition_map[partition2][home2].len();
        let mut dst_id = self
            .pick_client_index(partition2, home2)
            .unwrap_or(src_id + 1);
        let mut attempts = 0;
        while dst_id == src_id && pool_len > 1 && attempts < 32 {
            dst_id = self
                .pick_client_index(partition2, home2)
                .unwrap_or(src_id + 1);
            attempts += 1;
        }

        let name = self.client_names_by_id[dst_id as usize % self.client_names_by_id.len()].clone();
        self.get_customer_id_txn(txn, &name);
        profile.transaction_type = TransactionType::Amalgamate;
        profile.dependency_type = DependencyType::FirstPhase;
    }

    fn amalgamate_final_phase(&mut self, txn: &mut Transaction, src_id: i32, dst_id: i32) {
        let src_name = self.client_names_by_id[src_id.max(0) as usize].clone();
        let dst_name = self.client_names_by_id[dst_id.max(0) as usize].clone();
        let (adapter, dyn_adapter) = Self::keygen_adapter();
        let mut body = Amalgamate::new(&dyn_adapter, &src_name, &dst_name, src_id, dst_id);
        body.read();
        body.write();
        adapter.finalize(txn, &self.initializer);
        txn.add_procedure(vec![
            "amalgamate".to_string(),
            src_name,
            dst_name,
            src_id.to_string(),
            dst_id.to_string(),
        ]);
        self.stats.amalgamate.total += 1;
    }
}

impl Workload for SmallBankWorkload {
    fn name(&self) -> &'static str {
        "smallbank"
    }

    fn next_transaction(&mut self) -> (Transaction, TransactionProfile) {
        let mut profile = TransactionProfile {
            client_txn_id: self.client_txn_id_counter,
            ..TransactionProfile::default()
        };
        let mut txn = Transaction::default();

        match self.pending.take() {
            Some((TransactionType::Balance, prev)) => {
                let customer_id = Self::decode_customer_id(&prev);
                self.balance_second_phase(&mut txn, customer_id);
                profile.dependency_type = DependencyType::SecondPhase;
            }
            Some((TransactionType::DepositChecking, prev)) => {
                let customer_id = Self::decode_customer_id(&prev);
                self.deposit_second_phase(&mut txn, customer_id);
                profile.dependency_type = DependencyType::SecondPhase;
            }
            Some((TransactionType::TransactionSaving, prev)) => {
                let customer_id = Self::decode_customer_id(&prev);
                self.saving_second_phase(&mut txn, customer_id);
                profile.dependency_type = DependencyType::SecondPhase;
            }
            Some((TransactionType::Writecheck, prev)) => {
                let customer_id = Self::decode_customer_id(&prev);
                self.writecheck_second_phase(&mut txn, customer_id);
                profile.dependency_type = DependencyType::SecondPhase;
            }
            Some((TransactionType::Amalgamate, prev)) => {
                if self.previous_amalgamate.is_none() {
                    let src_id = Self::decode_customer_id(&prev);
                    self.amalgamate_pick_destination(&mut txn, &mut profile, src_id);
                    self.previous_amalgamate = Some(prev);
                } else {
                    let src = self
                        .previous_amalgamate
                        .take()
                        .unwrap_or_else(Transaction::default);
                    let src_id = Self::decode_customer_id(&src);
                    let dst_id = Self::decode_customer_id(&prev);
                    self.amalgamate_final_phase(&mut txn, src_id, dst_id);
                    profile.dependency_type = DependencyType::SecondPhase;
                }
            }
            _ => match self.txn_mix.sample(&mut self.rng) {
                0 => self.first_phase(&mut txn, &mut profile, TransactionType::Balance),
                1 => self.first_phase(&mut txn, &mut profile, TransactionType::DepositChecking),
                2 => self.first_phase(&mut txn, &mut profile, TransactionType::TransactionSaving),
                3 => self.amalgamate_pick_source(&mut txn, &mut profile),
                _ => self.first_phase(&mut txn, &mut profile, TransactionType::Writecheck),
            },
        }

        txn.set_id(self.client_txn_id_counter);
        self.client_txn_id_counter += 1;
        (txn, profile)
    }

    fn on_result(&mut self, txn: &Transaction, profile: &TransactionProfile) {
        if profile.dependency_type == DependencyType::FirstPhase {
            self.pending = Some((profile.transaction_type, txn.clone()));
        }
    }

    fn refresh_sunflower(&mut self, duration: i64, elapsed: i64) {
        if !self.sunflower_enabled() || duration <= 0 {
            return;
        }
        let steps = self.region_mix.len();
        if self.sunflower_index + 1 < steps
            && elapsed as f64 / duration as f64 > (self.sunflower_index + 1) as f64 / steps as f64
        {
            self.sunflower_index += 1;
            info!(
                index = self.sunflower_index,
                region = self.region_mix[self.sunflower_index],
                "sunflower shift advanced"
            );
        }
    }

    fn log_statistics(&self) {
        for (label, counters) in [
            ("balance", self.stats.balance),
            ("deposit", self.stats.deposit),
            ("saving", self.stats.saving),
            ("amalgamate", self.stats.amalgamate),
            ("writecheck", self.stats.writecheck),
        ] {
            info!(
                txn = label,
                total = counters.total,
                sh = counters.sh,
                mh = counters.mh,
                sp = counters.sp,
                mp = counters.mp,
                "smallbank workload statistics"
            );
        }
        info!(
            sent_sunflower = self.stats.sent_sunflower,
            "smallbank sunflower statistics"
        );
    }
}
