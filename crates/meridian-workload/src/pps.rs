//! PPS workload generator.
//!
//! Products are striped into blocks of `4 * P * R` consecutive ids; the
//! four sub-blocks of each block are the placement categories (same/other
//! region x same/other partition of the product's parts, as installed by
//! the loader). Picking a category therefore fixes whether the eventual
//! `order_product` is SH/MH and SP/MP, and the generator picks it straight
//! from the configured mh/mp percentages.

use std::sync::Arc;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use meridian_common::config::Partitioning;
use meridian_common::{Configuration, MeridianError, MeridianResult, RegionId, ReplicaId, TxnId};
use meridian_exec::adapter::{KeyGenAdapter, StorageAdapter};
use meridian_exec::metadata::MetadataInitializer;
use meridian_exec::pps::{
    GetPart, GetPartsByProduct, GetProduct, OrderProduct, UpdateProductPart, PARTS_PER_PRODUCT,
};
use meridian_exec::txn::TransactionBody;
use meridian_proto::Transaction;

use crate::params::WorkloadParams;
use crate::profile::{DependencyType, TransactionProfile, TransactionType};
use crate::util::nurand;
use crate::{effective_regions, Workload};

const MH_PCT: &str = "mh";
const MP_PCT: &str = "mp";
const TXN_MIX: &str = "mix";
const HOT: &str = "hot";
const SUNFLOWER_TARGET: &str = "sunflower";
const NEAREST: &str = "nearest";

const DEFAULT_PARAMS: &[(&str, &str)] = &[
    (MH_PCT, "0"),
    (MP_PCT, "0"),
    // order_product : get_parts_by_product : update_product_part :
    // get_product : get_part
    (TXN_MIX, "80:8:8:2:2"),
    (HOT, "0.0"),
    (SUNFLOWER_TARGET, "-1"),
    (NEAREST, "1"),
];

#[derive(Debug, Default)]
struct PpsStats {
    total: u64,
    order_product_first_phase: u64,
    order_product_by_category: [u64; 4],
    get_parts_by_product: u64,
    update_product_part: u64,
    get_product: u64,
    get_part: u64,
}

/// Generator for the PPS family.
pub struct PpsWorkload {
    params: WorkloadParams,
    local_region: RegionId,
    num_regions: u32,
    num_partitions: u32,
    num_products: u32,
    num_parts: u32,
    sunflower_redirect_pct: i32,
    sunflower_target_region: i32,
    initializer: MetadataInitializer,
    txn_mix: WeightedIndex<i32>,
    rng: StdRng,
    client_txn_id_counter: TxnId,
    /// Executed first-phase `order_product`, delivered via `on_result`.
    pending_first_phase: Option<Transaction>,
    parts_to_retrieve: Vec<i32>,
    stats: PpsStats,
}

impl PpsWorkload {
    /// Builds a generator for one client at the given region/replica.
    pub fn new(
        config: &Configuration,
        region: RegionId,
        replica: ReplicaId,
        params_str: &str,
        seed: u64,
    ) -> MeridianResult<Self> {
        let Partitioning::Pps {
            products, parts, ..
        } = config.partitioning
        else {
            return Err(MeridianError::InvalidConfig(
                "pps workload requires pps partitioning".into(),
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
        let local_region = if config.num_regions == 1 { replica } else { region };
        let sunflower_target_region = params.get_i32(SUNFLOWER_TARGET);

        info!(
            region = local_region,
            products,
            parts,
            seed,
            "pps workload created"
        );

        Ok(Self {
            params,
            local_region,
            num_regions,
            num_partitions: config.num_partitions,
            num_products: products,
            num_parts: parts,
            sunflower_redirect_pct: 0,
            sunflower_target_region,
            initializer: MetadataInitializer::from_config(config),
            txn_mix,
            rng: StdRng::seed_from_u64(seed),
            client_txn_id_counter: 0,
            pending_first_phase: None,
            parts_to_retrieve: (1..=PARTS_PER_PRODUCT as i32).collect(),
            stats: PpsStats::default(),
        })
    }

    fn keygen_adapter() -> (Arc<KeyGenAdapter>, Arc<dyn StorageAdapter>) {
        let adapter = Arc::new(KeyGenAdapter::new());
        let dyn_adapter: Arc<dyn StorageAdapter> = adapter.clone();
        (adapter, dyn_adapter)
    }

    fn order_product_second_phase(&mut self, txn: &mut Transaction, product_id: i32) {
        let blocks = 4 * self.num_partitions * self.num_regions;
        let category = ((product_id.max(1) as u32 - 1) % blocks
            / (self.num_partitions * self.num_regions)) as usize;
        self.stats.order_product_by_category[category.min(3)] += 1;

        let (adapter, dyn_adapter) = Self::keygen_adapter();
        let mut body =
            OrderProduct::new(&dyn_adapter, product_id, self.parts_to_retrieve.clone());
        body.read();
        body.write();
        adapter.finalize(txn, &self.initializer);

        let mut args = vec!["order_product".to_string(), product_id.to_string()];
        args.extend(self.parts_to_retrieve.iter().map(ToString::to_string));
        txn.add_procedure(args);
    }

    fn get_parts_by_product_txn(&mut self, txn: &mut Transaction) {
        let product_id = self.select_product();
        let (adapter, dyn_adapter) = Self::keygen_adapter();
        let mut body = GetPartsByProduct::new(&dyn_adapter, product_id);
        body.read();
        adapter.finalize(txn, &self.initializer);
        txn.add_procedure(vec![
            "get_parts_by_product".to_string(),
            product_id.to_string(),
        ]);
    }

    fn update_product_part_txn(&mut self, txn: &mut Transaction) {
        let product_id = self.select_product();
        let (adapter, dyn_adapter) = Self::keygen_adapter();
        let mut body = UpdateProductPart::new(&dyn_adapter, product_id);
        body.read();
        body.write();
        adapter.finalize(txn, &self.initializer);
        txn.add_procedure(vec![
            "update_product_part".to_string(),
            product_id.to_string(),
        ]);
    }

    fn get_product_txn(&mut self, txn: &mut Transaction) {
        let product_id = self.select_product();
        let (adapter, dyn_adapter) = Self::keygen_adapter();
        let mut body = GetProduct::new(&dyn_adapter, product_id);
        body.read();
        adapter.finalize(txn, &self.initializer);
        txn.add_procedure(vec!["get_product".to_string(), product_id.to_string()]);
    }

    fn get_part_txn(&mut self, txn: &mut Transaction) {
        let part_id = self.rng.gen_range(1..=self.num_parts as i32);
        let (adapter, dyn_adapter) = Self::keygen_adapter();
        let mut body = GetPart::new(&dyn_adapter, part_id);
        body.read();
        adapter.finalize(txn, &self.initializer);
        txn.add_procedure(vec!["get_part".to_string(), part_id.to_string()]);
    }

    /// Joint (category, region, block, partition) product choice.
    ///
    /// The category is fixed by the mh/mp rolls; the region within the
    /// block follows the sunflower redirect, or the client's locality for
    /// single-home picks; block and partition come from one NURand draw.
    fn select_product(&mut self) -> i32 {
        let p = self.num_partitions;
        let r = self.num_regions;

        let is_mh = self
            .rng
            .gen_bool((self.params.get_f64(MH_PCT) / 100.0).clamp(0.0, 1.0));
        let is_mp = self
            .rng
            .gen_bool((self.params.get_f64(MP_PCT) / 100.0).clamp(0.0, 1.0));

        let follow_sunflower = self.sunflower_target_region >= 0
            && self
                .rng
                .gen_bool((f64::from(self.sunflower_redirect_pct) / 100.0).clamp(0.0, 1.0));
        let nearest = self.params.get_i32(NEAREST);
        let chosen_region = if follow_sunflower {
            self.sunflower_target_region as u32
        } else if !is_mh && nearest == 1 {
            self.local_region
        } else {
            self.rng.gen_range(0..r)
        };

        let total_blocks_per_category = self.num_products / (4 * p * r);
        let skew = self.params.get_f64(HOT);
        let a = (skew * f64::from(total_blocks_per_category * p)) as i64;
        let choice = nurand(
            &mut self.rng,
            a,
            0,
            i64::from(total_blocks_per_category * p) - 1,
        ) as u32;
        let chosen_block = choice / p;
        let chosen_partition = choice % p;

        let category = u32::from(is_mh) << 1 | u32::from(is_mp);
        let product_id =
            chosen_block * (4 * p * r) + chosen_region * p + chosen_partition + 1 + category * p * r;
        debug_assert!(product_id >= 1 && product_id <= self.num_products);
        product_id as i32
    }
}

impl Workload for PpsWorkload {
    fn name(&self) -> &'static str {
        "pps"
    }

    fn next_transaction(&mut self) -> (Transaction, TransactionProfile) {
        let mut profile = TransactionProfile {
            client_txn_id: self.client_txn_id_counter,
            ..TransactionProfile::default()
        };
        self.stats.total += 1;

        let mut txn = Transaction::default();

        if let Some(prev) = self.pending_first_phase.take() {
            // The executed first phase carries one product_parts key per
            // slot; the slot number sits after the 4-byte product id and
            // the part id is the row value.
            debug_assert_eq!(prev.keys.len(), PARTS_PER_PRODUCT);
            for entry in &prev.keys {
                let slot = entry
                    .key
                    .get(4..8)
                    .and_then(|raw| raw.try_into().ok())
                    .map_or(0, i32::from_le_bytes);
                let part_id = entry
                    .value()
                    .get(..4)
                    .and_then(|raw| raw.try_into().ok())
                    .map_or(0, i32::from_le_bytes);
                if slot >= 1 && slot <= PARTS_PER_PRODUCT as i32 {
                    self.parts_to_retrieve[slot as usize - 1] = part_id;
                }
            }
            let product_id = prev
                .procedures()
                .first()
                .and_then(|procedure| procedure.args.get(1))
                .and_then(|arg| arg.parse().ok())
                .unwrap_or(0);

            profile.dependency_type = DependencyType::SecondPhase;
            profile.transaction_type = TransactionType::OrderProduct;
            self.order_product_second_phase(&mut txn, product_id);
        } else {
            match self.txn_mix.sample(&mut self.rng) {
                0 => {
                    profile.dependency_type = DependencyType::FirstPhase;
                    profile.transaction_type = TransactionType::OrderProduct;
                    self.stats.order_product_first_phase += 1;
                    self.get_parts_by_product_txn(&mut txn);
                }
                1 => {
                    self.stats.get_parts_by_product += 1;
                    self.get_parts_by_product_txn(&mut txn);
                }
                2 => {
                    self.stats.update_product_part += 1;
                    self.update_product_part_txn(&mut txn);
                }
                3 => {
                    self.stats.get_product += 1;
                    self.get_product_txn(&mut txn);
                }
                _ => {
                    self.stats.get_part += 1;
                    self.get_part_txn(&mut txn);
                }
            }
        }

        txn.set_id(self.client_txn_id_counter);
        self.client_txn_id_counter += 1;
        (txn, profile)
    }

    fn on_result(&mut self, txn: &Transaction, profile: &TransactionProfile) {
        if profile.dependency_type == DependencyType::FirstPhase
            && profile.transaction_type == TransactionType::OrderProduct
        {
            self.pending_first_phase = Some(txn.clone());
        }
    }

    fn refresh_sunflower(&mut self, duration: i64, elapsed: i64) {
        if self.sunflower_target_region < 0 || duration <= 0 {
            return;
        }
        // The redirect share ramps up linearly, ten points at a time.
        if elapsed as f64 / duration as f64 > f64::from(self.sunflower_redirect_pct) / 100.0 {
            self.sunflower_redirect_pct += 10;
            info!(
                redirect_pct = self.sunflower_redirect_pct,
                target_region = self.sunflower_target_region,
                "sunflower shift advanced"
            );
        }
    }

    fn log_statistics(&self) {
        let s = &self.stats;
        info!(
            total = s.total,
            order_product_first_phase = s.order_product_first_phase,
            order_product_sh_sp = s.order_product_by_category[0],
            order_product_sh_mp = s.order_product_by_category[1],
            order_product_mh_sp = s.order_product_by_category[2],
            order_product_mh_mp = s.order_product_by_category[3],
            get_parts_by_product = s.get_parts_by_product,
            update_product_part = s.update_product_part,
            get_product = s.get_product,
            get_part = s.get_part,
            "pps workload statistics"
        );
    }
}
