//! PPS bootstrap loader.
//!
//! Iterates the full id space and installs only rows whose key lands on
//! the local partition. Placement arithmetic: partition of id is
//! `(id - 1) % P`, home region is `((id - 1) / P) % R`.
//!
//! We call the combination of a region and a partition a *class*; parts
//! are striped over classes so that class `(r, p)` owns part ids
//! `{(k - 1) * P * R + P * r + p + 1}`. Each local product draws its
//! parts from one of four placement categories (same/other region x
//! same/other partition), cycling per product, which is what gives the
//! workload its controllable MH/MP mix.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::adapter::StorageAdapter;
use crate::scalar::Scalar;
use crate::table::Table;

use super::schema::{
    PartSchema, ProductPartsSchema, ProductSchema, SupplierPartsSchema, SupplierSchema,
};
use super::{PARTS_PER_PRODUCT, PARTS_PER_SUPPLIER};

const NAME_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz ";

fn random_name(rng: &mut StdRng, len: usize) -> String {
    (0..len)
        .map(|_| NAME_CHARSET[rng.gen_range(0..NAME_CHARSET.len())] as char)
        .collect()
}

/// Sizing and placement parameters of the PPS loader.
#[derive(Debug, Clone)]
pub struct PpsLoadParams {
    /// Total products across the cluster.
    pub num_products: u32,
    /// Total parts across the cluster.
    pub num_parts: u32,
    /// Total suppliers across the cluster.
    pub num_suppliers: u32,
    /// Regions in the cluster.
    pub num_regions: u32,
    /// Partitions per region.
    pub num_partitions: u32,
    /// Partition this loader populates.
    pub local_partition: u32,
    /// How many distinct regions a category III/IV product may span.
    pub max_regions: u32,
    /// How many distinct partitions a category II/IV product may span.
    pub max_partitions: u32,
    /// PRNG seed; identical seeds produce identical tables.
    pub seed: u64,
}

struct PpsLoader<'a> {
    params: &'a PpsLoadParams,
    remote_regions: Vec<Vec<u32>>,
    remote_partitions: Vec<u32>,
    parts_per_class: u32,
    rng: StdRng,
    adapter: Arc<dyn StorageAdapter>,
}

/// Populates the PPS tables for one partition.
pub fn load_tables(adapter: &Arc<dyn StorageAdapter>, params: &PpsLoadParams) {
    let num_classes = params.num_partitions * params.num_regions;
    let parts_per_class = params.num_parts / num_classes;
    assert!(
        parts_per_class >= PARTS_PER_PRODUCT as u32,
        "not enough parts per class: {parts_per_class}"
    );

    let remote_regions = (0..params.num_regions)
        .map(|r| (0..params.num_regions).filter(|&o| o != r).collect())
        .collect();
    let remote_partitions = (0..params.num_partitions)
        .filter(|&p| p != params.local_partition)
        .collect();

    let mut loader = PpsLoader {
        params,
        remote_regions,
        remote_partitions,
        parts_per_class,
        rng: StdRng::seed_from_u64(params.seed),
        adapter: Arc::clone(adapter),
    };
    loader.load();
}

impl PpsLoader<'_> {
    fn partition_of(&self, id: u32) -> u32 {
        (id - 1) % self.params.num_partitions
    }

    fn region_of(&self, id: u32) -> u32 {
        (id - 1) / self.params.num_partitions % self.params.num_regions
    }

    fn is_local(&self, id: u32) -> bool {
        self.partition_of(id) == self.params.local_partition
    }

    /// A uniformly random part belonging to class `(region, partition)`.
    fn choose_random_part(&mut self, region: u32, partition: u32) -> u32 {
        let normalized_part_id = self.params.num_partitions * region + partition + 1;
        let index_within_class = self.rng.gen_range(1..=self.parts_per_class);
        (index_within_class - 1) * self.params.num_partitions * self.params.num_regions
            + normalized_part_id
    }

    fn choose_partition(&mut self) -> u32 {
        if self.remote_partitions.is_empty() {
            return self.params.local_partition;
        }
        let index = self.rng.gen_range(0..self.params.max_partitions) as usize;
        if index == self.params.max_partitions as usize - 1 {
            self.params.local_partition
        } else {
            self.remote_partitions[index % self.remote_partitions.len()]
        }
    }

    fn choose_region(&mut self, product_region: u32) -> u32 {
        let remotes = &self.remote_regions[product_region as usize];
        if remotes.is_empty() {
            return product_region;
        }
        let index = self.rng.gen_range(0..self.params.max_regions) as usize;
        if index == self.params.max_regions as usize - 1 {
            product_region
        } else {
            remotes[index % remotes.len()]
        }
    }

    fn load(&mut self) {
        let p = self.params;
        info!(
            products = p.num_products,
            parts = p.num_parts,
            suppliers = p.num_suppliers,
            partition = p.local_partition,
            "loading pps tables"
        );

        let products = Table::<ProductSchema>::new(Arc::clone(&self.adapter));
        for product_id in 1..=p.num_products {
            if self.is_local(product_id) {
                let name = random_name(&mut self.rng, 10);
                products.insert(&[
                    Scalar::Int32(product_id as i32),
                    Scalar::fixed_text(&name, 10),
                ]);
            }
        }

        let parts = Table::<PartSchema>::new(Arc::clone(&self.adapter));
        for part_id in 1..=p.num_parts {
            if self.is_local(part_id) {
                let name = random_name(&mut self.rng, 10);
                parts.insert(&[
                    Scalar::Int32(part_id as i32),
                    Scalar::Int64(i64::from(1000 + part_id % 100)),
                    Scalar::fixed_text(&name, 10),
                ]);
            }
        }

        let suppliers = Table::<SupplierSchema>::new(Arc::clone(&self.adapter));
        for supplier_id in 1..=p.num_suppliers {
            if self.is_local(supplier_id) {
                let name = random_name(&mut self.rng, 10);
                suppliers.insert(&[
                    Scalar::Int32(supplier_id as i32),
                    Scalar::fixed_text(&name, 10),
                ]);
            }
        }

        self.load_product_parts();
        self.load_supplier_parts();
    }

    fn load_product_parts(&mut self) {
        let p = self.params;
        let product_parts = Table::<ProductPartsSchema>::new(Arc::clone(&self.adapter));
        let mut local_count: u32 = 0;
        for product_id in 1..=p.num_products {
            if !self.is_local(product_id) {
                continue;
            }
            let product_region = self.region_of(product_id);
            let category = (local_count / p.num_regions) % 4;
            let mut chosen = Vec::with_capacity(PARTS_PER_PRODUCT);
            for slot in 1..=PARTS_PER_PRODUCT as i32 {
                let (region, partition) = match category {
                    // Category I: same region, same partition.
                    0 => (product_region, p.local_partition),
                    // Category II: same region, other partitions allowed.
                    1 => (product_region, self.choose_partition()),
                    // Category III: other regions allowed, same partition.
                    2 => (self.choose_region(product_region), p.local_partition),
                    // Category IV: other regions and partitions allowed.
                    _ => {
                        let partition = self.choose_partition();
                        (self.choose_region(product_region), partition)
                    }
                };
                let part_id = self.choose_random_part(region, partition);
                debug_assert!(part_id >= 1 && part_id <= p.num_parts);
                chosen.push(part_id);
                product_parts.insert(&[
                    Scalar::Int32(product_id as i32),
                    Scalar::Int32(slot),
                    Scalar::Int32(part_id as i32),
                ]);
            }
            debug!(product_id, category, parts = ?chosen, "product parts loaded");
            local_count += 1;
        }
    }

    fn load_supplier_parts(&mut self) {
        let p = self.params;
        let supplier_parts = Table::<SupplierPartsSchema>::new(Arc::clone(&self.adapter));
        let mut part_ids: Vec<u32> = (1..=p.num_parts).collect();
        for supplier_id in 1..=p.num_suppliers {
            if !self.is_local(supplier_id) {
                continue;
            }
            part_ids.shuffle(&mut self.rng);
            for slot in 1..=PARTS_PER_SUPPLIER as i32 {
                supplier_parts.insert(&[
                    Scalar::Int32(supplier_id as i32),
                    Scalar::Int32(slot),
                    Scalar::Int32(part_ids[slot as usize] as i32),
                ]);
            }
        }
    }
}
