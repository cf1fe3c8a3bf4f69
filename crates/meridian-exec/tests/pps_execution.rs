//! End-to-end PPS tests: load, discover key sets, execute, apply writes.

use std::sync::Arc;

use meridian_common::config::{Configuration, Partitioning};
use meridian_exec::adapter::{KeyGenAdapter, StorageAdapter};
use meridian_exec::metadata::MetadataInitializer;
use meridian_exec::pps::{
    self, load_tables, PpsExecutor, PpsLoadParams, PARTS_PER_PRODUCT,
};
use meridian_exec::scalar::Scalar;
use meridian_exec::sharder::Sharder;
use meridian_exec::storage::{LoadAdapter, MemoryStorage};
use meridian_exec::table::Table;
use meridian_exec::txn::TransactionBody;
use meridian_proto::{Transaction, TransactionStatus};

fn config(num_partitions: u32, num_regions: u32) -> Configuration {
    Configuration::for_testing(
        num_partitions,
        num_regions,
        Partitioning::Pps {
            products: 96,
            parts: 96,
            suppliers: 12,
        },
    )
}

fn loaded_single_partition() -> (Configuration, Arc<MemoryStorage>, Arc<dyn StorageAdapter>) {
    let config = config(1, 1);
    let storage = Arc::new(MemoryStorage::new());
    let load_adapter: Arc<dyn StorageAdapter> = Arc::new(LoadAdapter::new(
        Arc::clone(&storage),
        MetadataInitializer::from_config(&config),
    ));
    load_tables(
        &load_adapter,
        &PpsLoadParams {
            num_products: 96,
            num_parts: 96,
            num_suppliers: 12,
            num_regions: 1,
            num_partitions: 1,
            local_partition: 0,
            max_regions: 1,
            max_partitions: 1,
            seed: 0,
        },
    );
    (config, storage, load_adapter)
}

fn executor(config: &Configuration, storage: &Arc<MemoryStorage>) -> PpsExecutor {
    PpsExecutor::new(
        Arc::new(Sharder::from_config(config)),
        Arc::clone(storage),
    )
}

/// Key-generation pass for one body plus the matching procedure args.
fn keygen<F>(config: &Configuration, args: Vec<String>, run: F) -> Transaction
where
    F: FnOnce(&Arc<dyn StorageAdapter>),
{
    let adapter = Arc::new(KeyGenAdapter::new());
    let dyn_adapter: Arc<dyn StorageAdapter> = adapter.clone();
    run(&dyn_adapter);
    let mut txn = Transaction::default();
    adapter.finalize(&mut txn, &MetadataInitializer::from_config(config));
    txn.add_procedure(args);
    txn
}

#[test]
fn test_get_product_on_nonexistent_id_aborts() {
    let (config, storage, _) = loaded_single_partition();
    let mut txn = keygen(
        &config,
        vec!["get_product".into(), "999999".into()],
        |adapter| {
            pps::GetProduct::new(adapter, 999_999).read();
        },
    );

    executor(&config, &storage).execute(&mut txn);
    assert_eq!(txn.status(), TransactionStatus::Aborted);
    assert!(
        txn.abort_reason
            .contains("The product with id 999999 does not exist"),
        "unexpected reason: {}",
        txn.abort_reason
    );
}

#[test]
fn test_get_product_commits_and_returns_name() {
    let (config, storage, _) = loaded_single_partition();
    let mut txn = keygen(&config, vec!["get_product".into(), "1".into()], |adapter| {
        pps::GetProduct::new(adapter, 1).read();
    });

    executor(&config, &storage).execute(&mut txn);
    assert_eq!(txn.status(), TransactionStatus::Committed);
    // The read value cell carries the 10-byte product name.
    assert_eq!(txn.keys[0].value().len(), 10);
}

#[test]
fn test_order_parts_decrements_amounts() {
    let (config, storage, load_adapter) = loaded_single_partition();
    let parts = Table::<pps::schema::PartSchema>::new(Arc::clone(&load_adapter));
    let before: Vec<i64> = [1, 2, 3]
        .iter()
        .map(|&id| {
            parts.select_columns(&[Scalar::Int32(id)], &[pps::schema::PartColumn::Amount])[0]
                .as_i64()
        })
        .collect();

    let mut txn = keygen(
        &config,
        vec!["order_parts".into(), "1".into(), "2".into(), "3".into()],
        |adapter| {
            let mut body = pps::OrderParts::new(adapter, vec![1, 2, 3]);
            body.read();
            body.write();
        },
    );
    executor(&config, &storage).execute(&mut txn);
    assert_eq!(txn.status(), TransactionStatus::Committed);

    for (i, &id) in [1, 2, 3].iter().enumerate() {
        let after = parts.select_columns(&[Scalar::Int32(id)], &[pps::schema::PartColumn::Amount])
            [0]
        .as_i64();
        assert_eq!(after, before[i] - 1);
    }
}

#[test]
fn test_update_product_part_swaps_first_and_last_slot() {
    let (config, storage, load_adapter) = loaded_single_partition();
    let product_parts = Table::<pps::schema::ProductPartsSchema>::new(Arc::clone(&load_adapter));
    let slot_part = |slot: i32| {
        product_parts.select_columns(
            &[Scalar::Int32(1), Scalar::Int32(slot)],
            &[pps::schema::ProductPartsColumn::PartId],
        )[0]
            .as_i32()
    };
    let first_before = slot_part(1);
    let last_before = slot_part(PARTS_PER_PRODUCT as i32);

    let mut txn = keygen(
        &config,
        vec!["update_product_part".into(), "1".into()],
        |adapter| {
            let mut body = pps::UpdateProductPart::new(adapter, 1);
            body.read();
            body.write();
        },
    );
    executor(&config, &storage).execute(&mut txn);
    assert_eq!(txn.status(), TransactionStatus::Committed);

    assert_eq!(slot_part(1), last_before);
    assert_eq!(slot_part(PARTS_PER_PRODUCT as i32), first_before);
}

#[test]
fn test_order_product_dependent_phases() {
    let (config, storage, _) = loaded_single_partition();
    let executor = executor(&config, &storage);

    // Phase 1: discover the product's slot-to-part mapping.
    let mut phase1 = keygen(
        &config,
        vec!["get_parts_by_product".into(), "1".into()],
        |adapter| {
            pps::GetPartsByProduct::new(adapter, 1).read();
        },
    );
    executor.execute(&mut phase1);
    assert_eq!(phase1.status(), TransactionStatus::Committed);
    assert_eq!(phase1.keys.len(), PARTS_PER_PRODUCT);

    // Decode part ids the way the generator does: slot from the key,
    // part id from the value cell.
    let mut parts = vec![0i32; PARTS_PER_PRODUCT];
    for entry in &phase1.keys {
        let slot = i32::from_le_bytes(entry.key[4..8].try_into().unwrap());
        let part_id = i32::from_le_bytes(entry.value()[..4].try_into().unwrap());
        assert!((1..=PARTS_PER_PRODUCT as i32).contains(&slot));
        parts[slot as usize - 1] = part_id;
    }

    // Phase 2: order the product with the decoded parts.
    let mut args = vec!["order_product".to_string(), "1".to_string()];
    args.extend(parts.iter().map(ToString::to_string));
    let mut phase2 = keygen(&config, args, |adapter| {
        let mut body = pps::OrderProduct::new(adapter, 1, parts.clone());
        body.read();
        body.write();
    });
    executor.execute(&mut phase2);
    assert_eq!(
        phase2.status(),
        TransactionStatus::Committed,
        "reason: {}",
        phase2.abort_reason
    );
}

#[test]
fn test_order_product_with_wrong_parts_aborts() {
    let (config, storage, _) = loaded_single_partition();
    let wrong_parts: Vec<i32> = (90..90 + PARTS_PER_PRODUCT as i32).collect();
    let mut args = vec!["order_product".to_string(), "1".to_string()];
    args.extend(wrong_parts.iter().map(ToString::to_string));
    let mut txn = keygen(&config, args, |adapter| {
        let mut body = pps::OrderProduct::new(adapter, 1, wrong_parts.clone());
        body.read();
        body.write();
    });

    executor(&config, &storage).execute(&mut txn);
    assert_eq!(txn.status(), TransactionStatus::Aborted);
    assert!(txn
        .abort_reason
        .contains("The part doesn't correspond to the product"));
}

#[test]
fn test_loader_placement_consistency() {
    // Two partitions, two regions: every key a partition's loader emits
    // must shard back to that partition, and the stored home must follow
    // the one-based id rule.
    let num_partitions = 2;
    let num_regions = 2;
    for partition in 0..num_partitions {
        let config = config(num_partitions, num_regions).at_partition(partition);
        let sharder = Sharder::from_config(&config);
        let initializer = MetadataInitializer::from_config(&config);
        let storage = Arc::new(MemoryStorage::new());
        let load_adapter: Arc<dyn StorageAdapter> = Arc::new(LoadAdapter::new(
            Arc::clone(&storage),
            initializer.clone(),
        ));
        load_tables(
            &load_adapter,
            &PpsLoadParams {
                num_products: 96,
                num_parts: 96,
                num_suppliers: 12,
                num_regions,
                num_partitions,
                local_partition: partition,
                max_regions: num_regions,
                max_partitions: num_partitions,
                seed: 7,
            },
        );
        assert!(!storage.is_empty());

        for key in storage.keys() {
            assert_eq!(
                sharder.compute_partition(&key),
                partition,
                "misplaced key {key:?}"
            );
            let id = key.read_i32_le().unwrap();
            let expected_home =
                ((id - 1) as u32 / num_partitions) % num_regions;
            assert_eq!(storage.home(&key), Some(expected_home));
            assert_eq!(initializer.compute_home(&key), expected_home);
        }
    }
}

#[test]
fn test_invalid_code_aborts() {
    let (config, storage, _) = loaded_single_partition();
    let executor = executor(&config, &storage);

    let mut empty = Transaction::default();
    executor.execute(&mut empty);
    assert_eq!(empty.status(), TransactionStatus::Aborted);
    assert_eq!(empty.abort_reason, "Invalid code");

    let mut unknown = Transaction::default();
    unknown.add_procedure(vec!["no_such_procedure".into()]);
    executor.execute(&mut unknown);
    assert_eq!(unknown.status(), TransactionStatus::Aborted);
    assert_eq!(unknown.abort_reason, "Unknown procedure name");
}
