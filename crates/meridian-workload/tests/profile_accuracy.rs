//! Profile accuracy: a transaction not flagged multi-home must carry keys
//! with one home; not flagged multi-partition, keys on one partition.

use std::collections::HashSet;
use std::sync::Arc;

use meridian_common::config::{Configuration, Partitioning};
use meridian_common::Key;
use meridian_exec::adapter::StorageAdapter;
use meridian_exec::metadata::MetadataInitializer;
use meridian_exec::smallbank::SmallBankExecutor;
use meridian_exec::storage::{LoadAdapter, MemoryStorage};
use meridian_exec::Sharder;
use meridian_proto::Transaction;
use meridian_workload::{
    DependencyType, DshWorkload, MovieWorkload, SmallBankWorkload, TransactionProfile, Workload,
};

fn distinct_homes(txn: &Transaction) -> usize {
    txn.keys
        .iter()
        .map(|entry| entry.home)
        .collect::<HashSet<_>>()
        .len()
}

fn distinct_partitions(txn: &Transaction, sharder: &Sharder) -> usize {
    txn.keys
        .iter()
        .map(|entry| sharder.compute_partition(&Key::from_raw(entry.key.clone())))
        .collect::<HashSet<_>>()
        .len()
}

fn check_single_placement(txn: &Transaction, profile: &TransactionProfile, sharder: &Sharder) {
    if txn.keys.is_empty() {
        return;
    }
    if !profile.is_multi_home {
        assert_eq!(distinct_homes(txn), 1, "keys span homes: {txn:?}");
    }
    if !profile.is_multi_partition {
        assert_eq!(
            distinct_partitions(txn, sharder),
            1,
            "keys span partitions: {txn:?}"
        );
    }
}

#[test]
fn test_dsh_single_home_single_partition() {
    let config = Configuration::for_testing(
        2,
        2,
        Partitioning::Dsh {
            num_users: 40,
            num_hotels: 40,
            max_coord: 10.0,
        },
    );
    let sharder = Sharder::from_config(&config);
    let mut workload = DshWorkload::new(&config, 0, 0, "mh=0.0,mp=0.0", 9).unwrap();

    for _ in 0..100 {
        let (txn, profile) = workload.next_transaction();
        assert!(!profile.is_multi_home);
        assert!(!profile.is_multi_partition);
        check_single_placement(&txn, &profile, &sharder);
    }
}

#[test]
fn test_dsh_multi_home_spreads_homes() {
    let config = Configuration::for_testing(
        1,
        2,
        Partitioning::Dsh {
            num_users: 40,
            num_hotels: 40,
            max_coord: 10.0,
        },
    );
    let mut workload = DshWorkload::new(&config, 0, 0, "mh=1.0,mp=0.0,mix=1:0:0:0", 9).unwrap();

    let mut saw_multiple_homes = false;
    for _ in 0..50 {
        let (txn, profile) = workload.next_transaction();
        assert!(profile.is_multi_home);
        saw_multiple_homes |= distinct_homes(&txn) > 1;
    }
    assert!(saw_multiple_homes);
}

#[test]
fn test_movie_single_placement() {
    let config = Configuration::for_testing(2, 2, Partitioning::Movie);
    let sharder = Sharder::from_config(&config);
    let mut workload = MovieWorkload::new(&config, 0, 0, "mh=0,mp=0", 9).unwrap();

    for _ in 0..100 {
        let (txn, profile) = workload.next_transaction();
        check_single_placement(&txn, &profile, &sharder);
    }
}

#[test]
fn test_smallbank_single_placement_across_phases() {
    let config = Configuration::for_testing(2, 2, Partitioning::Smallbank { clients: 200 });
    let sharder = Sharder::from_config(&config);

    // Full database view for executing first phases.
    let storage = Arc::new(MemoryStorage::new());
    for partition in 0..config.num_partitions {
        let view = config.clone().at_partition(partition);
        let adapter: Arc<dyn StorageAdapter> = Arc::new(LoadAdapter::new(
            Arc::clone(&storage),
            MetadataInitializer::from_config(&view),
        ));
        meridian_exec::smallbank::load_tables(
            &adapter,
            &meridian_exec::smallbank::SmallBankLoadParams {
                num_clients: 200,
                num_regions: config.num_regions,
                num_partitions: config.num_partitions,
                local_partition: partition,
                num_threads: 1,
                seed: 2,
            },
        );
    }
    let executor = SmallBankExecutor::new(Arc::new(sharder.clone()), Arc::clone(&storage));

    // Amalgamate aside (its placement is split across two lookups), every
    // operation generated with mh=0, mp=0 stays on one home and
    // partition in both phases.
    let mut workload =
        SmallBankWorkload::new(&config, 0, 0, "mh=0,mp=0,mix=40:25:15:0:20", 9).unwrap();
    for _ in 0..120 {
        let (txn, profile) = workload.next_transaction();
        check_single_placement(&txn, &profile, &sharder);
        if profile.dependency_type == DependencyType::FirstPhase {
            let mut executed = txn;
            executor.execute(&mut executed);
            workload.on_result(&executed, &profile);
        }
    }
}
