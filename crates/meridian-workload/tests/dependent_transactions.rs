//! Dependent-transaction state machines: NONE -> FIRST_PHASE ->
//! SECOND_PHASE -> NONE, with results fed back between calls.

use std::sync::Arc;

use meridian_common::config::{Configuration, Partitioning};
use meridian_exec::adapter::StorageAdapter;
use meridian_exec::metadata::MetadataInitializer;
use meridian_exec::pps::{PpsExecutor, PpsLoadParams, PARTS_PER_PRODUCT};
use meridian_exec::smallbank::{SmallBankExecutor, SmallBankLoadParams};
use meridian_exec::storage::{LoadAdapter, MemoryStorage};
use meridian_exec::Sharder;
use meridian_workload::{
    DependencyType, PpsWorkload, SmallBankWorkload, TransactionType, Workload,
};

fn pps_fixture() -> (Configuration, Arc<MemoryStorage>) {
    let config = Configuration::for_testing(
        1,
        1,
        Partitioning::Pps {
            products: 96,
            parts: 96,
            suppliers: 12,
        },
    );
    let storage = Arc::new(MemoryStorage::new());
    let adapter: Arc<dyn StorageAdapter> = Arc::new(LoadAdapter::new(
        Arc::clone(&storage),
        MetadataInitializer::from_config(&config),
    ));
    meridian_exec::pps::load_tables(
        &adapter,
        &PpsLoadParams {
            num_products: 96,
            num_parts: 96,
            num_suppliers: 12,
            num_regions: 1,
            num_partitions: 1,
            local_partition: 0,
            max_regions: 1,
            max_partitions: 1,
            seed: 4,
        },
    );
    (config, storage)
}

#[test]
fn test_pps_order_product_two_phases() {
    let (config, storage) = pps_fixture();
    let executor = PpsExecutor::new(
        Arc::new(Sharder::from_config(&config)),
        Arc::clone(&storage),
    );
    // Mix pinned to the dependent transaction.
    let mut workload = PpsWorkload::new(&config, 0, 0, "mix=1:0:0:0:0", 17).unwrap();

    for _ in 0..10 {
        let (txn, profile) = workload.next_transaction();
        assert_eq!(profile.dependency_type, DependencyType::FirstPhase);
        assert_eq!(profile.transaction_type, TransactionType::OrderProduct);
        assert_eq!(txn.procedures()[0].args[0], "get_parts_by_product");
        assert_eq!(txn.keys.len(), PARTS_PER_PRODUCT);

        let mut executed = txn;
        executor.execute(&mut executed);
        workload.on_result(&executed, &profile);

        let (second, second_profile) = workload.next_transaction();
        assert_eq!(second_profile.dependency_type, DependencyType::SecondPhase);
        let args = &second.procedures()[0].args;
        assert_eq!(args[0], "order_product");
        // Same product as the first phase.
        assert_eq!(args[1], executed.procedures()[0].args[1]);
        // The slot-ordered part ids decoded from the first phase.
        assert_eq!(args.len(), 2 + PARTS_PER_PRODUCT);

        // And the second phase executes cleanly against the database.
        let mut executed_second = second;
        executor.execute(&mut executed_second);
        assert_eq!(
            executed_second.status(),
            meridian_proto::TransactionStatus::Committed,
            "reason: {}",
            executed_second.abort_reason
        );
    }
}

#[test]
fn test_smallbank_two_phase_ops_and_three_phase_amalgamate() {
    let config = Configuration::for_testing(1, 1, Partitioning::Smallbank { clients: 100 });
    let storage = Arc::new(MemoryStorage::new());
    let adapter: Arc<dyn StorageAdapter> = Arc::new(LoadAdapter::new(
        Arc::clone(&storage),
        MetadataInitializer::from_config(&config),
    ));
    meridian_exec::smallbank::load_tables(
        &adapter,
        &SmallBankLoadParams {
            num_clients: 100,
            num_regions: 1,
            num_partitions: 1,
            local_partition: 0,
            num_threads: 1,
            seed: 6,
        },
    );
    let executor = SmallBankExecutor::new(
        Arc::new(Sharder::from_config(&config)),
        Arc::clone(&storage),
    );

    // Balance only: strict two-phase alternation.
    let mut workload = SmallBankWorkload::new(&config, 0, 0, "mix=1:0:0:0:0", 23).unwrap();
    for _ in 0..5 {
        let (phase1, profile1) = workload.next_transaction();
        assert_eq!(profile1.dependency_type, DependencyType::FirstPhase);
        assert_eq!(profile1.transaction_type, TransactionType::Balance);
        assert_eq!(phase1.procedures()[0].args[0], "getCustomerIdByName");

        let mut executed = phase1;
        executor.execute(&mut executed);
        assert_eq!(
            executed.status(),
            meridian_proto::TransactionStatus::Committed
        );
        workload.on_result(&executed, &profile1);

        let (phase2, profile2) = workload.next_transaction();
        assert_eq!(profile2.dependency_type, DependencyType::SecondPhase);
        let args = &phase2.procedures()[0].args;
        assert_eq!(args[0], "balance");
        // The id in the args is the one the lookup returned.
        let returned =
            i32::from_le_bytes(executed.keys[0].value()[..4].try_into().unwrap());
        assert_eq!(args[2], returned.to_string());
    }

    // Amalgamate only: two lookups then the merge.
    let mut workload = SmallBankWorkload::new(&config, 0, 0, "mix=0:0:0:1:0", 29).unwrap();
    let (src_lookup, src_profile) = workload.next_transaction();
    assert_eq!(src_profile.dependency_type, DependencyType::FirstPhase);
    assert_eq!(src_profile.transaction_type, TransactionType::Amalgamate);

    let mut executed_src = src_lookup;
    executor.execute(&mut executed_src);
    workload.on_result(&executed_src, &src_profile);

    let (dst_lookup, dst_profile) = workload.next_transaction();
    assert_eq!(dst_profile.dependency_type, DependencyType::FirstPhase);
    assert_eq!(dst_profile.transaction_type, TransactionType::Amalgamate);
    assert_eq!(dst_lookup.procedures()[0].args[0], "getCustomerIdByName");

    let mut executed_dst = dst_lookup;
    executor.execute(&mut executed_dst);
    workload.on_result(&executed_dst, &dst_profile);

    let (merge, merge_profile) = workload.next_transaction();
    assert_eq!(merge_profile.dependency_type, DependencyType::SecondPhase);
    let args = &merge.procedures()[0].args;
    assert_eq!(args[0], "amalgamate");
    assert_eq!(args.len(), 5);

    let src_id = i32::from_le_bytes(executed_src.keys[0].value()[..4].try_into().unwrap());
    let dst_id = i32::from_le_bytes(executed_dst.keys[0].value()[..4].try_into().unwrap());
    assert_eq!(args[3], src_id.to_string());
    assert_eq!(args[4], dst_id.to_string());

    let mut executed_merge = merge;
    executor.execute(&mut executed_merge);
    assert_eq!(
        executed_merge.status(),
        meridian_proto::TransactionStatus::Committed,
        "reason: {}",
        executed_merge.abort_reason
    );

    // The cycle is closed: the next transaction is a fresh first phase.
    let (_, next_profile) = workload.next_transaction();
    assert_eq!(next_profile.dependency_type, DependencyType::FirstPhase);
}
