//! End-to-end SmallBank tests.

use std::sync::Arc;

use meridian_common::config::{Configuration, Partitioning};
use meridian_common::hash::murmur_hash_3;
use meridian_exec::adapter::{KeyGenAdapter, StorageAdapter};
use meridian_exec::metadata::MetadataInitializer;
use meridian_exec::scalar::Scalar;
use meridian_exec::sharder::Sharder;
use meridian_exec::smallbank::{
    self, account_name, load_tables, SmallBankExecutor, SmallBankLoadParams, ACCOUNT_NAME_WIDTH,
};
use meridian_exec::storage::{LoadAdapter, MemoryStorage};
use meridian_exec::table::Table;
use meridian_exec::txn::TransactionBody;
use meridian_proto::{Transaction, TransactionStatus};

use meridian_exec::smallbank::schema::{
    AccountsSchema, CheckingColumn, CheckingSchema, SavingsColumn, SavingsSchema,
};

fn config() -> Configuration {
    Configuration::for_testing(1, 1, Partitioning::Smallbank { clients: 100 })
}

/// Installs an account with fixed balances.
fn install_account(adapter: &Arc<dyn StorageAdapter>, id: i32, checking: i32, savings: i32) {
    let accounts = Table::<AccountsSchema>::new(Arc::clone(adapter));
    let checking_table = Table::<CheckingSchema>::new(Arc::clone(adapter));
    let savings_table = Table::<SavingsSchema>::new(Arc::clone(adapter));
    accounts.insert(&[
        Scalar::fixed_text(&account_name(id as u32), ACCOUNT_NAME_WIDTH),
        Scalar::Int32(id),
    ]);
    checking_table.insert(&[Scalar::Int32(id), Scalar::Int32(checking)]);
    savings_table.insert(&[Scalar::Int32(id), Scalar::Int32(savings)]);
}

struct Fixture {
    config: Configuration,
    storage: Arc<MemoryStorage>,
    load_adapter: Arc<dyn StorageAdapter>,
}

impl Fixture {
    fn new() -> Self {
        let config = config();
        let storage = Arc::new(MemoryStorage::new());
        let load_adapter: Arc<dyn StorageAdapter> = Arc::new(LoadAdapter::new(
            Arc::clone(&storage),
            MetadataInitializer::from_config(&config),
        ));
        Self {
            config,
            storage,
            load_adapter,
        }
    }

    fn executor(&self) -> SmallBankExecutor {
        SmallBankExecutor::new(
            Arc::new(Sharder::from_config(&self.config)),
            Arc::clone(&self.storage),
        )
    }

    fn keygen<F>(&self, args: Vec<String>, run: F) -> Transaction
    where
        F: FnOnce(&Arc<dyn StorageAdapter>),
    {
        let adapter = Arc::new(KeyGenAdapter::new());
        let dyn_adapter: Arc<dyn StorageAdapter> = adapter.clone();
        run(&dyn_adapter);
        let mut txn = Transaction::default();
        adapter.finalize(&mut txn, &MetadataInitializer::from_config(&self.config));
        txn.add_procedure(args);
        txn
    }

    fn checking_balance(&self, id: i32) -> i32 {
        Table::<CheckingSchema>::new(Arc::clone(&self.load_adapter))
            .select_columns(&[Scalar::Int32(id)], &[CheckingColumn::Balance])[0]
            .as_i32()
    }

    fn savings_balance(&self, id: i32) -> i32 {
        Table::<SavingsSchema>::new(Arc::clone(&self.load_adapter))
            .select_columns(&[Scalar::Int32(id)], &[SavingsColumn::Balance])[0]
            .as_i32()
    }
}

#[test]
fn test_balance_two_phase_scenario() {
    let fixture = Fixture::new();
    install_account(&fixture.load_adapter, 17, 500, 300);
    let executor = fixture.executor();
    let name = account_name(17);

    // Phase 1: resolve the customer id by name.
    let mut phase1 = fixture.keygen(
        vec!["getCustomerIdByName".into(), name.clone()],
        |adapter| {
            smallbank::GetCustomerIdByName::new(adapter, &name).read();
        },
    );
    executor.execute(&mut phase1);
    assert_eq!(phase1.status(), TransactionStatus::Committed);

    // The generator decodes the id from the first value cell.
    let id = i32::from_le_bytes(phase1.keys[0].value()[..4].try_into().unwrap());
    assert_eq!(id, 17);

    // Phase 2: read both balances.
    let name2 = account_name(id as u32);
    let mut phase2 = fixture.keygen(
        vec!["balance".into(), name2.clone(), id.to_string()],
        |adapter| {
            let mut body = smallbank::Balance::new(adapter, &name2, id);
            body.read();
            body.write();
        },
    );
    executor.execute(&mut phase2);
    assert_eq!(phase2.status(), TransactionStatus::Committed);

    // Verify the two balance reads through a plain body run.
    let mut body = smallbank::Balance::new(&fixture.load_adapter, &name2, id);
    assert!(body.execute());
    assert_eq!(body.total_balance(), 800);
}

#[test]
fn test_deposit_checking_adds_amount() {
    let fixture = Fixture::new();
    install_account(&fixture.load_adapter, 3, 1000, 0);
    let name = account_name(3);

    let mut txn = fixture.keygen(
        vec![
            "depositChecking".into(),
            name.clone(),
            "3".into(),
            "250".into(),
        ],
        |adapter| {
            let mut body = smallbank::DepositChecking::new(adapter, &name, 3, 250);
            body.read();
            body.write();
        },
    );
    fixture.executor().execute(&mut txn);
    assert_eq!(txn.status(), TransactionStatus::Committed);
    assert_eq!(fixture.checking_balance(3), 1250);
}

#[test]
fn test_writecheck_penalty_branches() {
    let fixture = Fixture::new();
    install_account(&fixture.load_adapter, 4, 100, 50);
    let name = account_name(4);
    let executor = fixture.executor();

    // Covered: 120 <= 150, plain deduction.
    let mut covered = fixture.keygen(
        vec!["writecheck".into(), name.clone(), "4".into(), "120".into()],
        |adapter| {
            let mut body = smallbank::Writecheck::new(adapter, &name, 4, 120);
            body.read();
            body.write();
        },
    );
    executor.execute(&mut covered);
    assert_eq!(covered.status(), TransactionStatus::Committed);
    assert_eq!(fixture.checking_balance(4), -20);

    // Uncovered: remaining funds -20 + 50 < 200, one-unit penalty.
    let mut overdraft = fixture.keygen(
        vec!["writecheck".into(), name.clone(), "4".into(), "200".into()],
        |adapter| {
            let mut body = smallbank::Writecheck::new(adapter, &name, 4, 200);
            body.read();
            body.write();
        },
    );
    executor.execute(&mut overdraft);
    assert_eq!(overdraft.status(), TransactionStatus::Committed);
    assert_eq!(fixture.checking_balance(4), -20 - 201);
}

#[test]
fn test_amalgamate_moves_funds_including_destination_savings() {
    let fixture = Fixture::new();
    install_account(&fixture.load_adapter, 1, 100, 50);
    install_account(&fixture.load_adapter, 2, 1000, 7);
    let src = account_name(1);
    let dst = account_name(2);

    let mut txn = fixture.keygen(
        vec![
            "amalgamate".into(),
            src.clone(),
            dst.clone(),
            "1".into(),
            "2".into(),
        ],
        |adapter| {
            let mut body = smallbank::Amalgamate::new(adapter, &src, &dst, 1, 2);
            body.read();
            body.write();
        },
    );
    fixture.executor().execute(&mut txn);
    assert_eq!(txn.status(), TransactionStatus::Committed);

    // The source is zeroed. The destination's checking is rebuilt from
    // the source's balances plus the destination's own savings; its
    // previous checking balance does not participate.
    assert_eq!(fixture.checking_balance(1), 0);
    assert_eq!(fixture.savings_balance(1), 0);
    assert_eq!(fixture.checking_balance(2), 100 + 50 + 7);
    assert_eq!(fixture.savings_balance(2), 7);
}

#[test]
fn test_missing_account_aborts_with_reason() {
    let fixture = Fixture::new();
    let name = account_name(9);
    let mut txn = fixture.keygen(
        vec!["getCustomerIdByName".into(), name.clone()],
        |adapter| {
            smallbank::GetCustomerIdByName::new(adapter, &name).read();
        },
    );
    fixture.executor().execute(&mut txn);
    assert_eq!(txn.status(), TransactionStatus::Aborted);
    assert!(txn
        .abort_reason
        .contains("There is no account associated with this name"));
}

#[test]
fn test_loader_thread_count_does_not_change_state() {
    let load = |threads: u32| {
        let config = config();
        let storage = Arc::new(MemoryStorage::new());
        let adapter: Arc<dyn StorageAdapter> = Arc::new(LoadAdapter::new(
            Arc::clone(&storage),
            MetadataInitializer::from_config(&config),
        ));
        load_tables(
            &adapter,
            &SmallBankLoadParams {
                num_clients: 100,
                num_regions: 1,
                num_partitions: 1,
                local_partition: 0,
                num_threads: threads,
                seed: 11,
            },
        );
        storage
    };

    let single = load(1);
    let multi = load(3);
    assert_eq!(single.len(), multi.len());
    for (key, record) in single.snapshot() {
        let other = multi.get_record(&key).expect("missing key");
        assert_eq!(other.value, record.value, "value mismatch for {key:?}");
        assert_eq!(other.home, record.home);
    }
}

#[test]
fn test_loader_placement_consistency() {
    let num_partitions = 2;
    let num_regions = 3;
    for partition in 0..num_partitions {
        let config = Configuration::for_testing(
            num_partitions,
            num_regions,
            Partitioning::Smallbank { clients: 60 },
        )
        .at_partition(partition);
        let sharder = Sharder::from_config(&config);
        let initializer = MetadataInitializer::from_config(&config);
        let storage = Arc::new(MemoryStorage::new());
        let adapter: Arc<dyn StorageAdapter> = Arc::new(LoadAdapter::new(
            Arc::clone(&storage),
            initializer.clone(),
        ));
        load_tables(
            &adapter,
            &SmallBankLoadParams {
                num_clients: 60,
                num_regions,
                num_partitions,
                local_partition: partition,
                num_threads: 2,
                seed: 5,
            },
        );

        for key in storage.keys() {
            assert_eq!(sharder.compute_partition(&key), partition);
            if key.len() == ACCOUNT_NAME_WIDTH + 2 {
                // Account keys place by the murmur hash of the name.
                let hash = murmur_hash_3(&key[..ACCOUNT_NAME_WIDTH]);
                assert_eq!(storage.home(&key), Some((hash / num_partitions) % num_regions));
            } else {
                let id = key.read_i32_le().unwrap() as u32;
                assert_eq!(storage.home(&key), Some((id / num_partitions) % num_regions));
            }
        }
    }
}
