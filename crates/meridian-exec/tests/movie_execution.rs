//! End-to-end movie tests.

use std::sync::Arc;

use meridian_common::config::{Configuration, Partitioning};
use meridian_exec::adapter::{KeyGenAdapter, StorageAdapter};
use meridian_exec::metadata::MetadataInitializer;
use meridian_exec::movie::{
    self, load_tables, title_for, username_for, MovieExecutor, NUM_USERS,
};
use meridian_exec::scalar::Scalar;
use meridian_exec::sharder::Sharder;
use meridian_exec::storage::{LoadAdapter, MemoryStorage};
use meridian_exec::table::Table;
use meridian_exec::txn::TransactionBody;
use meridian_proto::{Transaction, TransactionStatus};

use meridian_exec::movie::schema::{ReviewColumn, ReviewSchema, UserColumn, UserSchema};

fn fixture() -> (Configuration, Arc<MemoryStorage>, Arc<dyn StorageAdapter>) {
    let config = Configuration::for_testing(1, 1, Partitioning::Movie);
    let storage = Arc::new(MemoryStorage::new());
    let load_adapter: Arc<dyn StorageAdapter> = Arc::new(LoadAdapter::new(
        Arc::clone(&storage),
        MetadataInitializer::from_config(&config),
    ));
    load_tables(&load_adapter);
    (config, storage, load_adapter)
}

fn new_review_txn(config: &Configuration, user_id: i64, title_index: i64, review_id: i64) -> Transaction {
    let username = username_for(user_id);
    let title = title_for(title_index);
    let text = "x".repeat(256);

    let adapter = Arc::new(KeyGenAdapter::new());
    let dyn_adapter: Arc<dyn StorageAdapter> = adapter.clone();
    let mut body = movie::NewReview::new(
        &dyn_adapter,
        review_id,
        8,
        &username,
        &title,
        review_id,
        review_id,
        &text,
    );
    body.read();
    body.write();

    let mut txn = Transaction::default();
    adapter.finalize(&mut txn, &MetadataInitializer::from_config(config));
    txn.add_procedure(vec![
        "new_review".to_string(),
        review_id.to_string(),
        "8".to_string(),
        username,
        title,
        review_id.to_string(),
        review_id.to_string(),
        text,
    ]);
    txn
}

#[test]
fn test_new_review_commits_and_updates_user() {
    let (config, storage, load_adapter) = fixture();
    let executor = MovieExecutor::new(
        Arc::new(Sharder::from_config(&config)),
        Arc::clone(&storage),
    );

    let mut txn = new_review_txn(&config, 5, 3, 777);
    executor.execute(&mut txn);
    assert_eq!(
        txn.status(),
        TransactionStatus::Committed,
        "reason: {}",
        txn.abort_reason
    );

    let users = Table::<UserSchema>::new(Arc::clone(&load_adapter));
    let row = users.select_columns(
        &[Scalar::fixed_text(&username_for(5), 21)],
        &[UserColumn::Reviews],
    );
    assert_eq!(row[0].as_i64(), 1);

    let reviews = Table::<ReviewSchema>::new(Arc::clone(&load_adapter));
    let review = reviews.select_columns(
        &[Scalar::Int64(777)],
        &[ReviewColumn::Rating, ReviewColumn::UserId],
    );
    assert_eq!(review[0].as_i32(), 8);
    assert_eq!(review[1].as_i64(), 5);
}

#[test]
fn test_new_review_for_unknown_movie_aborts() {
    let (config, storage, _) = fixture();
    let executor = MovieExecutor::new(
        Arc::new(Sharder::from_config(&config)),
        Arc::clone(&storage),
    );

    let username = username_for(5);
    let bogus_title = format!("{:<100}", "999999999999_No Such Movie");
    let text = "x".repeat(256);
    let adapter = Arc::new(KeyGenAdapter::new());
    let dyn_adapter: Arc<dyn StorageAdapter> = adapter.clone();
    let mut body =
        movie::NewReview::new(&dyn_adapter, 1, 5, &username, &bogus_title, 1, 1, &text);
    body.read();
    body.write();
    let mut txn = Transaction::default();
    adapter.finalize(&mut txn, &MetadataInitializer::from_config(&config));
    txn.add_procedure(vec![
        "new_review".to_string(),
        "1".to_string(),
        "5".to_string(),
        username,
        bogus_title,
        "1".to_string(),
        "1".to_string(),
        text,
    ]);

    executor.execute(&mut txn);
    assert_eq!(txn.status(), TransactionStatus::Aborted);
    assert!(txn.abort_reason.contains("Movie does not exist"));
}

#[test]
fn test_loader_covers_full_id_spaces() {
    let (_, storage, load_adapter) = fixture();
    assert!(!storage.is_empty());

    let users = Table::<UserSchema>::new(Arc::clone(&load_adapter));
    for id in [1, i64::from(NUM_USERS)] {
        let row = users.select_columns(
            &[Scalar::fixed_text(&username_for(id), 21)],
            &[UserColumn::UserId],
        );
        assert_eq!(row[0].as_i64(), id);
    }
}
