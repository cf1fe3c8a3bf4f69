//! End-to-end DSH tests.

use std::sync::Arc;

use meridian_common::config::{Configuration, Partitioning};
use meridian_exec::adapter::{KeyGenAdapter, StorageAdapter};
use meridian_exec::dsh::{
    self, format_uname, load_tables, DshExecutor, DshLoadParams, RecommendationType,
};
use meridian_exec::metadata::MetadataInitializer;
use meridian_exec::scalar::Scalar;
use meridian_exec::sharder::Sharder;
use meridian_exec::storage::{LoadAdapter, MemoryStorage};
use meridian_exec::table::Table;
use meridian_exec::txn::TransactionBody;
use meridian_proto::{Transaction, TransactionStatus};

use meridian_exec::dsh::schema::{
    HotelSchema, ReservationCountColumn, ReservationCountSchema, UserSchema,
};

fn config() -> Configuration {
    Configuration::for_testing(
        1,
        1,
        Partitioning::Dsh {
            num_users: 20,
            num_hotels: 10,
            max_coord: 10.0,
        },
    )
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

    /// Installs one hotel with fixed attributes.
    fn install_hotel(&self, id: i32, lat: f64, lon: f64, rating: f64, price: f64, capacity: i32) {
        Table::<HotelSchema>::new(Arc::clone(&self.load_adapter)).insert(&[
            Scalar::Int32(id),
            Scalar::Float64(lat),
            Scalar::Float64(lon),
            Scalar::Float64(rating),
            Scalar::Float64(price),
            Scalar::Int32(capacity),
        ]);
    }

    fn install_user(&self, id: u32) {
        Table::<UserSchema>::new(Arc::clone(&self.load_adapter)).insert(&[
            Scalar::fixed_text(&format_uname(&id.to_string()), 20),
            Scalar::var_text(&id.to_string(), 60),
        ]);
    }

    fn install_count(&self, hotel_id: i32, date: &str, count: i32) {
        Table::<ReservationCountSchema>::new(Arc::clone(&self.load_adapter)).insert(&[
            Scalar::Int32(hotel_id),
            Scalar::fixed_text(date, 10),
            Scalar::Int32(count),
        ]);
    }

    fn count_for(&self, hotel_id: i32, date: &str) -> Option<i32> {
        let counts = Table::<ReservationCountSchema>::new(Arc::clone(&self.load_adapter));
        let row = counts.select_columns(
            &[Scalar::Int32(hotel_id), Scalar::fixed_text(date, 10)],
            &[ReservationCountColumn::Count],
        );
        row.first().map(Scalar::as_i32)
    }

    fn executor(&self) -> DshExecutor {
        DshExecutor::new(
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
}

fn reservation_args(user: &str, in_date: &str, out_date: &str, hotel: i32, rooms: i32) -> Vec<String> {
    vec![
        "reservation".into(),
        user.into(),
        user.into(),
        in_date.into(),
        out_date.into(),
        hotel.to_string(),
        rooms.to_string(),
        user.into(),
    ]
}

#[test]
fn test_reservation_over_capacity_aborts_with_date() {
    let fixture = Fixture::new();
    fixture.install_user(7);
    fixture.install_hotel(1, 0.0, 0.0, 4.0, 100.0, 2);
    fixture.install_count(1, "01-06-2020", 1);

    let mut txn = fixture.keygen(
        reservation_args("7", "01-06-2020", "02-06-2020", 1, 2),
        |adapter| {
            dsh::Reservation::new(adapter, "7", "7", "01-06-2020", "02-06-2020", 1, "7", 2)
                .execute();
        },
    );
    fixture.executor().execute(&mut txn);
    assert_eq!(txn.status(), TransactionStatus::Aborted);
    assert!(
        txn.abort_reason
            .contains("Too many reservations on 01-06-2020"),
        "unexpected reason: {}",
        txn.abort_reason
    );
}

#[test]
fn test_reservation_commits_and_updates_counts() {
    let fixture = Fixture::new();
    fixture.install_user(7);
    fixture.install_hotel(1, 0.0, 0.0, 4.0, 100.0, 5);
    fixture.install_count(1, "01-06-2020", 3);

    // Two-night stay: the first night has a count row, the second does
    // not and must be created at full capacity minus the request.
    let mut txn = fixture.keygen(
        reservation_args("7", "01-06-2020", "03-06-2020", 1, 2),
        |adapter| {
            dsh::Reservation::new(adapter, "7", "7", "01-06-2020", "03-06-2020", 1, "7", 2)
                .execute();
        },
    );
    fixture.executor().execute(&mut txn);
    assert_eq!(
        txn.status(),
        TransactionStatus::Committed,
        "reason: {}",
        txn.abort_reason
    );

    assert_eq!(fixture.count_for(1, "01-06-2020"), Some(1));
    assert_eq!(fixture.count_for(1, "02-06-2020"), Some(3));
    // The checkout day is not part of the stay.
    assert_eq!(fixture.count_for(1, "03-06-2020"), None);
}

#[test]
fn test_reservation_with_unknown_user_aborts() {
    let fixture = Fixture::new();
    fixture.install_hotel(1, 0.0, 0.0, 4.0, 100.0, 5);

    let mut txn = fixture.keygen(
        reservation_args("9", "01-06-2020", "02-06-2020", 1, 1),
        |adapter| {
            dsh::Reservation::new(adapter, "9", "9", "01-06-2020", "02-06-2020", 1, "9", 1)
                .execute();
        },
    );
    fixture.executor().execute(&mut txn);
    assert_eq!(txn.status(), TransactionStatus::Aborted);
    assert!(txn.abort_reason.contains("User not found"));
}

#[test]
fn test_user_login_commits() {
    let fixture = Fixture::new();
    fixture.install_user(3);

    let mut txn = fixture.keygen(
        vec!["user_login".into(), "3".into(), "3".into()],
        |adapter| {
            dsh::UserLogin::new(adapter, "3", "3").execute();
        },
    );
    fixture.executor().execute(&mut txn);
    assert_eq!(txn.status(), TransactionStatus::Committed);
}

#[test]
fn test_search_reads_ranked_hotels() {
    let fixture = Fixture::new();
    for id in 0..4 {
        fixture.install_hotel(id, f64::from(id), 0.0, 3.0, 50.0, 4);
    }

    let ids = ["0", "1", "2", "3"].map(String::from);
    let mut args = vec![
        "search".to_string(),
        "01-06-2020".to_string(),
        "03-06-2020".to_string(),
        "0.5".to_string(),
        "0".to_string(),
    ];
    args.extend(ids);
    let hotel_ids = [0, 1, 2, 3];
    let mut txn = fixture.keygen(args, |adapter| {
        dsh::Search::new(adapter, "01-06-2020", "03-06-2020", 0.5, 0.0, &hotel_ids).execute();
    });
    fixture.executor().execute(&mut txn);
    assert_eq!(
        txn.status(),
        TransactionStatus::Committed,
        "reason: {}",
        txn.abort_reason
    );
}

#[test]
fn test_recommend_picks_extremes() {
    let fixture = Fixture::new();
    fixture.install_hotel(0, 5.0, 5.0, 1.0, 900.0, 4);
    fixture.install_hotel(1, 1.0, 1.0, 4.5, 300.0, 4);
    fixture.install_hotel(2, 9.0, 9.0, 2.0, 80.0, 4);
    let ids = [0, 1, 2];
    let load = &fixture.load_adapter;

    let mut by_distance = dsh::Recommend::new(load, RecommendationType::Distance, 0.0, 0.0, &ids);
    assert!(by_distance.execute());
    assert_eq!(by_distance.chosen_hotel_id(), 1);

    let mut by_rating = dsh::Recommend::new(load, RecommendationType::Rating, 0.0, 0.0, &ids);
    assert!(by_rating.execute());
    assert_eq!(by_rating.chosen_hotel_id(), 1);

    let mut by_price = dsh::Recommend::new(load, RecommendationType::Price, 0.0, 0.0, &ids);
    assert!(by_price.execute());
    assert_eq!(by_price.chosen_hotel_id(), 2);
}

#[test]
fn test_keygen_covers_fresh_count_rows() {
    // The key-generation pass must record count keys for dates that have
    // no rows yet, otherwise execution could not insert them.
    let fixture = Fixture::new();
    fixture.install_user(7);
    fixture.install_hotel(1, 0.0, 0.0, 4.0, 100.0, 5);

    let txn = fixture.keygen(
        reservation_args("7", "01-06-2020", "04-06-2020", 1, 1),
        |adapter| {
            dsh::Reservation::new(adapter, "7", "7", "01-06-2020", "04-06-2020", 1, "7", 1)
                .execute();
        },
    );
    // user + hotel + three count rows + the reservation row.
    assert_eq!(txn.keys.len(), 6);
}

#[test]
fn test_loader_placement_consistency() {
    let num_partitions = 2;
    let num_regions = 2;
    for partition in 0..num_partitions {
        let config = Configuration::for_testing(
            num_partitions,
            num_regions,
            Partitioning::Dsh {
                num_users: 40,
                num_hotels: 20,
                max_coord: 10.0,
            },
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
            &DshLoadParams {
                num_users: 40,
                num_hotels: 20,
                num_partitions,
                local_partition: partition,
                max_coord: 10.0,
                seed: 3,
            },
        );

        for key in storage.keys() {
            assert_eq!(sharder.compute_partition(&key), partition);
            assert_eq!(
                storage.home(&key),
                Some(initializer.compute_home(&key)),
                "home mismatch for {key:?}"
            );
        }
    }
}
