//! DSH execution entry point.

use std::sync::Arc;

use crate::adapter::{apply_writes, StorageAdapter, TxnStorageAdapter};
use crate::exec_common::{float_arg, int_arg, run_body, str_arg};
use crate::sharder::Sharder;
use crate::storage::MemoryStorage;
use meridian_proto::{Transaction, TransactionStatus};

use super::transactions::{RecommendationType, Recommend, Reservation, Search, UserLogin};

/// Executes DSH transactions on one partition.
pub struct DshExecutor {
    sharder: Arc<Sharder>,
    storage: Arc<MemoryStorage>,
}

impl DshExecutor {
    /// Creates an executor over this partition's sharder and storage.
    #[must_use]
    pub fn new(sharder: Arc<Sharder>, storage: Arc<MemoryStorage>) -> Self {
        Self { sharder, storage }
    }

    /// Runs `txn` to completion, setting its status and abort reason.
    pub fn execute(&self, txn: &mut Transaction) {
        let args = match txn.procedures().first() {
            Some(procedure) if !procedure.args.is_empty() => procedure.args.clone(),
            _ => {
                txn.abort("Invalid code");
                return;
            }
        };

        let adapter = Arc::new(TxnStorageAdapter::new(
            std::mem::take(txn),
            Arc::clone(&self.storage),
        ));
        let dyn_adapter: Arc<dyn StorageAdapter> = adapter.clone();
        let result = dispatch(&dyn_adapter, &args);
        adapter.finish(txn);

        match result {
            Ok(()) => {
                txn.set_status(TransactionStatus::Committed);
                apply_writes(txn, &self.sharder, &self.storage);
            }
            Err(reason) => txn.abort(reason),
        }
    }
}

fn dispatch(adapter: &Arc<dyn StorageAdapter>, args: &[String]) -> Result<(), String> {
    match args[0].as_str() {
        "user_login" => {
            let username = str_arg(args, 1, "UserLogin")?;
            let password = str_arg(args, 2, "UserLogin")?;
            run_body("UserLogin", &mut UserLogin::new(adapter, username, password))
        }
        "search" => {
            let in_date = str_arg(args, 1, "Search")?;
            let out_date = str_arg(args, 2, "Search")?;
            let lat = float_arg(args, 3, "Search")?;
            let lon = float_arg(args, 4, "Search")?;
            let hotel_ids = hotels_from(args, 5, "Search")?;
            run_body(
                "Search",
                &mut Search::new(adapter, in_date, out_date, lat, lon, &hotel_ids),
            )
        }
        "recommendation" => {
            let type_str = str_arg(args, 1, "Recommend")?;
            let recommendation_type = RecommendationType::from_str(type_str)
                .ok_or_else(|| format!("Invalid recommendation type: {type_str}"))?;
            let lat = float_arg(args, 2, "Recommend")?;
            let lon = float_arg(args, 3, "Recommend")?;
            let hotel_ids = hotels_from(args, 4, "Recommend")?;
            run_body(
                "Recommend",
                &mut Recommend::new(adapter, recommendation_type, lat, lon, &hotel_ids),
            )
        }
        "reservation" => {
            let username = str_arg(args, 1, "Reservation")?;
            let password = str_arg(args, 2, "Reservation")?;
            let in_date = str_arg(args, 3, "Reservation")?;
            let out_date = str_arg(args, 4, "Reservation")?;
            let hotel_id = int_arg(args, 5, "Reservation")?;
            let num_rooms = int_arg(args, 6, "Reservation")?;
            let cust_name = str_arg(args, 7, "Reservation")?;
            run_body(
                "Reservation",
                &mut Reservation::new(
                    adapter, username, password, in_date, out_date, hotel_id, cust_name, num_rooms,
                ),
            )
        }
        _ => Err("Unknown procedure name".into()),
    }
}

fn hotels_from(args: &[String], from: usize, txn_name: &str) -> Result<Vec<i32>, String> {
    (from..args.len())
        .map(|i| int_arg(args, i, txn_name))
        .collect()
}
