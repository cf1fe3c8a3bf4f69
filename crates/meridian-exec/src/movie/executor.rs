//! Movie execution entry point.

use std::sync::Arc;

use crate::adapter::{apply_writes, StorageAdapter, TxnStorageAdapter};
use crate::exec_common::{expect_args, int_arg, long_arg, run_body, str_arg};
use crate::sharder::Sharder;
use crate::storage::MemoryStorage;
use meridian_proto::{Transaction, TransactionStatus};

use super::transactions::NewReview;

/// Executes movie transactions on one partition.
pub struct MovieExecutor {
    sharder: Arc<Sharder>,
    storage: Arc<MemoryStorage>,
}

impl MovieExecutor {
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
        "new_review" => {
            expect_args(args, 8, "NewReview")?;
            let req_id = long_arg(args, 1, "NewReview")?;
            let rating = int_arg(args, 2, "NewReview")?;
            let username = str_arg(args, 3, "NewReview")?;
            let title = str_arg(args, 4, "NewReview")?;
            let timestamp = long_arg(args, 5, "NewReview")?;
            let review_id = long_arg(args, 6, "NewReview")?;
            let text = str_arg(args, 7, "NewReview")?;
            run_body(
                "NewReview",
                &mut NewReview::new(
                    adapter, req_id, rating, username, title, timestamp, review_id, text,
                ),
            )
        }
        _ => Err("Unknown procedure name".into()),
    }
}
