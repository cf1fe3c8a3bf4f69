//! SmallBank execution entry point.

use std::sync::Arc;

use crate::adapter::{apply_writes, StorageAdapter, TxnStorageAdapter};
use crate::exec_common::{expect_args, int_arg, run_body, str_arg};
use crate::sharder::Sharder;
use crate::storage::MemoryStorage;
use meridian_proto::{Transaction, TransactionStatus};

use super::transactions::{
    Amalgamate, Balance, DepositChecking, GetCustomerIdByName, TransactionSaving, Writecheck,
};

/// Executes SmallBank transactions on one partition.
pub struct SmallBankExecutor {
    sharder: Arc<Sharder>,
    storage: Arc<MemoryStorage>,
}

impl SmallBankExecutor {
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
        "getCustomerIdByName" => {
            expect_args(args, 2, "getCustomerIdByName")?;
            let name = str_arg(args, 1, "getCustomerIdByName")?;
            run_body(
                "getCustomerIdByName",
                &mut GetCustomerIdByName::new(adapter, name),
            )
        }
        "balance" => {
            expect_args(args, 3, "BalanceTxn")?;
            let name = str_arg(args, 1, "BalanceTxn")?;
            let customer_id = int_arg(args, 2, "BalanceTxn")?;
            run_body("BalanceTxn", &mut Balance::new(adapter, name, customer_id))
        }
        "depositChecking" => {
            expect_args(args, 4, "DepositCheckingTxn")?;
            let name = str_arg(args, 1, "DepositCheckingTxn")?;
            let customer_id = int_arg(args, 2, "DepositCheckingTxn")?;
            let amount = int_arg(args, 3, "DepositCheckingTxn")?;
            run_body(
                "DepositCheckingTxn",
                &mut DepositChecking::new(adapter, name, customer_id, amount),
            )
        }
        "transactionSaving" => {
            expect_args(args, 4, "TransactionSavingTxn")?;
            let name = str_arg(args, 1, "TransactionSavingTxn")?;
            let customer_id = int_arg(args, 2, "TransactionSavingTxn")?;
            let amount = int_arg(args, 3, "TransactionSavingTxn")?;
            run_body(
                "TransactionSavingTxn",
                &mut TransactionSaving::new(adapter, name, customer_id, amount),
            )
        }
        "writecheck" => {
            expect_args(args, 4, "WritecheckTxn")?;
            let name = str_arg(args, 1, "WritecheckTxn")?;
            let customer_id = int_arg(args, 2, "WritecheckTxn")?;
            let value = int_arg(args, 3, "WritecheckTxn")?;
            run_body(
                "WritecheckTxn",
                &mut Writecheck::new(adapter, name, customer_id, value),
            )
        }
        "amalgamate" => {
            expect_args(args, 5, "AmalgamateTxn")?;
            let src_name = str_arg(args, 1, "AmalgamateTxn")?;
            let dst_name = str_arg(args, 2, "AmalgamateTxn")?;
            let src_id = int_arg(args, 3, "AmalgamateTxn")?;
            let dst_id = int_arg(args, 4, "AmalgamateTxn")?;
            run_body(
                "AmalgamateTxn",
                &mut Amalgamate::new(adapter, src_name, dst_name, src_id, dst_id),
            )
        }
        _ => Err("Unknown procedure name".into()),
    }
}
