//! PPS execution entry point.
//!
//! Dispatches a wire transaction to the matching body, runs it against
//! real storage, and applies the staged writes of committed transactions
//! for locally-owned rows.

use std::sync::Arc;

use crate::adapter::{apply_writes, StorageAdapter, TxnStorageAdapter};
use crate::exec_common::{int_arg, run_body};
use crate::sharder::Sharder;
use crate::storage::MemoryStorage;
use meridian_proto::{Transaction, TransactionStatus};

use super::transactions::{
    GetPart, GetPartsByProduct, GetPartsBySupplier, GetProduct, OrderParts, OrderProduct,
    SupplierRestock, UpdateProductPart,
};

/// Executes PPS transactions on one partition.
pub struct PpsExecutor {
    sharder: Arc<Sharder>,
    storage: Arc<MemoryStorage>,
}

impl PpsExecutor {
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
        "get_product" => {
            let product_id = int_arg(args, 1, "GetProduct")?;
            run_body("GetProduct", &mut GetProduct::new(adapter, product_id))
        }
        "get_part" => {
            let part_id = int_arg(args, 1, "GetPart")?;
            run_body("GetPart", &mut GetPart::new(adapter, part_id))
        }
        "order_parts" => {
            let parts_ids = parts_from(args, 1, "OrderParts")?;
            run_body("OrderParts", &mut OrderParts::new(adapter, parts_ids))
        }
        "order_product" => {
            let product_id = int_arg(args, 1, "OrderProduct")?;
            let parts_ids = parts_from(args, 2, "OrderProduct")?;
            run_body(
                "OrderProduct",
                &mut OrderProduct::new(adapter, product_id, parts_ids),
            )
        }
        "supplier_restock" => {
            let supplier_id = int_arg(args, 1, "SupplierRestock")?;
            let parts_ids = parts_from(args, 2, "SupplierRestock")?;
            run_body(
                "SupplierRestock",
                &mut SupplierRestock::new(adapter, supplier_id, parts_ids),
            )
        }
        "get_parts_by_product" => {
            let product_id = int_arg(args, 1, "GetPartsByProduct")?;
            run_body(
                "GetPartsByProduct",
                &mut GetPartsByProduct::new(adapter, product_id),
            )
        }
        "get_parts_by_supplier" => {
            let supplier_id = int_arg(args, 1, "GetPartsBySupplier")?;
            run_body(
                "GetPartsBySupplier",
                &mut GetPartsBySupplier::new(adapter, supplier_id),
            )
        }
        "update_product_part" => {
            let product_id = int_arg(args, 1, "UpdateProductPart")?;
            run_body(
                "UpdateProductPart",
                &mut UpdateProductPart::new(adapter, product_id),
            )
        }
        _ => Err("Unknown procedure name".into()),
    }
}

fn parts_from(args: &[String], from: usize, txn_name: &str) -> Result<Vec<i32>, String> {
    (from..args.len())
        .map(|i| int_arg(args, i, txn_name))
        .collect()
}
