//! Builds wire transactions from JSON descriptions.
//!
//! PPS and DSH descriptions run the real transaction bodies through a
//! key-generation adapter so the submitted transaction carries the exact
//! key set execution will touch. Home hints are left for the server's
//! metadata initializer; the client stamps a neutral zero.
//!
//! Everything else is a raw description: explicit read/write sets plus
//! either procedure code or a `new_master` re-mastering request.

use std::sync::Arc;

use serde_json::Value;

use meridian_common::{MeridianError, MeridianResult};
use meridian_exec::adapter::{KeyGenAdapter, StorageAdapter};
use meridian_exec::metadata::MetadataInitializer;
use meridian_exec::txn::TransactionBody;
use meridian_exec::{dsh, pps};
use meridian_proto::{KeyType, Transaction};

fn invalid(message: impl Into<String>) -> MeridianError {
    MeridianError::InvalidTransaction(message.into())
}

fn str_field<'a>(doc: &'a Value, key: &str) -> MeridianResult<&'a str> {
    doc.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(format!("missing string field \"{key}\"")))
}

fn int_field(doc: &Value, key: &str) -> MeridianResult<i64> {
    doc.get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| invalid(format!("missing integer field \"{key}\"")))
}

fn float_field(doc: &Value, key: &str) -> MeridianResult<f64> {
    doc.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid(format!("missing number field \"{key}\"")))
}

fn int_list_field(doc: &Value, key: &str) -> MeridianResult<Vec<i32>> {
    doc.get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| invalid(format!("missing array field \"{key}\"")))?
        .iter()
        .map(|v| {
            v.as_i64()
                .map(|n| n as i32)
                .ok_or_else(|| invalid(format!("non-integer element in \"{key}\"")))
        })
        .collect()
}

/// Builds the wire transaction described by `doc`.
pub fn build_transaction(doc: &Value) -> MeridianResult<Transaction> {
    let workload = doc.get("workload").and_then(Value::as_str).unwrap_or("");
    match workload {
        "pps" => build_pps(doc),
        "dsh" => build_dsh(doc),
        _ => build_raw(doc),
    }
}

fn keygen() -> (Arc<KeyGenAdapter>, Arc<dyn StorageAdapter>) {
    let adapter = Arc::new(KeyGenAdapter::new());
    let dyn_adapter: Arc<dyn StorageAdapter> = adapter.clone();
    (adapter, dyn_adapter)
}

// Home hints are assigned server-side; the client has no placement map.
const CLIENT_INITIALIZER: MetadataInitializer = MetadataInitializer::Constant { home: 0 };

fn build_pps(doc: &Value) -> MeridianResult<Transaction> {
    let txn_type = str_field(doc, "txn_type")?;
    let arguments = doc
        .get("arguments")
        .ok_or_else(|| invalid("missing \"arguments\""))?;

    let mut txn = Transaction::default();
    let (adapter, dyn_adapter) = keygen();
    let mut args = vec![txn_type.to_string()];

    match txn_type {
        "get_product" => {
            let product_id = int_field(arguments, "product_id")? as i32;
            pps::GetProduct::new(&dyn_adapter, product_id).read();
            args.push(product_id.to_string());
        }
        "get_part" => {
            let part_id = int_field(arguments, "part_id")? as i32;
            pps::GetPart::new(&dyn_adapter, part_id).read();
            args.push(part_id.to_string());
        }
        "order_parts" => {
            let parts_ids = int_list_field(arguments, "parts_ids")?;
            let mut body = pps::OrderParts::new(&dyn_adapter, parts_ids.clone());
            body.read();
            body.write();
            args.extend(parts_ids.iter().map(ToString::to_string));
        }
        "order_product" => {
            let product_id = int_field(arguments, "product_id")? as i32;
            let parts_ids = int_list_field(arguments, "parts_ids")?;
            let mut body = pps::OrderProduct::new(&dyn_adapter, product_id, parts_ids.clone());
            body.read();
            body.write();
            args.push(product_id.to_string());
            args.extend(parts_ids.iter().map(ToString::to_string));
        }
        "supplier_restock" => {
            let supplier_id = int_field(arguments, "supplier_id")? as i32;
            let parts_ids = int_list_field(arguments, "parts_ids")?;
            let mut body = pps::SupplierRestock::new(&dyn_adapter, supplier_id, parts_ids.clone());
            body.read();
            body.write();
            args.push(supplier_id.to_string());
            args.extend(parts_ids.iter().map(ToString::to_string));
        }
        "get_parts_by_product" => {
            let product_id = int_field(arguments, "product_id")? as i32;
            pps::GetPartsByProduct::new(&dyn_adapter, product_id).read();
            args.push(product_id.to_string());
        }
        "get_parts_by_supplier" => {
            let supplier_id = int_field(arguments, "supplier_id")? as i32;
            pps::GetPartsBySupplier::new(&dyn_adapter, supplier_id).read();
            args.push(supplier_id.to_string());
        }
        "update_product_part" => {
            let product_id = int_field(arguments, "product_id")? as i32;
            let mut body = pps::UpdateProductPart::new(&dyn_adapter, product_id);
            body.read();
            body.write();
            args.push(product_id.to_string());
        }
        other => return Err(invalid(format!("unknown pps transaction type: {other}"))),
    }

    adapter.finalize(&mut txn, &CLIENT_INITIALIZER);
    txn.add_procedure(args);
    Ok(txn)
}

fn build_dsh(doc: &Value) -> MeridianResult<Transaction> {
    let txn_type = str_field(doc, "txn_type")?;
    let arguments = doc
        .get("arguments")
        .ok_or_else(|| invalid("missing \"arguments\""))?;

    let mut txn = Transaction::default();
    let (adapter, dyn_adapter) = keygen();
    let mut args = vec![txn_type.to_string()];

    match txn_type {
        "user_login" => {
            let username = str_field(arguments, "username")?;
            let password = str_field(arguments, "password")?;
            dsh::UserLogin::new(&dyn_adapter, username, password).execute();
            args.push(username.to_string());
            args.push(password.to_string());
        }
        "recommendation" => {
            let type_str = str_field(arguments, "type")?;
            let recommendation_type = dsh::RecommendationType::from_str(type_str)
                .ok_or_else(|| invalid(format!("invalid recommendation type: {type_str}")))?;
            let (mut lat, mut lon) = (0.0, 0.0);
            if recommendation_type == dsh::RecommendationType::Distance {
                lat = float_field(arguments, "lat")?;
                lon = float_field(arguments, "lon")?;
            }
            let hotel_ids = int_list_field(arguments, "h_ids")?;
            dsh::Recommend::new(&dyn_adapter, recommendation_type, lat, lon, &hotel_ids).execute();
            args.push(type_str.to_string());
            args.push(lat.to_string());
            args.push(lon.to_string());
            args.extend(hotel_ids.iter().map(ToString::to_string));
        }
        "search" => {
            let in_date = str_field(arguments, "in_date")?;
            let out_date = str_field(arguments, "out_date")?;
            let lat = float_field(arguments, "lat")?;
            let lon = float_field(arguments, "lon")?;
            let hotel_ids = int_list_field(arguments, "h_ids")?;
            dsh::Search::new(&dyn_adapter, in_date, out_date, lat, lon, &hotel_ids).execute();
            args.push(in_date.to_string());
            args.push(out_date.to_string());
            args.push(lat.to_string());
            args.push(lon.to_string());
            args.extend(hotel_ids.iter().map(ToString::to_string));
        }
        "reservation" => {
            let username = str_field(arguments, "username")?;
            let password = str_field(arguments, "password")?;
            let in_date = str_field(arguments, "in_date")?;
            let out_date = str_field(arguments, "out_date")?;
            let hotel_id = int_field(arguments, "hotel_id")? as i32;
            let num_rooms = int_field(arguments, "num_rooms")? as i32;
            let cust_name = str_field(arguments, "cust_name")?;
            dsh::Reservation::new(
                &dyn_adapter,
                username,
                password,
                in_date,
                out_date,
                hotel_id,
                cust_name,
                num_rooms,
            )
            .execute();
            args.push(username.to_string());
            args.push(password.to_string());
            args.push(in_date.to_string());
            args.push(out_date.to_string());
            args.push(hotel_id.to_string());
            args.push(num_rooms.to_string());
            args.push(cust_name.to_string());
        }
        other => return Err(invalid(format!("unknown dsh transaction type: {other}"))),
    }

    adapter.finalize(&mut txn, &CLIENT_INITIALIZER);
    txn.add_procedure(args);
    Ok(txn)
}

fn build_raw(doc: &Value) -> MeridianResult<Transaction> {
    let mut txn = Transaction::default();

    for (field, key_type) in [("write_set", KeyType::Write), ("read_set", KeyType::Read)] {
        if let Some(keys) = doc.get(field) {
            let keys = keys
                .as_array()
                .ok_or_else(|| invalid(format!("\"{field}\" must be an array")))?;
            for key in keys {
                let key = key
                    .as_str()
                    .ok_or_else(|| invalid(format!("non-string key in \"{field}\"")))?;
                txn.push_key(key.as_bytes().to_vec().into(), key_type, 0);
            }
        }
    }

    if let Some(new_master) = doc.get("new_master") {
        let new_master = new_master
            .as_i64()
            .ok_or_else(|| invalid("\"new_master\" must be an integer"))?;
        // Re-mastering ships as its own single procedure.
        txn.add_procedure(vec!["remaster".to_string(), new_master.to_string()]);
        return Ok(txn);
    }

    let code = doc
        .get("code")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("missing \"code\""))?;
    for procedure in code {
        let procedure = procedure
            .as_array()
            .ok_or_else(|| invalid("each procedure must be an array"))?;
        let args: MeridianResult<Vec<String>> = procedure
            .iter()
            .map(|arg| {
                arg.as_str()
                    .map(ToString::to_string)
                    .ok_or_else(|| invalid("procedure arguments must be strings"))
            })
            .collect();
        txn.add_procedure(args?);
    }
    Ok(txn)
}
