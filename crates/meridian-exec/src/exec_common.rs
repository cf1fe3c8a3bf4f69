//! Shared helpers for the per-family executors.

use crate::txn::TransactionBody;

/// Runs a body, formatting its failure as the wire abort reason.
pub(crate) fn run_body(name: &str, body: &mut dyn TransactionBody) -> Result<(), String> {
    if body.execute() {
        Ok(())
    } else {
        Err(format!("{name} Txn - {}", body.error()))
    }
}

/// Fails unless the procedure has exactly `n` arguments (name included).
pub(crate) fn expect_args(args: &[String], n: usize, txn_name: &str) -> Result<(), String> {
    if args.len() == n {
        Ok(())
    } else {
        Err(format!("{txn_name} Txn - Invalid number of arguments"))
    }
}

/// The argument at `index` as a string.
pub(crate) fn str_arg<'a>(
    args: &'a [String],
    index: usize,
    txn_name: &str,
) -> Result<&'a str, String> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| format!("{txn_name} Txn - Invalid number of arguments"))
}

/// The argument at `index` parsed as `i32`.
pub(crate) fn int_arg(args: &[String], index: usize, txn_name: &str) -> Result<i32, String> {
    str_arg(args, index, txn_name)?
        .parse()
        .map_err(|_| format!("{txn_name} Txn - Invalid arguments"))
}

/// The argument at `index` parsed as `i64`.
pub(crate) fn long_arg(args: &[String], index: usize, txn_name: &str) -> Result<i64, String> {
    str_arg(args, index, txn_name)?
        .parse()
        .map_err(|_| format!("{txn_name} Txn - Invalid arguments"))
}

/// The argument at `index` parsed as `f64`.
pub(crate) fn float_arg(args: &[String], index: usize, txn_name: &str) -> Result<f64, String> {
    str_arg(args, index, txn_name)?
        .parse()
        .map_err(|_| format!("{txn_name} Txn - Invalid arguments"))
}
