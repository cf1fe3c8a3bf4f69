//! The SmallBank benchmark family.
//!
//! Accounts are looked up by a 24-byte client name; checking and savings
//! balances are keyed by the customer id that lookup returns. Every
//! user-facing transaction is therefore dependent: a `getCustomerIdByName`
//! phase followed by the operation itself (two lookups for `amalgamate`).

mod executor;
mod load;
pub mod schema;
mod transactions;

pub use executor::SmallBankExecutor;
pub use load::{load_tables, SmallBankLoadParams};
pub use transactions::{
    Amalgamate, Balance, DepositChecking, GetCustomerIdByName, TransactionSaving, Writecheck,
};

/// Width of an account name: the client name padded with spaces.
pub const ACCOUNT_NAME_WIDTH: usize = 24;

/// Builds the padded account name of a client id.
#[must_use]
pub fn account_name(client_id: u32) -> String {
    format!("{:<width$}", format!("Client{client_id}"), width = ACCOUNT_NAME_WIDTH)
}
