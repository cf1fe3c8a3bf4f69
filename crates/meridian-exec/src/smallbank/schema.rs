//! Table schemas of the SmallBank family.

use crate::scalar::ScalarType;
use crate::table::Schema;

use super::ACCOUNT_NAME_WIDTH;

/// `Accounts(name -> id)`.
pub struct AccountsSchema;

/// Value columns of [`AccountsSchema`].
#[derive(Debug, Clone, Copy)]
pub enum AccountsColumn {
    /// Customer id.
    Id,
}

impl Schema for AccountsSchema {
    type Column = AccountsColumn;
    const NAME: &'static str = "accounts";
    const ID: u16 = 0;
    const KEY: &'static [ScalarType] = &[ScalarType::FixedText(ACCOUNT_NAME_WIDTH)];
    const VALUE: &'static [ScalarType] = &[ScalarType::Int32];

    fn column_index(column: AccountsColumn) -> usize {
        match column {
            AccountsColumn::Id => 0,
        }
    }
}

/// `Savings(id -> balance)`.
pub struct SavingsSchema;

/// Value columns of [`SavingsSchema`].
#[derive(Debug, Clone, Copy)]
pub enum SavingsColumn {
    /// Savings balance.
    Balance,
}

impl Schema for SavingsSchema {
    type Column = SavingsColumn;
    const NAME: &'static str = "savings";
    const ID: u16 = 1;
    const KEY: &'static [ScalarType] = &[ScalarType::Int32];
    const VALUE: &'static [ScalarType] = &[ScalarType::Int32];

    fn column_index(column: SavingsColumn) -> usize {
        match column {
            SavingsColumn::Balance => 0,
        }
    }
}

/// `Checking(id -> balance)`.
pub struct CheckingSchema;

/// Value columns of [`CheckingSchema`].
#[derive(Debug, Clone, Copy)]
pub enum CheckingColumn {
    /// Checking balance.
    Balance,
}

impl Schema for CheckingSchema {
    type Column = CheckingColumn;
    const NAME: &'static str = "checking";
    const ID: u16 = 2;
    const KEY: &'static [ScalarType] = &[ScalarType::Int32];
    const VALUE: &'static [ScalarType] = &[ScalarType::Int32];

    fn column_index(column: CheckingColumn) -> usize {
        match column {
            CheckingColumn::Balance => 0,
        }
    }
}
