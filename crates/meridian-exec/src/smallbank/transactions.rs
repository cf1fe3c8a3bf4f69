//! SmallBank transaction bodies.

use std::sync::Arc;

use crate::adapter::StorageAdapter;
use crate::scalar::Scalar;
use crate::table::Table;
use crate::txn::{ErrorSlot, TransactionBody};

use super::schema::{
    AccountsColumn, AccountsSchema, CheckingColumn, CheckingSchema, SavingsColumn, SavingsSchema,
};
use super::ACCOUNT_NAME_WIDTH;

const NO_ACCOUNT_FOR_NAME: &str = "There is no account associated with this name";
const NO_CHECKING_FOR_ID: &str = "There is no account checkings associated with this customer_id";
const NO_SAVINGS_FOR_ID: &str = "There is no account savings associated with this customer_id";

fn name_scalar(account_name: &str) -> Scalar {
    Scalar::fixed_text(account_name, ACCOUNT_NAME_WIDTH)
}

/// Resolves a customer id from an account name.
///
/// Phase 1 of every other SmallBank transaction: the id this body reads
/// is decoded from the returned value cell by the workload generator and
/// fed to the follow-up transaction.
pub struct GetCustomerIdByName {
    accounts: Table<AccountsSchema>,
    account_name: Scalar,
    customer_id: i32,
    err: ErrorSlot,
}

impl GetCustomerIdByName {
    /// Builds the body.
    #[must_use]
    pub fn new(adapter: &Arc<dyn StorageAdapter>, account_name: &str) -> Self {
        Self {
            accounts: Table::new(Arc::clone(adapter)),
            account_name: name_scalar(account_name),
            customer_id: 0,
            err: ErrorSlot::new(),
        }
    }

    /// The customer id read.
    #[must_use]
    pub fn customer_id(&self) -> i32 {
        self.customer_id
    }
}

impl TransactionBody for GetCustomerIdByName {
    fn read(&mut self) -> bool {
        let res = self
            .accounts
            .select_columns(&[self.account_name.clone()], &[AccountsColumn::Id]);
        match res.first() {
            Some(id) => {
                self.customer_id = id.as_i32();
                true
            }
            None => {
                self.err.set(NO_ACCOUNT_FOR_NAME);
                false
            }
        }
    }

    fn compute(&mut self) {}

    fn write(&mut self) -> bool {
        true
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}

/// Reads the total balance of a customer.
pub struct Balance {
    accounts: Table<AccountsSchema>,
    checking: Table<CheckingSchema>,
    savings: Table<SavingsSchema>,
    account_name: Scalar,
    customer_id: i32,
    checking_balance: i32,
    savings_balance: i32,
    total_balance: i32,
    err: ErrorSlot,
}

impl Balance {
    /// Builds the body.
    #[must_use]
    pub fn new(adapter: &Arc<dyn StorageAdapter>, account_name: &str, customer_id: i32) -> Self {
        Self {
            accounts: Table::new(Arc::clone(adapter)),
            checking: Table::new(Arc::clone(adapter)),
            savings: Table::new(Arc::clone(adapter)),
            account_name: name_scalar(account_name),
            customer_id,
            checking_balance: 0,
            savings_balance: 0,
            total_balance: 0,
            err: ErrorSlot::new(),
        }
    }

    /// Checking plus savings, valid after `compute`.
    #[must_use]
    pub fn total_balance(&self) -> i32 {
        self.total_balance
    }
}

impl TransactionBody for Balance {
    fn read(&mut self) -> bool {
        let mut ok = true;
        let res = self
            .accounts
            .select_columns(&[self.account_name.clone()], &[AccountsColumn::Id]);
        if res.is_empty() {
            self.err.set(NO_ACCOUNT_FOR_NAME);
            ok = false;
        }

        let res = self
            .checking
            .select_columns(&[Scalar::Int32(self.customer_id)], &[CheckingColumn::Balance]);
        match res.first() {
            Some(balance) => self.checking_balance = balance.as_i32(),
            None => {
                self.err.set(NO_CHECKING_FOR_ID);
                ok = false;
            }
        }

        let res = self
            .savings
            .select_columns(&[Scalar::Int32(self.customer_id)], &[SavingsColumn::Balance]);
        match res.first() {
            Some(balance) => self.savings_balance = balance.as_i32(),
            None => {
                self.err.set(NO_SAVINGS_FOR_ID);
                ok = false;
            }
        }
        ok
    }

    fn compute(&mut self) {
        self.total_balance = self.checking_balance + self.savings_balance;
    }

    fn write(&mut self) -> bool {
        true
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}

/// Adds an amount to a customer's checking balance.
pub struct DepositChecking {
    accounts: Table<AccountsSchema>,
    checking: Table<CheckingSchema>,
    account_name: Scalar,
    customer_id: i32,
    amount: i32,
    balance: i32,
    new_balance: i32,
    err: ErrorSlot,
}

impl DepositChecking {
    /// Builds the body.
    #[must_use]
    pub fn new(
        adapter: &Arc<dyn StorageAdapter>,
        account_name: &str,
        customer_id: i32,
        amount: i32,
    ) -> Self {
        Self {
            accounts: Table::new(Arc::clone(adapter)),
            checking: Table::new(Arc::clone(adapter)),
            account_name: name_scalar(account_name),
            customer_id,
            amount,
            balance: 0,
            new_balance: 0,
            err: ErrorSlot::new(),
        }
    }
}

impl TransactionBody for DepositChecking {
    fn read(&mut self) -> bool {
        let mut ok = true;
        let res = self
            .accounts
            .select_columns(&[self.account_name.clone()], &[AccountsColumn::Id]);
        if res.is_empty() {
            self.err.set(NO_ACCOUNT_FOR_NAME);
            ok = false;
        }
        let res = self
            .checking
            .select_columns(&[Scalar::Int32(self.customer_id)], &[CheckingColumn::Balance]);
        match res.first() {
            Some(balance) => self.balance = balance.as_i32(),
            None => {
                self.err
                    .set("There is no account associated with this customer_id");
                ok = false;
            }
        }
        ok
    }

    fn compute(&mut self) {
        self.new_balance = self.balance + self.amount;
    }

    fn write(&mut self) -> bool {
        if self.checking.update(
            &[Scalar::Int32(self.customer_id)],
            &[CheckingColumn::Balance],
            &[Scalar::Int32(self.new_balance)],
        ) {
            true
        } else {
            self.err.set("Cannot update Checking Ballance");
            false
        }
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}

/// Adds an amount to a customer's savings balance.
pub struct TransactionSaving {
    accounts: Table<AccountsSchema>,
    savings: Table<SavingsSchema>,
    account_name: Scalar,
    customer_id: i32,
    amount: i32,
    balance: i32,
    new_balance: i32,
    err: ErrorSlot,
}

impl TransactionSaving {
    /// Builds the body.
    #[must_use]
    pub fn new(
        adapter: &Arc<dyn StorageAdapter>,
        account_name: &str,
        customer_id: i32,
        amount: i32,
    ) -> Self {
        Self {
            accounts: Table::new(Arc::clone(adapter)),
            savings: Table::new(Arc::clone(adapter)),
            account_name: name_scalar(account_name),
            customer_id,
            amount,
            balance: 0,
            new_balance: 0,
            err: ErrorSlot::new(),
        }
    }
}

impl TransactionBody for TransactionSaving {
    fn read(&mut self) -> bool {
        let mut ok = true;
        let res = self
            .accounts
            .select_columns(&[self.account_name.clone()], &[AccountsColumn::Id]);
        if res.is_empty() {
            self.err.set(NO_ACCOUNT_FOR_NAME);
            ok = false;
        }
        let res = self
            .savings
            .select_columns(&[Scalar::Int32(self.customer_id)], &[SavingsColumn::Balance]);
        match res.first() {
            Some(balance) => self.balance = balance.as_i32(),
            None => {
                self.err
                    .set("There is no account associated with this customer_id");
                ok = false;
            }
        }
        ok
    }

    fn compute(&mut self) {
        self.new_balance = self.balance + self.amount;
    }

    fn write(&mut self) -> bool {
        if self.savings.update(
            &[Scalar::Int32(self.customer_id)],
            &[SavingsColumn::Balance],
            &[Scalar::Int32(self.new_balance)],
        ) {
            true
        } else {
            self.err.set("Cannot update Savings ballance");
            false
        }
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}

/// Merges a source customer's funds into a destination customer.
///
/// The amount arriving in the destination's checking account is the
/// source's checking plus the source's savings plus the destination's
/// *savings* balance, and both source balances are zeroed. The
/// destination's savings row is read, not written.
pub struct Amalgamate {
    accounts: Table<AccountsSchema>,
    savings: Table<SavingsSchema>,
    checking: Table<CheckingSchema>,
    src_name: Scalar,
    dst_name: Scalar,
    src_customer_id: i32,
    dst_customer_id: i32,
    src_checking: i32,
    src_savings: i32,
    dst_savings: i32,
    new_dst_checking: i32,
    err: ErrorSlot,
}

impl Amalgamate {
    /// Builds the body.
    #[must_use]
    pub fn new(
        adapter: &Arc<dyn StorageAdapter>,
        src_name: &str,
        dst_name: &str,
        src_customer_id: i32,
        dst_customer_id: i32,
    ) -> Self {
        Self {
            accounts: Table::new(Arc::clone(adapter)),
            savings: Table::new(Arc::clone(adapter)),
            checking: Table::new(Arc::clone(adapter)),
            src_name: name_scalar(src_name),
            dst_name: name_scalar(dst_name),
            src_customer_id,
            dst_customer_id,
            src_checking: 0,
            src_savings: 0,
            dst_savings: 0,
            new_dst_checking: 0,
            err: ErrorSlot::new(),
        }
    }
}

impl TransactionBody for Amalgamate {
    fn read(&mut self) -> bool {
        let mut ok = true;
        for name in [&self.src_name, &self.dst_name] {
            let res = self
                .accounts
                .select_columns(&[name.clone()], &[AccountsColumn::Id]);
            if res.is_empty() {
                self.err.set(NO_ACCOUNT_FOR_NAME);
                ok = false;
            }
        }

        let res = self.checking.select_columns(
            &[Scalar::Int32(self.src_customer_id)],
            &[CheckingColumn::Balance],
        );
        match res.first() {
            Some(balance) => self.src_checking = balance.as_i32(),
            None => {
                self.err.set(NO_CHECKING_FOR_ID);
                ok = false;
            }
        }

        let res = self.savings.select_columns(
            &[Scalar::Int32(self.src_customer_id)],
            &[SavingsColumn::Balance],
        );
        match res.first() {
            Some(balance) => self.src_savings = balance.as_i32(),
            None => {
                self.err.set(NO_SAVINGS_FOR_ID);
                ok = false;
            }
        }

        let res = self.savings.select_columns(
            &[Scalar::Int32(self.dst_customer_id)],
            &[SavingsColumn::Balance],
        );
        match res.first() {
            Some(balance) => self.dst_savings = balance.as_i32(),
            None => {
                self.err.set(NO_SAVINGS_FOR_ID);
                ok = false;
            }
        }
        ok
    }

    fn compute(&mut self) {
        self.new_dst_checking = self.src_checking + self.src_savings + self.dst_savings;
    }

    fn write(&mut self) -> bool {
        let mut ok = true;
        if !self.checking.update(
            &[Scalar::Int32(self.src_customer_id)],
            &[CheckingColumn::Balance],
            &[Scalar::Int32(0)],
        ) {
            self.err.set("Cannot update Checking Ballance");
            ok = false;
        }
        if !self.savings.update(
            &[Scalar::Int32(self.src_customer_id)],
            &[SavingsColumn::Balance],
            &[Scalar::Int32(0)],
        ) {
            self.err.set("Cannot update Savings Ballance");
            ok = false;
        }
        if !self.checking.update(
            &[Scalar::Int32(self.dst_customer_id)],
            &[CheckingColumn::Balance],
            &[Scalar::Int32(self.new_dst_checking)],
        ) {
            self.err.set("Cannot update Checking Ballance");
            ok = false;
        }
        ok
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}

/// Cashes a check against a customer's checking account, with a one-unit
/// penalty when the combined balances cannot cover it.
pub struct Writecheck {
    accounts: Table<AccountsSchema>,
    savings: Table<SavingsSchema>,
    checking: Table<CheckingSchema>,
    account_name: Scalar,
    customer_id: i32,
    value: i32,
    checking_balance: i32,
    savings_balance: i32,
    err: ErrorSlot,
}

impl Writecheck {
    /// Builds the body.
    #[must_use]
    pub fn new(
        adapter: &Arc<dyn StorageAdapter>,
        account_name: &str,
        customer_id: i32,
        value: i32,
    ) -> Self {
        Self {
            accounts: Table::new(Arc::clone(adapter)),
            savings: Table::new(Arc::clone(adapter)),
            checking: Table::new(Arc::clone(adapter)),
            account_name: name_scalar(account_name),
            customer_id,
            value,
            checking_balance: 0,
            savings_balance: 0,
            err: ErrorSlot::new(),
        }
    }
}

impl TransactionBody for Writecheck {
    fn read(&mut self) -> bool {
        let mut ok = true;
        let res = self
            .accounts
            .select_columns(&[self.account_name.clone()], &[AccountsColumn::Id]);
        if res.is_empty() {
            self.err.set(NO_ACCOUNT_FOR_NAME);
            ok = false;
        }
        let res = self
            .checking
            .select_columns(&[Scalar::Int32(self.customer_id)], &[CheckingColumn::Balance]);
        match res.first() {
            Some(balance) => self.checking_balance = balance.as_i32(),
            None => {
                self.err.set(NO_CHECKING_FOR_ID);
                ok = false;
            }
        }
        let res = self
            .savings
            .select_columns(&[Scalar::Int32(self.customer_id)], &[SavingsColumn::Balance]);
        match res.first() {
            Some(balance) => self.savings_balance = balance.as_i32(),
            None => {
                self.err.set(NO_SAVINGS_FOR_ID);
                ok = false;
            }
        }
        ok
    }

    fn compute(&mut self) {}

    fn write(&mut self) -> bool {
        let covered = self.checking_balance + self.savings_balance >= self.value;
        let updated = if covered {
            self.checking_balance - self.value
        } else {
            self.checking_balance - (self.value + 1)
        };
        if self.checking.update(
            &[Scalar::Int32(self.customer_id)],
            &[CheckingColumn::Balance],
            &[Scalar::Int32(updated)],
        ) {
            true
        } else {
            self.err.set("Cannot update Checking Ballance");
            false
        }
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}
