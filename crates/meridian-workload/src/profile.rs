//! Out-of-band transaction annotations produced by the generators.

use meridian_common::TxnId;

/// Phase of a dependent transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DependencyType {
    /// Independent transaction.
    #[default]
    None,
    /// First phase; its result must be fed back via `on_result`.
    FirstPhase,
    /// Follow-up phase produced from a fed-back result.
    SecondPhase,
}

/// Which logical operation a transaction belongs to.
///
/// Dependent-transaction routing keys off this: the generator uses it to
/// decide which follow-up a fed-back first-phase result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionType {
    /// No follow-up routing.
    #[default]
    Nothing,
    /// SmallBank balance.
    Balance,
    /// SmallBank depositChecking.
    DepositChecking,
    /// SmallBank transactionSaving.
    TransactionSaving,
    /// SmallBank amalgamate.
    Amalgamate,
    /// SmallBank writecheck.
    Writecheck,
    /// PPS order_product.
    OrderProduct,
}

/// The generator's annotation of one produced transaction.
#[derive(Debug, Clone, Default)]
pub struct TransactionProfile {
    /// Client-side transaction id.
    pub client_txn_id: TxnId,
    /// Whether the key set intentionally spans partitions.
    pub is_multi_partition: bool,
    /// Whether the key set intentionally spans home regions.
    pub is_multi_home: bool,
    /// Whether a single-home transaction was deliberately sent to a
    /// non-local home.
    pub is_foreign_single_home: bool,
    /// Logical operation.
    pub transaction_type: TransactionType,
    /// Dependency phase.
    pub dependency_type: DependencyType,
}
