//! Transaction wire message.
//!
//! Field numbers are frozen: the serialized form is the interop surface
//! between the client driver, the external coordinator, and execution
//! nodes.

use bytes::Bytes;

/// Access type of one key in a transaction's key set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum KeyType {
    /// The key is only read.
    Read = 0,
    /// The key is written (possibly also read).
    Write = 1,
}

/// Lifecycle status of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TransactionStatus {
    /// Not yet executed.
    Pending = 0,
    /// Executed and applied.
    Committed = 1,
    /// Aborted; see `abort_reason`.
    Aborted = 2,
}

/// Value cell attached to a key entry.
///
/// For READ keys, execution stamps the bytes that were read; for WRITE
/// keys it stages the bytes to be applied.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ValueEntry {
    /// Raw row bytes.
    #[prost(bytes = "bytes", tag = "1")]
    pub value: Bytes,
}

/// One entry of a transaction's key set.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeyEntry {
    /// The physical key.
    #[prost(bytes = "bytes", tag = "1")]
    pub key: Bytes,
    /// Read or write access.
    #[prost(enumeration = "KeyType", tag = "2")]
    pub key_type: i32,
    /// Home-region hint assigned by the metadata initializer.
    #[prost(uint32, tag = "3")]
    pub home: u32,
    /// Value cell; filled during execution.
    #[prost(message, optional, tag = "4")]
    pub value_entry: Option<ValueEntry>,
}

impl KeyEntry {
    /// Bytes of the value cell, empty when absent.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        self.value_entry.as_ref().map_or(&[], |v| &v.value)
    }
}

/// One stored procedure invocation: `args[0]` is the procedure name.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Procedure {
    /// Procedure name followed by its textual arguments.
    #[prost(string, repeated, tag = "1")]
    pub args: Vec<String>,
}

/// The procedures making up a transaction's code.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Code {
    /// Procedures in execution order.
    #[prost(message, repeated, tag = "1")]
    pub procedures: Vec<Procedure>,
}

/// A timestamped trace event recorded while the transaction moved through
/// the system.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionEvent {
    /// Event name.
    #[prost(string, tag = "1")]
    pub event: String,
    /// Machine that recorded the event.
    #[prost(uint32, tag = "2")]
    pub machine: u32,
    /// Nanosecond timestamp.
    #[prost(int64, tag = "3")]
    pub time: i64,
    /// Home region the event was recorded in.
    #[prost(uint32, tag = "4")]
    pub home: u32,
}

/// System-internal transaction fields.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionInternal {
    /// Transaction id assigned by the generator or server.
    #[prost(uint64, tag = "1")]
    pub id: u64,
    /// Trace events.
    #[prost(message, repeated, tag = "2")]
    pub events: Vec<TransactionEvent>,
}

/// The transaction wire message.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Transaction {
    /// Key set with access types, home hints, and value cells.
    #[prost(message, repeated, tag = "1")]
    pub keys: Vec<KeyEntry>,
    /// Procedure code.
    #[prost(message, optional, tag = "2")]
    pub code: Option<Code>,
    /// Lifecycle status.
    #[prost(enumeration = "TransactionStatus", tag = "3")]
    pub status: i32,
    /// Reason the transaction aborted, empty otherwise.
    #[prost(string, tag = "4")]
    pub abort_reason: String,
    /// Internal id and trace events.
    #[prost(message, optional, tag = "5")]
    pub internal: Option<TransactionInternal>,
}

impl Transaction {
    /// Marks the transaction aborted with the given reason.
    pub fn abort(&mut self, reason: impl Into<String>) {
        self.set_status(TransactionStatus::Aborted);
        self.abort_reason = reason.into();
    }

    /// Appends a key entry with an empty value cell.
    pub fn push_key(&mut self, key: Bytes, key_type: KeyType, home: u32) {
        self.keys.push(KeyEntry {
            key,
            key_type: key_type as i32,
            home,
            value_entry: Some(ValueEntry::default()),
        });
    }

    /// Appends a procedure to the transaction code.
    pub fn add_procedure(&mut self, args: Vec<String>) {
        self.code
            .get_or_insert_with(Code::default)
            .procedures
            .push(Procedure { args });
    }

    /// The procedures of this transaction, empty when no code is attached.
    #[must_use]
    pub fn procedures(&self) -> &[Procedure] {
        self.code.as_ref().map_or(&[], |c| &c.procedures)
    }

    /// The internal transaction id, zero when unset.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.internal.as_ref().map_or(0, |i| i.id)
    }

    /// Assigns the internal transaction id.
    pub fn set_id(&mut self, id: u64) {
        self.internal.get_or_insert_with(TransactionInternal::default).id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_round_trip() {
        let mut txn = Transaction::default();
        txn.set_id(99);
        txn.add_procedure(vec!["balance".into(), "Client7".into(), "7".into()]);
        txn.push_key(Bytes::from_static(b"\x07\x00\x00\x00"), KeyType::Read, 2);
        txn.set_status(TransactionStatus::Committed);

        let encoded = txn.encode_to_vec();
        let decoded = Transaction::decode(encoded.as_slice()).unwrap();
        assert_eq!(decoded, txn);
        assert_eq!(decoded.id(), 99);
        assert_eq!(decoded.status(), TransactionStatus::Committed);
        assert_eq!(decoded.keys[0].key_type(), KeyType::Read);
    }

    #[test]
    fn test_abort_sets_status_and_reason() {
        let mut txn = Transaction::default();
        txn.abort("The part does not exist");
        assert_eq!(txn.status(), TransactionStatus::Aborted);
        assert_eq!(txn.abort_reason, "The part does not exist");
    }

    #[test]
    fn test_empty_accessors() {
        let txn = Transaction::default();
        assert!(txn.procedures().is_empty());
        assert_eq!(txn.id(), 0);
    }
}
