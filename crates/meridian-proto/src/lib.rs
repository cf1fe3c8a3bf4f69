//! Meridian Wire Protocol
//!
//! This crate defines the protobuf messages exchanged between clients,
//! workload generators, and execution nodes, plus the length-delimited
//! stream codec used on the socket.
//!
//! The central message is [`Transaction`]: the key set with access types
//! and home hints discovered during the key-generation pass, the
//! procedure code, and the status/abort-reason filled in by execution.
//!
//! # Example
//!
//! ```rust
//! use meridian_proto::{KeyType, Transaction};
//!
//! let mut txn = Transaction::default();
//! txn.add_procedure(vec!["get_product".into(), "42".into()]);
//! txn.push_key(b"\x2a\x00\x00\x00".as_slice().into(), KeyType::Read, 1);
//! assert_eq!(txn.keys.len(), 1);
//! ```

#![warn(clippy::all)]

pub mod api;
pub mod codec;
mod wire;

pub use api::{Request, Response};
pub use wire::{
    Code, KeyEntry, KeyType, Procedure, Transaction, TransactionEvent, TransactionInternal,
    TransactionStatus, ValueEntry,
};
