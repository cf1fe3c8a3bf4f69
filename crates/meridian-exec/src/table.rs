//! Table facade over a storage adapter.
//!
//! A [`Schema`] describes one logical relation at compile time: its table
//! id, primary-key column types, and value column types. [`Table`] turns
//! rows of [`Scalar`]s into physical keys and values and runs all accesses
//! through the adapter, so the same body code works in key-generation and
//! execution mode.
//!
//! Physical key layout: the primary-key scalars serialized in declared
//! width, followed by the table id as a little-endian `u16`. Physical
//! value layout: the non-key scalars serialized in schema order.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;
use meridian_common::Key;

use crate::adapter::StorageAdapter;
use crate::scalar::{Scalar, ScalarType};

/// Compile-time description of one table.
pub trait Schema {
    /// Identifier type for the table's value columns.
    type Column: Copy + fmt::Debug;

    /// Table name, used in diagnostics.
    const NAME: &'static str;

    /// Table id appended to every physical key. Unique within a family.
    const ID: u16;

    /// Primary-key column types in declared order.
    const KEY: &'static [ScalarType];

    /// Value column types in declared order.
    const VALUE: &'static [ScalarType];

    /// Index of `column` within [`Self::VALUE`].
    fn column_index(column: Self::Column) -> usize;
}

/// Typed operation surface over one table.
///
/// Cloning a table is cheap; clones share the adapter.
pub struct Table<S: Schema> {
    adapter: Arc<dyn StorageAdapter>,
    _schema: PhantomData<S>,
}

impl<S: Schema> Clone for Table<S> {
    fn clone(&self) -> Self {
        Self {
            adapter: Arc::clone(&self.adapter),
            _schema: PhantomData,
        }
    }
}

impl<S: Schema> Table<S> {
    /// Creates a table over the given adapter.
    #[must_use]
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self {
            adapter,
            _schema: PhantomData,
        }
    }

    /// Builds the physical key for a primary key.
    #[must_use]
    pub fn make_key(pk: &[Scalar]) -> Key {
        debug_assert_eq!(pk.len(), S::KEY.len(), "{}: wrong pk arity", S::NAME);
        let mut buf = Vec::with_capacity(16);
        for scalar in pk {
            scalar.encode_into(&mut buf);
        }
        buf.extend_from_slice(&S::ID.to_le_bytes());
        Key::from_vec(buf)
    }

    /// Reads all value columns of the row with the given primary key.
    ///
    /// Returns an empty vector when the row does not exist (or in
    /// key-generation mode, where the access is only recorded).
    #[must_use]
    pub fn select(&self, pk: &[Scalar]) -> Vec<Scalar> {
        let key = Self::make_key(pk);
        match self.adapter.select(&key) {
            Some(bytes) => Self::decode_row(&bytes).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Reads a projection of the row with the given primary key.
    ///
    /// The result has one scalar per requested column, in request order;
    /// empty when the row does not exist.
    #[must_use]
    pub fn select_columns(&self, pk: &[Scalar], columns: &[S::Column]) -> Vec<Scalar> {
        let row = self.select(pk);
        if row.is_empty() {
            return Vec::new();
        }
        columns
            .iter()
            .map(|&c| row[S::column_index(c)].clone())
            .collect()
    }

    /// Inserts a full row: primary-key scalars followed by value scalars.
    pub fn insert(&self, row: &[Scalar]) -> bool {
        debug_assert_eq!(
            row.len(),
            S::KEY.len() + S::VALUE.len(),
            "{}: wrong row arity",
            S::NAME
        );
        let key = Self::make_key(&row[..S::KEY.len()]);
        let mut buf = Vec::with_capacity(32);
        for scalar in &row[S::KEY.len()..] {
            scalar.encode_into(&mut buf);
        }
        self.adapter.insert(key, Bytes::from(buf))
    }

    /// Updates the given columns of an existing row.
    ///
    /// Reads the current row through the adapter, patches the columns, and
    /// stages the new value. In key-generation mode there is no current
    /// row; the access is recorded as a write and reported successful.
    pub fn update(&self, pk: &[Scalar], columns: &[S::Column], values: &[Scalar]) -> bool {
        debug_assert_eq!(columns.len(), values.len(), "{}: arity mismatch", S::NAME);
        let key = Self::make_key(pk);
        match self.adapter.select(&key) {
            Some(bytes) => {
                let Some(mut row) = Self::decode_row(&bytes) else {
                    return false;
                };
                for (&column, value) in columns.iter().zip(values) {
                    row[S::column_index(column)] = value.clone();
                }
                let mut buf = Vec::with_capacity(bytes.len());
                for scalar in &row {
                    scalar.encode_into(&mut buf);
                }
                self.adapter.update(&key, Some(Bytes::from(buf)))
            }
            None => self.adapter.update(&key, None),
        }
    }

    fn decode_row(bytes: &[u8]) -> Option<Vec<Scalar>> {
        let mut pos = 0;
        let mut row = Vec::with_capacity(S::VALUE.len());
        for &ty in S::VALUE {
            row.push(Scalar::decode(ty, bytes, &mut pos)?);
        }
        Some(row)
    }
}
