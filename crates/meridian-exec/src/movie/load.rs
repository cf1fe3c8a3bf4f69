//! Movie bootstrap loader.
//!
//! Installs the fixed movie catalog and `NUM_USERS` users. Key prefixes
//! are the decimal ids the workload selects by, so placement is fully
//! determined by the id arithmetic shared with the sharder.

use std::sync::Arc;

use tracing::info;

use crate::adapter::StorageAdapter;
use crate::scalar::Scalar;
use crate::table::Table;

use super::schema::{MovieSchema, UserSchema};
use super::{title_for, username_for, zero_padded, MOVIES, NUM_USERS};

/// Populates the movie tables.
pub fn load_tables(adapter: &Arc<dyn StorageAdapter>) {
    info!(users = NUM_USERS, movies = MOVIES.len(), "loading movie tables");

    let movies = Table::<MovieSchema>::new(Arc::clone(adapter));
    for index in 0..MOVIES.len() as i64 {
        movies.insert(&[
            Scalar::fixed_text(&title_for(index), 100),
            Scalar::fixed_text(&zero_padded(index, 4), 4),
        ]);
    }

    let users = Table::<UserSchema>::new(Arc::clone(adapter));
    for id in 1..=i64::from(NUM_USERS) {
        let postfix = zero_padded(id, 4);
        users.insert(&[
            Scalar::fixed_text(&username_for(id), 21),
            Scalar::Int64(id),
            Scalar::fixed_text(&format!("password_{postfix}"), 13),
            Scalar::fixed_text(&format!("last_name_{postfix}"), 14),
            Scalar::fixed_text(&format!("first_name_{postfix}"), 15),
            Scalar::Int64(0),
        ]);
    }
}
