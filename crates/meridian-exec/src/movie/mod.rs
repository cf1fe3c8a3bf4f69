//! The movie-review benchmark family.
//!
//! A single transaction, `new_review`, joins a user and a movie and
//! appends a review. Usernames and movie titles carry a 12-digit decimal
//! id prefix that drives partitioning and home assignment.

mod executor;
mod load;
pub mod schema;
mod transactions;

pub use executor::MovieExecutor;
pub use load::load_tables;
pub use transactions::NewReview;

/// Users installed by the loader, ids `1..=NUM_USERS`.
pub const NUM_USERS: u32 = 1000;

/// The movie catalog; the loader installs one row per title, keyed by a
/// 12-digit index prefix.
pub const MOVIES: &[&str] = &[
    "The Shawshank Redemption",
    "The Godfather",
    "The Dark Knight",
    "Pulp Fiction",
    "Forrest Gump",
    "Inception",
    "Fight Club",
    "The Matrix",
    "Goodfellas",
    "Interstellar",
    "Se7en",
    "The Silence of the Lambs",
    "Gladiator",
    "The Departed",
    "Whiplash",
    "The Prestige",
];

/// Left-pads a decimal id to `width` digits.
#[must_use]
pub fn zero_padded(id: i64, width: usize) -> String {
    format!("{id:0width$}")
}

/// The stored username of a user id.
#[must_use]
pub fn username_for(user_id: i64) -> String {
    format!("{}_username", zero_padded(user_id, 12))
}

/// The stored title of a movie index, space-padded to the column width.
#[must_use]
pub fn title_for(title_index: i64) -> String {
    let raw = format!("{}_{}", zero_padded(title_index, 12), MOVIES[title_index as usize]);
    format!("{raw:<100}")
}
