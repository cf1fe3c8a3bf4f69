//! The DeathStar Hotel benchmark family.
//!
//! Users log in, search and get recommendations over a 10-hotel read set,
//! and reserve rooms; per-date reservation counts guard hotel capacity.
//! Dates are `dd-mm-yyyy` fixed text under a non-leap 365-day calendar.

mod executor;
mod load;
pub mod schema;
mod transactions;
mod util;

pub use executor::DshExecutor;
pub use load::{load_tables, DshLoadParams};
pub use transactions::{RecommendationType, Recommend, Reservation, Search, UserLogin};
pub use util::{date_interp, dist, format_date, format_uname};

/// Longest allowed stay in days.
pub const MAX_STAY: usize = 14;

/// Hotels read by one search or recommendation.
pub const RECOMMENDATION_READ_SIZE: usize = 10;

/// Upper bound of generated hotel prices.
pub const MAX_HOTEL_PRICE: f64 = 10000.0;

/// Smallest generated hotel capacity.
pub const MIN_HOTEL_CAPACITY: u32 = 10;

/// Largest generated hotel capacity.
pub const MAX_HOTEL_CAPACITY: u32 = 500;
