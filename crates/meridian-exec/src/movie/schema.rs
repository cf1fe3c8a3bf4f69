//! Table schemas of the movie family.

use crate::scalar::ScalarType;
use crate::table::Schema;

/// `User(username -> id, password, last, first, reviews)`.
pub struct UserSchema;

/// Value columns of [`UserSchema`].
#[derive(Debug, Clone, Copy)]
pub enum UserColumn {
    /// Numeric user id.
    UserId,
    /// Stored password.
    Password,
    /// Last name.
    LastName,
    /// First name.
    FirstName,
    /// Number of reviews written.
    Reviews,
}

impl Schema for UserSchema {
    type Column = UserColumn;
    const NAME: &'static str = "user";
    const ID: u16 = 0;
    const KEY: &'static [ScalarType] = &[ScalarType::FixedText(21)];
    const VALUE: &'static [ScalarType] = &[
        ScalarType::Int64,
        ScalarType::FixedText(13),
        ScalarType::FixedText(14),
        ScalarType::FixedText(15),
        ScalarType::Int64,
    ];

    fn column_index(column: UserColumn) -> usize {
        match column {
            UserColumn::UserId => 0,
            UserColumn::Password => 1,
            UserColumn::LastName => 2,
            UserColumn::FirstName => 3,
            UserColumn::Reviews => 4,
        }
    }
}

/// `Movie(title -> movie_id)`.
pub struct MovieSchema;

/// Value columns of [`MovieSchema`].
#[derive(Debug, Clone, Copy)]
pub enum MovieColumn {
    /// Short movie id.
    MovieId,
}

impl Schema for MovieSchema {
    type Column = MovieColumn;
    const NAME: &'static str = "movie";
    const ID: u16 = 1;
    const KEY: &'static [ScalarType] = &[ScalarType::FixedText(100)];
    const VALUE: &'static [ScalarType] = &[ScalarType::FixedText(4)];

    fn column_index(column: MovieColumn) -> usize {
        match column {
            MovieColumn::MovieId => 0,
        }
    }
}

/// `Review(review_id -> req_id, text, rating, ts, movie_id, user_id)`.
pub struct ReviewSchema;

/// Value columns of [`ReviewSchema`].
#[derive(Debug, Clone, Copy)]
pub enum ReviewColumn {
    /// Originating request id.
    ReqId,
    /// Review text.
    Text,
    /// Star rating.
    Rating,
    /// Timestamp.
    Timestamp,
    /// Reviewed movie.
    MovieId,
    /// Authoring user.
    UserId,
}

impl Schema for ReviewSchema {
    type Column = ReviewColumn;
    const NAME: &'static str = "review";
    const ID: u16 = 2;
    const KEY: &'static [ScalarType] = &[ScalarType::Int64];
    const VALUE: &'static [ScalarType] = &[
        ScalarType::Int64,
        ScalarType::FixedText(256),
        ScalarType::Int32,
        ScalarType::Int64,
        ScalarType::FixedText(4),
        ScalarType::Int64,
    ];

    fn column_index(column: ReviewColumn) -> usize {
        match column {
            ReviewColumn::ReqId => 0,
            ReviewColumn::Text => 1,
            ReviewColumn::Rating => 2,
            ReviewColumn::Timestamp => 3,
            ReviewColumn::MovieId => 4,
            ReviewColumn::UserId => 5,
        }
    }
}
