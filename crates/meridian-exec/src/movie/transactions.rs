//! Movie transaction bodies.

use std::sync::Arc;

use crate::adapter::StorageAdapter;
use crate::scalar::Scalar;
use crate::table::Table;
use crate::txn::{ErrorSlot, TransactionBody};

use super::schema::{MovieColumn, MovieSchema, ReviewSchema, UserColumn, UserSchema};

/// Appends a review: reads the user and the movie, bumps the user's
/// review counter, and inserts the review row.
pub struct NewReview {
    user: Table<UserSchema>,
    movie: Table<MovieSchema>,
    review: Table<ReviewSchema>,
    username: Scalar,
    title: Scalar,
    rating: i32,
    timestamp: i64,
    req_id: i64,
    review_id: i64,
    text: Scalar,
    user_id: i64,
    movie_id: Option<Scalar>,
    reviews: i64,
    new_reviews: i64,
    err: ErrorSlot,
}

impl NewReview {
    /// Builds the body.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        adapter: &Arc<dyn StorageAdapter>,
        req_id: i64,
        rating: i32,
        username: &str,
        title: &str,
        timestamp: i64,
        review_id: i64,
        text: &str,
    ) -> Self {
        Self {
            user: Table::new(Arc::clone(adapter)),
            movie: Table::new(Arc::clone(adapter)),
            review: Table::new(Arc::clone(adapter)),
            username: Scalar::fixed_text(username, 21),
            title: Scalar::fixed_text(title, 100),
            rating,
            timestamp,
            req_id,
            review_id,
            text: Scalar::fixed_text(text, 256),
            user_id: 0,
            movie_id: None,
            reviews: 0,
            new_reviews: 0,
            err: ErrorSlot::new(),
        }
    }

    /// The authoring user's id, valid after `read`.
    #[must_use]
    pub fn user_id(&self) -> i64 {
        self.user_id
    }
}

impl TransactionBody for NewReview {
    fn read(&mut self) -> bool {
        let mut ok = true;
        let res = self.user.select_columns(
            &[self.username.clone()],
            &[UserColumn::UserId, UserColumn::Reviews],
        );
        if res.len() == 2 {
            self.user_id = res[0].as_i64();
            self.reviews = res[1].as_i64();
        } else {
            self.err.set("User does not exist");
            ok = false;
        }

        let res = self
            .movie
            .select_columns(&[self.title.clone()], &[MovieColumn::MovieId]);
        match res.into_iter().next() {
            Some(movie_id) => self.movie_id = Some(movie_id),
            None => {
                self.err.set("Movie does not exist");
                ok = false;
            }
        }
        ok
    }

    fn compute(&mut self) {
        self.new_reviews = self.reviews + 1;
    }

    fn write(&mut self) -> bool {
        let mut ok = true;
        let movie_id = self
            .movie_id
            .clone()
            .unwrap_or_else(|| Scalar::fixed_text("", 4));
        if !self.review.insert(&[
            Scalar::Int64(self.review_id),
            Scalar::Int64(self.req_id),
            self.text.clone(),
            Scalar::Int32(self.rating),
            Scalar::Int64(self.timestamp),
            movie_id,
            Scalar::Int64(self.user_id),
        ]) {
            self.err.set("Could not insert review");
            ok = false;
        }
        if !self.user.update(
            &[self.username.clone()],
            &[UserColumn::Reviews],
            &[Scalar::Int64(self.new_reviews)],
        ) {
            self.err.set("Could not update user reviews");
            ok = false;
        }
        ok
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}
