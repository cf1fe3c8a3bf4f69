//! DSH transaction bodies.

use std::sync::Arc;

use meridian_common::hash::fnv_hash_32;

use crate::adapter::StorageAdapter;
use crate::scalar::Scalar;
use crate::table::Table;
use crate::txn::{ErrorSlot, TransactionBody};

use super::schema::{
    HotelColumn, HotelSchema, ReservationCountColumn, ReservationCountSchema, ReservationSchema,
    UserColumn, UserSchema,
};
use super::util::{date_interp, dist, format_uname};
use super::{MAX_HOTEL_PRICE, MAX_STAY, RECOMMENDATION_READ_SIZE};

/// Checks a user's password.
pub struct UserLogin {
    users: Table<UserSchema>,
    username: Scalar,
    password: Scalar,
    stored_password: Option<Scalar>,
    login_ok: bool,
    err: ErrorSlot,
}

impl UserLogin {
    /// Builds the body from the raw (unformatted) username.
    #[must_use]
    pub fn new(adapter: &Arc<dyn StorageAdapter>, username: &str, password: &str) -> Self {
        Self {
            users: Table::new(Arc::clone(adapter)),
            username: Scalar::fixed_text(&format_uname(username), 20),
            password: Scalar::var_text(password, 60),
            stored_password: None,
            login_ok: false,
            err: ErrorSlot::new(),
        }
    }

    /// Whether the password matched, valid after `compute`.
    #[must_use]
    pub fn login_ok(&self) -> bool {
        self.login_ok
    }
}

impl TransactionBody for UserLogin {
    fn read(&mut self) -> bool {
        let res = self
            .users
            .select_columns(&[self.username.clone()], &[UserColumn::Password]);
        match res.into_iter().next() {
            Some(password) => {
                self.stored_password = Some(password);
                true
            }
            None => {
                self.err.set("User does not exist");
                false
            }
        }
    }

    fn compute(&mut self) {
        self.login_ok = self
            .stored_password
            .as_ref()
            .is_some_and(|stored| stored.as_text() == self.password.as_text());
    }

    fn write(&mut self) -> bool {
        true
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}

/// Ranks candidate hotels by distance and checks the nearest available
/// one for capacity on every night of the stay.
pub struct Search {
    hotels: Table<HotelSchema>,
    reservation_counts: Table<ReservationCountSchema>,
    in_date: String,
    out_date: String,
    lat: f64,
    lon: f64,
    hotel_ids: Vec<i32>,
    err: ErrorSlot,
}

impl Search {
    /// Builds the body over up to ten candidate hotels.
    #[must_use]
    pub fn new(
        adapter: &Arc<dyn StorageAdapter>,
        in_date: &str,
        out_date: &str,
        lat: f64,
        lon: f64,
        hotel_ids: &[i32],
    ) -> Self {
        Self {
            hotels: Table::new(Arc::clone(adapter)),
            reservation_counts: Table::new(Arc::clone(adapter)),
            in_date: in_date.to_string(),
            out_date: out_date.to_string(),
            lat,
            lon,
            hotel_ids: hotel_ids
                .iter()
                .copied()
                .take(RECOMMENDATION_READ_SIZE)
                .collect(),
            err: ErrorSlot::new(),
        }
    }
}

impl TransactionBody for Search {
    fn read(&mut self) -> bool {
        let mut ok = true;
        let mut ranking: Vec<(f64, i32)> = Vec::with_capacity(self.hotel_ids.len());
        for &hotel_id in &self.hotel_ids {
            let res = self.hotels.select_columns(
                &[Scalar::Int32(hotel_id)],
                &[HotelColumn::Lat, HotelColumn::Lon],
            );
            if res.len() == 2 {
                let d = dist(self.lat, self.lon, res[0].as_f64(), res[1].as_f64());
                ranking.push((d, hotel_id));
            } else {
                self.err.set("Hotel not found");
                ok = false;
            }
        }
        ranking.sort_by(|a, b| a.0.total_cmp(&b.0));

        let date_range = date_interp(&self.in_date, &self.out_date);
        for &(_, hotel_id) in &ranking {
            let mut all_dates_available = true;
            for date in &date_range {
                let res = self.reservation_counts.select_columns(
                    &[Scalar::Int32(hotel_id), Scalar::fixed_text(date, 10)],
                    &[ReservationCountColumn::Count],
                );
                // A hotel with no reservations that day has no count row;
                // its free-room count is its full capacity.
                let available = match res.first() {
                    Some(count) => count.as_i32(),
                    None => {
                        let cap = self
                            .hotels
                            .select_columns(&[Scalar::Int32(hotel_id)], &[HotelColumn::Capacity]);
                        match cap.first() {
                            Some(capacity) => capacity.as_i32(),
                            None => {
                                self.err.set("Hotel capacity not found");
                                ok = false;
                                continue;
                            }
                        }
                    }
                };
                if available <= 0 {
                    all_dates_available = false;
                    break;
                }
            }
            if all_dates_available {
                break;
            }
        }
        ok
    }

    fn compute(&mut self) {}

    fn write(&mut self) -> bool {
        true
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}

/// Criterion a recommendation optimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationType {
    /// Nearest to the given coordinates.
    Distance,
    /// Highest rating.
    Rating,
    /// Lowest price.
    Price,
}

impl RecommendationType {
    /// Parses the textual form used in procedure arguments.
    #[must_use]
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "distance" => Some(Self::Distance),
            "rating" => Some(Self::Rating),
            "price" => Some(Self::Price),
            _ => None,
        }
    }

    /// The textual form used in procedure arguments.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Distance => "distance",
            Self::Rating => "rating",
            Self::Price => "price",
        }
    }
}

struct HotelRead {
    hotel_id: i32,
    lat: f64,
    lon: f64,
    rating: f64,
    price: f64,
}

/// Picks the best of ten hotels by distance, rating, or price.
pub struct Recommend {
    hotels: Table<HotelSchema>,
    recommendation_type: RecommendationType,
    lat: f64,
    lon: f64,
    hotel_ids: Vec<i32>,
    reads: Vec<HotelRead>,
    chosen_hotel_id: i32,
    err: ErrorSlot,
}

impl Recommend {
    /// Builds the body over up to ten candidate hotels.
    #[must_use]
    pub fn new(
        adapter: &Arc<dyn StorageAdapter>,
        recommendation_type: RecommendationType,
        lat: f64,
        lon: f64,
        hotel_ids: &[i32],
    ) -> Self {
        Self {
            hotels: Table::new(Arc::clone(adapter)),
            recommendation_type,
            lat,
            lon,
            hotel_ids: hotel_ids
                .iter()
                .copied()
                .take(RECOMMENDATION_READ_SIZE)
                .collect(),
            reads: Vec::new(),
            chosen_hotel_id: 0,
            err: ErrorSlot::new(),
        }
    }

    /// The winning hotel, valid after `compute`.
    #[must_use]
    pub fn chosen_hotel_id(&self) -> i32 {
        self.chosen_hotel_id
    }
}

impl TransactionBody for Recommend {
    fn read(&mut self) -> bool {
        let mut ok = true;
        for &hotel_id in &self.hotel_ids {
            let res = self.hotels.select_columns(
                &[Scalar::Int32(hotel_id)],
                &[
                    HotelColumn::Lat,
                    HotelColumn::Lon,
                    HotelColumn::Rating,
                    HotelColumn::Price,
                ],
            );
            if res.len() == 4 {
                self.reads.push(HotelRead {
                    hotel_id,
                    lat: res[0].as_f64(),
                    lon: res[1].as_f64(),
                    rating: res[2].as_f64(),
                    price: res[3].as_f64(),
                });
            } else {
                self.err.set("Cannot find recommendation hotel");
                ok = false;
            }
        }
        ok
    }

    fn compute(&mut self) {
        match self.recommendation_type {
            RecommendationType::Distance => {
                let mut best = f64::MAX;
                for hotel in &self.reads {
                    let d = dist(hotel.lat, hotel.lon, self.lat, self.lon);
                    if d < best {
                        best = d;
                        self.chosen_hotel_id = hotel.hotel_id;
                    }
                }
            }
            RecommendationType::Price => {
                let mut best = MAX_HOTEL_PRICE;
                for hotel in &self.reads {
                    if hotel.price < best {
                        best = hotel.price;
                        self.chosen_hotel_id = hotel.hotel_id;
                    }
                }
            }
            RecommendationType::Rating => {
                let mut best = 0.0;
                for hotel in &self.reads {
                    if hotel.rating > best {
                        best = hotel.rating;
                        self.chosen_hotel_id = hotel.hotel_id;
                    }
                }
            }
        }
    }

    fn write(&mut self) -> bool {
        true
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}

/// Reserves rooms: verifies the user and per-date capacity, then inserts
/// the reservation row and updates every night's free-room count.
pub struct Reservation {
    reservations: Table<ReservationSchema>,
    hotels: Table<HotelSchema>,
    reservation_counts: Table<ReservationCountSchema>,
    users: Table<UserSchema>,
    username: Scalar,
    password: Scalar,
    in_date: String,
    out_date: String,
    hotel_id: i32,
    cust_name: Scalar,
    num_rooms: i32,
    reservation_id: i32,
    date_range: Vec<String>,
    hotel_capacity: i32,
    stored_password: Option<Scalar>,
    new_counts: Vec<i32>,
    correct_password: bool,
    err: ErrorSlot,
}

impl Reservation {
    /// Builds the body from the raw (unformatted) username.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        adapter: &Arc<dyn StorageAdapter>,
        username: &str,
        password: &str,
        in_date: &str,
        out_date: &str,
        hotel_id: i32,
        cust_name: &str,
        num_rooms: i32,
    ) -> Self {
        // The reservation id must come out identical in the
        // key-generation and execution passes, so it is derived from the
        // request rather than drawn from storage state.
        let mut id_material = Vec::new();
        id_material.extend_from_slice(cust_name.as_bytes());
        id_material.extend_from_slice(in_date.as_bytes());
        id_material.extend_from_slice(out_date.as_bytes());
        let reservation_id = fnv_hash_32(&id_material) as i32;

        Self {
            reservations: Table::new(Arc::clone(adapter)),
            hotels: Table::new(Arc::clone(adapter)),
            reservation_counts: Table::new(Arc::clone(adapter)),
            users: Table::new(Arc::clone(adapter)),
            username: Scalar::fixed_text(&format_uname(username), 20),
            password: Scalar::var_text(password, 60),
            in_date: in_date.to_string(),
            out_date: out_date.to_string(),
            hotel_id,
            cust_name: Scalar::var_text(cust_name, 55),
            num_rooms,
            reservation_id,
            date_range: Vec::new(),
            hotel_capacity: 0,
            stored_password: None,
            new_counts: Vec::new(),
            correct_password: false,
            err: ErrorSlot::new(),
        }
    }

    /// Whether the supplied password matched, valid after `compute`.
    #[must_use]
    pub fn password_ok(&self) -> bool {
        self.correct_password
    }
}

impl TransactionBody for Reservation {
    fn read(&mut self) -> bool {
        let mut ok = true;
        let res = self
            .users
            .select_columns(&[self.username.clone()], &[UserColumn::Password]);
        match res.into_iter().next() {
            Some(password) => self.stored_password = Some(password),
            None => {
                self.err.set("User not found");
                ok = false;
            }
        }

        let res = self
            .hotels
            .select_columns(&[Scalar::Int32(self.hotel_id)], &[HotelColumn::Capacity]);
        match res.first() {
            Some(capacity) => self.hotel_capacity = capacity.as_i32(),
            None => {
                self.err.set("Hotel capacity does not exist");
                ok = false;
            }
        }

        if ok && self.num_rooms > self.hotel_capacity {
            self.err.set("Hotel capacity is too low");
            ok = false;
        }

        self.date_range = date_interp(&self.in_date, &self.out_date);
        if self.date_range.len() > MAX_STAY {
            self.err.set("Stay is too long");
            ok = false;
        }

        self.new_counts = vec![0; self.date_range.len()];
        for i in 0..self.date_range.len() {
            let date = self.date_range[i].clone();
            let res = self.reservation_counts.select_columns(
                &[Scalar::Int32(self.hotel_id), Scalar::fixed_text(&date, 10)],
                &[ReservationCountColumn::Count],
            );
            // Even after a failure, keep touching the remaining count keys
            // so the key-generation pass discovers the full set.
            if !ok {
                continue;
            }
            match res.first() {
                // No count row yet: the whole capacity is free that day.
                None => self.new_counts[i] = self.hotel_capacity - self.num_rooms,
                Some(count) => {
                    let new_count = count.as_i32() - self.num_rooms;
                    if new_count < 0 {
                        self.err.set(format!("Too many reservations on {date}"));
                        ok = false;
                    }
                    self.new_counts[i] = new_count;
                }
            }
        }
        ok
    }

    fn compute(&mut self) {
        self.correct_password = self
            .stored_password
            .as_ref()
            .is_some_and(|stored| stored.as_text() == self.password.as_text());
    }

    fn write(&mut self) -> bool {
        for i in 0..self.date_range.len() {
            let date = Scalar::fixed_text(&self.date_range[i], 10);
            // A count equal to capacity minus the request marks a day that
            // had no row yet; it is inserted rather than updated.
            if self.new_counts[i] + self.num_rooms == self.hotel_capacity {
                if !self.reservation_counts.insert(&[
                    Scalar::Int32(self.hotel_id),
                    date,
                    Scalar::Int32(self.new_counts[i]),
                ]) {
                    self.err.set("Reservation count update failed");
                    return false;
                }
                continue;
            }
            if !self.reservation_counts.update(
                &[Scalar::Int32(self.hotel_id), date],
                &[ReservationCountColumn::Count],
                &[Scalar::Int32(self.new_counts[i])],
            ) {
                self.err.set("Reservation count update failed");
                return false;
            }
        }

        if !self.reservations.insert(&[
            Scalar::Int32(self.hotel_id),
            Scalar::Int32(self.reservation_id),
            self.cust_name.clone(),
            Scalar::fixed_text(&self.in_date, 10),
            Scalar::fixed_text(&self.out_date, 10),
            Scalar::Int32(self.num_rooms),
        ]) {
            self.err.set("Reservation insertion failed");
            return false;
        }
        true
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}
