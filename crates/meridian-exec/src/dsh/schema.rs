//! Table schemas of the DSH family.

use crate::scalar::ScalarType;
use crate::table::Schema;

/// `User(username -> password)`; the username is the 20-byte formatted form.
pub struct UserSchema;

/// Value columns of [`UserSchema`].
#[derive(Debug, Clone, Copy)]
pub enum UserColumn {
    /// Stored password.
    Password,
}

impl Schema for UserSchema {
    type Column = UserColumn;
    const NAME: &'static str = "user";
    const ID: u16 = 0;
    const KEY: &'static [ScalarType] = &[ScalarType::FixedText(20)];
    const VALUE: &'static [ScalarType] = &[ScalarType::VarText(60)];

    fn column_index(column: UserColumn) -> usize {
        match column {
            UserColumn::Password => 0,
        }
    }
}

/// `Hotel(id -> lat, lon, rating, price, capacity)`.
pub struct HotelSchema;

/// Value columns of [`HotelSchema`].
#[derive(Debug, Clone, Copy)]
pub enum HotelColumn {
    /// Latitude.
    Lat,
    /// Longitude.
    Lon,
    /// Guest rating in `[0, 5]`.
    Rating,
    /// Nightly price.
    Price,
    /// Total rooms.
    Capacity,
}

impl Schema for HotelSchema {
    type Column = HotelColumn;
    const NAME: &'static str = "hotel";
    const ID: u16 = 1;
    const KEY: &'static [ScalarType] = &[ScalarType::Int32];
    const VALUE: &'static [ScalarType] = &[
        ScalarType::Float64,
        ScalarType::Float64,
        ScalarType::Float64,
        ScalarType::Float64,
        ScalarType::Int32,
    ];

    fn column_index(column: HotelColumn) -> usize {
        match column {
            HotelColumn::Lat => 0,
            HotelColumn::Lon => 1,
            HotelColumn::Rating => 2,
            HotelColumn::Price => 3,
            HotelColumn::Capacity => 4,
        }
    }
}

/// `ReservationCount(hotel_id, date -> count)`: rooms still free on a day.
///
/// Rows appear lazily; a missing row means the hotel is at full capacity
/// that day.
pub struct ReservationCountSchema;

/// Value columns of [`ReservationCountSchema`].
#[derive(Debug, Clone, Copy)]
pub enum ReservationCountColumn {
    /// Rooms still available.
    Count,
}

impl Schema for ReservationCountSchema {
    type Column = ReservationCountColumn;
    const NAME: &'static str = "reservation_count";
    const ID: u16 = 2;
    const KEY: &'static [ScalarType] = &[ScalarType::Int32, ScalarType::FixedText(10)];
    const VALUE: &'static [ScalarType] = &[ScalarType::Int32];

    fn column_index(column: ReservationCountColumn) -> usize {
        match column {
            ReservationCountColumn::Count => 0,
        }
    }
}

/// `Reservation(hotel_id, rid -> cust, in, out, rooms)`.
pub struct ReservationSchema;

/// Value columns of [`ReservationSchema`].
#[derive(Debug, Clone, Copy)]
pub enum ReservationColumn {
    /// Customer name.
    Customer,
    /// Check-in date.
    InDate,
    /// Check-out date.
    OutDate,
    /// Rooms reserved.
    Rooms,
}

impl Schema for ReservationSchema {
    type Column = ReservationColumn;
    const NAME: &'static str = "reservation";
    const ID: u16 = 3;
    const KEY: &'static [ScalarType] = &[ScalarType::Int32, ScalarType::Int32];
    const VALUE: &'static [ScalarType] = &[
        ScalarType::VarText(55),
        ScalarType::FixedText(10),
        ScalarType::FixedText(10),
        ScalarType::Int32,
    ];

    fn column_index(column: ReservationColumn) -> usize {
        match column {
            ReservationColumn::Customer => 0,
            ReservationColumn::InDate => 1,
            ReservationColumn::OutDate => 2,
            ReservationColumn::Rooms => 3,
        }
    }
}
