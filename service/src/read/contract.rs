//! [`Contract`] read models definitions.

use time::Date;

use crate::domain::room;
#[cfg(doc)]
use crate::domain::{Contract, Room};

/// Days a [`Room`] is requested to be booked for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Booking {
    /// ID of the requested [`Room`].
    pub room_id: room::Id,

    /// First booked day.
    pub start: Date,

    /// Checkout day (exclusive).
    pub end: Date,
}

/// Wrapper around a non-cancelled [`Contract`] intersecting a [`Booking`].
#[derive(Clone, Copy, Debug)]
pub struct Overlapping<T>(pub T);
