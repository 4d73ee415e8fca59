//! [`Contract`] definitions.

use common::{calendar, define_kind, unit, DateTimeOf, Money};
use derive_more::{Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::{invoice, room, user};
#[cfg(doc)]
use crate::domain::{Invoice, Room, User};

/// Room rental contract of a tenant.
#[derive(Clone, Debug)]
pub struct Contract {
    /// ID of this [`Contract`].
    pub id: Id,

    /// Human-facing [`Number`] of this [`Contract`].
    pub number: Number,

    /// ID of the rented [`Room`].
    pub room_id: room::Id,

    /// ID of the [`User`] renting the [`Room`].
    pub tenant_id: user::Id,

    /// [`Term`] of this [`Contract`].
    pub term: Term,

    /// Day of month the recurring monthly invoices are aligned to.
    pub billing_day: u8,

    /// Rent per billing period, after promotions are applied.
    pub rent: Money,

    /// Deposit to be paid once, after promotions are applied.
    pub deposit: Money,

    /// How the monthly rent of this [`Contract`] is invoiced.
    pub invoice_mode: InvoiceMode,

    /// [`Status`] of this [`Contract`].
    pub status: Status,

    /// [`DateTime`] when this [`Contract`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

define_id! {
    #[doc = "ID of a [`Contract`]."]
    Id
}

/// Sequential human-facing number of a [`Contract`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(i64);

/// Rental term of a [`Contract`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Term {
    /// First day of the rental.
    pub start: Date,

    /// Checkout day of the rental (exclusive).
    pub end: Date,

    /// [`BillingPeriod`] the [`Term::duration`] is expressed in.
    pub period: BillingPeriod,

    /// Number of [`BillingPeriod`]s the rental lasts.
    pub duration: u32,
}

impl Term {
    /// Creates a new [`Term`] computing its end from the provided `start`,
    /// `period` and `duration`.
    #[must_use]
    pub fn new(start: Date, period: BillingPeriod, duration: u32) -> Self {
        Self {
            start,
            end: period.advance(start, duration),
            period,
            duration,
        }
    }

    /// Indicates whether this [`Term`] intersects the `[start, end)` range.
    #[must_use]
    pub fn overlaps(&self, start: Date, end: Date) -> bool {
        self.start < end && start < self.end
    }
}

define_kind! {
    #[doc = "Period a rent is billed by."]
    enum BillingPeriod {
        #[doc = "Rent is billed per day."]
        Daily = 1,

        #[doc = "Rent is billed per week."]
        Weekly = 2,

        #[doc = "Rent is billed per calendar month."]
        Monthly = 3,
    }
}

impl BillingPeriod {
    /// Advances the provided [`Date`] by the provided number of these
    /// [`BillingPeriod`]s.
    #[must_use]
    pub fn advance(self, date: Date, count: u32) -> Date {
        match self {
            Self::Daily => calendar::add_days(date, count),
            Self::Weekly => calendar::add_days(date, count.saturating_mul(7)),
            Self::Monthly => calendar::add_months(date, count),
        }
    }

    /// Returns the [`invoice::item::Unit`] a rent of this [`BillingPeriod`]
    /// is measured in.
    #[must_use]
    pub fn unit(self) -> invoice::item::Unit {
        use invoice::item::Unit;

        match self {
            Self::Daily => Unit::Day,
            Self::Weekly => Unit::Week,
            Self::Monthly => Unit::Month,
        }
    }
}

define_kind! {
    #[doc = "Mode of invoicing a monthly [`Contract`]."]
    enum InvoiceMode {
        #[doc = "A single [`Invoice`] covers the whole term."]
        Full = 1,

        #[doc = "An [`Invoice`] is issued for every month of the term."]
        PerMonth = 2,
    }
}

define_kind! {
    #[doc = "Status of a [`Contract`]."]
    enum Status {
        #[doc = "The [`Contract`] awaits its first payment."]
        Pending = 1,

        #[doc = "The [`Contract`] is in effect."]
        Active = 2,

        #[doc = "The [`Contract`] term is over."]
        Ended = 3,

        #[doc = "The [`Contract`] was cancelled."]
        Cancelled = 4,
    }
}

/// [`DateTime`] when a [`Contract`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Contract, unit::Creation)>;
