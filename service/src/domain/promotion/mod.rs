//! [`Promotion`] definitions.

pub mod action;
pub mod coupon;
pub mod rule;
pub mod scope;

use common::define_kind;
use derive_more::{AsRef, Display, From, FromStr};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use time::Date;

use crate::domain::Room;

pub use self::{action::Action, coupon::Coupon, rule::Rule, scope::Scope};

/// Admin-authored discount campaign.
#[derive(Clone, Debug)]
pub struct Promotion {
    /// ID of this [`Promotion`].
    pub id: Id,

    /// [`Slug`] of this [`Promotion`].
    pub slug: Slug,

    /// Dates this [`Promotion`] is valid within.
    pub validity: Validity,

    /// How this [`Promotion`] combines with the others.
    pub stack_mode: StackMode,

    /// Evaluation order of this [`Promotion`] (ascending).
    pub priority: i32,

    /// [`Channel`] this [`Promotion`] is restricted to, if any.
    pub default_channel: Option<Channel>,

    /// Whether this [`Promotion`] requires a [`Coupon`].
    ///
    /// [`None`] means it applies both with and without a [`Coupon`].
    pub require_coupon: Option<bool>,

    /// Whether this [`Promotion`] is enabled.
    pub is_active: bool,

    /// [`Scope`]s this [`Promotion`] is limited to.
    ///
    /// Empty means global.
    pub scopes: Vec<Scope>,

    /// [`Rule`]s qualifying this [`Promotion`], any of which is enough.
    ///
    /// Empty means always qualified.
    pub rules: Vec<Rule>,

    /// [`Action`]s of this [`Promotion`], ordered by their priority.
    pub actions: Vec<Action>,

    /// [`Coupon`]s unlocking this [`Promotion`].
    pub coupons: Vec<Coupon>,
}

impl Promotion {
    /// Indicates whether this [`Promotion`] may apply on the provided local
    /// date to a request with or without a coupon.
    ///
    /// Mirrors the predicate used when selecting candidates from a database.
    #[must_use]
    pub fn is_candidate(&self, today: Date, with_coupon: bool) -> bool {
        self.is_active
            && self.validity.contains(today)
            && self.require_coupon.map_or(true, |r| r == with_coupon)
    }

    /// Indicates whether this [`Promotion`] is in scope of the provided
    /// [`Room`].
    #[must_use]
    pub fn covers(&self, room: &Room) -> bool {
        self.scopes.is_empty() || self.scopes.iter().any(|s| s.covers(room))
    }

    /// Indicates whether any of the [`Rule`]s of this [`Promotion`] is
    /// satisfied by the provided [`rule::Facts`].
    #[must_use]
    pub fn qualifies(&self, facts: &rule::Facts<'_>) -> bool {
        self.rules.is_empty() || self.rules.iter().any(|r| r.matches(facts))
    }
}

define_id! {
    #[doc = "ID of a [`Promotion`]."]
    Id
}

/// URL-friendly unique name of a [`Promotion`].
#[derive(AsRef, Clone, Debug, Display, Eq, From, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Slug(String);

/// Sales channel a booking is made through.
#[derive(AsRef, Clone, Debug, Display, Eq, From, FromStr, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Channel(String);

impl From<&str> for Channel {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Inclusive range of dates, unbounded on the absent sides.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Validity {
    /// First valid date.
    pub from: Option<Date>,

    /// Last valid date.
    pub until: Option<Date>,
}

impl Validity {
    /// Indicates whether the provided [`Date`] is within this [`Validity`].
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.from.map_or(true, |f| f <= date)
            && self.until.map_or(true, |u| date <= u)
    }
}

define_kind! {
    #[doc = "Mode of combining a [`Promotion`] with the others."]
    enum StackMode {
        #[doc = "Adds up with every other applicable [`Promotion`]."]
        Stack = 1,

        #[doc = "Only the greatest of such [`Promotion`]s applies."]
        HighestOnly = 2,

        #[doc = "Only the greatest of such [`Promotion`]s applies, \
                 discarding all the others."]
        Exclusive = 3,
    }
}

#[cfg(test)]
mod spec {
    use time::macros::date;

    use super::Validity;

    #[test]
    fn validity_is_inclusive_and_unbounded_when_absent() {
        let v = Validity {
            from: Some(date!(2025 - 01 - 01)),
            until: Some(date!(2025 - 01 - 31)),
        };
        assert!(v.contains(date!(2025 - 01 - 01)));
        assert!(v.contains(date!(2025 - 01 - 31)));
        assert!(!v.contains(date!(2024 - 12 - 31)));
        assert!(!v.contains(date!(2025 - 02 - 01)));

        assert!(Validity::default().contains(date!(1999 - 01 - 01)));
        assert!(Validity {
            from: None,
            until: Some(date!(2025 - 01 - 31)),
        }
        .contains(date!(2000 - 06 - 15)));
    }
}
