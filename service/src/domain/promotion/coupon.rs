//! [`Coupon`] definitions.

use common::{unit, DateTime, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

#[cfg(doc)]
use crate::domain::Promotion;

/// Code unlocking a [`Promotion`].
#[derive(Clone, Debug)]
pub struct Coupon {
    /// ID of this [`Coupon`].
    pub id: Id,

    /// [`Code`] of this [`Coupon`].
    pub code: Code,

    /// Whether this [`Coupon`] is enabled.
    pub is_active: bool,

    /// [`DateTime`] this [`Coupon`] stops being accepted at, if any.
    pub expires_at: Option<ExpirationDateTime>,

    /// Number of times this [`Coupon`] may be redeemed, if limited.
    ///
    /// Not enforced during pricing evaluation.
    pub max_redemptions: Option<u32>,
}

impl Coupon {
    /// Indicates whether this [`Coupon`] is accepted at the provided moment.
    #[must_use]
    pub fn is_redeemable(&self, now: DateTime) -> bool {
        self.is_active && self.expires_at.map_or(true, |e| now < e.coerce())
    }
}

define_id! {
    #[doc = "ID of a [`Coupon`]."]
    Id
}

/// Code of a [`Coupon`], matched exactly.
#[derive(AsRef, Clone, Debug, Display, Eq, From, FromStr, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Code(String);

impl From<&str> for Code {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// [`DateTime`] when a [`Coupon`] expires.
pub type ExpirationDateTime = DateTimeOf<(Coupon, unit::Expiration)>;
