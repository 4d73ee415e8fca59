//! [`Percent`]-related definitions.

use std::{fmt, str::FromStr};

#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{prelude::ToPrimitive as _, Decimal};
use serde::{Deserialize, Serialize};

/// Percentage with a basis point (1/100 of a percent) precision.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[serde(try_from = "i32", into = "i32")]
pub struct Percent(i32);

impl Percent {
    /// Number of basis points in a whole (`100%`).
    pub const BPS_SCALE: i32 = 10_000;

    /// Creates a new [`Percent`] from the provided basis points, checking
    /// they are within `0..=10000` range.
    #[must_use]
    pub fn from_bps(bps: i32) -> Option<Self> {
        (0..=Self::BPS_SCALE).contains(&bps).then_some(Self(bps))
    }

    /// Returns basis points of this [`Percent`].
    #[must_use]
    pub const fn bps(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for Percent {
    type Error = &'static str;

    fn try_from(bps: i32) -> Result<Self, Self::Error> {
        Self::from_bps(bps).ok_or("basis points out of `0..=10000` range")
    }
}

impl From<Percent> for i32 {
    fn from(p: Percent) -> Self {
        p.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = Decimal::from(self.0) / Decimal::ONE_HUNDRED;
        write!(f, "{}%", value.normalize())
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    /// Parses a [`Percent`] from its `{value}%` representation, where the
    /// `%` sign is optional and `value` has at most two fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().strip_suffix('%').unwrap_or(s.trim());
        let bps = Decimal::from_str(value)
            .map_err(|_| "invalid percent value")?
            * Decimal::ONE_HUNDRED;
        if !bps.fract().is_zero() {
            return Err("too precise percent value");
        }
        bps.to_i32()
            .and_then(Self::from_bps)
            .ok_or("percent value out of `0..=100` range")
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Percentage in `{value}%` format with at most two fractional digits.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Percent = super::Percent;

    impl Percent {
        fn to_output<S: ScalarValue>(m: &Percent) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Percent` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Percent` input scalar: {e}")
                    })
                })
        }
    }
}
