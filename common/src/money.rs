//! [`Money`]-related definitions.

use std::{fmt, iter, ops, str::FromStr};

use derive_more::{From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{prelude::ToPrimitive as _, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::Percent;

/// Amount of money in the minor units of Indonesian Rupiah.
///
/// All the pricing and billing arithmetic is performed on whole minor units,
/// so every division states its rounding policy explicitly.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
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
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates a new [`Money`] from the provided amount of minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the amount of minor units of this [`Money`].
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Indicates whether this [`Money`] is strictly greater than zero.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Multiplies this [`Money`] by the provided quantity, saturating on
    /// overflow.
    #[must_use]
    pub fn times(self, qty: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(qty)))
    }

    /// Subtracts the provided amount, never going below zero.
    #[must_use]
    pub fn deduct(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0).max(0))
    }

    /// Clamps this [`Money`] into the `[0, max]` range.
    ///
    /// A negative `max` is treated as zero.
    #[must_use]
    pub fn clamp_to(self, max: Self) -> Self {
        self.max(Self::ZERO).min(max.max(Self::ZERO))
    }

    /// Returns the provided [`Percent`] of this [`Money`], rounded down.
    #[must_use]
    pub fn percent_floor(self, percent: Percent) -> Self {
        let raw = i128::from(self.0) * i128::from(percent.bps());
        let floored = raw.div_euclid(i128::from(Percent::BPS_SCALE));
        Self(i64::try_from(floored).unwrap_or(i64::MAX))
    }

    /// Divides this [`Money`] by the provided `divisor`, rounding down.
    ///
    /// Returns [`Money::ZERO`] if the `divisor` is zero.
    #[must_use]
    pub fn div_floor(self, divisor: u32) -> Self {
        if divisor == 0 {
            return Self::ZERO;
        }
        Self(self.0.div_euclid(i64::from(divisor)))
    }

    /// Divides this [`Money`] by the provided `divisor`, rounding half away
    /// from zero.
    ///
    /// Returns [`Money::ZERO`] if the `divisor` is zero.
    #[must_use]
    pub fn div_rounded(self, divisor: u32) -> Self {
        if divisor == 0 {
            return Self::ZERO;
        }
        let quotient = (Decimal::from(self.0) / Decimal::from(divisor))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Self(quotient.to_i64().unwrap_or(i64::MAX))
    }
}

impl ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl ops::Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, ops::Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{CURRENCY}", self.0)
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = s.strip_suffix(CURRENCY).unwrap_or(s);
        if amount.is_empty() {
            return Err("empty amount");
        }
        amount
            .replace('_', "")
            .parse::<i64>()
            .map(Self)
            .map_err(|_| "invalid amount")
    }
}

/// Code of the only supported currency.
const CURRENCY: &str = "IDR";

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Money in `{minor}IDR` format, where `minor` is an integer amount of
    /// Rupiah minor units (the `IDR` suffix is optional on input).
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use crate::Percent;

    use super::Money;

    #[test]
    fn from_str() {
        assert_eq!(Money::from_str("1500000IDR"), Ok(Money::new(1_500_000)));
        assert_eq!(Money::from_str("1500000"), Ok(Money::new(1_500_000)));
        assert_eq!(Money::from_str("1_500_000"), Ok(Money::new(1_500_000)));

        assert!(Money::from_str("IDR").is_err());
        assert!(Money::from_str("").is_err());
        assert!(Money::from_str("15.5IDR").is_err());
        assert!(Money::from_str("15USD").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(Money::new(1_500_000).to_string(), "1500000IDR");
        assert_eq!(Money::ZERO.to_string(), "0IDR");
    }

    #[test]
    fn percent_floors() {
        let bps = |v| Percent::from_bps(v).unwrap();

        assert_eq!(
            Money::new(1_500_000).percent_floor(bps(2000)),
            Money::new(300_000),
        );
        assert_eq!(Money::new(999).percent_floor(bps(1000)), Money::new(99));
        assert_eq!(Money::new(1).percent_floor(bps(9999)), Money::ZERO);
        assert_eq!(
            Money::new(12_345).percent_floor(bps(10_000)),
            Money::new(12_345),
        );
    }

    #[test]
    fn divides_rounding_half_away_from_zero() {
        assert_eq!(Money::new(1_000_000).div_rounded(30), Money::new(33_333));
        assert_eq!(Money::new(1_000_000).div_rounded(31), Money::new(32_258));
        assert_eq!(Money::new(15).div_rounded(2), Money::new(8));
        assert_eq!(Money::new(25).div_rounded(10), Money::new(3));
        assert_eq!(Money::new(24).div_rounded(10), Money::new(2));
        assert_eq!(Money::new(7).div_rounded(0), Money::ZERO);
    }

    #[test]
    fn divides_rounding_down() {
        assert_eq!(Money::new(1_000_000).div_floor(30), Money::new(33_333));
        assert_eq!(Money::new(59).div_floor(30), Money::new(1));
        assert_eq!(Money::new(7).div_floor(0), Money::ZERO);
    }

    #[test]
    fn deducts_and_clamps_without_going_negative() {
        assert_eq!(Money::new(100).deduct(Money::new(150)), Money::ZERO);
        assert_eq!(Money::new(100).deduct(Money::new(40)), Money::new(60));

        assert_eq!(Money::new(150).clamp_to(Money::new(100)), Money::new(100));
        assert_eq!(Money::new(-5).clamp_to(Money::new(100)), Money::ZERO);
        assert_eq!(Money::new(5).clamp_to(Money::new(-1)), Money::ZERO);
    }

    #[test]
    fn sums() {
        let total: Money =
            [Money::new(199_998), Money::new(1_000_000), Money::new(500_000)]
                .into_iter()
                .sum();
        assert_eq!(total, Money::new(1_699_998));
    }
}
