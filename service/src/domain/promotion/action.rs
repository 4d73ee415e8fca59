//! [`Action`] definitions.

use std::ops;

use common::{define_kind, Money, Percent};

#[cfg(doc)]
use crate::domain::Promotion;

/// Discount granted by a [`Promotion`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Action {
    /// [`Kind`] of this [`Action`] with its magnitudes.
    pub kind: Kind,

    /// Base amounts this [`Action`] discounts.
    pub target: Target,

    /// Upper bound of the discount per base amount, if any.
    pub max_discount: Option<Money>,

    /// Evaluation order of this [`Action`] (ascending).
    pub priority: i32,
}

/// Kind of an [`Action`] along with its magnitudes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    /// Percentage of the base amount.
    Percent {
        /// Discounted percentage.
        percent: Percent,
    },

    /// Fixed amount off the base amount.
    Amount {
        /// Discounted amount.
        amount: Money,
    },

    /// Base amount lowered to a fixed price.
    FixedPrice {
        /// Price to lower the base amount to.
        price: Money,
    },

    /// Free days of rent.
    FreeNDays {
        /// Number of free days.
        days: u32,
    },

    /// Percentage of the base amount for the leading billing periods only.
    FirstNPeriodsPercent {
        /// Discounted percentage.
        percent: Percent,

        /// Number of leading billing periods.
        periods: u32,
    },

    /// Fixed amount off the base amount for the leading billing periods only.
    FirstNPeriodsAmount {
        /// Discounted amount.
        amount: Money,

        /// Number of leading billing periods.
        periods: u32,
    },
}

impl Kind {
    /// Returns the stored [`Tag`] of this [`Kind`].
    #[must_use]
    pub fn tag(&self) -> Tag {
        match self {
            Self::Percent { .. } => Tag::Percent,
            Self::Amount { .. } => Tag::Amount,
            Self::FixedPrice { .. } => Tag::FixedPrice,
            Self::FreeNDays { .. } => Tag::FreeNDays,
            Self::FirstNPeriodsPercent { .. } => Tag::FirstNPeriodsPercent,
            Self::FirstNPeriodsAmount { .. } => Tag::FirstNPeriodsAmount,
        }
    }
}

define_kind! {
    #[doc = "Stored discriminant of an action [`Kind`]."]
    enum Tag {
        #[doc = "[`Kind::Percent`]."]
        Percent = 1,

        #[doc = "[`Kind::Amount`]."]
        Amount = 2,

        #[doc = "[`Kind::FixedPrice`]."]
        FixedPrice = 3,

        #[doc = "[`Kind::FreeNDays`]."]
        FreeNDays = 4,

        #[doc = "[`Kind::FirstNPeriodsPercent`]."]
        FirstNPeriodsPercent = 5,

        #[doc = "[`Kind::FirstNPeriodsAmount`]."]
        FirstNPeriodsAmount = 6,
    }
}

/// Stored magnitudes of an [`Action`], only some of which are meaningful for
/// its [`Tag`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Magnitudes {
    /// Percentage, in basis points.
    pub percent_bps: Option<i32>,

    /// Fixed amount.
    pub amount: Option<Money>,

    /// Fixed price.
    pub fixed_price: Option<Money>,

    /// Number of days.
    pub days: Option<i32>,

    /// Number of billing periods.
    pub periods: Option<i32>,
}

impl Kind {
    /// Assembles a [`Kind`] out of its stored [`Tag`] and [`Magnitudes`].
    ///
    /// [`None`] is returned if a [`Magnitudes`] field required by the [`Tag`]
    /// is absent or out of range.
    #[must_use]
    pub fn assemble(tag: Tag, m: Magnitudes) -> Option<Self> {
        let percent = || m.percent_bps.and_then(Percent::from_bps);
        let count = |v: Option<i32>| v.and_then(|v| u32::try_from(v).ok());
        let amount = || m.amount.filter(|a| *a >= Money::ZERO);

        Some(match tag {
            Tag::Percent => Self::Percent {
                percent: percent()?,
            },
            Tag::Amount => Self::Amount { amount: amount()? },
            Tag::FixedPrice => Self::FixedPrice {
                price: m.fixed_price.filter(|p| *p >= Money::ZERO)?,
            },
            Tag::FreeNDays => Self::FreeNDays {
                days: count(m.days)?,
            },
            Tag::FirstNPeriodsPercent => Self::FirstNPeriodsPercent {
                percent: percent()?,
                periods: count(m.periods)?,
            },
            Tag::FirstNPeriodsAmount => Self::FirstNPeriodsAmount {
                amount: amount()?,
                periods: count(m.periods)?,
            },
        })
    }
}

/// Base amounts an [`Action`] applies to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Target {
    /// Whether the rent is targeted.
    pub rent: bool,

    /// Whether the deposit is targeted.
    pub deposit: bool,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            rent: true,
            deposit: false,
        }
    }
}

/// Inputs an [`Action`] discount is computed from.
#[derive(Clone, Copy, Debug)]
pub struct Basis {
    /// Base rent, if priced.
    pub rent: Option<Money>,

    /// Base deposit, if priced.
    pub deposit: Option<Money>,

    /// Price of a single rent day used by [`Kind::FreeNDays`].
    pub per_day_rate: Money,

    /// 1-based index of the billed period.
    pub period_index: u32,
}

/// Discount of rent and deposit.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Discount {
    /// Discount of the rent.
    pub rent: Money,

    /// Discount of the deposit.
    pub deposit: Money,
}

impl Discount {
    /// Returns the total of this [`Discount`].
    #[must_use]
    pub fn total(&self) -> Money {
        self.rent + self.deposit
    }

    /// Indicates whether this [`Discount`] discounts anything.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.rent.is_positive() || self.deposit.is_positive()
    }

    /// Clamps this [`Discount`] to the provided base amounts independently.
    #[must_use]
    pub fn clamp_to(self, rent: Option<Money>, deposit: Option<Money>) -> Self {
        Self {
            rent: self.rent.clamp_to(rent.unwrap_or_default()),
            deposit: self.deposit.clamp_to(deposit.unwrap_or_default()),
        }
    }
}

impl ops::Add for Discount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            rent: self.rent + rhs.rent,
            deposit: self.deposit + rhs.deposit,
        }
    }
}

impl std::iter::Sum for Discount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), ops::Add::add)
    }
}

impl Action {
    /// Computes the [`Discount`] of this [`Action`] for the provided
    /// [`Basis`].
    ///
    /// The rent and deposit parts are computed independently, each only if
    /// targeted and priced.
    #[must_use]
    pub fn discount(&self, basis: &Basis) -> Discount {
        let part = |targeted: bool, base: Option<Money>| {
            base.filter(|_| targeted)
                .map_or(Money::ZERO, |b| self.raw_discount(b, basis))
        };
        Discount {
            rent: part(self.target.rent, basis.rent),
            deposit: part(self.target.deposit, basis.deposit),
        }
    }

    /// Computes the discount of a single `base` amount, capped by
    /// [`Action::max_discount`].
    fn raw_discount(&self, base: Money, basis: &Basis) -> Money {
        let within = |periods: u32| basis.period_index <= periods;

        let raw = match self.kind {
            Kind::Percent { percent } => base.percent_floor(percent),
            Kind::Amount { amount } => base.min(amount),
            Kind::FixedPrice { price } => base.deduct(price),
            Kind::FreeNDays { days } => basis.per_day_rate.times(days),
            Kind::FirstNPeriodsPercent { percent, periods } => {
                if within(periods) {
                    base.percent_floor(percent)
                } else {
                    Money::ZERO
                }
            }
            Kind::FirstNPeriodsAmount { amount, periods } => {
                if within(periods) {
                    base.min(amount)
                } else {
                    Money::ZERO
                }
            }
        };
        self.max_discount.map_or(raw, |cap| raw.min(cap)).max(Money::ZERO)
    }
}
