//! [`Room`] definitions.

use std::collections::HashMap;

use common::Money;
use derive_more::{AsRef, Display, From};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

use crate::domain::contract::BillingPeriod;

/// Rentable room of a boarding house.
#[derive(Clone, Debug)]
pub struct Room {
    /// ID of this [`Room`].
    pub id: Id,

    /// [`Number`] of this [`Room`] inside its building.
    pub number: Number,

    /// ID of the building this [`Room`] is located in.
    pub building_id: BuildingId,

    /// ID of the floor this [`Room`] is located on.
    pub floor_id: FloorId,

    /// ID of the type of this [`Room`].
    pub type_id: TypeId,

    /// [`Rates`] set for this exact [`Room`].
    pub rates: Rates,

    /// [`Rates`] set for the type of this [`Room`].
    pub type_rates: Rates,
}

impl Room {
    /// Returns the rent of this [`Room`] for the provided [`BillingPeriod`],
    /// falling back to its type's rent.
    #[must_use]
    pub fn effective_price(&self, period: BillingPeriod) -> Option<Money> {
        self.rates
            .get(period)
            .and_then(|r| r.rent)
            .or_else(|| self.type_rates.get(period).and_then(|r| r.rent))
    }

    /// Returns the deposit of this [`Room`] for the provided
    /// [`BillingPeriod`], falling back to its type's deposit.
    #[must_use]
    pub fn effective_deposit(&self, period: BillingPeriod) -> Option<Money> {
        self.rates
            .get(period)
            .and_then(|r| r.deposit)
            .or_else(|| self.type_rates.get(period).and_then(|r| r.deposit))
    }
}

define_id! {
    #[doc = "ID of a [`Room`]."]
    Id
}

define_id! {
    #[doc = "ID of a building containing [`Room`]s."]
    BuildingId
}

define_id! {
    #[doc = "ID of a floor containing [`Room`]s."]
    FloorId
}

define_id! {
    #[doc = "ID of a [`Room`] type."]
    TypeId
}

/// Number of a [`Room`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(String);

impl Number {
    /// Creates a new [`Number`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        (number.trim() == number && !number.is_empty() && number.len() <= 32)
            .then_some(Self(number))
    }
}

/// Rent and deposit set for a single [`BillingPeriod`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Rate {
    /// Rent per [`BillingPeriod`], if set.
    pub rent: Option<Money>,

    /// Deposit, if set.
    pub deposit: Option<Money>,
}

/// [`Rate`]s of a [`Room`] by [`BillingPeriod`].
#[derive(Clone, Debug, Default, From)]
pub struct Rates(HashMap<BillingPeriod, Rate>);

impl Rates {
    /// Returns the [`Rate`] for the provided [`BillingPeriod`], if any.
    #[must_use]
    pub fn get(&self, period: BillingPeriod) -> Option<Rate> {
        self.0.get(&period).copied()
    }
}

impl FromIterator<(BillingPeriod, Rate)> for Rates {
    fn from_iter<I: IntoIterator<Item = (BillingPeriod, Rate)>>(
        iter: I,
    ) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod spec {
    use common::Money;

    use super::{
        BillingPeriod, BuildingId, FloorId, Id, Number, Rate, Rates, Room,
        TypeId,
    };

    fn room(rates: Rates, type_rates: Rates) -> Room {
        Room {
            id: Id::new(),
            number: Number::new("101").unwrap(),
            building_id: BuildingId::new(),
            floor_id: FloorId::new(),
            type_id: TypeId::new(),
            rates,
            type_rates,
        }
    }

    #[test]
    fn falls_back_to_type_rates_per_field() {
        let room = room(
            [(
                BillingPeriod::Monthly,
                Rate {
                    rent: Some(Money::new(1_200_000)),
                    deposit: None,
                },
            )]
            .into_iter()
            .collect(),
            [
                (
                    BillingPeriod::Monthly,
                    Rate {
                        rent: Some(Money::new(1_000_000)),
                        deposit: Some(Money::new(500_000)),
                    },
                ),
                (
                    BillingPeriod::Daily,
                    Rate {
                        rent: Some(Money::new(80_000)),
                        deposit: None,
                    },
                ),
            ]
            .into_iter()
            .collect(),
        );

        assert_eq!(
            room.effective_price(BillingPeriod::Monthly),
            Some(Money::new(1_200_000)),
        );
        assert_eq!(
            room.effective_deposit(BillingPeriod::Monthly),
            Some(Money::new(500_000)),
        );
        assert_eq!(
            room.effective_price(BillingPeriod::Daily),
            Some(Money::new(80_000)),
        );
        assert_eq!(room.effective_deposit(BillingPeriod::Daily), None);
        assert_eq!(room.effective_price(BillingPeriod::Weekly), None);
    }

    #[test]
    fn validates_number() {
        assert!(Number::new("A-12").is_some());
        assert!(Number::new("").is_none());
        assert!(Number::new(" 12").is_none());
    }
}
