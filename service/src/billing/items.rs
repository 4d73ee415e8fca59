//! Builders of [`Item`]s.

use common::{calendar, Money};
use time::Date;

use crate::domain::{
    contract::BillingPeriod,
    invoice::item::{Code, Item, Meta, Unit},
};

use super::release;

/// Builds a [`Code::Rent`] [`Item`] of the provided number of
/// [`BillingPeriod`]s.
pub(super) fn rent(rent: Money, period: BillingPeriod, qty: u32) -> Item {
    let unit = period.unit();
    Item {
        code: Code::Rent,
        label: format!(
            "Rent for {qty} {unit}{}",
            if qty == 1 { "" } else { "s" },
        ),
        amount: rent.times(qty),
        meta: Meta {
            unit,
            qty,
            unit_price: rent,
        },
    }
}

/// Builds a [`Code::Prorata`] [`Item`] of the days in the `[from, until)`
/// range.
///
/// [`Meta::unit_price`] is the daily rate of the month `from` belongs to.
pub(super) fn prorata(monthly_rent: Money, from: Date, until: Date) -> Item {
    let last = until.previous_day().unwrap_or(until);
    Item {
        code: Code::Prorata,
        label: format!("Prorated rent from {from} to {last}"),
        amount: release::prorate(monthly_rent, from, until),
        meta: Meta {
            unit: Unit::Day,
            qty: calendar::days_between(from, until),
            unit_price: release::daily_rate(monthly_rent, from),
        },
    }
}

/// Builds a [`Code::Deposit`] [`Item`].
pub(super) fn deposit(deposit: Money) -> Item {
    Item {
        code: Code::Deposit,
        label: "Deposit".into(),
        amount: deposit,
        meta: Meta {
            unit: Unit::Once,
            qty: 1,
            unit_price: deposit,
        },
    }
}
