//! [`Invoice`] definitions.

use common::{define_kind, unit, DateTimeOf, Money};
use time::Date;

use crate::domain::contract;
#[cfg(doc)]
use crate::domain::Contract;

pub use self::item::Item;

/// Bill for a single period of a [`Contract`].
#[derive(Clone, Debug)]
pub struct Invoice {
    /// ID of this [`Invoice`].
    pub id: Id,

    /// ID of the [`Contract`] this [`Invoice`] bills.
    pub contract_id: contract::Id,

    /// First billed day.
    pub period_start: Date,

    /// Day the billed period ends on.
    pub period_end: Date,

    /// [`DateTime`] this [`Invoice`] must be paid until.
    ///
    /// [`DateTime`]: common::DateTime
    pub due_at: DueDateTime,

    /// [`Status`] of this [`Invoice`].
    pub status: Status,

    /// Ordered line [`Item`]s of this [`Invoice`].
    pub items: Vec<Item>,
}

impl Invoice {
    /// Returns the total amount of this [`Invoice`].
    #[must_use]
    pub fn amount(&self) -> Money {
        self.items.iter().map(|i| i.amount).sum()
    }
}

define_id! {
    #[doc = "ID of an [`Invoice`]."]
    Id
}

define_kind! {
    #[doc = "Status of an [`Invoice`]."]
    enum Status {
        #[doc = "The [`Invoice`] awaits payment."]
        Pending = 1,

        #[doc = "The [`Invoice`] is paid."]
        Paid = 2,

        #[doc = "The [`Invoice`] is not paid in time."]
        Overdue = 3,

        #[doc = "The [`Invoice`] was cancelled."]
        Cancelled = 4,
    }
}

/// [`DateTime`] when an [`Invoice`] becomes overdue.
///
/// [`DateTime`]: common::DateTime
pub type DueDateTime = DateTimeOf<(Invoice, unit::Due)>;

pub mod item {
    //! [`Item`] definitions.

    use common::{define_kind, Money};
    use serde::{Deserialize, Serialize};

    #[cfg(doc)]
    use super::Invoice;

    /// Line item of an [`Invoice`].
    ///
    /// Serialized form is consumed by payment integrations, so the field
    /// names and their order must stay intact.
    #[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
    pub struct Item {
        /// [`Code`] of this [`Item`].
        pub code: Code,

        /// Human-readable label of this [`Item`].
        pub label: String,

        /// Charged amount.
        #[serde(rename = "amount_cents")]
        pub amount: Money,

        /// Breakdown of the charged amount.
        pub meta: Meta,
    }

    define_kind! {
        #[doc = "Code of an [`Item`]."]
        enum Code {
            #[doc = "Rent for the days before the first release day."]
            Prorata = 1,

            #[doc = "Rent for the billed periods."]
            Rent = 2,

            #[doc = "Refundable deposit."]
            Deposit = 3,
        }
    }

    /// Breakdown of an [`Item`] amount.
    #[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
    pub struct Meta {
        /// [`Unit`] the [`Meta::qty`] is measured in.
        pub unit: Unit,

        /// Number of charged [`Unit`]s.
        pub qty: u32,

        /// Price of a single [`Unit`].
        #[serde(rename = "unit_price_cents")]
        pub unit_price: Money,
    }

    /// Unit of an [`Item`] quantity.
    #[derive(
        Clone,
        Copy,
        Debug,
        Deserialize,
        Eq,
        PartialEq,
        Serialize,
        strum::Display,
    )]
    #[serde(rename_all = "lowercase")]
    #[strum(serialize_all = "lowercase")]
    pub enum Unit {
        /// A day.
        Day,

        /// A week.
        Week,

        /// A calendar month.
        Month,

        /// A one-time charge.
        Once,
    }
}

#[cfg(test)]
mod spec {
    use common::Money;
    use serde_json::json;

    use super::item::{Code, Item, Meta, Unit};

    #[test]
    fn serializes_item_in_stable_shape() {
        let item = Item {
            code: Code::Prorata,
            label: "Prorated rent".into(),
            amount: Money::new(199_998),
            meta: Meta {
                unit: Unit::Day,
                qty: 6,
                unit_price: Money::new(33_333),
            },
        };

        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({
                "code": "PRORATA",
                "label": "Prorated rent",
                "amount_cents": 199_998,
                "meta": {
                    "unit": "day",
                    "qty": 6,
                    "unit_price_cents": 33_333,
                },
            }),
        );
        assert_eq!(
            serde_json::to_string(&item).unwrap(),
            "{\"code\":\"PRORATA\",\"label\":\"Prorated rent\",\
             \"amount_cents\":199998,\"meta\":{\"unit\":\"day\",\"qty\":6,\
             \"unit_price_cents\":33333}}",
        );
    }
}
