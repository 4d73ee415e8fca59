//! `Invoice`-related definitions.

use common::{DateTime, Money};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLObject, GraphQLScalar};
use service::domain;
use time::Date;
use uuid::Uuid;

use crate::{api, Context};

/// Bill for a single period of a `Contract`.
#[derive(Clone, Debug, From)]
pub struct Invoice(domain::Invoice);

/// Bill for a single period of a `Contract`.
#[graphql_object(context = Context)]
impl Invoice {
    /// Unique identifier of this `Invoice`.
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// ID of the `Contract` this `Invoice` bills.
    pub fn contract_id(&self) -> api::contract::Id {
        self.0.contract_id.into()
    }

    /// First billed day.
    pub fn period_start(&self) -> Date {
        self.0.period_start
    }

    /// Day the billed period ends on.
    pub fn period_end(&self) -> Date {
        self.0.period_end
    }

    /// `DateTime` this `Invoice` must be paid until.
    pub fn due_at(&self) -> DateTime {
        self.0.due_at.coerce()
    }

    /// Payment status of this `Invoice`.
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Total amount of this `Invoice`.
    pub fn amount(&self) -> Money {
        self.0.amount()
    }

    /// Ordered line items of this `Invoice`.
    pub fn items(&self) -> Vec<Item> {
        self.0.items.iter().cloned().map(Into::into).collect()
    }
}

/// Unique identifier of an `Invoice`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::invoice::Id)]
#[into(domain::invoice::Id)]
#[graphql(name = "InvoiceId", transparent)]
pub struct Id(Uuid);

/// Payment status of an `Invoice`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "InvoiceStatus")]
pub enum Status {
    /// The `Invoice` awaits payment.
    Pending,

    /// The `Invoice` is paid.
    Paid,

    /// The `Invoice` is not paid in time.
    Overdue,

    /// The `Invoice` was cancelled.
    Cancelled,
}

impl From<domain::invoice::Status> for Status {
    fn from(status: domain::invoice::Status) -> Self {
        use domain::invoice::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Paid => Self::Paid,
            S::Overdue => Self::Overdue,
            S::Cancelled => Self::Cancelled,
        }
    }
}

/// Line item of an `Invoice`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "InvoiceItem", context = Context)]
pub struct Item {
    /// What this item charges for.
    pub code: ItemCode,

    /// Human-readable label of this item.
    pub label: String,

    /// Charged amount.
    pub amount: Money,

    /// Unit the `qty` is measured in.
    pub unit: ItemUnit,

    /// Number of charged units.
    pub qty: i32,

    /// Price of a single unit.
    pub unit_price: Money,
}

impl From<domain::invoice::Item> for Item {
    fn from(item: domain::invoice::Item) -> Self {
        let domain::invoice::Item {
            code,
            label,
            amount,
            meta,
        } = item;
        Self {
            code: code.into(),
            label,
            amount,
            unit: meta.unit.into(),
            qty: i32::try_from(meta.qty).unwrap_or(i32::MAX),
            unit_price: meta.unit_price,
        }
    }
}

/// What an `InvoiceItem` charges for.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "InvoiceItemCode")]
pub enum ItemCode {
    /// Rent for the days before the first release day.
    Prorata,

    /// Rent for the billed periods.
    Rent,

    /// Refundable deposit.
    Deposit,
}

impl From<domain::invoice::item::Code> for ItemCode {
    fn from(code: domain::invoice::item::Code) -> Self {
        use domain::invoice::item::Code as C;
        match code {
            C::Prorata => Self::Prorata,
            C::Rent => Self::Rent,
            C::Deposit => Self::Deposit,
        }
    }
}

/// Unit of an `InvoiceItem` quantity.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "InvoiceItemUnit")]
pub enum ItemUnit {
    /// A day.
    Day,

    /// A week.
    Week,

    /// A calendar month.
    Month,

    /// A one-time charge.
    Once,
}

impl From<domain::invoice::item::Unit> for ItemUnit {
    fn from(unit: domain::invoice::item::Unit) -> Self {
        use domain::invoice::item::Unit as U;
        match unit {
            U::Day => Self::Day,
            U::Week => Self::Week,
            U::Month => Self::Month,
            U::Once => Self::Once,
        }
    }
}
