//! `Contract`-related definitions.

use common::{DateTime, Money};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLObject, GraphQLScalar};
use service::{command, domain, query, Query as _};
use time::Date;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, room::RoomError, user::UserError},
    define_error, AsError, Context, Error,
};

/// Room rental contract of a tenant.
#[derive(Clone, Debug)]
pub struct Contract {
    /// Underlying [`domain::Contract`].
    contract: domain::Contract,

    /// [`domain::Invoice`]s of this [`Contract`], loaded on demand.
    invoices: OnceCell<Vec<domain::Invoice>>,
}

impl From<domain::Contract> for Contract {
    fn from(contract: domain::Contract) -> Self {
        Self {
            contract,
            invoices: OnceCell::new(),
        }
    }
}

/// Room rental contract of a tenant.
#[graphql_object(context = Context)]
impl Contract {
    /// Unique identifier of this `Contract`.
    pub fn id(&self) -> Id {
        self.contract.id.into()
    }

    /// Sequential number of this `Contract`.
    ///
    /// Serialized as a string, since it may exceed 32 bits.
    pub fn number(&self) -> String {
        self.contract.number.to_string()
    }

    /// ID of the rented `Room`.
    pub fn room_id(&self) -> api::room::Id {
        self.contract.room_id.into()
    }

    /// ID of the `User` renting the `Room`.
    pub fn tenant_id(&self) -> api::user::Id {
        self.contract.tenant_id.into()
    }

    /// First day of the rental.
    pub fn start_date(&self) -> Date {
        self.contract.term.start
    }

    /// Checkout day of the rental (exclusive).
    pub fn end_date(&self) -> Date {
        self.contract.term.end
    }

    /// Period the rent is billed by.
    pub fn period(&self) -> BillingPeriod {
        self.contract.term.period.into()
    }

    /// Number of periods the rental lasts.
    pub fn duration(&self) -> i32 {
        i32::try_from(self.contract.term.duration).unwrap_or(i32::MAX)
    }

    /// Day of month the monthly invoices are anchored to.
    pub fn billing_day(&self) -> i32 {
        self.contract.billing_day.into()
    }

    /// Rent per period, with the `Promotion`s applied.
    pub fn rent(&self) -> Money {
        self.contract.rent
    }

    /// Refundable deposit, with the `Promotion`s applied.
    pub fn deposit(&self) -> Money {
        self.contract.deposit
    }

    /// How this `Contract` is invoiced.
    pub fn invoice_mode(&self) -> InvoiceMode {
        self.contract.invoice_mode.into()
    }

    /// Status of this `Contract`.
    pub fn status(&self) -> Status {
        self.contract.status.into()
    }

    /// `DateTime` this `Contract` was created at.
    pub fn created_at(&self) -> DateTime {
        self.contract.created_at.coerce()
    }

    /// `Invoice`s of this `Contract`, ordered by their period.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.invoices",
            id = %self.contract.id,
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn invoices(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Invoice>, Error> {
        let id = self.contract.id;
        let invoices = self
            .invoices
            .get_or_try_init(|| async {
                ctx.service()
                    .execute(query::contract::Invoices::by(id))
                    .await
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
            })
            .await?;
        Ok(invoices.iter().cloned().map(Into::into).collect())
    }
}

/// Unique identifier of a `Contract`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::contract::Id)]
#[into(domain::contract::Id)]
#[graphql(name = "ContractId", transparent)]
pub struct Id(Uuid);

/// Period a rent is billed by.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
pub enum BillingPeriod {
    /// Rent is billed per day.
    Daily,

    /// Rent is billed per week.
    Weekly,

    /// Rent is billed per calendar month.
    Monthly,
}

impl From<domain::contract::BillingPeriod> for BillingPeriod {
    fn from(period: domain::contract::BillingPeriod) -> Self {
        use domain::contract::BillingPeriod as P;
        match period {
            P::Daily => Self::Daily,
            P::Weekly => Self::Weekly,
            P::Monthly => Self::Monthly,
        }
    }
}

impl From<BillingPeriod> for domain::contract::BillingPeriod {
    fn from(period: BillingPeriod) -> Self {
        match period {
            BillingPeriod::Daily => Self::Daily,
            BillingPeriod::Weekly => Self::Weekly,
            BillingPeriod::Monthly => Self::Monthly,
        }
    }
}

/// How a monthly `Contract` is invoiced.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
pub enum InvoiceMode {
    /// A single `Invoice` covers the whole term.
    Full,

    /// An `Invoice` is issued for every month of the term.
    PerMonth,
}

impl From<domain::contract::InvoiceMode> for InvoiceMode {
    fn from(mode: domain::contract::InvoiceMode) -> Self {
        use domain::contract::InvoiceMode as M;
        match mode {
            M::Full => Self::Full,
            M::PerMonth => Self::PerMonth,
        }
    }
}

impl From<InvoiceMode> for domain::contract::InvoiceMode {
    fn from(mode: InvoiceMode) -> Self {
        match mode {
            InvoiceMode::Full => Self::Full,
            InvoiceMode::PerMonth => Self::PerMonth,
        }
    }
}

/// Status of a `Contract`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "ContractStatus")]
pub enum Status {
    /// The `Contract` awaits its first payment.
    Pending,

    /// The `Contract` is in effect.
    Active,

    /// The `Contract` term is over.
    Ended,

    /// The `Contract` was cancelled.
    Cancelled,
}

impl From<domain::contract::Status> for Status {
    fn from(status: domain::contract::Status) -> Self {
        use domain::contract::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Active => Self::Active,
            S::Ended => Self::Ended,
            S::Cancelled => Self::Cancelled,
        }
    }
}

/// Result of a `Contract` creation.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "CreateContractResult", context = Context)]
pub struct CreateResult {
    /// Created `Contract`.
    pub contract: Contract,

    /// First `Invoice` of the created `Contract`.
    pub invoice: api::Invoice,

    /// Pricing the rent and deposit of the created `Contract` come from.
    pub pricing: api::pricing::Evaluation,
}

impl From<command::create_contract::Output> for CreateResult {
    fn from(output: command::create_contract::Output) -> Self {
        Self {
            contract: output.contract.into(),
            invoice: output.invoice.into(),
            pricing: output.evaluation.into(),
        }
    }
}

define_error! {
    enum ContractError {
        #[code = "CONTRACT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Contract` with the specified ID does not exist"]
        NotExists,
    }
}

impl AsError for command::create_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVALID_DURATION"]
                #[status = BAD_REQUEST]
                #[message = "Duration must be at least one period"]
                InvalidDuration,

                #[code = "START_DATE_TOO_EARLY"]
                #[status = BAD_REQUEST]
                #[message = "Start date must not be in the past"]
                StartDateTooEarly,

                #[code = "START_DATE_TOO_FAR"]
                #[status = BAD_REQUEST]
                #[message = "Start date is beyond the prebooking window"]
                StartDateTooFar,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Settings(e) => e.try_as_error(),
            Self::InvalidDuration => Some(Error::InvalidDuration.into()),
            Self::StartDateTooEarly(_) => Some(Error::StartDateTooEarly.into()),
            Self::StartDateTooFar(_) => Some(Error::StartDateTooFar.into()),
            Self::RoomNotExists(_) => Some(RoomError::NotExists.into()),
            Self::UserNotExists(_) => Some(UserError::NotExists.into()),
            Self::RoomOccupied(_) => Some(RoomError::Occupied.into()),
            Self::RoomNotPriced(..) => Some(RoomError::NotPriced.into()),
            Self::NoInvoice(_) => None,
        }
    }
}
