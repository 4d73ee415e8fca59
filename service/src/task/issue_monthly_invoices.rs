//! [`IssueMonthlyInvoices`] [`Task`].

use std::{convert::Infallible, time};

use common::{
    calendar,
    operations::{By, Insert, Perform, Select, Start},
    DateTime,
};
use derive_more::{Display, Error, From};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    billing,
    domain::Invoice,
    infra::{database, Database},
    query::settings,
    read::invoice::{EndingBy, Renewal},
    Query, Service, Settings,
};
#[cfg(doc)]
use crate::domain::{contract::InvoiceMode, Contract};

use super::Task;

/// Unique constraint preventing the same period from being invoiced twice.
const INVOICE_PERIOD_KEY: &str = "invoices_contract_id_period_start_key";

/// Configuration for [`IssueMonthlyInvoices`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between issuing rounds.
    pub interval: time::Duration,

    /// Period before the end of the latest [`Invoice`] the next one is
    /// issued in.
    pub lead: time::Duration,
}

/// [`Task`] issuing the next [`Invoice`]s of [`InvoiceMode::PerMonth`]
/// [`Contract`]s.
#[derive(Clone, Copy, Debug)]
pub struct IssueMonthlyInvoices<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<IssueMonthlyInvoices<Self>, Config>>> for Service<Db>
where
    IssueMonthlyInvoices<Service<Db>>:
        Task<Perform<()>, Ok = (), Err: std::error::Error>
            + Send
            + Sync
            + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<IssueMonthlyInvoices<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = IssueMonthlyInvoices {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::IssueMonthlyInvoices` failed: {e}");
            });
        }
    }
}

impl<Db> Task<Perform<()>> for IssueMonthlyInvoices<Service<Db>>
where
    Db: Database<
            Select<By<Vec<Renewal>, EndingBy>>,
            Ok = Vec<Renewal>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<Invoice>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
    Service<Db>: Query<
        settings::Current,
        Ok = Settings,
        Err = Traced<settings::ExecutionError>,
    >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let settings = self
            .service
            .execute(settings::Current)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let now = DateTime::now();

        let lead_days = self.config.lead.as_secs() / 86_400;
        let until = calendar::add_days(
            now.date_at(settings.utc_offset()),
            u32::try_from(lead_days).unwrap_or(u32::MAX),
        );
        let renewals = self
            .service
            .database()
            .execute(Select(By::new(EndingBy(until))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        for Renewal {
            contract,
            issued,
            last_period_end,
        } in renewals
        {
            let Some(invoice) =
                billing::next_monthly_invoice(&contract, issued, &settings, now)
            else {
                log::debug!(
                    "`Contract(id: {})` is fully invoiced until \
                     {last_period_end}",
                    contract.id,
                );
                continue;
            };

            log::info!(
                "issuing `Invoice(id: {})` of {} for `Contract(id: {})` \
                 covering {}..{}",
                invoice.id,
                invoice.amount(),
                contract.id,
                invoice.period_start,
                invoice.period_end,
            );
            match self.service.database().execute(Insert(invoice)).await {
                Ok(()) => {}
                Err(e) if e.as_ref().is_conflict(INVOICE_PERIOD_KEY) => {
                    log::debug!(
                        "next `Invoice` of `Contract(id: {})` is already \
                         issued",
                        contract.id,
                    );
                }
                Err(e) => {
                    return Err(e).map_err(tracerr::map_from_and_wrap!(=> E));
                }
            }
        }
        Ok(())
    }
}

/// Error of [`IssueMonthlyInvoices`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Settings`] cannot be read.
    #[display("Cannot read settings: {_0}")]
    Settings(settings::ExecutionError),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{operations::Perform, DateTime, Money};
    use time::macros::date;

    use crate::{
        billing,
        domain::{
            contract::{self, BillingPeriod, InvoiceMode, Status, Term},
            invoice::item::Code,
            Contract,
        },
        infra::database::mock::Mock,
        Settings, Task as _,
    };

    use super::{Config, IssueMonthlyInvoices};

    #[tokio::test]
    async fn issues_remaining_months_one_by_one() {
        let mock = Mock::default();
        let settings = Settings::default();
        let start = date!(2025 - 06 - 25);
        let contract = Contract {
            id: contract::Id::new(),
            number: contract::Number::from(7),
            room_id: mock.room.id,
            tenant_id: mock.tenant.id,
            term: Term::new(start, BillingPeriod::Monthly, 3),
            billing_day: billing::billing_day(
                start,
                BillingPeriod::Monthly,
                &settings,
            ),
            rent: Money::new(1_000_000),
            deposit: Money::ZERO,
            invoice_mode: InvoiceMode::PerMonth,
            status: Status::Active,
            created_at: DateTime::now().coerce(),
        };
        let first = billing::generate_initial_invoices(
            &contract,
            contract.rent,
            contract.deposit,
            3,
            InvoiceMode::PerMonth,
            &settings,
            DateTime::now(),
        )
        .remove(0);
        mock.add_contract(contract, first).await;

        let task = IssueMonthlyInvoices {
            config: Config {
                interval: Duration::from_secs(60),
                lead: Duration::from_secs(3 * 24 * 3600),
            },
            service: mock.service(),
        };
        for _ in 0..4 {
            task.execute(Perform(())).await.unwrap();
        }

        let invoices = mock.invoices().await;
        assert_eq!(invoices.len(), 3);
        assert_eq!(invoices[1].period_start, date!(2025 - 08 - 01));
        assert_eq!(invoices[1].items[0].code, Code::Rent);
        assert_eq!(invoices[2].period_start, date!(2025 - 09 - 01));
        assert_eq!(invoices[2].period_end, date!(2025 - 09 - 24));
        assert_eq!(invoices[2].items[0].code, Code::Prorata);
    }

    #[tokio::test]
    async fn skips_full_mode_contracts() {
        let mock = Mock::default();
        let settings = Settings::default();
        let start = date!(2025 - 06 - 01);
        let contract = Contract {
            id: contract::Id::new(),
            number: contract::Number::from(8),
            room_id: mock.room.id,
            tenant_id: mock.tenant.id,
            term: Term::new(start, BillingPeriod::Monthly, 2),
            billing_day: 1,
            rent: Money::new(1_000_000),
            deposit: Money::ZERO,
            invoice_mode: InvoiceMode::Full,
            status: Status::Active,
            created_at: DateTime::now().coerce(),
        };
        let first = billing::generate_initial_invoices(
            &contract,
            contract.rent,
            contract.deposit,
            2,
            InvoiceMode::Full,
            &settings,
            DateTime::now(),
        )
        .remove(0);
        mock.add_contract(contract, first).await;

        let task = IssueMonthlyInvoices {
            config: Config {
                interval: Duration::from_secs(60),
                lead: Duration::ZERO,
            },
            service: mock.service(),
        };
        task.execute(Perform(())).await.unwrap();

        assert_eq!(mock.invoices().await.len(), 1);
    }
}
