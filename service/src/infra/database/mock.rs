//! In-memory [`Database`] for testing.

use std::sync::Arc;

use common::{
    operations::{By, Commit, Increment, Insert, Lock, Select, Transact},
    Money,
};
use tokio::sync::RwLock;
use tracerr::Traced;

use crate::{
    domain::{
        contract::{self, BillingPeriod, InvoiceMode, Status},
        room::{self, Rate, Rates},
        user, Contract, Invoice, Promotion, Room, User,
    },
    infra::{database, Database},
    read::{
        contract::{Booking, Overlapping},
        invoice::{EndingBy, Renewal},
        promotion::Candidates,
        settings::Overrides,
    },
    task, Config, Service, Settings,
};

/// In-memory [`Database`] holding a single [`Room`] and a single tenant.
#[derive(Clone, Debug)]
pub(crate) struct Mock {
    /// The only [`Room`] available for rent.
    pub(crate) room: Room,

    /// The only tenant.
    pub(crate) tenant: User,

    /// Committed [`State`].
    state: Arc<RwLock<State>>,
}

/// Stored data of a [`Mock`].
#[derive(Debug, Default)]
struct State {
    contracts: Vec<Contract>,
    invoices: Vec<Invoice>,
    promotions: Vec<Promotion>,
    overrides: Vec<(String, String)>,
    sequence: i64,
    commits: usize,
}

impl Default for Mock {
    fn default() -> Self {
        let rate = |rent: i64, deposit: Option<i64>| Rate {
            rent: Some(Money::new(rent)),
            deposit: deposit.map(Money::new),
        };
        Self {
            room: Room {
                id: room::Id::new(),
                number: room::Number::new("A-101").expect("valid"),
                building_id: room::BuildingId::new(),
                floor_id: room::FloorId::new(),
                type_id: room::TypeId::new(),
                rates: [(BillingPeriod::Daily, rate(100_000, None))]
                    .into_iter()
                    .collect(),
                type_rates: [(
                    BillingPeriod::Monthly,
                    rate(1_000_000, Some(500_000)),
                )]
                .into_iter()
                .collect::<Rates>(),
            },
            tenant: User {
                id: user::Id::new(),
                roles: vec![],
            },
            state: Arc::default(),
        }
    }
}

impl Mock {
    /// Creates a new [`Service`] backed by this [`Mock`].
    pub(crate) fn service(&self) -> Service<Self> {
        Service {
            config: Config {
                billing: Settings::default(),
                issue_monthly_invoices: task::issue_monthly_invoices::Config {
                    interval: std::time::Duration::from_secs(3600),
                    lead: std::time::Duration::from_secs(3 * 24 * 3600),
                },
            },
            database: self.clone(),
        }
    }

    /// Stores the provided [`Promotion`].
    pub(crate) async fn add_promotion(&self, promotion: Promotion) {
        self.state.write().await.promotions.push(promotion);
    }

    /// Stores the provided setting override.
    pub(crate) async fn set(&self, key: &str, value: &str) {
        self.state
            .write()
            .await
            .overrides
            .push((key.to_owned(), value.to_owned()));
    }

    /// Stores the provided [`Contract`] along with its first [`Invoice`].
    pub(crate) async fn add_contract(
        &self,
        contract: Contract,
        first: Invoice,
    ) {
        let mut state = self.state.write().await;
        state.contracts.push(contract);
        state.invoices.push(first);
    }

    /// Returns the committed [`Contract`]s.
    pub(crate) async fn contracts(&self) -> Vec<Contract> {
        self.state.read().await.contracts.clone()
    }

    /// Returns the committed [`Invoice`]s.
    pub(crate) async fn invoices(&self) -> Vec<Invoice> {
        self.state.read().await.invoices.clone()
    }

    /// Returns the number of committed transactions.
    pub(crate) async fn commits(&self) -> usize {
        self.state.read().await.commits
    }

    /// Returns a [`contract::Number`] never handed out before.
    async fn next_number(&self) -> contract::Number {
        let mut state = self.state.write().await;
        state.sequence += 1;
        contract::Number::from(state.sequence)
    }

    /// Selects the [`Promotion`]s matching the provided [`Candidates`].
    async fn candidates(&self, by: Candidates) -> Vec<Promotion> {
        let mut promotions = self
            .state
            .read()
            .await
            .promotions
            .iter()
            .filter(|p| p.is_candidate(by.today, by.with_coupon))
            .cloned()
            .collect::<Vec<_>>();
        promotions.sort_by_key(|p| p.priority);
        promotions
    }
}

/// Transaction of a [`Mock`], applying its writes on [`Commit`] only.
#[derive(Debug)]
pub(crate) struct MockTx {
    /// [`Mock`] this transaction was started on.
    db: Mock,

    /// Writes staged by this transaction.
    staged: RwLock<State>,
}

impl Database<Transact> for Mock {
    type Ok = MockTx;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(MockTx {
            db: self.clone(),
            staged: RwLock::default(),
        })
    }
}

impl Database<Commit> for MockTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let mut staged = self.staged.write().await;
        let mut state = self.db.state.write().await;
        state.contracts.append(&mut staged.contracts);
        state.invoices.append(&mut staged.invoices);
        state.commits += 1;
        Ok(())
    }
}

impl Database<Select<By<Overrides, ()>>> for Mock {
    type Ok = Overrides;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Overrides, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(Overrides(self.state.read().await.overrides.clone()))
    }
}

impl Database<Select<By<Option<Room>, room::Id>>> for Mock {
    type Ok = Option<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Room>, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok((*by.inner() == self.room.id).then(|| self.room.clone()))
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Mock {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok((*by.inner() == self.tenant.id).then(|| self.tenant.clone()))
    }
}

impl Database<Select<By<Vec<Promotion>, Candidates>>> for Mock {
    type Ok = Vec<Promotion>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Promotion>, Candidates>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.candidates(by.into_inner()).await)
    }
}

impl Database<Select<By<Vec<Renewal>, EndingBy>>> for Mock {
    type Ok = Vec<Renewal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Renewal>, EndingBy>>,
    ) -> Result<Self::Ok, Self::Err> {
        let EndingBy(until) = by.into_inner();
        let state = self.state.read().await;
        Ok(state
            .contracts
            .iter()
            .filter(|c| {
                c.term.period == BillingPeriod::Monthly
                    && c.invoice_mode == InvoiceMode::PerMonth
                    && matches!(c.status, Status::Pending | Status::Active)
            })
            .filter_map(|c| {
                let own =
                    state.invoices.iter().filter(|i| i.contract_id == c.id);
                let last_period_end = own.clone().map(|i| i.period_end).max()?;
                (last_period_end <= until).then(|| Renewal {
                    contract: c.clone(),
                    issued: u32::try_from(own.count()).unwrap_or(u32::MAX),
                    last_period_end,
                })
            })
            .collect())
    }
}

impl Database<Insert<Invoice>> for Mock {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(invoice): Insert<Invoice>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state.write().await.invoices.push(invoice);
        Ok(())
    }
}

impl Database<Lock<By<Room, room::Id>>> for MockTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Room, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Lock<By<contract::Number, ()>>> for MockTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<contract::Number, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Increment<By<contract::Number, ()>>> for MockTx {
    type Ok = contract::Number;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Increment<By<contract::Number, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.db.next_number().await)
    }
}

impl Database<Select<By<Option<Overlapping<contract::Id>>, Booking>>>
    for MockTx
{
    type Ok = Option<Overlapping<contract::Id>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Overlapping<contract::Id>>, Booking>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Booking {
            room_id,
            start,
            end,
        } = by.into_inner();
        let state = self.db.state.read().await;
        let staged = self.staged.read().await;
        Ok(state
            .contracts
            .iter()
            .chain(&staged.contracts)
            .find(|c| {
                c.room_id == room_id
                    && c.status != Status::Cancelled
                    && c.term.overlaps(start, end)
            })
            .map(|c| Overlapping(c.id)))
    }
}

impl Database<Select<By<Vec<Promotion>, Candidates>>> for MockTx {
    type Ok = Vec<Promotion>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Promotion>, Candidates>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.db.candidates(by.into_inner()).await)
    }
}

impl Database<Insert<Contract>> for MockTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        self.staged.write().await.contracts.push(contract);
        Ok(())
    }
}

impl Database<Insert<Invoice>> for MockTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(invoice): Insert<Invoice>,
    ) -> Result<Self::Ok, Self::Err> {
        self.staged.write().await.invoices.push(invoice);
        Ok(())
    }
}
