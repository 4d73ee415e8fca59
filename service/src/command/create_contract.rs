//! [`Command`] for creating a new [`Contract`].

use common::{
    calendar,
    operations::{
        By, Commit, Increment, Insert, Lock, Select, Transact, Transacted,
    },
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use time::Date;
use tracerr::Traced;
use tracing as log;

use crate::{
    billing,
    domain::{
        contract::{self, BillingPeriod, InvoiceMode, Term},
        promotion::{coupon, Channel},
        room, user, Contract, Invoice, Promotion, Room, User,
    },
    infra::{database, Database},
    pricing::{self, Evaluation},
    query::settings,
    read::{
        contract::{Booking, Overlapping},
        promotion::Candidates,
    },
    Query, Service, Settings,
};

use super::Command;

/// [`Command`] for creating a new [`Contract`] along with its first
/// [`Invoice`].
#[derive(Clone, Debug)]
pub struct CreateContract {
    /// ID of the [`Room`] to rent.
    pub room_id: room::Id,

    /// ID of the [`User`] renting the [`Room`].
    pub tenant_id: user::Id,

    /// First day of the rental.
    pub start_date: Date,

    /// [`BillingPeriod`] of the rental.
    pub period: BillingPeriod,

    /// Number of [`BillingPeriod`]s the rental lasts.
    pub duration: u32,

    /// [`Channel`] the [`Contract`] is created through, if known.
    pub channel: Option<Channel>,

    /// [`coupon::Code`] to redeem, if any.
    pub coupon_code: Option<coupon::Code>,

    /// [`InvoiceMode`] overriding the configured one.
    pub invoice_mode: Option<InvoiceMode>,
}

/// Output of [`CreateContract`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Created [`Contract`].
    pub contract: Contract,

    /// First [`Invoice`] of the created [`Contract`].
    pub invoice: Invoice,

    /// [`Evaluation`] the [`Contract`] rent and deposit are taken from.
    pub evaluation: Evaluation,
}

impl<Db> Command<CreateContract> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Room, room::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Overlapping<contract::Id>>, Booking>>,
            Ok = Option<Overlapping<contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Promotion>, Candidates>>,
            Ok = Vec<Promotion>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<contract::Number, ()>>,
            Err = Traced<database::Error>,
        > + Database<
            Increment<By<contract::Number, ()>>,
            Ok = contract::Number,
            Err = Traced<database::Error>,
        > + Database<Insert<Contract>, Err = Traced<database::Error>>
        + Database<Insert<Invoice>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Self: Query<
        settings::Current,
        Ok = Settings,
        Err = Traced<settings::ExecutionError>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateContract {
            room_id,
            tenant_id,
            start_date,
            period,
            duration,
            channel,
            coupon_code,
            invoice_mode,
        } = cmd;

        let settings = self
            .execute(settings::Current)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let now = DateTime::now();
        let utc_offset = settings.utc_offset();

        if duration == 0 {
            return Err(tracerr::new!(E::InvalidDuration));
        }
        let today = now.date_at(utc_offset);
        if start_date < today {
            return Err(tracerr::new!(E::StartDateTooEarly(start_date)));
        }
        let latest = calendar::add_days(today, settings.max_prebook_days);
        if start_date > latest {
            return Err(tracerr::new!(E::StartDateTooFar(start_date)));
        }

        let term = Term::new(start_date, period, duration);

        let room = self
            .database()
            .execute(Select(By::<Option<Room>, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RoomNotExists(room_id))
            .map_err(tracerr::wrap!())?;
        let tenant = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(tenant_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(tenant_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent bookings of the same `Room`.
        tx.execute(Lock(By::<Room, _>::new(room.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let booking = Booking {
            room_id: room.id,
            start: term.start,
            end: term.end,
        };
        if let Some(Overlapping(id)) = tx
            .execute(Select(By::new(booking)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            log::debug!(
                "`Room(id: {})` is occupied by `Contract(id: {id})`",
                room.id,
            );
            return Err(tracerr::new!(E::RoomOccupied(room.id)));
        }

        let candidates = tx
            .execute(Select(By::new(Candidates {
                today,
                with_coupon: coupon_code.is_some(),
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let ctx = pricing::Context {
            user: Some(&tenant),
            channel: channel.as_ref(),
            coupon_code: coupon_code.as_ref(),
            ..pricing::Context::new(now, utc_offset)
        };
        let evaluation = pricing::evaluate(&room, period, &ctx, &candidates);
        let Some(rent) = evaluation.final_rent else {
            return Err(tracerr::new!(E::RoomNotPriced(room.id, period)));
        };
        let deposit = evaluation.final_deposit.unwrap_or(Money::ZERO);

        // Numbers must be handed out strictly one by one.
        tx.execute(Lock(By::<contract::Number, _>::new(())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let number = tx
            .execute(Increment(By::new(())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let invoice_mode =
            invoice_mode.unwrap_or(settings.monthly_invoice_mode);
        let contract = Contract {
            id: contract::Id::new(),
            number,
            room_id: room.id,
            tenant_id: tenant.id,
            term,
            billing_day: billing::billing_day(term.start, period, &settings),
            rent,
            deposit,
            invoice_mode,
            status: contract::Status::Pending,
            created_at: now.coerce(),
        };
        let invoice = billing::generate_initial_invoices(
            &contract,
            rent,
            deposit,
            duration,
            invoice_mode,
            &settings,
            now,
        )
        .into_iter()
        .next()
        .ok_or(E::NoInvoice(contract.id))
        .map_err(tracerr::wrap!())?;

        tx.execute(Insert(contract.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(invoice.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "created `Contract(id: {}, number: {})` of `Room(id: {})` \
             for {}..{}",
            contract.id,
            contract.number,
            contract.room_id,
            contract.term.start,
            contract.term.end,
        );
        Ok(Output {
            contract,
            invoice,
            evaluation,
        })
    }
}

/// Error of [`CreateContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Settings`] cannot be read.
    #[display("Cannot read settings: {_0}")]
    #[from]
    Settings(settings::ExecutionError),

    /// Duration of the rental is zero.
    #[display("Duration must be at least one period")]
    InvalidDuration,

    /// Rental starts in the past.
    #[display("Start date `{_0}` is in the past")]
    StartDateTooEarly(#[error(not(source))] Date),

    /// Rental starts later than it may be booked in advance.
    #[display("Start date `{_0}` is too far in the future")]
    StartDateTooFar(#[error(not(source))] Date),

    /// [`Room`] with the provided ID does not exist.
    #[display("`Room(id: {_0})` does not exist")]
    RoomNotExists(#[error(not(source))] room::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`Room`] is booked by another [`Contract`] in the requested days.
    #[display("`Room(id: {_0})` is occupied in the requested days")]
    RoomOccupied(#[error(not(source))] room::Id),

    /// [`Room`] has no rent for the requested [`BillingPeriod`].
    #[display("`Room(id: {_0})` is not priced for {_1}")]
    RoomNotPriced(room::Id, BillingPeriod),

    /// No [`Invoice`] is generated for the [`Contract`].
    #[display("No `Invoice` is generated for `Contract(id: {_0})`")]
    NoInvoice(#[error(not(source))] contract::Id),
}

#[cfg(test)]
mod spec {
    use common::{Money, Percent};
    use time::{Date, Duration};

    use crate::{
        domain::{
            contract::{BillingPeriod, InvoiceMode},
            invoice::item::Code,
            promotion::{
                self,
                action::{self, Action, Target},
                coupon::{self, Coupon},
                Slug, StackMode, Validity,
            },
            Promotion,
        },
        infra::database::mock::Mock,
        settings::key,
        Command as _, Settings,
    };

    use super::{CreateContract, ExecutionError};

    fn today() -> Date {
        common::DateTime::now().date_at(Settings::default().utc_offset())
    }

    fn cmd(mock: &Mock, start_date: Date) -> CreateContract {
        CreateContract {
            room_id: mock.room.id,
            tenant_id: mock.tenant.id,
            start_date,
            period: BillingPeriod::Monthly,
            duration: 3,
            channel: None,
            coupon_code: None,
            invoice_mode: None,
        }
    }

    fn daily(mock: &Mock, start_date: Date, duration: u32) -> CreateContract {
        CreateContract {
            period: BillingPeriod::Daily,
            duration,
            ..cmd(mock, start_date)
        }
    }

    #[tokio::test]
    async fn creates_contract_with_first_invoice() {
        let mock = Mock::default();

        let out = mock.service().execute(cmd(&mock, today())).await.unwrap();

        assert_eq!(out.contract.rent, Money::new(1_000_000));
        assert_eq!(out.contract.deposit, Money::new(500_000));
        assert_eq!(out.contract.invoice_mode, InvoiceMode::PerMonth);
        assert_eq!(
            out.contract.term.end,
            BillingPeriod::Monthly.advance(today(), 3),
        );
        assert_eq!(out.invoice.contract_id, out.contract.id);
        assert_eq!(
            out.invoice.items.last().map(|i| i.code),
            Some(Code::Deposit),
        );
        assert_eq!(out.evaluation.base_rent, Some(Money::new(1_000_000)));
        assert_eq!(mock.contracts().await.len(), 1);
        assert_eq!(mock.invoices().await.len(), 1);
        assert_eq!(mock.commits().await, 1);
    }

    #[tokio::test]
    async fn rejects_overlapping_booking() {
        let mock = Mock::default();
        let svc = mock.service();
        let first = svc.execute(daily(&mock, today(), 5)).await.unwrap();

        let err = svc
            .execute(daily(&mock, today() + Duration::days(4), 2))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::RoomOccupied(id) if *id == mock.room.id,
        ));
        assert_eq!(mock.contracts().await.len(), 1);
        assert_eq!(mock.invoices().await.len(), 1);

        // Checkout day is free for the next tenant.
        let next = svc
            .execute(daily(&mock, first.contract.term.end, 2))
            .await
            .unwrap();
        assert_eq!(next.contract.term.start, first.contract.term.end);
        assert_eq!(mock.contracts().await.len(), 2);
    }

    #[tokio::test]
    async fn numbers_contracts_sequentially() {
        let mock = Mock::default();
        let svc = mock.service();

        let mut numbers = vec![];
        for offset in [0, 3, 6] {
            let out = svc
                .execute(daily(&mock, today() + Duration::days(offset), 2))
                .await
                .unwrap();
            numbers.push(i64::from(out.contract.number));
        }

        assert_eq!(numbers, [1, 2, 3]);
    }

    #[tokio::test]
    async fn validates_term() {
        let mock = Mock::default();
        let svc = mock.service();

        let err = svc
            .execute(daily(&mock, today(), 0))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidDuration));

        let err = svc
            .execute(daily(&mock, today() - Duration::days(1), 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::StartDateTooEarly(_),
        ));

        let err = svc
            .execute(daily(&mock, today() + Duration::days(31), 1))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::StartDateTooFar(_)));

        assert!(svc
            .execute(daily(&mock, today() + Duration::days(30), 1))
            .await
            .is_ok());
        assert_eq!(mock.contracts().await.len(), 1);
    }

    #[tokio::test]
    async fn honors_stored_settings() {
        let mock = Mock::default();
        mock.set(key::MAX_PREBOOK_DAYS, "5").await;
        mock.set(key::MONTHLY_INVOICE_MODE, "FULL").await;
        let svc = mock.service();

        let err = svc
            .execute(daily(&mock, today() + Duration::days(6), 1))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::StartDateTooFar(_)));

        let out = svc.execute(cmd(&mock, today())).await.unwrap();
        assert_eq!(out.contract.invoice_mode, InvoiceMode::Full);
        assert_eq!(out.invoice.period_end, out.contract.term.end);

        mock.set(key::RELEASE_DAY_OF_MONTH, "never").await;
        let err = svc
            .execute(daily(&mock, today() + Duration::days(5), 1))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Settings(_)));
    }

    #[tokio::test]
    async fn rejects_unpriced_room() {
        let mock = Mock::default();

        let err = mock
            .service()
            .execute(CreateContract {
                period: BillingPeriod::Weekly,
                ..cmd(&mock, today())
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::RoomNotPriced(_, BillingPeriod::Weekly),
        ));
        assert!(mock.contracts().await.is_empty());
        assert_eq!(mock.commits().await, 0);
    }

    #[tokio::test]
    async fn applies_coupon_promotion() {
        let mock = Mock::default();
        mock.add_promotion(Promotion {
            id: promotion::Id::new(),
            slug: Slug::from("hemat-10".to_owned()),
            validity: Validity::default(),
            stack_mode: StackMode::Stack,
            priority: 1,
            default_channel: None,
            require_coupon: Some(true),
            is_active: true,
            scopes: vec![],
            rules: vec![],
            actions: vec![Action {
                kind: action::Kind::Percent {
                    percent: Percent::from_bps(1000).unwrap(),
                },
                target: Target::default(),
                max_discount: None,
                priority: 0,
            }],
            coupons: vec![Coupon {
                id: coupon::Id::new(),
                code: coupon::Code::from("HEMAT10"),
                is_active: true,
                expires_at: None,
                max_redemptions: None,
            }],
        })
        .await;
        let svc = mock.service();

        let discounted = svc
            .execute(CreateContract {
                coupon_code: Some(coupon::Code::from("HEMAT10")),
                ..daily(&mock, today(), 2)
            })
            .await
            .unwrap();
        let undiscounted = svc
            .execute(CreateContract {
                coupon_code: Some(coupon::Code::from("BADCODE")),
                ..daily(&mock, today() + Duration::days(2), 2)
            })
            .await
            .unwrap();

        assert_eq!(discounted.contract.rent, Money::new(90_000));
        assert_eq!(discounted.invoice.amount(), Money::new(180_000));
        assert_eq!(discounted.evaluation.applied.len(), 1);
        assert_eq!(undiscounted.contract.rent, Money::new(100_000));
        assert!(undiscounted.evaluation.applied.is_empty());
    }
}
