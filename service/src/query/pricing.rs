//! [`EvaluatePricing`] [`Query`].

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contract::BillingPeriod,
        promotion::{coupon, Channel},
        room, user, Promotion, Room, User,
    },
    infra::{database, Database},
    pricing::{self, Evaluation},
    query::settings,
    read::promotion::Candidates,
    Query, Service,
};

/// [`Query`] evaluating the final rent and deposit of a [`Room`].
#[derive(Clone, Debug)]
pub struct EvaluatePricing {
    /// ID of the priced [`Room`].
    pub room_id: room::Id,

    /// [`BillingPeriod`] to price the [`Room`] for.
    pub period: BillingPeriod,

    /// [`Channel`] the request is made through, if known.
    pub channel: Option<Channel>,

    /// [`coupon::Code`] provided with the request, if any.
    pub coupon_code: Option<coupon::Code>,

    /// ID of the [`User`] requesting the price, if known.
    pub user_id: Option<user::Id>,

    /// 1-based index of the priced period.
    pub period_index: u32,
}

impl<Db> Query<EvaluatePricing> for Service<Db>
where
    Db: Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Promotion>, Candidates>>,
            Ok = Vec<Promotion>,
            Err = Traced<database::Error>,
        >,
    Self: Query<
        settings::Current,
        Ok = crate::Settings,
        Err = Traced<settings::ExecutionError>,
    >,
{
    type Ok = Evaluation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: EvaluatePricing,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let EvaluatePricing {
            room_id,
            period,
            channel,
            coupon_code,
            user_id,
            period_index,
        } = query;

        let settings = self
            .execute(settings::Current)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let now = DateTime::now();
        let utc_offset = settings.utc_offset();

        let room = self
            .database()
            .execute(Select(By::<Option<Room>, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RoomNotExists(room_id))
            .map_err(tracerr::wrap!())?;

        let user = if let Some(id) = user_id {
            Some(
                self.database()
                    .execute(Select(By::<Option<User>, _>::new(id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::UserNotExists(id))
                    .map_err(tracerr::wrap!())?,
            )
        } else {
            None
        };

        let candidates = self
            .database()
            .execute(Select(By::new(Candidates {
                today: now.date_at(utc_offset),
                with_coupon: coupon_code.is_some(),
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let ctx = pricing::Context {
            user: user.as_ref(),
            channel: channel.as_ref(),
            coupon_code: coupon_code.as_ref(),
            period_index: period_index.max(1),
            ..pricing::Context::new(now, utc_offset)
        };
        let evaluation = pricing::evaluate(&room, period, &ctx, &candidates);
        log::debug!(
            "evaluated `Room(id: {room_id})` for {period}: {:?} -> {:?} \
             with {} promotion(s) applied",
            evaluation.base_rent,
            evaluation.final_rent,
            evaluation.applied.len(),
        );

        Ok(evaluation)
    }
}

/// Error of [`EvaluatePricing`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Settings`] cannot be read.
    ///
    /// [`Settings`]: crate::Settings
    #[display("Cannot read settings: {_0}")]
    #[from]
    Settings(settings::ExecutionError),

    /// [`Room`] with the provided ID does not exist.
    #[display("`Room(id: {_0})` does not exist")]
    RoomNotExists(#[error(not(source))] room::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
