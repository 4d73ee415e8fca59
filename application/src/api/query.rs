//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{query, Query as _};

use crate::{api, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Evaluates the final rent and deposit of the `Room` with the specified
    /// ID for the specified `BillingPeriod`.
    ///
    /// An invalid `couponCode` or a `Room` not priced for the `period` are
    /// not errors: they result in no discount and no amounts respectively.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `ROOM_NOT_EXISTS` - the `Room` with the specified ID does not exist;
    /// - `USER_NOT_EXISTS` - the `User` with the specified ID does not exist;
    /// - `OUT_OF_RANGE` - `periodIndex` is negative.
    #[tracing::instrument(
        skip_all,
        fields(
            channel = ?channel.as_ref().map(ToString::to_string),
            coupon = coupon_code.is_some(),
            gql.name = "pricing",
            otel.name = Self::SPAN_NAME,
            period = ?period,
            period_index = ?period_index,
            room_id = %room_id,
            user_id = ?user_id.map(|id| id.to_string()),
        ),
    )]
    pub async fn pricing(
        room_id: api::room::Id,
        period: api::contract::BillingPeriod,
        channel: Option<api::pricing::Channel>,
        coupon_code: Option<api::pricing::CouponCode>,
        user_id: Option<api::user::Id>,
        period_index: Option<i32>,
        ctx: &Context,
    ) -> Result<api::pricing::Evaluation, Error> {
        let period_index = period_index
            .map(u32::try_from)
            .transpose()
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .unwrap_or(1);

        ctx.service()
            .execute(query::EvaluatePricing {
                room_id: room_id.into(),
                period: period.into(),
                channel: channel.map(Into::into),
                coupon_code: coupon_code.map(Into::into),
                user_id: user_id.map(Into::into),
                period_index,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Contract` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CONTRACT_NOT_EXISTS` - the `Contract` with the specified ID does
    ///                           not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "contract",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn contract(
        id: api::contract::Id,
        ctx: &Context,
    ) -> Result<api::Contract, Error> {
        ctx.service()
            .execute(query::contract::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::contract::ContractError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }
}
