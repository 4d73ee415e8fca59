//! GraphQL [`Mutation`]s definitions.

use juniper::graphql_object;
use service::{command, Command as _};
use time::Date;

use crate::{api, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Books the `Room` with the specified ID for the `User` with the
    /// specified ID, creating a new `Contract` along with its first `Invoice`.
    ///
    /// The `Contract` rent and deposit are priced at the moment of creation
    /// and stay fixed afterwards.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_DURATION` - `duration` is less than one period;
    /// - `OUT_OF_RANGE` - `duration` is negative;
    /// - `START_DATE_TOO_EARLY` - `startDate` is in the past;
    /// - `START_DATE_TOO_FAR` - `startDate` is beyond the prebooking window;
    /// - `ROOM_NOT_EXISTS` - the `Room` with the specified ID does not exist;
    /// - `USER_NOT_EXISTS` - the `User` with the specified ID does not exist;
    /// - `ROOM_OCCUPIED` - the `Room` is booked in the requested days;
    /// - `ROOM_NOT_PRICED` - the `Room` has no rent for the `period`.
    #[tracing::instrument(
        skip_all,
        fields(
            channel = ?channel.as_ref().map(ToString::to_string),
            coupon = coupon_code.is_some(),
            duration = duration,
            gql.name = "createContract",
            invoice_mode = ?invoice_mode,
            otel.name = Self::SPAN_NAME,
            period = ?period,
            room_id = %room_id,
            start_date = %start_date,
            tenant_id = %tenant_id,
        ),
    )]
    pub async fn create_contract(
        room_id: api::room::Id,
        tenant_id: api::user::Id,
        start_date: Date,
        period: api::contract::BillingPeriod,
        duration: i32,
        channel: Option<api::pricing::Channel>,
        coupon_code: Option<api::pricing::CouponCode>,
        invoice_mode: Option<api::contract::InvoiceMode>,
        ctx: &Context,
    ) -> Result<api::contract::CreateResult, Error> {
        let duration = u32::try_from(duration)
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateContract {
                room_id: room_id.into(),
                tenant_id: tenant_id.into(),
                start_date,
                period: period.into(),
                duration,
                channel: channel.map(Into::into),
                coupon_code: coupon_code.map(Into::into),
                invoice_mode: invoice_mode.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}
