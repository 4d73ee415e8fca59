//! Pricing evaluation definitions.

use common::Money;
use derive_more::{AsRef, Display, From, Into};
use juniper::{GraphQLEnum, GraphQLObject, GraphQLScalar};
use service::{domain, pricing, query};
use uuid::Uuid;

use crate::{
    api::{room::RoomError, scalar, user::UserError},
    AsError, Context, Error,
};

/// Final rent and deposit of a `Room` after applying the eligible
/// `Promotion`s.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "PricingEvaluation", context = Context)]
pub struct Evaluation {
    /// Rent before any discount, if the `Room` is priced for the period.
    pub base_rent: Option<Money>,

    /// Deposit before any discount, if the `Room` requires one.
    pub base_deposit: Option<Money>,

    /// Rent after applying the `Promotion`s.
    pub final_rent: Option<Money>,

    /// Deposit after applying the `Promotion`s.
    pub final_deposit: Option<Money>,

    /// Total discount granted by the `Promotion`s.
    pub discount: Discount,

    /// Applied `Promotion`s, in their evaluation order.
    pub applied: Vec<Applied>,
}

impl From<pricing::Evaluation> for Evaluation {
    fn from(evaluation: pricing::Evaluation) -> Self {
        let discount = evaluation.discount().into();
        let pricing::Evaluation {
            base_rent,
            base_deposit,
            final_rent,
            final_deposit,
            applied,
        } = evaluation;
        Self {
            base_rent,
            base_deposit,
            final_rent,
            final_deposit,
            discount,
            applied: applied.into_iter().map(Into::into).collect(),
        }
    }
}

/// `Promotion` applied by a `PricingEvaluation`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "AppliedPromotion", context = Context)]
pub struct Applied {
    /// ID of the applied `Promotion`.
    pub promotion_id: PromotionId,

    /// Slug of the applied `Promotion`.
    pub slug: String,

    /// How the applied `Promotion` combines with the other ones.
    pub stack_mode: StackMode,

    /// Priority of the applied `Promotion`.
    pub priority: i32,

    /// Discount granted by the applied `Promotion`.
    pub discount: Discount,

    /// ID of the `Coupon` unlocking the applied `Promotion`, if any.
    pub coupon_id: Option<CouponId>,
}

impl From<pricing::Applied> for Applied {
    fn from(applied: pricing::Applied) -> Self {
        Self {
            promotion_id: applied.promotion_id.into(),
            slug: applied.slug.to_string(),
            stack_mode: applied.stack_mode.into(),
            priority: applied.priority,
            discount: applied.discount.into(),
            coupon_id: applied.coupon_id.map(Into::into),
        }
    }
}

/// Discount of rent and deposit.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(context = Context)]
pub struct Discount {
    /// Discount of the rent.
    pub rent: Money,

    /// Discount of the deposit.
    pub deposit: Money,

    /// Sum of the rent and deposit discounts.
    pub total: Money,
}

impl From<domain::promotion::action::Discount> for Discount {
    fn from(discount: domain::promotion::action::Discount) -> Self {
        Self {
            rent: discount.rent,
            deposit: discount.deposit,
            total: discount.total(),
        }
    }
}

/// How a `Promotion` combines with the other applicable ones.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PromotionStackMode")]
pub enum StackMode {
    /// Adds up with every other applicable `Promotion`.
    Stack,

    /// Only the greatest of such `Promotion`s applies.
    HighestOnly,

    /// Only the greatest of such `Promotion`s applies, discarding all the
    /// others.
    Exclusive,
}

impl From<domain::promotion::StackMode> for StackMode {
    fn from(mode: domain::promotion::StackMode) -> Self {
        use domain::promotion::StackMode as M;
        match mode {
            M::Stack => Self::Stack,
            M::HighestOnly => Self::HighestOnly,
            M::Exclusive => Self::Exclusive,
        }
    }
}

/// Unique identifier of a `Promotion`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::promotion::Id)]
#[into(domain::promotion::Id)]
#[graphql(transparent)]
pub struct PromotionId(Uuid);

/// Unique identifier of a `Coupon`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::promotion::coupon::Id)]
#[into(domain::promotion::coupon::Id)]
#[graphql(transparent)]
pub struct CouponId(Uuid);

/// Sales channel a booking is made through, matched exactly.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(with = scalar::Via::<domain::promotion::Channel>)]
pub struct Channel(domain::promotion::Channel);

/// Code of a `Coupon`, matched exactly.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(with = scalar::Via::<domain::promotion::coupon::Code>)]
pub struct CouponCode(domain::promotion::coupon::Code);

impl AsError for query::pricing::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Settings(e) => e.try_as_error(),
            Self::RoomNotExists(_) => Some(RoomError::NotExists.into()),
            Self::UserNotExists(_) => Some(UserError::NotExists.into()),
        }
    }
}
