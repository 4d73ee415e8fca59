//! Resolution of [`Promotion`]s into the final rent and deposit of a [`Room`].

mod stacking;

use common::{DateTime, Money};
use time::UtcOffset;
use tracing as log;

use crate::domain::{
    contract::BillingPeriod,
    promotion::{
        self,
        action::{self, Action, Discount},
        coupon, rule, Channel, StackMode,
    },
    Promotion, Room, User,
};

/// Number of days a monthly rent is divided by to get a rent of a single day.
pub const DAYS_PER_MONTH: u32 = 30;

/// Context of a pricing request.
#[derive(Clone, Copy, Debug)]
pub struct Context<'a> {
    /// Moment the request is evaluated at.
    pub now: DateTime,

    /// Offset of the local time, used for date and time predicates.
    pub utc_offset: UtcOffset,

    /// [`User`] requesting the price, if known.
    pub user: Option<&'a User>,

    /// [`Channel`] the request is made through, if known.
    pub channel: Option<&'a Channel>,

    /// [`coupon::Code`] provided with the request, if any.
    pub coupon_code: Option<&'a coupon::Code>,

    /// 1-based index of the billed period.
    pub period_index: u32,

    /// Price of a single rent day overriding the derived one.
    pub per_day_rate: Option<Money>,

    /// Base rent overriding the [`Room`] one.
    pub base_rent: Option<Money>,

    /// Base deposit overriding the [`Room`] one.
    pub base_deposit: Option<Money>,
}

impl Context<'_> {
    /// Creates a new [`Context`] of the first billed period at the provided
    /// moment.
    #[must_use]
    pub fn new(now: DateTime, utc_offset: UtcOffset) -> Self {
        Self {
            now,
            utc_offset,
            user: None,
            channel: None,
            coupon_code: None,
            period_index: 1,
            per_day_rate: None,
            base_rent: None,
            base_deposit: None,
        }
    }
}

/// Result of a pricing evaluation.
#[derive(Clone, Debug, Default)]
pub struct Evaluation {
    /// Rent before discounts, if priced.
    pub base_rent: Option<Money>,

    /// Deposit before discounts, if priced.
    pub base_deposit: Option<Money>,

    /// Rent after discounts, if priced.
    pub final_rent: Option<Money>,

    /// Deposit after discounts, if priced.
    pub final_deposit: Option<Money>,

    /// [`Applied`] promotions, ordered by their priority.
    pub applied: Vec<Applied>,
}

impl Evaluation {
    /// Creates a new [`Evaluation`] leaving the provided base amounts
    /// undiscounted.
    fn undiscounted(
        base_rent: Option<Money>,
        base_deposit: Option<Money>,
    ) -> Self {
        Self {
            base_rent,
            base_deposit,
            final_rent: base_rent,
            final_deposit: base_deposit,
            applied: vec![],
        }
    }

    /// Returns the total [`Discount`] of this [`Evaluation`].
    #[must_use]
    pub fn discount(&self) -> Discount {
        self.applied.iter().map(|a| a.discount).sum()
    }
}

/// [`Promotion`] applied by an [`Evaluation`].
#[derive(Clone, Debug)]
pub struct Applied {
    /// ID of the applied [`Promotion`].
    pub promotion_id: promotion::Id,

    /// Slug of the applied [`Promotion`].
    pub slug: promotion::Slug,

    /// [`StackMode`] of the applied [`Promotion`].
    pub stack_mode: StackMode,

    /// Priority of the applied [`Promotion`].
    pub priority: i32,

    /// [`Discount`] granted by the applied [`Promotion`].
    pub discount: Discount,

    /// [`Action`]s of the applied [`Promotion`].
    pub actions: Vec<Action>,

    /// ID of the [`coupon::Coupon`] unlocking the [`Promotion`], if any.
    pub coupon_id: Option<coupon::Id>,
}

/// Evaluates the final rent and deposit of the provided [`Room`] for the
/// provided [`BillingPeriod`] by applying the eligible `candidates`.
///
/// Lacking a price, an invalid coupon or no eligible [`Promotion`] are not
/// errors, but result in an undiscounted [`Evaluation`].
#[must_use]
pub fn evaluate(
    room: &Room,
    period: BillingPeriod,
    ctx: &Context<'_>,
    candidates: &[Promotion],
) -> Evaluation {
    let base_rent = ctx.base_rent.or_else(|| room.effective_price(period));
    let base_deposit =
        ctx.base_deposit.or_else(|| room.effective_deposit(period));
    if base_rent.is_none() && base_deposit.is_none() {
        log::debug!("`Room(id: {})` is not priced for {period}", room.id);
        return Evaluation::undiscounted(None, None);
    }

    let today = ctx.now.date_at(ctx.utc_offset);
    let mut candidates = candidates
        .iter()
        .filter(|p| p.is_candidate(today, ctx.coupon_code.is_some()))
        .filter(|p| p.covers(room))
        .collect::<Vec<_>>();
    candidates.sort_by_key(|p| p.priority);

    let mut coupon_id = None;
    if let Some(code) = ctx.coupon_code {
        let Some((promo, id)) = candidates.iter().find_map(|p| {
            p.coupons
                .iter()
                .find(|c| &c.code == code && c.is_redeemable(ctx.now))
                .map(|c| (*p, c.id))
        }) else {
            log::debug!("coupon `{code}` is not redeemable");
            return Evaluation::undiscounted(base_rent, base_deposit);
        };
        coupon_id = Some(id);
        candidates = vec![promo];
    }

    let facts = rule::Facts {
        date: today,
        time: ctx.now.time_at(ctx.utc_offset),
        channel: ctx.channel,
        user: ctx.user,
        period,
        base_rent,
        base_deposit,
        period_index: ctx.period_index,
    };
    let basis = action::Basis {
        rent: base_rent,
        deposit: base_deposit,
        per_day_rate: ctx.per_day_rate.unwrap_or_else(|| {
            base_rent.unwrap_or_default().div_floor(DAYS_PER_MONTH)
        }),
        period_index: ctx.period_index,
    };

    let eligible = candidates
        .into_iter()
        .filter(|p| {
            p.default_channel
                .as_ref()
                .zip(ctx.channel)
                .map_or(true, |(own, requested)| own == requested)
        })
        .filter(|p| p.qualifies(&facts))
        .filter_map(|p| {
            let discount = p
                .actions
                .iter()
                .map(|a| a.discount(&basis))
                .sum::<Discount>()
                .clamp_to(base_rent, base_deposit);
            discount.is_positive().then(|| Applied {
                promotion_id: p.id,
                slug: p.slug.clone(),
                stack_mode: p.stack_mode,
                priority: p.priority,
                discount,
                actions: p.actions.clone(),
                coupon_id,
            })
        })
        .collect();

    let applied = stacking::resolve(eligible);
    let total = applied.iter().map(|a| a.discount).sum::<Discount>();
    Evaluation {
        base_rent,
        base_deposit,
        final_rent: base_rent.map(|b| b.deduct(total.rent)),
        final_deposit: base_deposit.map(|b| b.deduct(total.deposit)),
        applied,
    }
}

#[cfg(test)]
mod spec {
    use common::{DateTime, Money, Percent};
    use time::UtcOffset;

    use crate::domain::{
        contract::BillingPeriod,
        promotion::{
            self,
            action::{self, Action, Target},
            coupon::{self, Coupon},
            Channel, Rule, Scope, Slug, StackMode, Validity,
        },
        room::{self, Rate, Rates},
        Promotion, Room,
    };

    use super::{evaluate, Context};

    fn room(rent: i64, deposit: Option<i64>) -> Room {
        Room {
            id: room::Id::new(),
            number: room::Number::new("101").unwrap(),
            building_id: room::BuildingId::new(),
            floor_id: room::FloorId::new(),
            type_id: room::TypeId::new(),
            rates: Rates::default(),
            type_rates: [(
                BillingPeriod::Monthly,
                Rate {
                    rent: Some(Money::new(rent)),
                    deposit: deposit.map(Money::new),
                },
            )]
            .into_iter()
            .collect(),
        }
    }

    fn promo(priority: i32, mode: StackMode, off: i64) -> Promotion {
        Promotion {
            id: promotion::Id::new(),
            slug: Slug::from(format!("promo-{priority}")),
            validity: Validity::default(),
            stack_mode: mode,
            priority,
            default_channel: None,
            require_coupon: None,
            is_active: true,
            scopes: vec![],
            rules: vec![],
            actions: vec![Action {
                kind: action::Kind::Amount {
                    amount: Money::new(off),
                },
                target: Target::default(),
                max_discount: None,
                priority: 0,
            }],
            coupons: vec![],
        }
    }

    fn ctx() -> Context<'static> {
        Context::new(
            DateTime::from_rfc3339("2025-01-15T03:00:00Z").unwrap(),
            UtcOffset::from_hms(7, 0, 0).unwrap(),
        )
    }

    #[test]
    fn unpriced_room_is_not_discounted() {
        let mut r = room(1_000, None);
        r.type_rates = Rates::default();

        let ev = evaluate(
            &r,
            BillingPeriod::Monthly,
            &ctx(),
            &[promo(1, StackMode::Stack, 100)],
        );

        assert_eq!(ev.base_rent, None);
        assert_eq!(ev.final_rent, None);
        assert!(ev.applied.is_empty());
    }

    #[test]
    fn exclusive_discards_others() {
        let ev = evaluate(
            &room(1_000, None),
            BillingPeriod::Monthly,
            &ctx(),
            &[
                promo(1, StackMode::Stack, 50),
                promo(2, StackMode::Exclusive, 100),
            ],
        );

        assert_eq!(ev.applied.len(), 1);
        assert_eq!(ev.applied[0].stack_mode, StackMode::Exclusive);
        assert_eq!(ev.final_rent, Some(Money::new(900)));
    }

    #[test]
    fn highest_only_combines_with_stack() {
        let ev = evaluate(
            &room(1_000, None),
            BillingPeriod::Monthly,
            &ctx(),
            &[
                promo(1, StackMode::HighestOnly, 60),
                promo(2, StackMode::HighestOnly, 80),
                promo(3, StackMode::Stack, 10),
            ],
        );

        assert_eq!(ev.discount().rent, Money::new(90));
        assert_eq!(ev.final_rent, Some(Money::new(910)));
        assert_eq!(
            ev.applied.iter().map(|a| a.priority).collect::<Vec<_>>(),
            [2, 3],
        );
    }

    #[test]
    fn ties_are_won_by_earlier_priority() {
        let first = promo(1, StackMode::Exclusive, 100);
        let second = promo(2, StackMode::Exclusive, 100);

        let ev = evaluate(
            &room(1_000, None),
            BillingPeriod::Monthly,
            &ctx(),
            &[second, first.clone()],
        );

        assert_eq!(ev.applied.len(), 1);
        assert_eq!(ev.applied[0].promotion_id, first.id);
    }

    #[test]
    fn percent_action_floors_discount() {
        let mut p = promo(1, StackMode::Stack, 0);
        p.actions[0].kind = action::Kind::Percent {
            percent: Percent::from_bps(2000).unwrap(),
        };

        let ev = evaluate(
            &room(1_500_000, None),
            BillingPeriod::Monthly,
            &ctx(),
            &[p],
        );

        assert_eq!(ev.discount().rent, Money::new(300_000));
        assert_eq!(ev.final_rent, Some(Money::new(1_200_000)));
    }

    #[test]
    fn discount_is_clamped_to_base() {
        let mut p = promo(1, StackMode::Stack, 700);
        p.actions.push(p.actions[0]);

        let ev = evaluate(
            &room(1_000, Some(300)),
            BillingPeriod::Monthly,
            &ctx(),
            &[p],
        );

        assert_eq!(ev.discount().rent, Money::new(1_000));
        assert_eq!(ev.final_rent, Some(Money::ZERO));
        assert_eq!(ev.final_deposit, Some(Money::new(300)));
    }

    #[test]
    fn invalid_coupon_is_not_discounted() {
        let mut p = promo(1, StackMode::Stack, 100);
        p.require_coupon = Some(true);
        p.coupons.push(Coupon {
            id: coupon::Id::new(),
            code: coupon::Code::from("HEMAT10"),
            is_active: true,
            expires_at: None,
            max_redemptions: None,
        });
        let bad = coupon::Code::from("BADCODE");

        let ev = evaluate(
            &room(1_000, None),
            BillingPeriod::Monthly,
            &Context {
                coupon_code: Some(&bad),
                ..ctx()
            },
            &[p],
        );

        assert!(ev.applied.is_empty());
        assert_eq!(ev.final_rent, ev.base_rent);
    }

    #[test]
    fn valid_coupon_narrows_to_its_promotion() {
        let mut gated = promo(2, StackMode::Stack, 100);
        gated.require_coupon = Some(true);
        let coupon_id = coupon::Id::new();
        gated.coupons.push(Coupon {
            id: coupon_id,
            code: coupon::Code::from("HEMAT10"),
            is_active: true,
            expires_at: None,
            max_redemptions: Some(10),
        });
        let open = promo(1, StackMode::Stack, 50);
        let without_coupon = {
            let mut p = promo(3, StackMode::Stack, 25);
            p.require_coupon = Some(false);
            p
        };
        let code = coupon::Code::from("HEMAT10");

        let ev = evaluate(
            &room(1_000, None),
            BillingPeriod::Monthly,
            &Context {
                coupon_code: Some(&code),
                ..ctx()
            },
            &[open.clone(), gated.clone(), without_coupon.clone()],
        );
        assert_eq!(ev.applied.len(), 1);
        assert_eq!(ev.applied[0].promotion_id, gated.id);
        assert_eq!(ev.applied[0].coupon_id, Some(coupon_id));

        let ev = evaluate(
            &room(1_000, None),
            BillingPeriod::Monthly,
            &ctx(),
            &[open, gated, without_coupon],
        );
        assert_eq!(ev.discount().rent, Money::new(75));
    }

    #[test]
    fn filters_by_scope() {
        let r = room(1_000, None);
        let mut other_building = promo(1, StackMode::Stack, 100);
        other_building.scopes = vec![Scope::Building(room::BuildingId::new())];
        let mut same_floor = promo(2, StackMode::Stack, 10);
        same_floor.scopes = vec![
            Scope::Room(room::Id::new()),
            Scope::Floor(r.floor_id),
        ];
        let mut global = promo(3, StackMode::Stack, 1);
        global.scopes = vec![Scope::Global];

        let ev = evaluate(
            &r,
            BillingPeriod::Monthly,
            &ctx(),
            &[other_building, same_floor, global],
        );

        assert_eq!(ev.discount().rent, Money::new(11));
    }

    #[test]
    fn skips_promotions_of_other_channel() {
        let mut p = promo(1, StackMode::Stack, 100);
        p.default_channel = Some(Channel::from("app"));
        let web = Channel::from("web");
        let app = Channel::from("app");

        let eval_with = |channel| {
            evaluate(
                &room(1_000, None),
                BillingPeriod::Monthly,
                &Context { channel, ..ctx() },
                &[p.clone()],
            )
        };

        assert!(eval_with(Some(&web)).applied.is_empty());
        assert_eq!(eval_with(Some(&app)).applied.len(), 1);
        assert_eq!(eval_with(None).applied.len(), 1);
    }

    #[test]
    fn ors_rules_of_promotion() {
        let mut p = promo(1, StackMode::Stack, 100);
        p.rules = vec![
            Rule {
                billing_periods: vec!["daily".into()],
                ..Rule::default()
            },
            Rule {
                first_n_periods: Some(1),
                ..Rule::default()
            },
        ];

        let first = evaluate(
            &room(1_000, None),
            BillingPeriod::Monthly,
            &ctx(),
            std::slice::from_ref(&p),
        );
        let second = evaluate(
            &room(1_000, None),
            BillingPeriod::Monthly,
            &Context {
                period_index: 2,
                ..ctx()
            },
            &[p],
        );

        assert_eq!(first.applied.len(), 1);
        assert!(second.applied.is_empty());
    }

    #[test]
    fn skips_expired_and_inactive_promotions() {
        let mut expired = promo(1, StackMode::Stack, 100);
        expired.validity.until = Some(time::macros::date!(2025 - 01 - 14));
        let mut inactive = promo(2, StackMode::Stack, 100);
        inactive.is_active = false;

        let ev = evaluate(
            &room(1_000, None),
            BillingPeriod::Monthly,
            &ctx(),
            &[expired, inactive],
        );

        assert!(ev.applied.is_empty());
    }

    #[test]
    fn free_days_derive_per_day_rate_from_rent() {
        let mut p = promo(1, StackMode::Stack, 0);
        p.actions[0].kind = action::Kind::FreeNDays { days: 2 };

        let derived = evaluate(
            &room(1_000_000, None),
            BillingPeriod::Monthly,
            &ctx(),
            std::slice::from_ref(&p),
        );
        let overridden = evaluate(
            &room(1_000_000, None),
            BillingPeriod::Monthly,
            &Context {
                per_day_rate: Some(Money::new(40_000)),
                ..ctx()
            },
            &[p],
        );

        assert_eq!(derived.discount().rent, Money::new(66_666));
        assert_eq!(overridden.discount().rent, Money::new(80_000));
    }
}
