//! [`Promotion`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Select},
    Money,
};
use itertools::Itertools as _;
use tokio_postgres::{types::ToSql, Row};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        promotion::{
            self,
            action::{self, Magnitudes, Target},
            coupon,
            rule::MinSpend,
            scope, Action, Coupon, Rule, Scope, Validity,
        },
        Promotion,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::promotion::Candidates,
};

impl<C> Database<Select<By<Vec<Promotion>, Candidates>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Promotion>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Promotion>, Candidates>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Candidates { today, with_coupon } = by.into_inner();

        const SQL: &str = "\
            SELECT id, slug, \
                   valid_from, valid_until, \
                   stack_mode, priority, \
                   default_channel, require_coupon, is_active \
            FROM promotions \
            WHERE is_active \
              AND (valid_from IS NULL OR valid_from <= $1::DATE) \
              AND (valid_until IS NULL OR $1::DATE <= valid_until) \
              AND (require_coupon IS NULL OR require_coupon = $2::BOOL) \
            ORDER BY priority, id";
        let rows = self
            .query(SQL, &[&today, &with_coupon])
            .await
            .map_err(tracerr::wrap!())?;
        if rows.is_empty() {
            return Ok(vec![]);
        }
        let ids = rows
            .iter()
            .map(|r| r.get::<_, promotion::Id>("id"))
            .collect::<Vec<_>>();

        const SCOPES_SQL: &str = "\
            SELECT promotion_id, kind, target_id \
            FROM promotion_scopes \
            WHERE promotion_id = ANY($1::UUID[])";
        const RULES_SQL: &str = "\
            SELECT promotion_id, \
                   channel, date_from, date_until, days_of_week, \
                   time_start, time_end, billing_periods, \
                   min_spend, min_spend_rent, min_spend_deposit, \
                   user_ids, role_names, first_n_periods \
            FROM promotion_rules \
            WHERE promotion_id = ANY($1::UUID[])";
        const ACTIONS_SQL: &str = "\
            SELECT promotion_id, kind, \
                   percent_bps, amount, fixed_price, days, periods, \
                   target_rent, target_deposit, \
                   max_discount, priority \
            FROM promotion_actions \
            WHERE promotion_id = ANY($1::UUID[]) \
            ORDER BY priority, id";
        const COUPONS_SQL: &str = "\
            SELECT promotion_id, id, code, \
                   is_active, expires_at, max_redemptions \
            FROM coupons \
            WHERE promotion_id = ANY($1::UUID[])";
        let params: &[&(dyn ToSql + Sync)] = &[&ids];
        let (scopes, rules, actions, coupons) = futures::try_join!(
            self.query(SCOPES_SQL, params),
            self.query(RULES_SQL, params),
            self.query(ACTIONS_SQL, params),
            self.query(COUPONS_SQL, params),
        )
        .map_err(tracerr::wrap!())?;
        let mut scopes = group(scopes, scope);
        let mut rules = group(rules, rule);
        let mut actions = group(actions, action);
        let mut coupons = group(coupons, coupon);

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id: promotion::Id = row.get("id");
                let (
                    Some(scopes),
                    Some(rules),
                    Some(actions),
                    Some(coupons),
                ) = (
                    take(&mut scopes, id),
                    take(&mut rules, id),
                    take(&mut actions, id),
                    take(&mut coupons, id),
                )
                else {
                    log::warn!("skipping malformed `Promotion(id: {id})`");
                    return None;
                };

                Some(Promotion {
                    id,
                    slug: row.get("slug"),
                    validity: Validity {
                        from: row.get("valid_from"),
                        until: row.get("valid_until"),
                    },
                    stack_mode: row.get("stack_mode"),
                    priority: row.get("priority"),
                    default_channel: row.get("default_channel"),
                    require_coupon: row.get("require_coupon"),
                    is_active: row.get("is_active"),
                    scopes,
                    rules,
                    actions,
                    coupons,
                })
            })
            .collect())
    }
}

/// Groups the provided [`Row`]s by their `promotion_id` column, parsing each
/// one with the provided function.
///
/// [`None`] marks a [`Row`] failed to be parsed.
fn group<T>(
    rows: Vec<Row>,
    parse: fn(&Row) -> Option<T>,
) -> HashMap<promotion::Id, Vec<Option<T>>> {
    rows.iter()
        .map(|row| (row.get::<_, promotion::Id>("promotion_id"), parse(row)))
        .into_group_map()
}

/// Takes the children of the provided [`Promotion`] out of the ones
/// [`group`]ed, unless any of them is malformed.
fn take<T>(
    grouped: &mut HashMap<promotion::Id, Vec<Option<T>>>,
    id: promotion::Id,
) -> Option<Vec<T>> {
    grouped
        .remove(&id)
        .unwrap_or_default()
        .into_iter()
        .collect()
}

/// Parses a [`Scope`] from the provided [`Row`].
fn scope(row: &Row) -> Option<Scope> {
    Scope::new(
        row.get::<_, scope::Kind>("kind"),
        row.get::<_, Option<uuid::Uuid>>("target_id"),
    )
}

/// Parses a [`Rule`] from the provided [`Row`].
fn rule(row: &Row) -> Option<Rule> {
    let days_of_week = row
        .get::<_, Vec<i16>>("days_of_week")
        .into_iter()
        .map(|d| u8::try_from(d).ok().filter(|d| (1..=7).contains(d)))
        .collect::<Option<Vec<_>>>()?;
    let first_n_periods = row
        .get::<_, Option<i32>>("first_n_periods")
        .map(u32::try_from)
        .transpose()
        .ok()?;
    let min_spend =
        row.get::<_, Option<Money>>("min_spend").map(|amount| MinSpend {
            amount,
            basis: Target {
                rent: row.get("min_spend_rent"),
                deposit: row.get("min_spend_deposit"),
            },
        });

    Some(Rule {
        channel: row.get("channel"),
        date_from: row.get("date_from"),
        date_until: row.get("date_until"),
        days_of_week,
        time_start: row.get("time_start"),
        time_end: row.get("time_end"),
        billing_periods: row.get("billing_periods"),
        min_spend,
        user_ids: row.get("user_ids"),
        role_names: row.get("role_names"),
        first_n_periods,
    })
}

/// Parses an [`Action`] from the provided [`Row`].
fn action(row: &Row) -> Option<Action> {
    let kind = action::Kind::assemble(
        row.get("kind"),
        Magnitudes {
            percent_bps: row.get("percent_bps"),
            amount: row.get("amount"),
            fixed_price: row.get("fixed_price"),
            days: row.get("days"),
            periods: row.get("periods"),
        },
    )?;

    Some(Action {
        kind,
        target: Target {
            rent: row.get("target_rent"),
            deposit: row.get("target_deposit"),
        },
        max_discount: row.get("max_discount"),
        priority: row.get("priority"),
    })
}

/// Parses a [`Coupon`] from the provided [`Row`].
fn coupon(row: &Row) -> Option<Coupon> {
    let max_redemptions = row
        .get::<_, Option<i32>>("max_redemptions")
        .map(u32::try_from)
        .transpose()
        .ok()?;

    Some(Coupon {
        id: row.get::<_, coupon::Id>("id"),
        code: row.get("code"),
        is_active: row.get("is_active"),
        expires_at: row.get("expires_at"),
        max_redemptions,
    })
}
