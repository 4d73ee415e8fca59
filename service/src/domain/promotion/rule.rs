//! [`Rule`] definitions.

use common::Money;
use time::{Date, Time};

use crate::domain::{contract::BillingPeriod, user, User};
#[cfg(doc)]
use crate::domain::Promotion;

use super::{action::Target, Channel};

/// Eligibility predicate of a [`Promotion`].
///
/// Every present field must be satisfied; absent fields and empty lists
/// impose no constraint.
#[derive(Clone, Debug, Default)]
pub struct Rule {
    /// Required booking [`Channel`].
    pub channel: Option<Channel>,

    /// First local date this [`Rule`] is satisfied on.
    pub date_from: Option<Date>,

    /// Last local date this [`Rule`] is satisfied on (inclusive).
    pub date_until: Option<Date>,

    /// ISO weekdays (`1` is Monday) this [`Rule`] is satisfied on.
    pub days_of_week: Vec<u8>,

    /// Local time of day this [`Rule`] is satisfied from.
    pub time_start: Option<Time>,

    /// Local time of day this [`Rule`] is satisfied until (inclusive).
    ///
    /// Being earlier than [`Rule::time_start`] makes the window wrap around
    /// midnight.
    pub time_end: Option<Time>,

    /// Names of [`BillingPeriod`]s this [`Rule`] is satisfied for, compared
    /// case-insensitively.
    pub billing_periods: Vec<String>,

    /// Minimal spend this [`Rule`] is satisfied by.
    pub min_spend: Option<MinSpend>,

    /// [`User`]s this [`Rule`] is satisfied for.
    pub user_ids: Vec<user::Id>,

    /// Role names of [`User`]s this [`Rule`] is satisfied for, compared
    /// case-insensitively.
    pub role_names: Vec<String>,

    /// Number of leading billing periods this [`Rule`] is satisfied for.
    pub first_n_periods: Option<u32>,
}

/// Minimal spend required by a [`Rule`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MinSpend {
    /// Required amount.
    pub amount: Money,

    /// Base amounts constituting the spend.
    pub basis: Target,
}

/// Facts about a pricing request a [`Rule`] is matched against.
#[derive(Clone, Copy, Debug)]
pub struct Facts<'a> {
    /// Local date of the request.
    pub date: Date,

    /// Local time of the request, truncated to minutes.
    pub time: Time,

    /// [`Channel`] the request is made through, if known.
    pub channel: Option<&'a Channel>,

    /// [`User`] making the request, if known.
    pub user: Option<&'a User>,

    /// Requested [`BillingPeriod`].
    pub period: BillingPeriod,

    /// Base rent, if priced.
    pub base_rent: Option<Money>,

    /// Base deposit, if priced.
    pub base_deposit: Option<Money>,

    /// 1-based index of the billed period.
    pub period_index: u32,
}

impl Rule {
    /// Indicates whether the provided [`Facts`] satisfy this [`Rule`].
    #[must_use]
    pub fn matches(&self, facts: &Facts<'_>) -> bool {
        if let Some(ch) = &self.channel {
            if facts.channel != Some(ch) {
                return false;
            }
        }

        if self.date_from.is_some_and(|from| facts.date < from)
            || self.date_until.is_some_and(|until| facts.date > until)
        {
            return false;
        }

        if !self.days_of_week.is_empty()
            && !self
                .days_of_week
                .contains(&facts.date.weekday().number_from_monday())
        {
            return false;
        }

        if !self.is_within_time_window(facts.time) {
            return false;
        }

        if !self.billing_periods.is_empty() {
            let period = facts.period.to_string();
            if !self
                .billing_periods
                .iter()
                .any(|p| p.trim().eq_ignore_ascii_case(&period))
            {
                return false;
            }
        }

        if let Some(min) = self.min_spend {
            let spend = min
                .basis
                .rent
                .then_some(facts.base_rent)
                .flatten()
                .unwrap_or_default()
                + min
                    .basis
                    .deposit
                    .then_some(facts.base_deposit)
                    .flatten()
                    .unwrap_or_default();
            if spend < min.amount {
                return false;
            }
        }

        if !self.user_ids.is_empty()
            && !facts.user.is_some_and(|u| self.user_ids.contains(&u.id))
        {
            return false;
        }

        if !self.role_names.is_empty()
            && !facts.user.is_some_and(|u| u.has_any_role(&self.role_names))
        {
            return false;
        }

        if self.first_n_periods.is_some_and(|n| facts.period_index > n) {
            return false;
        }

        true
    }

    /// Indicates whether the provided local [`Time`] is within the time
    /// window of this [`Rule`] at a minute granularity.
    fn is_within_time_window(&self, time: Time) -> bool {
        let minute = |t: Time| u16::from(t.hour()) * 60 + u16::from(t.minute());

        let now = minute(time);
        match (self.time_start.map(minute), self.time_end.map(minute)) {
            (None, None) => true,
            (Some(start), None) => start <= now,
            (None, Some(end)) => now <= end,
            (Some(start), Some(end)) if start <= end => {
                start <= now && now <= end
            }
            (Some(start), Some(end)) => start <= now || now <= end,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::Money;
    use time::macros::{date, time};

    use crate::domain::{
        contract::BillingPeriod,
        promotion::{action::Target, Channel},
        user::{self, Role},
        User,
    };

    use super::{Facts, MinSpend, Rule};

    fn facts() -> Facts<'static> {
        Facts {
            // Wednesday.
            date: date!(2025 - 01 - 15),
            time: time!(14:30),
            channel: None,
            user: None,
            period: BillingPeriod::Monthly,
            base_rent: Some(Money::new(1_000_000)),
            base_deposit: Some(Money::new(500_000)),
            period_index: 1,
        }
    }

    #[test]
    fn empty_rule_always_matches() {
        assert!(Rule::default().matches(&facts()));
    }

    #[test]
    fn matches_channel_exactly() {
        let rule = Rule {
            channel: Some("web".into()),
            ..Rule::default()
        };
        let web = Channel::from("web");
        let app = Channel::from("app");

        assert!(rule.matches(&Facts {
            channel: Some(&web),
            ..facts()
        }));
        assert!(!rule.matches(&Facts {
            channel: Some(&app),
            ..facts()
        }));
        assert!(!rule.matches(&facts()));
    }

    #[test]
    fn matches_inclusive_date_window() {
        let rule = Rule {
            date_from: Some(date!(2025 - 01 - 10)),
            date_until: Some(date!(2025 - 01 - 15)),
            ..Rule::default()
        };

        assert!(rule.matches(&facts()));
        assert!(!rule.matches(&Facts {
            date: date!(2025 - 01 - 16),
            ..facts()
        }));
        assert!(!rule.matches(&Facts {
            date: date!(2025 - 01 - 09),
            ..facts()
        }));
    }

    #[test]
    fn matches_iso_weekdays() {
        let weekend = Rule {
            days_of_week: vec![6, 7],
            ..Rule::default()
        };
        let wednesday = Rule {
            days_of_week: vec![3],
            ..Rule::default()
        };

        assert!(!weekend.matches(&facts()));
        assert!(weekend.matches(&Facts {
            date: date!(2025 - 01 - 19),
            ..facts()
        }));
        assert!(wednesday.matches(&facts()));
    }

    #[test]
    fn matches_time_window_wrapping_midnight() {
        let night = Rule {
            time_start: Some(time!(22:00)),
            time_end: Some(time!(06:00)),
            ..Rule::default()
        };
        let day = Rule {
            time_start: Some(time!(09:00)),
            time_end: Some(time!(14:30)),
            ..Rule::default()
        };

        assert!(!night.matches(&facts()));
        for t in [time!(23:15), time!(00:00), time!(06:00), time!(22:00)] {
            assert!(night.matches(&Facts { time: t, ..facts() }), "{t}");
        }
        assert!(day.matches(&facts()));
        assert!(day.matches(&Facts {
            time: time!(14:30:59),
            ..facts()
        }));
        assert!(!day.matches(&Facts {
            time: time!(14:31),
            ..facts()
        }));
    }

    #[test]
    fn matches_billing_periods_case_insensitively() {
        let rule = Rule {
            billing_periods: vec!["weekly".into(), "Monthly".into()],
            ..Rule::default()
        };

        assert!(rule.matches(&facts()));
        assert!(!rule.matches(&Facts {
            period: BillingPeriod::Daily,
            ..facts()
        }));
    }

    #[test]
    fn matches_min_spend_against_basis() {
        let rent_only = Rule {
            min_spend: Some(MinSpend {
                amount: Money::new(1_200_000),
                basis: Target {
                    rent: true,
                    deposit: false,
                },
            }),
            ..Rule::default()
        };
        let both = Rule {
            min_spend: Some(MinSpend {
                amount: Money::new(1_200_000),
                basis: Target {
                    rent: true,
                    deposit: true,
                },
            }),
            ..Rule::default()
        };

        assert!(!rent_only.matches(&facts()));
        assert!(both.matches(&facts()));
    }

    #[test]
    fn requires_user_for_user_and_role_predicates() {
        let id = user::Id::new();
        let tenant = User {
            id,
            roles: vec![Role::from("Student".to_owned())],
        };
        let by_id = Rule {
            user_ids: vec![id],
            ..Rule::default()
        };
        let by_role = Rule {
            role_names: vec!["STUDENT".into()],
            ..Rule::default()
        };

        assert!(!by_id.matches(&facts()));
        assert!(!by_role.matches(&facts()));
        assert!(by_id.matches(&Facts {
            user: Some(&tenant),
            ..facts()
        }));
        assert!(by_role.matches(&Facts {
            user: Some(&tenant),
            ..facts()
        }));
    }

    #[test]
    fn gates_first_n_periods() {
        let rule = Rule {
            first_n_periods: Some(2),
            ..Rule::default()
        };

        assert!(rule.matches(&facts()));
        assert!(rule.matches(&Facts {
            period_index: 2,
            ..facts()
        }));
        assert!(!rule.matches(&Facts {
            period_index: 3,
            ..facts()
        }));
    }
}
