//! Billing cycles of [`Contract`]s turned into [`Invoice`]s.

mod items;
mod release;

use common::{calendar, DateTime, Money};
use time::Date;
use tracing as log;

use crate::{
    domain::{
        contract::{BillingPeriod, InvoiceMode, Term},
        invoice, Contract, Invoice,
    },
    settings::Settings,
};

pub use self::release::{
    daily_rate, is_misaligned, next_release_date, prorata_until_next_release,
    prorate,
};

/// Returns the day of month the monthly periods of a [`Contract`] starting
/// at the provided `start` are aligned to.
///
/// This is the release day only for a prorated term. A term starting on a
/// release day clamped to a short month keeps its `start` day, so that the
/// first full month ends right before the second one starts.
#[must_use]
pub fn billing_day(
    start: Date,
    period: BillingPeriod,
    settings: &Settings,
) -> u8 {
    let release_day = settings.release_day();
    if period == BillingPeriod::Monthly
        && settings.prorata
        && is_misaligned(start, release_day)
    {
        release_day
    } else {
        start.day()
    }
}

/// Generates the [`Invoice`]s issued along with the provided [`Contract`].
///
/// Exactly one [`Invoice`] is generated: the whole term for daily, weekly and
/// [`InvoiceMode::Full`] monthly contracts, or the first month (preceded by
/// the prorated days before the release day) for [`InvoiceMode::PerMonth`]
/// monthly contracts.
#[must_use]
pub fn generate_initial_invoices(
    contract: &Contract,
    rent: Money,
    deposit: Money,
    duration: u32,
    mode: InvoiceMode,
    settings: &Settings,
    now: DateTime,
) -> Vec<Invoice> {
    let Term { start, period, .. } = contract.term;
    let release_day = settings.release_day();
    let prorated = period == BillingPeriod::Monthly
        && settings.prorata
        && is_misaligned(start, release_day);

    let mut lines = Vec::with_capacity(3);
    let period_end = match (period, mode) {
        (BillingPeriod::Daily | BillingPeriod::Weekly, _) => {
            lines.push(items::rent(rent, period, duration));
            period.advance(start, duration)
        }
        (BillingPeriod::Monthly, InvoiceMode::Full) => {
            if prorated {
                let release = next_release_date(start, release_day);
                lines.push(items::prorata(rent, start, release));
            }
            lines.push(items::rent(rent, period, duration));
            period.advance(start, duration)
        }
        (BillingPeriod::Monthly, InvoiceMode::PerMonth) => {
            if prorated {
                let release = next_release_date(start, release_day);
                lines.push(items::prorata(rent, start, release));
                lines.push(items::rent(rent, period, 1));
                release
            } else {
                lines.push(items::rent(rent, period, 1));
                day_before(calendar::add_months(start, 1))
            }
        }
    };
    if deposit.is_positive() {
        lines.push(items::deposit(deposit));
    }

    let invoice = issue(contract, start, period_end, lines, settings, now);
    log::debug!(
        "generated initial `Invoice` of {} for `Contract(id: {})` \
         covering {start}..{period_end}",
        invoice.amount(),
        contract.id,
    );
    vec![invoice]
}

/// Generates the next [`InvoiceMode::PerMonth`] [`Invoice`] of the provided
/// monthly [`Contract`], having the provided number of [`Invoice`]s
/// already `issued`.
///
/// Months are aligned to the [`Contract::billing_day`]. A last month cut
/// short by the end of the [`Term`] is prorated.
///
/// [`None`] is returned once the whole [`Term`] is invoiced.
#[must_use]
pub fn next_monthly_invoice(
    contract: &Contract,
    issued: u32,
    settings: &Settings,
    now: DateTime,
) -> Option<Invoice> {
    if contract.term.period != BillingPeriod::Monthly || issued == 0 {
        return None;
    }

    let start = month_start(contract, issued);
    if start >= contract.term.end {
        return None;
    }
    let next = month_start(contract, issued + 1);

    let (period_end, item) = if next > contract.term.end {
        (
            day_before(contract.term.end),
            items::prorata(contract.rent, start, contract.term.end),
        )
    } else {
        (
            day_before(next),
            items::rent(contract.rent, BillingPeriod::Monthly, 1),
        )
    };
    Some(issue(contract, start, period_end, vec![item], settings, now))
}

/// Returns the first day of the `index`th full month of the provided monthly
/// [`Contract`], counting from zero.
fn month_start(contract: &Contract, index: u32) -> Date {
    let anchor = next_release_date(contract.term.start, contract.billing_day);
    calendar::with_day_clamped(
        calendar::add_months(calendar::with_day_clamped(anchor, 1), index),
        contract.billing_day,
    )
}

/// Returns the day preceding the provided [`Date`].
fn day_before(date: Date) -> Date {
    date.previous_day().unwrap_or(date)
}

/// Creates a new [`invoice::Status::Pending`] [`Invoice`] of the provided
/// [`invoice::Item`]s.
fn issue(
    contract: &Contract,
    period_start: Date,
    period_end: Date,
    items: Vec<invoice::Item>,
    settings: &Settings,
    now: DateTime,
) -> Invoice {
    Invoice {
        id: invoice::Id::new(),
        contract_id: contract.id,
        period_start,
        period_end,
        due_at: (now + settings.invoice_due_in()).coerce(),
        status: invoice::Status::Pending,
        items,
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{DateTime, Money};
    use time::{macros::date, Date};

    use crate::{
        domain::{
            contract::{self, BillingPeriod, InvoiceMode, Status, Term},
            invoice::item::{Code, Unit},
            room, user, Contract,
        },
        settings::Settings,
    };

    use super::{
        billing_day, generate_initial_invoices, next_monthly_invoice,
    };

    fn contract(
        start: Date,
        period: BillingPeriod,
        duration: u32,
        settings: &Settings,
    ) -> Contract {
        Contract {
            id: contract::Id::new(),
            number: contract::Number::from(1),
            room_id: room::Id::new(),
            tenant_id: user::Id::new(),
            term: Term::new(start, period, duration),
            billing_day: billing_day(start, period, settings),
            rent: Money::new(1_000_000),
            deposit: Money::new(500_000),
            invoice_mode: InvoiceMode::PerMonth,
            status: Status::Pending,
            created_at: DateTime::now().coerce(),
        }
    }

    fn codes(inv: &crate::domain::Invoice) -> Vec<Code> {
        inv.items.iter().map(|i| i.code).collect()
    }

    #[test]
    fn prorates_first_per_month_invoice() {
        let settings = Settings::default();
        let c = contract(
            date!(2025 - 06 - 25),
            BillingPeriod::Monthly,
            3,
            &settings,
        );
        let now = DateTime::now();

        let invoices = generate_initial_invoices(
            &c,
            c.rent,
            c.deposit,
            3,
            InvoiceMode::PerMonth,
            &settings,
            now,
        );

        assert_eq!(invoices.len(), 1);
        let inv = &invoices[0];
        assert_eq!(codes(inv), [Code::Prorata, Code::Rent, Code::Deposit]);
        assert_eq!(inv.items[0].amount, Money::new(199_998));
        assert_eq!(inv.items[0].meta.qty, 6);
        assert_eq!(inv.items[0].meta.unit, Unit::Day);
        assert_eq!(inv.items[0].meta.unit_price, Money::new(33_333));
        assert_eq!(inv.items[1].amount, Money::new(1_000_000));
        assert_eq!(inv.period_start, date!(2025 - 06 - 25));
        assert_eq!(inv.period_end, date!(2025 - 07 - 01));
        assert_eq!(
            inv.amount(),
            Money::new(199_998 + 1_000_000 + 500_000),
        );
        assert_eq!(
            inv.due_at.coerce::<()>(),
            now + Duration::from_secs(24 * 3600),
        );
    }

    #[test]
    fn aligned_start_is_not_prorated() {
        let settings = Settings::default();
        let c = contract(
            date!(2025 - 06 - 01),
            BillingPeriod::Monthly,
            3,
            &settings,
        );

        let inv = generate_initial_invoices(
            &c,
            c.rent,
            Money::ZERO,
            3,
            InvoiceMode::PerMonth,
            &settings,
            DateTime::now(),
        )
        .remove(0);

        assert_eq!(codes(&inv), [Code::Rent]);
        assert_eq!(inv.period_end, date!(2025 - 06 - 30));
        assert_eq!(inv.amount(), Money::new(1_000_000));
    }

    #[test]
    fn disabled_prorata_bills_whole_months() {
        let settings = Settings {
            prorata: false,
            ..Settings::default()
        };
        let c = contract(
            date!(2025 - 01 - 31),
            BillingPeriod::Monthly,
            2,
            &settings,
        );

        let inv = generate_initial_invoices(
            &c,
            c.rent,
            c.deposit,
            2,
            InvoiceMode::PerMonth,
            &settings,
            DateTime::now(),
        )
        .remove(0);

        assert_eq!(codes(&inv), [Code::Rent, Code::Deposit]);
        assert_eq!(inv.period_end, date!(2025 - 02 - 27));
    }

    #[test]
    fn bills_whole_term_in_full_mode() {
        let settings = Settings::default();
        let c = contract(
            date!(2025 - 06 - 25),
            BillingPeriod::Monthly,
            3,
            &settings,
        );

        let inv = generate_initial_invoices(
            &c,
            c.rent,
            c.deposit,
            3,
            InvoiceMode::Full,
            &settings,
            DateTime::now(),
        )
        .remove(0);

        assert_eq!(codes(&inv), [Code::Prorata, Code::Rent, Code::Deposit]);
        assert_eq!(inv.items[1].meta.qty, 3);
        assert_eq!(inv.items[1].amount, Money::new(3_000_000));
        assert_eq!(inv.period_end, date!(2025 - 09 - 25));
        assert_eq!(
            inv.amount(),
            inv.items.iter().map(|i| i.amount).sum::<Money>(),
        );
    }

    #[test]
    fn never_prorates_daily_and_weekly() {
        let settings = Settings::default();
        for (period, unit, end) in [
            (BillingPeriod::Daily, Unit::Day, date!(2025 - 06 - 29)),
            (BillingPeriod::Weekly, Unit::Week, date!(2025 - 07 - 23)),
        ] {
            let c = contract(date!(2025 - 06 - 25), period, 4, &settings);

            let inv = generate_initial_invoices(
                &c,
                Money::new(100_000),
                Money::ZERO,
                4,
                InvoiceMode::PerMonth,
                &settings,
                DateTime::now(),
            )
            .remove(0);

            assert_eq!(codes(&inv), [Code::Rent]);
            assert_eq!(inv.items[0].meta.unit, unit);
            assert_eq!(inv.items[0].amount, Money::new(400_000));
            assert_eq!(inv.period_end, end);
            assert_eq!(inv.period_end, c.term.end);
        }
    }

    #[test]
    fn issues_following_months_until_term_end() {
        let settings = Settings::default();
        let c = contract(
            date!(2025 - 06 - 25),
            BillingPeriod::Monthly,
            3,
            &settings,
        );
        let now = DateTime::now();

        let second = next_monthly_invoice(&c, 1, &settings, now).unwrap();
        assert_eq!(codes(&second), [Code::Rent]);
        assert_eq!(second.period_start, date!(2025 - 08 - 01));
        assert_eq!(second.period_end, date!(2025 - 08 - 31));
        assert_eq!(second.amount(), Money::new(1_000_000));

        // September is cut short by the checkout on the 25th.
        let third = next_monthly_invoice(&c, 2, &settings, now).unwrap();
        assert_eq!(codes(&third), [Code::Prorata]);
        assert_eq!(third.period_start, date!(2025 - 09 - 01));
        assert_eq!(third.period_end, date!(2025 - 09 - 24));
        assert_eq!(third.items[0].meta.qty, 24);
        assert_eq!(third.amount(), Money::new(33_333 * 24));

        assert!(next_monthly_invoice(&c, 3, &settings, now).is_none());
    }

    #[test]
    fn keeps_months_aligned_to_billing_day() {
        let settings = Settings {
            prorata: false,
            ..Settings::default()
        };
        let c = contract(
            date!(2025 - 01 - 31),
            BillingPeriod::Monthly,
            3,
            &settings,
        );
        let now = DateTime::now();

        let second = next_monthly_invoice(&c, 1, &settings, now).unwrap();
        assert_eq!(second.period_start, date!(2025 - 02 - 28));
        assert_eq!(second.period_end, date!(2025 - 03 - 30));

        let third = next_monthly_invoice(&c, 2, &settings, now).unwrap();
        assert_eq!(third.period_start, date!(2025 - 03 - 31));
        assert_eq!(third.period_end, date!(2025 - 04 - 29));
        assert_eq!(codes(&third), [Code::Rent]);

        assert!(next_monthly_invoice(&c, 3, &settings, now).is_none());
    }

    #[test]
    fn uses_start_day_on_clamped_release_day() {
        let settings = Settings {
            release_day_of_month: 31,
            ..Settings::default()
        };

        let day =
            |start| billing_day(start, BillingPeriod::Monthly, &settings);

        assert_eq!(day(date!(2025 - 02 - 28)), 28);
        assert_eq!(day(date!(2025 - 02 - 10)), 31);
        assert_eq!(day(date!(2025 - 03 - 31)), 31);
    }

    #[test]
    fn bills_months_without_gaps() {
        let now = DateTime::now();
        for release_day in [1, 15, 28, 29, 30, 31] {
            let settings = Settings {
                release_day_of_month: release_day,
                ..Settings::default()
            };
            for start in [
                date!(2025 - 01 - 31),
                date!(2025 - 02 - 28),
                date!(2024 - 02 - 29),
                date!(2025 - 04 - 30),
                date!(2025 - 06 - 15),
                date!(2025 - 12 - 29),
            ] {
                let c = contract(start, BillingPeriod::Monthly, 4, &settings);
                let first = generate_initial_invoices(
                    &c,
                    c.rent,
                    Money::ZERO,
                    4,
                    InvoiceMode::PerMonth,
                    &settings,
                    now,
                )
                .remove(0);

                // A prorated first invoice also bills the whole month
                // starting on its `period_end` release day.
                let prorated = first.items[0].code == Code::Prorata;
                let mut expected = (!prorated)
                    .then(|| first.period_end.next_day().unwrap());
                let mut issued = 1;
                while let Some(inv) =
                    next_monthly_invoice(&c, issued, &settings, now)
                {
                    if let Some(expected) = expected {
                        assert_eq!(
                            inv.period_start, expected,
                            "release day {release_day}, start {start}, \
                             invoice {issued}",
                        );
                    } else {
                        assert!(inv.period_start > first.period_end);
                    }
                    assert!(inv.period_end >= inv.period_start);
                    expected = inv.period_end.next_day();
                    issued += 1;
                }
                assert!(
                    issued > 1,
                    "release day {release_day}, start {start}",
                );
                assert_eq!(
                    expected,
                    Some(c.term.end),
                    "release day {release_day}, start {start}",
                );
            }
        }
    }
}
