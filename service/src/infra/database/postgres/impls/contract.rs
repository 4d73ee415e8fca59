//! [`Contract`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        contract::{self, BillingPeriod, InvoiceMode, Status, Term},
        Contract,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::{
        contract::{Booking, Overlapping},
        invoice::{EndingBy, Renewal},
    },
};

use super::narrow;

/// Columns of the `contracts` table parsed by [`from_row()`].
const COLUMNS: &str = "\
    c.id, c.number, c.room_id, c.tenant_id, \
    c.start_date, c.end_date, c.period, c.duration, c.billing_day, \
    c.rent, c.deposit, \
    c.invoice_mode, c.status, c.created_at";

/// Parses a [`Contract`] from the provided [`Row`] having the [`COLUMNS`].
fn from_row(row: &Row) -> Result<Contract, Traced<database::Error>> {
    Ok(Contract {
        id: row.get("id"),
        number: row.get("number"),
        room_id: row.get("room_id"),
        tenant_id: row.get("tenant_id"),
        term: Term {
            start: row.get("start_date"),
            end: row.get("end_date"),
            period: row.get("period"),
            duration: narrow::<i32, _>(row, "duration")
                .map_err(tracerr::wrap!())?,
        },
        billing_day: narrow::<i16, _>(row, "billing_day")
            .map_err(tracerr::wrap!())?,
        rent: row.get("rent"),
        deposit: row.get("deposit"),
        invoice_mode: row.get("invoice_mode"),
        status: row.get("status"),
        created_at: row.get("created_at"),
    })
}

impl<C> Database<Select<By<Option<Contract>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: contract::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM contracts AS c \
             WHERE c.id = $1::UUID",
        );
        self.query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row)
            .transpose()
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Option<Overlapping<contract::Id>>, Booking>>>
    for Postgres<C>
where
    C: Connection,
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

        const SQL: &str = "\
            SELECT id \
            FROM contracts \
            WHERE room_id = $1::UUID \
              AND status <> $2::INT2 \
              AND start_date < $4::DATE \
              AND $3::DATE < end_date \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&room_id, &Status::Cancelled, &start, &end])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Overlapping(row.get("id"))))
    }
}

impl<C> Database<Insert<Contract>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        let Contract {
            id,
            number,
            room_id,
            tenant_id,
            term:
                Term {
                    start,
                    end,
                    period,
                    duration,
                },
            billing_day,
            rent,
            deposit,
            invoice_mode,
            status,
            created_at,
        } = contract;
        // Both are bounded far below `i32::MAX` by the term validation.
        let duration = i32::try_from(duration).unwrap_or(i32::MAX);
        let billing_day = i16::from(billing_day);

        const SQL: &str = "\
            INSERT INTO contracts (\
                id, number, room_id, tenant_id, \
                start_date, end_date, period, duration, billing_day, \
                rent, deposit, \
                invoice_mode, status, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::INT8, $3::UUID, $4::UUID, \
                $5::DATE, $6::DATE, $7::INT2, $8::INT4, $9::INT2, \
                $10::INT8, $11::INT8, \
                $12::INT2, $13::INT2, $14::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &number,
                &room_id,
                &tenant_id,
                &start,
                &end,
                &period,
                &duration,
                &billing_day,
                &rent,
                &deposit,
                &invoice_mode,
                &status,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Renewal>, EndingBy>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Renewal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Renewal>, EndingBy>>,
    ) -> Result<Self::Ok, Self::Err> {
        let EndingBy(until) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS}, i.issued, i.last_period_end \
             FROM contracts AS c \
             INNER JOIN (\
                 SELECT contract_id, \
                        COUNT(*) AS issued, \
                        MAX(period_end) AS last_period_end \
                 FROM invoices \
                 GROUP BY contract_id\
             ) AS i ON i.contract_id = c.id \
             WHERE c.period = $1::INT2 \
               AND c.invoice_mode = $2::INT2 \
               AND c.status = ANY($3::INT2[]) \
               AND i.last_period_end <= $4::DATE \
             ORDER BY i.last_period_end, c.number",
        );
        self.query(
            sql.as_str(),
            &[
                &BillingPeriod::Monthly,
                &InvoiceMode::PerMonth,
                &[Status::Pending, Status::Active].as_slice(),
                &until,
            ],
        )
        .await
        .map_err(tracerr::wrap!())?
        .iter()
        .map(|row| {
            Ok(Renewal {
                contract: from_row(row).map_err(tracerr::wrap!())?,
                issued: narrow::<i64, _>(row, "issued")
                    .map_err(tracerr::wrap!())?,
                last_period_end: row.get("last_period_end"),
            })
        })
        .collect()
    }
}
