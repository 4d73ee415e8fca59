//! [`Invoice`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use postgres_types::Json;
use tracerr::Traced;

use crate::{
    domain::{contract, Invoice},
    infra::{
        database::{self, postgres, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Insert<Invoice>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(invoice): Insert<Invoice>,
    ) -> Result<Self::Ok, Self::Err> {
        let Invoice {
            id,
            contract_id,
            period_start,
            period_end,
            due_at,
            status,
            items,
        } = invoice;

        const SQL: &str = "\
            INSERT INTO invoices (\
                id, contract_id, \
                period_start, period_end, \
                due_at, status, items\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::DATE, $4::DATE, \
                $5::TIMESTAMPTZ, $6::INT2, $7::JSONB\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &contract_id,
                &period_start,
                &period_end,
                &due_at,
                &status,
                &Json(&items),
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Invoice>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Invoice>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Invoice>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let contract_id: contract::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, contract_id, \
                   period_start, period_end, \
                   due_at, status, items \
            FROM invoices \
            WHERE contract_id = $1::UUID \
            ORDER BY period_start";
        self.query(SQL, &[&contract_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let items = serde_json::from_value(row.get("items"))
                    .map_err(|source| postgres::Error::Malformed {
                        column: "items",
                        source,
                    })
                    .map_err(tracerr::wrap!())
                    .map_err(tracerr::map_from)?;
                Ok(Invoice {
                    id: row.get("id"),
                    contract_id: row.get("contract_id"),
                    period_start: row.get("period_start"),
                    period_end: row.get("period_end"),
                    due_at: row.get("due_at"),
                    status: row.get("status"),
                    items,
                })
            })
            .collect()
    }
}
