//! [`Room`]-related [`Database`] implementations.

use common::{
    operations::{By, Lock, Select},
    Money,
};
use tracerr::Traced;

use crate::{
    domain::{
        contract::BillingPeriod,
        room::{self, Rate, Rates},
        Room,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Room>, room::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Room>, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: room::Id = by.into_inner();

        const ROOM_SQL: &str = "\
            SELECT id, number, building_id, floor_id, type_id \
            FROM rooms \
            WHERE id = $1::UUID";
        let Some(row) = self
            .query_opt(ROOM_SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };
        let type_id: room::TypeId = row.get("type_id");

        const RATES_SQL: &str = "\
            SELECT NULL::UUID AS type_id, period, rent, deposit \
            FROM room_rates \
            WHERE room_id = $1::UUID \
            UNION ALL \
            SELECT type_id, period, rent, deposit \
            FROM room_type_rates \
            WHERE type_id = $2::UUID";
        let (type_rates, rates): (Vec<_>, Vec<_>) = self
            .query(RATES_SQL, &[&id, &type_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let rate = Rate {
                    rent: row.get::<_, Option<Money>>("rent"),
                    deposit: row.get::<_, Option<Money>>("deposit"),
                };
                (
                    row.get::<_, Option<room::TypeId>>("type_id").is_some(),
                    (row.get::<_, BillingPeriod>("period"), rate),
                )
            })
            .partition(|(of_type, _)| *of_type);

        Ok(Some(Room {
            id,
            number: row.get("number"),
            building_id: row.get("building_id"),
            floor_id: row.get("floor_id"),
            type_id,
            rates: rates.into_iter().map(|(_, r)| r).collect::<Rates>(),
            type_rates: type_rates.into_iter().map(|(_, r)| r).collect(),
        }))
    }
}

impl<C> Database<Lock<By<Room, room::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Room, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: room::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM rooms \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
