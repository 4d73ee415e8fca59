//! [`contract::Number`] sequence [`Database`] implementations.

use common::operations::{By, Increment, Lock};
use tracerr::Traced;

use crate::{
    domain::contract,
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Lock<By<contract::Number, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<contract::Number, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO contract_sequence (id, last) \
            VALUES (TRUE, 0) \
            ON CONFLICT (id) DO NOTHING";
        self.exec(SQL, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        const LOCK_SQL: &str = "\
            SELECT last \
            FROM contract_sequence \
            WHERE id \
            FOR UPDATE";
        self.query(LOCK_SQL, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Increment<By<contract::Number, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = contract::Number;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Increment<By<contract::Number, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO contract_sequence (id, last) \
            VALUES (TRUE, 1) \
            ON CONFLICT (id) DO UPDATE \
            SET last = contract_sequence.last + 1 \
            RETURNING last";
        Ok(self
            .query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())?
            .first()
            .map_or_else(
                || contract::Number::from(1),
                |row| row.get::<_, contract::Number>("last"),
            ))
    }
}
