//! Stored [`Settings`] overrides [`Database`] implementations.
//!
//! [`Settings`]: crate::Settings

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::settings::Overrides,
};

impl<C> Database<Select<By<Overrides, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Overrides;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Overrides, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT key, value \
            FROM settings \
            ORDER BY key";
        Ok(Overrides(
            self.query(SQL, &[])
                .await
                .map_err(tracerr::wrap!())?
                .into_iter()
                .map(|row| (row.get("key"), row.get("value")))
                .collect(),
        ))
    }
}
