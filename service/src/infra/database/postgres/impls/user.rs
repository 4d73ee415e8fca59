//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: user::Id = by.into_inner();

        const SQL: &str = "\
            SELECT u.id, \
                   COALESCE(\
                       ARRAY_AGG(r.role ORDER BY r.role) \
                           FILTER (WHERE r.role IS NOT NULL), \
                       '{}'\
                   ) AS roles \
            FROM users AS u \
            LEFT JOIN user_roles AS r ON r.user_id = u.id \
            WHERE u.id = $1::UUID \
            GROUP BY u.id";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| User {
                id: row.get("id"),
                roles: row.get("roles"),
            }))
    }
}
