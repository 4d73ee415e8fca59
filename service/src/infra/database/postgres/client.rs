//! Postgres database clients.

use std::{future::Future, sync::Arc};

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;
use tracing as log;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

/// Lazily initialized [`Connection`] slot shared between client clones.
type Slot<C> = Arc<RwLock<Option<C>>>;

/// Returns the [`Connection`] stored in the provided [`Slot`], initializing
/// it with the provided `init` future first if the [`Slot`] is empty.
async fn get_or_init<C, F>(
    slot: &Slot<C>,
    init: impl FnOnce() -> F,
) -> Result<RwLockReadGuard<'_, C>, Traced<database::Error>>
where
    F: Future<Output = Result<C, Traced<database::Error>>>,
{
    let read = slot.read().await;
    let guard = if read.is_some() {
        read
    } else {
        drop(read);
        let mut write = slot.write().await;
        if write.is_none() {
            *write = Some(init().await.map_err(tracerr::wrap!())?);
        }
        write.downgrade()
    };
    Ok(RwLockReadGuard::map(guard, |conn| {
        conn.as_ref()
            .expect("connection cannot be dropped while guard is alive")
    }))
}

/// Retrieves a new [`connection::NonTx`] from the provided
/// [`connection::Pool`].
async fn checkout(
    pool: &connection::Pool,
) -> Result<connection::NonTx, Traced<database::Error>> {
    pool.get()
        .await
        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
        .map_err(tracerr::map_from)
}

/// Implements [`Connection`] for a client delegating to the [`Connection`]
/// returned by its `connection()` method.
macro_rules! delegate_connection {
    ($ty:ty) => {
        impl Connection for $ty {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Vec<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Option<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query_opt(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<u64, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .exec(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }
        }
    };
}

delegate_connection!(NonTx);
delegate_connection!(Tx);

/// Non-transactional Postgres database client.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] the [`Connection`]s are retrieved from.
    pub(crate) pool: connection::Pool,

    /// [`Connection`] used for non-transactional operations, once retrieved.
    connection: Slot<connection::NonTx>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client on top of the provided
    /// [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            connection: Slot::default(),
        }
    }

    /// Returns the [`Connection`] of this [`NonTx`] client, retrieving it from
    /// the [`connection::Pool`] on first use.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::NonTx>, Traced<database::Error>>
    {
        get_or_init(&self.connection, || checkout(&self.pool)).await
    }

    /// Takes the retrieved [`Connection`] out of this [`NonTx`] client, if
    /// any.
    async fn take_connection(&self) -> Option<connection::NonTx> {
        self.connection.write().await.take()
    }
}

/// Transactional Postgres database client.
///
/// The transaction is started on first use, reusing the [`Connection`] of the
/// [`NonTx`] client it was created from, if any.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`NonTx`] client this [`Tx`] was created from.
    origin: NonTx,

    /// Started transaction, until committed.
    tx: Slot<connection::Tx>,
}

impl Tx {
    /// Creates a new [`Tx`] client from the provided [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            origin: client,
            tx: Slot::default(),
        }
    }

    /// Returns the [`connection::Tx`] of this [`Tx`] client, starting it on
    /// first use.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        get_or_init(&self.tx, || async {
            let conn = match self.origin.take_connection().await {
                Some(conn) => conn,
                None => checkout(&self.origin.pool)
                    .await
                    .map_err(tracerr::wrap!())?,
            };
            log::trace!("starting Postgres transaction");
            connection::Tx::begin(conn).await.map_err(tracerr::wrap!())
        })
        .await
    }

    /// Commits this [`Tx`] client.
    ///
    /// Does nothing if no statement has been executed in this [`Tx`] yet.
    ///
    /// # Errors
    ///
    /// If failed to commit transaction of this [`Tx`] client.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.tx.write().await.take() else {
            return Ok(());
        };
        log::trace!("committing Postgres transaction");
        tx.commit().await.map_err(tracerr::wrap!())
    }
}
