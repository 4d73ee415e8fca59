//! [`Current`] [`Settings`] [`Query`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    infra::{database, Database},
    read::settings::Overrides,
    settings::{MalformedSetting, Settings},
    Query, Service,
};

/// [`Query`] of the current [`Settings`] snapshot.
///
/// Stored overrides are applied on top of the configured defaults.
#[derive(Clone, Copy, Debug, Default)]
pub struct Current;

impl<Db> Query<Current> for Service<Db>
where
    Db: Database<
        Select<By<Overrides, ()>>,
        Ok = Overrides,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Settings;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, _: Current) -> Result<Self::Ok, Self::Err> {
        let overrides = self
            .database()
            .execute(Select(By::new(())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;

        let settings = self
            .config()
            .billing
            .overlay(overrides)
            .map_err(tracerr::from_and_wrap!(=> ExecutionError))?;
        log::trace!("current settings: {settings:?}");
        Ok(settings)
    }
}

/// Error of [`Current`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Stored setting is malformed.
    #[display("Stored setting is malformed: {_0}")]
    Malformed(MalformedSetting),
}
