//! [`Database`]-related implementations.

#[cfg(test)]
pub(crate) mod mock;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),
}

impl Error {
    /// Indicates whether this [`Error`] is caused by a value already stored
    /// under the provided unique constraint.
    #[must_use]
    pub fn is_conflict(&self, constraint: &str) -> bool {
        match *self {
            #[cfg(feature = "postgres")]
            Self::Postgres(ref e) => e.is_unique_violation(Some(constraint)),
        }
    }
}
