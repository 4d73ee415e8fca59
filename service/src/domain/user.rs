//! [`User`] definitions.

use derive_more::{AsRef, Display, From};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

/// Platform user, as seen by promotion rules.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`Role`]s granted to this [`User`].
    pub roles: Vec<Role>,
}

impl User {
    /// Indicates whether this [`User`] has any of the provided role names,
    /// compared case-insensitively.
    #[must_use]
    pub fn has_any_role<S: AsRef<str>>(&self, names: &[S]) -> bool {
        self.roles
            .iter()
            .any(|r| names.iter().any(|n| r.is(n.as_ref())))
    }
}

define_id! {
    #[doc = "ID of a [`User`]."]
    Id
}

/// Name of a role granted to a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, From, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Role(String);

impl Role {
    /// Indicates whether this [`Role`] has the provided name, compared
    /// case-insensitively.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}
