//! Stored [`Settings`] overrides.

use derive_more::{From, Into};

#[cfg(doc)]
use crate::settings::Settings;

/// Stored `(key, value)` entries overriding the default [`Settings`].
#[derive(Clone, Debug, Default, From, Into)]
pub struct Overrides(pub Vec<(String, String)>);

impl IntoIterator for Overrides {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
