//! Operational [`Settings`] of pricing and billing.

use std::{str::FromStr, time::Duration};

use derive_more::{Display, Error};
use smart_default::SmartDefault;
use time::UtcOffset;
use tracing as log;

use crate::domain::contract::InvoiceMode;

/// Immutable snapshot of operational settings.
///
/// Read once per pricing or billing decision, so every step of it observes
/// the same values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, SmartDefault)]
pub struct Settings {
    /// Whether the days before the first release day are billed separately.
    #[default(true)]
    pub prorata: bool,

    /// Day of month the monthly periods start on.
    #[default(1)]
    pub release_day_of_month: u8,

    /// Number of hours an invoice is due in after being issued.
    #[default(24)]
    pub invoice_due_hours: u32,

    /// Default [`InvoiceMode`] of monthly contracts.
    #[default(InvoiceMode::PerMonth)]
    pub monthly_invoice_mode: InvoiceMode,

    /// Number of days in advance a contract may be booked.
    #[default(30)]
    pub max_prebook_days: u32,

    /// Offset of the local time from UTC, in hours.
    #[default(7)]
    pub utc_offset_hours: i8,
}

impl Settings {
    /// Returns the release day of month clamped to the `1..=31` range.
    #[must_use]
    pub fn release_day(&self) -> u8 {
        self.release_day_of_month.clamp(1, 31)
    }

    /// Returns the period an invoice is due in, being at least one hour.
    #[must_use]
    pub fn invoice_due_in(&self) -> Duration {
        Duration::from_secs(u64::from(self.invoice_due_hours.max(1)) * 3600)
    }

    /// Returns the local [`UtcOffset`].
    #[must_use]
    pub fn utc_offset(&self) -> UtcOffset {
        UtcOffset::from_hms(self.utc_offset_hours, 0, 0).unwrap_or_else(|e| {
            log::warn!(
                "invalid UTC offset of {}h, falling back to UTC: {e}",
                self.utc_offset_hours,
            );
            UtcOffset::UTC
        })
    }

    /// Overrides these [`Settings`] with the provided stored `(key, value)`
    /// entries.
    ///
    /// Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// If a value of a known key cannot be parsed.
    pub fn overlay<K, V>(
        mut self,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, MalformedSetting>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in entries {
            let (name, value) = (name.as_ref(), value.as_ref().trim());
            match name {
                key::PRORATA => self.prorata = parse_bool(name, value)?,
                key::RELEASE_DAY_OF_MONTH => {
                    self.release_day_of_month = parse(name, value)?;
                }
                key::INVOICE_DUE_HOURS => {
                    self.invoice_due_hours = parse(name, value)?;
                }
                key::MONTHLY_INVOICE_MODE => {
                    self.monthly_invoice_mode = parse(name, value)?;
                }
                key::MAX_PREBOOK_DAYS => {
                    self.max_prebook_days = parse(name, value)?;
                }
                key::UTC_OFFSET_HOURS => {
                    self.utc_offset_hours = parse(name, value)?;
                }
                _ => log::debug!("ignoring unknown `{name}` setting"),
            }
        }
        Ok(self)
    }
}

pub mod key {
    //! Keys of the stored [`Settings`].
    //!
    //! [`Settings`]: super::Settings

    /// Key of [`Settings::prorata`].
    ///
    /// [`Settings::prorata`]: super::Settings::prorata
    pub const PRORATA: &str = "billing.prorata";

    /// Key of [`Settings::release_day_of_month`].
    ///
    /// [`Settings::release_day_of_month`]: super::Settings::release_day_of_month
    pub const RELEASE_DAY_OF_MONTH: &str = "billing.release_day_of_month";

    /// Key of [`Settings::invoice_due_hours`].
    ///
    /// [`Settings::invoice_due_hours`]: super::Settings::invoice_due_hours
    pub const INVOICE_DUE_HOURS: &str = "contract.invoice_due_hours";

    /// Key of [`Settings::monthly_invoice_mode`].
    ///
    /// [`Settings::monthly_invoice_mode`]: super::Settings::monthly_invoice_mode
    pub const MONTHLY_INVOICE_MODE: &str = "billing.monthly_invoice_mode";

    /// Key of [`Settings::max_prebook_days`].
    ///
    /// [`Settings::max_prebook_days`]: super::Settings::max_prebook_days
    pub const MAX_PREBOOK_DAYS: &str = "contract.max_prebook_days";

    /// Key of [`Settings::utc_offset_hours`].
    ///
    /// [`Settings::utc_offset_hours`]: super::Settings::utc_offset_hours
    pub const UTC_OFFSET_HOURS: &str = "app.utc_offset_hours";
}

/// Parses a setting value with its [`FromStr`] implementation.
fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, MalformedSetting> {
    value.parse().map_err(|_| MalformedSetting::new(key, value))
}

/// Parses a boolean setting value, accepting the common spellings.
fn parse_bool(key: &str, value: &str) -> Result<bool, MalformedSetting> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(MalformedSetting::new(key, value)),
    }
}

/// Stored setting value that cannot be parsed.
#[derive(Clone, Debug, Display, Error)]
#[display("malformed `{key}` setting value: `{value}`")]
pub struct MalformedSetting {
    /// Key of the malformed setting.
    pub key: String,

    /// Malformed value.
    pub value: String,
}

impl MalformedSetting {
    /// Creates a new [`MalformedSetting`] error.
    fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_owned(),
            value: value.to_owned(),
        }
    }
}
