//! [`Invoice`] read models definitions.

use time::Date;

use crate::domain::Contract;
#[cfg(doc)]
use crate::domain::{contract::InvoiceMode, Invoice};

/// [`InvoiceMode::PerMonth`] [`Contract`] whose next [`Invoice`] is due to be
/// issued.
#[derive(Clone, Debug)]
pub struct Renewal {
    /// [`Contract`] to be invoiced.
    pub contract: Contract,

    /// Number of [`Invoice`]s issued for the [`Contract`] so far.
    pub issued: u32,

    /// End of the period of the latest issued [`Invoice`].
    pub last_period_end: Date,
}

/// Selector of [`Renewal`]s whose latest [`Invoice`] period ends no later
/// than the provided [`Date`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EndingBy(pub Date);
