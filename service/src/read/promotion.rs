//! [`Promotion`] read models definitions.

use time::Date;

#[cfg(doc)]
use crate::domain::Promotion;

/// Selector of the [`Promotion`]s worth evaluating.
///
/// Selects active [`Promotion`]s valid on the [`Candidates::today`] date and
/// matching the coupon class of the request, ordered by their priority.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Candidates {
    /// Local date of the request.
    pub today: Date,

    /// Whether the request carries a coupon code.
    pub with_coupon: bool,
}
