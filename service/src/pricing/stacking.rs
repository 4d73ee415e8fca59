//! Resolution of conflicting [`Applied`] promotions.

use crate::domain::promotion::StackMode;

use super::Applied;

/// Resolves which of the provided [`Applied`] promotions (ordered by their
/// priority) combine.
///
/// Any [`StackMode::Exclusive`] one discards all the others, leaving only the
/// greatest exclusive one. Otherwise, the greatest
/// [`StackMode::HighestOnly`] one is combined with all the
/// [`StackMode::Stack`] ones. Ties are won by the earlier one.
pub(super) fn resolve(applied: Vec<Applied>) -> Vec<Applied> {
    let (exclusive, rest): (Vec<_>, Vec<_>) = applied
        .into_iter()
        .partition(|a| a.stack_mode == StackMode::Exclusive);
    if !exclusive.is_empty() {
        return greatest(exclusive).into_iter().collect();
    }

    let (highest, stacked): (Vec<_>, Vec<_>) = rest
        .into_iter()
        .partition(|a| a.stack_mode == StackMode::HighestOnly);
    let mut resolved = greatest(highest)
        .into_iter()
        .chain(stacked)
        .collect::<Vec<_>>();
    resolved.sort_by_key(|a| a.priority);
    resolved
}

/// Picks the [`Applied`] promotion with the greatest total discount, keeping
/// the earliest one on ties.
fn greatest(group: Vec<Applied>) -> Option<Applied> {
    group.into_iter().reduce(|best, next| {
        if next.discount.total() > best.discount.total() {
            next
        } else {
            best
        }
    })
}
