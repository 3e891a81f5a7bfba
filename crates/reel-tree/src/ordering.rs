//! Sibling ordering.
//!
//! Children of a folder are kept sorted by name, case-insensitively, with the
//! identifier as tie-break. Names equal up to case are therefore ordered by
//! identifier, not by case. Because identifiers are unique the order is
//! total: two distinct siblings never compare equal, so re-sorting is
//! deterministic and idempotent.

use std::cmp::Ordering;

use reel_types::ItemId;

/// The fields the ordering looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortKey<'a> {
    pub name: &'a str,
    pub id: ItemId,
}

impl<'a> SortKey<'a> {
    pub fn new(name: &'a str, id: ItemId) -> Self {
        Self { name, id }
    }
}

impl Ord for SortKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        fold_case(self.name)
            .cmp(fold_case(other.name))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for SortKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn fold_case(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}

/// Compare two siblings.
pub fn compare(a: SortKey<'_>, b: SortKey<'_>) -> Ordering {
    a.cmp(&b)
}

/// Re-sort sibling identifiers in place.
///
/// `key` looks up the sort key for an identifier. Only positions change.
pub fn re_sort<'a, F>(children: &mut [ItemId], key: F)
where
    F: Fn(ItemId) -> SortKey<'a>,
{
    children.sort_by(|a, b| key(*a).cmp(&key(*b)));
}

/// Index at which `new` belongs in an already sorted sibling list.
pub fn insertion_index<'a, F>(children: &[ItemId], new: SortKey<'_>, key: F) -> usize
where
    F: Fn(ItemId) -> SortKey<'a>,
{
    children.partition_point(|id| key(*id) < new)
}

/// Returns `true` if `children` is already in canonical order.
#[cfg(test)]
fn is_sorted<'a, F>(children: &[ItemId], key: F) -> bool
where
    F: Fn(ItemId) -> SortKey<'a>,
{
    children.windows(2).all(|w| key(w[0]) < key(w[1]))
}
