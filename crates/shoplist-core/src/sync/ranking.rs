//! Translation of sort-service responses into override order indices.

use std::collections::HashMap;

/// Positions of `values` ordered by value; ties keep their input order.
pub fn argsort(values: &[i64]) -> Vec<i64> {
    let mut positions: Vec<usize> = (0..values.len()).collect();
    positions.sort_by_key(|&position| values[position]);
    positions.into_iter().map(|position| position as i64).collect()
}

/// Map each requested id to its override index.
///
/// The service ranks titles ascending while the list renders highest index
/// first, so the indices are reversed before arg-sorting. Surplus ids or
/// indices on either side are ignored.
pub fn override_indices(item_ids: &[String], sort_indices: &[i64]) -> HashMap<String, i64> {
    let reversed: Vec<i64> = sort_indices.iter().rev().copied().collect();
    item_ids
        .iter()
        .cloned()
        .zip(argsort(&reversed))
        .collect()
}
