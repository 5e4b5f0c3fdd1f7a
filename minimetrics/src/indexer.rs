//! Frequency-scored value indexing.
//!
//! Distinct values are ranked by `occurrences × encoded length`, so the values that cost the
//! most text receive the shortest (smallest) indices. Ties are broken by the natural ordering
//! of the value (numeric ascending for integers, lexicographic for tuplets), which keeps the
//! output independent of any container's enumeration order.

use std::collections::HashMap;
use std::hash::Hash;

/// A lookup table plus one index into it per input value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Indexed<T> {
  pub lookup: Vec<T>,
  pub indices: Vec<usize>,
}

/// Length of the canonical text of an integer (what ends up in the record).
#[inline]
pub fn encoded_len(value: i64) -> usize {
  let digits = value.unsigned_abs().checked_ilog10().map_or(1, |d| d as usize + 1);
  digits + usize::from(value < 0)
}

/// Length of a tuplet written as a JSON array, e.g. `[3,0,12]` → 8.
#[inline]
pub fn tuplet_encoded_len(tuplet: &[usize]) -> usize {
  let body: usize = tuplet.iter().map(|&v| encoded_len(v as i64)).sum();
  body + tuplet.len().saturating_sub(1) + 2
}

/// Rank the distinct items of `values` by descending score, ties by `Ord`.
pub fn rank_by_score<T, F>(values: &[T], score_len: F) -> Vec<T>
where
  T: Clone + Eq + Hash + Ord,
  F: Fn(&T) -> usize,
{
  let counts = count(values);
  let mut ranked: Vec<(T, usize)> = counts
    .into_iter()
    .map(|(v, c)| {
      let score = c * score_len(&v);
      (v, score)
    })
    .collect();
  ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
  ranked.into_iter().map(|(v, _)| v).collect()
}

/// Rank `values` and replace each with its position in the ranking.
pub fn index_by_score<T, F>(values: &[T], score_len: F) -> Indexed<T>
where
  T: Clone + Eq + Hash + Ord,
  F: Fn(&T) -> usize,
{
  let lookup = rank_by_score(values, score_len);
  let positions: HashMap<&T, usize> = lookup.iter().enumerate().map(|(i, v)| (v, i)).collect();
  let indices = values.iter().map(|v| positions[v]).collect();
  Indexed { lookup, indices }
}

/// Index fixed-point values.
pub fn index_values(values: &[i64]) -> Indexed<i64> {
  index_by_score(values, |&v| encoded_len(v))
}

/// The most frequent value; ties go to the smaller value.
pub fn most_common<T: Clone + Eq + Hash + Ord>(values: &[T]) -> Option<T> {
  count(values)
    .into_iter()
    .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
    .map(|(v, _)| v)
}

#[inline]
fn count<T: Clone + Eq + Hash>(values: &[T]) -> HashMap<T, usize> {
  let mut counts: HashMap<T, usize> = HashMap::new();
  for v in values {
    *counts.entry(v.clone()).or_default() += 1;
  }
  counts
}
