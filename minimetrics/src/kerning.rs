//! Range compression of the sparse kerning relation.
//!
//! ## Token notation
//! A token is a set of characters written as literals and ranges over character-set order:
//! - `a-e` is every char from `a` through `e` in set order (only used for runs of 3 or more;
//!   a run of 2 costs the same written as two literals).
//! - any other char stands for itself.
//! - a leading `-` is a literal dash. A dash anywhere else is a range separator, so a literal
//!   dash is always hoisted to the front. A dash strictly inside a range needs no escape.
//!
//! ## Passes
//! 1. Per left char, right chars sharing one value collapse into one token.
//! 2. Left chars whose whole pass-1 object is identical collapse into one top-level token.
//!
//! Both levels are ordered by the set index of their first member, and the result serializes
//! as a JSON object of JSON objects in that order.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::charset::CharacterSet;
use crate::error::{FormatVersionError, ValidationError};
use crate::record::KERNING_TABLE;

/// String-keyed map that keeps its entries in the order they were produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> Default for OrderedMap<V> {
  fn default() -> Self {
    Self(Vec::new())
  }
}

impl<V> OrderedMap<V> {
  #[inline]
  pub fn len(&self) -> usize {
    self.0.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v))
  }

  #[inline]
  pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut V)> {
    self.0.iter_mut().map(|(k, v)| (k.as_str(), v))
  }

  pub fn get(&self, key: &str) -> Option<&V> {
    self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
  }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.0.len()))?;
    for (k, v) in &self.0 {
      map.serialize_entry(k, v)?;
    }
    map.end()
  }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    struct OrderedVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
      type Value = OrderedMap<V>;

      fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map keyed by character tokens")
      }

      fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<String, V>()? {
          entries.push((k, v));
        }
        Ok(OrderedMap(entries))
      }
    }

    deserializer.deserialize_map(OrderedVisitor(PhantomData))
  }
}

/// Two-level range-compressed kerning: left token → right token → value.
pub type RangeTable<V> = OrderedMap<OrderedMap<V>>;

// ---- tokens ----

/// Encode a set of character-set indices as a token.
pub fn encode_token(charset: &CharacterSet, members: &[usize]) -> String {
  let mut sorted = members.to_vec();
  sorted.sort_unstable();
  sorted.dedup();

  let dash = charset.index_of('-');
  let mut escape = false;
  let mut body = String::new();

  let mut i = 0;
  while i < sorted.len() {
    let mut j = i;
    while j + 1 < sorted.len() && sorted[j + 1] == sorted[j] + 1 {
      j += 1;
    }
    let (mut first, mut last) = (sorted[i], sorted[j]);
    i = j + 1;

    // A dash may sit inside a range, never at its ends or as a bare literal.
    if Some(first) == dash {
      escape = true;
      first += 1;
    } else if Some(last) == dash {
      escape = true;
      last -= 1;
    }
    if first > last {
      continue;
    }

    if last - first + 1 >= 3 {
      push_index(&mut body, charset, first);
      body.push('-');
      push_index(&mut body, charset, last);
    } else {
      for k in first..=last {
        push_index(&mut body, charset, k);
      }
    }
  }

  if escape {
    body.insert(0, '-');
  }
  body
}

#[inline]
fn push_index(out: &mut String, charset: &CharacterSet, index: usize) {
  if let Some(ch) = charset.get(index) {
    out.push(ch);
  }
}

/// Decode a token into its chars, in set order for ranges and written order otherwise.
pub fn expand_token(charset: &CharacterSet, token: &str) -> Result<Vec<char>, FormatVersionError> {
  let chars: Vec<char> = token.chars().collect();
  let mut out = Vec::with_capacity(chars.len());
  let mut i = 0;
  if chars.first() == Some(&'-') {
    member(charset, token, '-')?;
    out.push('-');
    i = 1;
  }

  while i < chars.len() {
    let first = chars[i];
    let first_idx = member(charset, token, first)?;
    if i + 2 < chars.len() && chars[i + 1] == '-' {
      let last_idx = member(charset, token, chars[i + 2])?;
      if last_idx < first_idx {
        return Err(bad_token(token, "has a descending range"));
      }
      out.extend((first_idx..=last_idx).filter_map(|k| charset.get(k)));
      i += 3;
    } else {
      if first == '-' {
        return Err(bad_token(token, "has a dangling range separator"));
      }
      out.push(first);
      i += 1;
    }
  }

  if out.is_empty() {
    return Err(bad_token(token, "is empty"));
  }
  Ok(out)
}

#[inline]
fn member(charset: &CharacterSet, token: &str, ch: char) -> Result<usize, FormatVersionError> {
  charset
    .index_of(ch)
    .ok_or_else(|| bad_token(token, &format!("names {ch:?}, which is not in the character set")))
}

#[inline]
fn bad_token(token: &str, what: &str) -> FormatVersionError {
  FormatVersionError::new("kerningTable", KERNING_TABLE, format!("token {token:?} {what}"))
}

// ---- passes ----

/// Compress a sparse relation. Every char must belong to `charset`.
pub fn compress_kerning<V>(
  charset: &CharacterSet,
  relation: &BTreeMap<char, BTreeMap<char, V>>,
) -> Result<RangeTable<V>, ValidationError>
where
  V: Clone + PartialEq,
{
  let keys = relation.iter().flat_map(|(&l, rights)| std::iter::once(l).chain(rights.keys().copied()));
  let unknown = charset.unknown(keys);
  if !unknown.is_empty() {
    return Err(ValidationError { unknown_kerning: unknown, ..Default::default() });
  }

  // pass 2 groups are keyed by the whole pass-1 object
  let mut groups: Vec<(OrderedMap<V>, Vec<usize>)> = Vec::new();
  for (left_idx, left) in charset.iter().enumerate() {
    let Some(rights) = relation.get(&left) else {
      continue;
    };
    if rights.is_empty() {
      continue;
    }
    let side = compress_right_side(charset, rights);
    match groups.iter_mut().find(|(s, _)| *s == side) {
      Some((_, lefts)) => lefts.push(left_idx),
      None => groups.push((side, vec![left_idx])),
    }
  }

  Ok(OrderedMap(groups.into_iter().map(|(side, lefts)| (encode_token(charset, &lefts), side)).collect()))
}

/// Pass 1 for a single left char.
fn compress_right_side<V: Clone + PartialEq>(charset: &CharacterSet, rights: &BTreeMap<char, V>) -> OrderedMap<V> {
  let mut groups: Vec<(V, Vec<usize>)> = Vec::new();
  for (idx, right) in charset.iter().enumerate() {
    let Some(value) = rights.get(&right) else {
      continue;
    };
    match groups.iter_mut().find(|(v, _)| v == value) {
      Some((_, members)) => members.push(idx),
      None => groups.push((value.clone(), vec![idx])),
    }
  }
  OrderedMap(groups.into_iter().map(|(value, members)| (encode_token(charset, &members), value)).collect())
}

/// Inverse of [`compress_kerning`].
pub fn expand_kerning<V: Clone>(
  charset: &CharacterSet,
  table: &RangeTable<V>,
) -> Result<BTreeMap<char, BTreeMap<char, V>>, FormatVersionError> {
  let mut out: BTreeMap<char, BTreeMap<char, V>> = BTreeMap::new();
  for (left_token, side) in table.iter() {
    let lefts = expand_token(charset, left_token)?;
    for (right_token, value) in side.iter() {
      let rights = expand_token(charset, right_token)?;
      for &left in &lefts {
        let row = out.entry(left).or_default();
        for &right in &rights {
          row.insert(right, value.clone());
        }
      }
    }
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  use pretty_assertions::assert_eq;

  fn ascii() -> CharacterSet {
    CharacterSet::printable_ascii()
  }

  fn row(pairs: impl IntoIterator<Item = (char, i32)>) -> BTreeMap<char, i32> {
    pairs.into_iter().collect()
  }

  fn tokens(set: &CharacterSet, s: &str) -> Vec<usize> {
    s.chars().map(|c| set.index_of(c).unwrap()).collect()
  }

  #[test]
  fn t_full_range_is_one_token() {
    let set = ascii();
    let mut rel = BTreeMap::new();
    rel.insert('A', set.iter().map(|c| (c, 20)).collect::<BTreeMap<_, _>>());
    let table = compress_kerning(&set, &rel).unwrap();
    assert_eq!(table.0, vec![("A".to_string(), OrderedMap(vec![(" -~".to_string(), 20)]))]);
  }

  #[test]
  fn t_partial_range() {
    let set = ascii();
    let mut rel = BTreeMap::new();
    rel.insert('B', ('0'..='9').map(|c| (c, 15)).collect::<BTreeMap<_, _>>());
    let table = compress_kerning(&set, &rel).unwrap();
    assert_eq!(table.get("B").unwrap().0, vec![("0-9".to_string(), 15)]);
    assert_eq!(serde_json::to_string(&table).unwrap(), r#"{"B":{"0-9":15}}"#);
  }

  #[test]
  fn t_mixed_ranges() {
    let set = ascii();
    let mut r = row(('0'..='5').map(|c| (c, 10)));
    r.extend([('A', 25), ('B', 25)]);
    r.extend(('a'..='e').map(|c| (c, 30)));
    let mut rel = BTreeMap::new();
    rel.insert('C', r);
    let table = compress_kerning(&set, &rel).unwrap();
    assert_eq!(
      table.get("C").unwrap().0,
      vec![("0-5".to_string(), 10), ("AB".to_string(), 25), ("a-e".to_string(), 30)]
    );
  }

  #[test]
  fn t_non_consecutive_stay_literal() {
    let set = ascii();
    let mut rel = BTreeMap::new();
    rel.insert('T', row([('A', 5), ('D', 5), ('Z', 5)]));
    let table = compress_kerning(&set, &rel).unwrap();
    let side = table.get("T").unwrap();
    assert_eq!(side.0, vec![("ADZ".to_string(), 5)]);
    assert_eq!(expand_token(&set, "ADZ").unwrap(), vec!['A', 'D', 'Z']);
  }

  #[test]
  fn t_identical_rows_share_left_token() {
    let set = ascii();
    let mut rel = BTreeMap::new();
    for left in ['V', 'W', 'X', 'Y', 'k'] {
      rel.insert(left, row([('a', -3), ('o', -3)]));
    }
    rel.insert('L', row([('T', -7)]));
    let table = compress_kerning(&set, &rel).unwrap();
    assert_eq!(
      table.0,
      vec![
        ("L".to_string(), OrderedMap(vec![("T".to_string(), -7)])),
        ("V-Yk".to_string(), OrderedMap(vec![("ao".to_string(), -3)])),
      ]
    );
    assert_eq!(expand_kerning(&set, &table).unwrap(), rel);
  }

  #[test]
  fn t_dash_escape() {
    let set = ascii();
    // a dash at either end of a run is hoisted to the front
    assert_eq!(encode_token(&set, &tokens(&set, "-./")), "-./");
    assert_eq!(encode_token(&set, &tokens(&set, "+,-")), "-+,");
    assert_eq!(encode_token(&set, &tokens(&set, "-")), "-");
    assert_eq!(encode_token(&set, &tokens(&set, "-a")), "-a");
    // a dash strictly inside a range is covered by it
    assert_eq!(encode_token(&set, &tokens(&set, ",-.")), ",-.");
    assert_eq!(encode_token(&set, &tokens(&set, "+,-./")), "+-/");

    for token in [",-.", "-./", "-", "-+,", "+-/", "-a-z"] {
      let chars = expand_token(&set, token).unwrap();
      let idx: Vec<usize> = chars.iter().map(|&c| set.index_of(c).unwrap()).collect();
      assert_eq!(encode_token(&set, &idx), token, "{token}");
    }
  }

  #[test]
  fn t_two_runs_stay_literal() {
    let set = ascii();
    assert_eq!(encode_token(&set, &tokens(&set, "ab")), "ab");
    assert_eq!(encode_token(&set, &tokens(&set, "abc")), "a-c");
    assert_eq!(encode_token(&set, &tokens(&set, "cab")), "a-c");
  }

  #[test]
  fn t_ranges_follow_set_order() {
    let set = CharacterSet::new("zyxw".chars()).unwrap();
    assert_eq!(encode_token(&set, &[0, 1, 2]), "z-x");
    assert_eq!(expand_token(&set, "z-x").unwrap(), vec!['z', 'y', 'x']);
    assert!(expand_token(&set, "x-z").is_err());
  }

  #[test]
  fn t_bad_tokens() {
    let set = ascii();
    assert!(expand_token(&set, "").is_err());
    assert!(expand_token(&set, "a-").is_err());
    assert!(expand_token(&set, "é").is_err());
  }

  #[test]
  fn t_leading_dash_needs_dash_in_set() {
    let set = CharacterSet::new("ab".chars()).unwrap();
    let err = expand_token(&set, "-a").unwrap_err();
    assert_eq!(err.field, "kerningTable");
    assert_eq!(expand_token(&CharacterSet::new("-ab".chars()).unwrap(), "-a").unwrap(), vec!['-', 'a']);
  }

  #[test]
  fn t_unknown_chars_rejected() {
    let set = CharacterSet::new("ABC".chars()).unwrap();
    let mut rel = BTreeMap::new();
    rel.insert('A', row([('B', 1), ('Q', 2)]));
    rel.insert('Z', row([('A', 1)]));
    let err = compress_kerning(&set, &rel).unwrap_err();
    assert_eq!(err.unknown_kerning, vec!['Q', 'Z']);
  }

  #[test]
  fn t_json_order_survives() {
    let set = ascii();
    let mut rel = BTreeMap::new();
    rel.insert('z', row([('a', 1)]));
    rel.insert('a', row([('z', 2), ('b', 3)]));
    let table = compress_kerning(&set, &rel).unwrap();
    let json = serde_json::to_string(&table).unwrap();
    assert_eq!(json, r#"{"a":{"b":3,"z":2},"z":{"a":1}}"#);
    let back: RangeTable<i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, table);
  }
}
