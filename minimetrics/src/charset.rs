//! The ordered character set.
//!
//! Every map-shaped structure in this crate is iterated in character-set order, never in the
//! native order of its container. Atlas packing order and reconstruction order both derive
//! from it, so it is passed explicitly to every codec, expander and reconstructor call.

use std::collections::HashMap;

use crate::error::ValidationError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterSet {
  chars: Vec<char>,
  positions: HashMap<char, usize>,
}

impl CharacterSet {
  /// Build from an ordered sequence. Duplicates are rejected.
  pub fn new(chars: impl IntoIterator<Item = char>) -> Result<Self, ValidationError> {
    let chars: Vec<char> = chars.into_iter().collect();
    let mut positions = HashMap::with_capacity(chars.len());
    let mut err = ValidationError::default();
    for (i, &ch) in chars.iter().enumerate() {
      if positions.insert(ch, i).is_some() && !err.duplicate.contains(&ch) {
        err.duplicate.push(ch);
      }
    }
    err.into_result()?;
    Ok(Self { chars, positions })
  }

  /// Inclusive range of scalars, in codepoint order.
  pub fn from_range(start: char, end: char) -> Result<Self, ValidationError> {
    Self::new(start..=end)
  }

  /// Printable ASCII, space through tilde.
  pub fn printable_ascii() -> Self {
    let chars: Vec<char> = (' '..='~').collect();
    let positions = chars.iter().enumerate().map(|(i, &c)| (c, i)).collect();
    Self { chars, positions }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.chars.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.chars.is_empty()
  }

  #[inline]
  pub fn index_of(&self, ch: char) -> Option<usize> {
    self.positions.get(&ch).copied()
  }

  #[inline]
  pub fn contains(&self, ch: char) -> bool {
    self.positions.contains_key(&ch)
  }

  #[inline]
  pub fn get(&self, index: usize) -> Option<char> {
    self.chars.get(index).copied()
  }

  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
    self.chars.iter().copied()
  }

  #[inline]
  pub fn as_slice(&self) -> &[char] {
    &self.chars
  }

  /// Chars of `keys` that are not members, deduplicated, in first-seen order.
  pub(crate) fn unknown<I: IntoIterator<Item = char>>(&self, keys: I) -> Vec<char> {
    let mut out = Vec::new();
    for ch in keys {
      if !self.contains(ch) && !out.contains(&ch) {
        out.push(ch);
      }
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn t_order_is_insertion_order() {
    let set = CharacterSet::new("zay".chars()).unwrap();
    assert_eq!(set.index_of('z'), Some(0));
    assert_eq!(set.index_of('y'), Some(2));
    assert_eq!(set.iter().collect::<String>(), "zay");
  }

  #[test]
  fn t_duplicates_rejected() {
    let err = CharacterSet::new("abca".chars()).unwrap_err();
    assert_eq!(err.duplicate, vec!['a']);
  }

  #[test]
  fn t_printable_ascii() {
    let set = CharacterSet::printable_ascii();
    assert_eq!(set.len(), 95);
    assert_eq!(set.get(0), Some(' '));
    assert_eq!(set.index_of('~'), Some(94));
    assert_eq!(set, CharacterSet::from_range(' ', '~').unwrap());
  }
}
