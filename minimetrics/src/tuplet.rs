//! Per-glyph index tuplets.
//!
//! Each glyph starts as five indices into the glyph-value lookup, in the order
//! `[width, left, right, ascent, descent]`. Before deduplication a tuplet is shortened by the
//! first rule that applies:
//!
//! | rule | condition                                        | stored                        |
//! |------|--------------------------------------------------|-------------------------------|
//! | 1    | `width == right && left == descent == common`    | `[width, ascent]`             |
//! | 2    | `width == right && left == descent`              | `[width, left, ascent]`       |
//! | 3    | `width == right`                                 | `[width, left, ascent, desc]` |
//! | 4    | otherwise                                        | all five                      |
//!
//! The length alone identifies the rule, so no tag is stored.

use crate::error::FormatVersionError;
use crate::indexer::{Indexed, index_by_score, tuplet_encoded_len};

const WIDTH: usize = 0;
const LEFT: usize = 1;
const RIGHT: usize = 2;
const ASCENT: usize = 3;
const DESCENT: usize = 4;

/// Shorten one tuplet. `common_left` is the lookup index of the most common left bearing.
pub fn compress_tuplet(t: [usize; 5], common_left: usize) -> Vec<usize> {
  let mirrored = t[WIDTH] == t[RIGHT];
  let symmetric = t[LEFT] == t[DESCENT];
  if mirrored && symmetric && t[LEFT] == common_left {
    vec![t[WIDTH], t[ASCENT]]
  } else if mirrored && symmetric {
    vec![t[WIDTH], t[LEFT], t[ASCENT]]
  } else if mirrored {
    vec![t[WIDTH], t[LEFT], t[ASCENT], t[DESCENT]]
  } else {
    t.to_vec()
  }
}

/// Inverse of [`compress_tuplet`].
pub fn restore_tuplet(t: &[usize], common_left: usize) -> Result<[usize; 5], FormatVersionError> {
  match *t {
    [w, a] => Ok([w, common_left, w, a, common_left]),
    [w, l, a] => Ok([w, l, w, a, l]),
    [w, l, a, d] => Ok([w, l, w, a, d]),
    [w, l, r, a, d] => Ok([w, l, r, a, d]),
    _ => Err(FormatVersionError::new(
      "tupletLookup",
      crate::record::TUPLET_LOOKUP,
      format!("holds a tuplet of length {}", t.len()),
    )),
  }
}

/// Compress every tuplet, then store each distinct one once.
///
/// Returns the tuplet lookup and one lookup index per input tuplet (same order).
pub fn compress_tuplets(tuplets: &[[usize; 5]], common_left: usize) -> Indexed<Vec<usize>> {
  let compressed: Vec<Vec<usize>> = tuplets.iter().map(|&t| compress_tuplet(t, common_left)).collect();
  index_by_score(&compressed, |t| tuplet_encoded_len(t))
}
