//! Fixed-point quantization and flat array encodings.
//!
//! Floats are stored as `round(v * 10_000)`, which keeps their text short, exact and free of
//! locale formatting. Tuplets are flattened with a shift-and-negate delimiter:
//!
//! ```text
//! [[4, 7], [0, 2, 9]]  →  +1  →  [[5, 8], [1, 3, 10]]  →  negate last  →  [5, -8, 1, 3, -10]
//! ```
//!
//! The shift keeps index 0 from becoming an ambiguous `-0` when it ends a tuplet.

use crate::error::FormatVersionError;
use crate::metrics::FontBaselines;
use crate::record::TUPLET_LOOKUP;

/// Fixed-point scale.
pub const SCALE: f64 = 10_000.0;

/// Fixed-point value of `v`. Saturates outside the `i64` range; see [`try_quantize`].
#[inline]
pub fn quantize(v: f64) -> i64 {
  (v * SCALE).round() as i64
}

/// Fixed-point value of `v`, or `None` when `v` is not finite or does not fit in `i64`.
#[inline]
pub fn try_quantize(v: f64) -> Option<i64> {
  let scaled = (v * SCALE).round();
  (scaled.is_finite() && scaled.abs() < i64::MAX as f64).then_some(scaled as i64)
}

#[inline]
pub fn dequantize(v: i64) -> f64 {
  v as f64 / SCALE
}

/// `[ascent, descent, hanging, alphabetic, ideographic, pixelDensity]`, quantized.
pub fn baselines_to_array(b: &FontBaselines) -> [i64; 6] {
  b.to_array().map(quantize)
}

pub fn baselines_from_array(a: &[i64; 6]) -> FontBaselines {
  FontBaselines {
    font_bounding_box_ascent: dequantize(a[0]),
    font_bounding_box_descent: dequantize(a[1]),
    hanging_baseline: dequantize(a[2]),
    alphabetic_baseline: dequantize(a[3]),
    ideographic_baseline: dequantize(a[4]),
    pixel_density: dequantize(a[5]),
  }
}

/// Flatten variable-length tuplets into one delimiter-encoded sequence.
pub fn flatten_tuplets(tuplets: &[Vec<usize>]) -> Vec<i64> {
  let mut out = Vec::with_capacity(tuplets.iter().map(Vec::len).sum());
  for t in tuplets {
    for (i, &v) in t.iter().enumerate() {
      let shifted = v as i64 + 1;
      out.push(if i + 1 == t.len() { -shifted } else { shifted });
    }
  }
  out
}

/// Inverse of [`flatten_tuplets`].
pub fn unflatten_tuplets(flat: &[i64]) -> Result<Vec<Vec<usize>>, FormatVersionError> {
  let mut out = Vec::new();
  let mut current = Vec::new();
  for (pos, &v) in flat.iter().enumerate() {
    if v == 0 {
      return Err(FormatVersionError::new("tupletLookup", TUPLET_LOOKUP, format!("has a zero at offset {pos}")));
    }
    current.push((v.unsigned_abs() - 1) as usize);
    if v < 0 {
      out.push(std::mem::take(&mut current));
    }
  }
  if !current.is_empty() {
    return Err(FormatVersionError::new("tupletLookup", TUPLET_LOOKUP, "ends with an unterminated tuplet"));
  }
  Ok(out)
}
