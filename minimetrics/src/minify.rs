//! Build-time codec: verbose metrics → compact record.
//!
//! Pipeline:
//!   1. check the glyph map and kerning against the character set
//!   2. quantize every float to fixed point
//!   3. index glyph values, pick the common left bearing, build and compress tuplets
//!   4. index kerning magnitudes and range-compress the indexed relation
//!   5. flatten tuplets, assemble the record
//!   6. expand it again and compare with the input; any difference is fatal

use std::collections::BTreeMap;

use crate::atlas::PixelBuffer;
use crate::charset::CharacterSet;
use crate::error::{Error, MismatchKey, ValidationError};
use crate::indexer::{Indexed, index_values, most_common};
use crate::kerning::compress_kerning;
use crate::metrics::{AtlasPositioning, FontBaselines, FontMetrics, GlyphMetrics};
use crate::quantize::{baselines_to_array, flatten_tuplets, quantize, try_quantize};
use crate::record::{CompactAtlas, CompactRecord};
use crate::tuplet::compress_tuplets;
use crate::validate::{validate_atlas, validate_roundtrip};

/// Compress `metrics`, which must cover exactly the members of `charset`.
pub fn minify(charset: &CharacterSet, metrics: &FontMetrics) -> Result<CompactRecord, Error> {
  check_coverage(charset, metrics)?;

  // ---- glyph values ----
  let values: Vec<i64> = charset
    .iter()
    .filter_map(|ch| metrics.glyph(ch))
    .flat_map(|g| g.to_array().map(quantize))
    .collect();
  let Indexed { lookup: glyph_lookup, indices } = index_values(&values);

  let lefts: Vec<i64> = values.chunks_exact(5).map(|g| g[1]).collect();
  let common_left = most_common(&lefts)
    .and_then(|v| glyph_lookup.iter().position(|&l| l == v))
    .unwrap_or(0);

  let tuplets: Vec<[usize; 5]> = indices.chunks_exact(5).map(|t| [t[0], t[1], t[2], t[3], t[4]]).collect();
  let Indexed { lookup: tuplet_lookup, indices: tuplet_indices } = compress_tuplets(&tuplets, common_left);

  // ---- kerning ----
  let pairs = kerning_pairs(charset, metrics, quantize);
  let magnitudes: Vec<i64> = pairs.iter().map(|&(_, _, v)| v).collect();
  let Indexed { lookup: kerning_lookup, indices: kerning_indices } = index_values(&magnitudes);

  let mut indexed: BTreeMap<char, BTreeMap<char, usize>> = BTreeMap::new();
  for (&(left, right, _), &i) in pairs.iter().zip(&kerning_indices) {
    indexed.entry(left).or_default().insert(right, i);
  }
  let kerning_table = compress_kerning(charset, &indexed)?;

  log::debug!(
    "minified {} glyphs: {} glyph values, {} tuplets; {} kerning pairs: {} values, {} tokens",
    charset.len(),
    glyph_lookup.len(),
    tuplet_lookup.len(),
    pairs.len(),
    kerning_lookup.len(),
    kerning_table.len()
  );

  // ---- assemble ----
  let record = CompactRecord {
    kerning_lookup,
    kerning_table,
    baselines: baselines_to_array(&metrics.baselines),
    glyph_lookup,
    tuplet_lookup: flatten_tuplets(&tuplet_lookup),
    tuplet_indices,
    space_advancement_override: quantize(metrics.space_advancement_override),
    common_left,
  };

  validate_roundtrip(charset, metrics, &record)?;
  Ok(record)
}

/// Drop the recomputable atlas fields, after proving they really are recomputable.
///
/// `xInAtlas` is always checked against the packing contract. `tightHeight` is checked only
/// when the atlas pixels are supplied.
pub fn minify_atlas(
  charset: &CharacterSet,
  positioning: &AtlasPositioning,
  pixels: Option<&PixelBuffer<'_>>,
) -> Result<CompactAtlas, Error> {
  let unknown = charset.unknown(positioning.keys().copied());
  if !unknown.is_empty() {
    return Err(ValidationError { unknown_atlas: unknown, ..Default::default() }.into());
  }

  let atlas = CompactAtlas {
    tight_width: positioning.iter().map(|(&ch, p)| (ch, p.tight_width)).collect(),
    dx: positioning.iter().map(|(&ch, p)| (ch, p.dx)).collect(),
    dy: positioning.iter().map(|(&ch, p)| (ch, p.dy)).collect(),
    tight_height: None,
  };
  validate_atlas(charset, positioning, &atlas, pixels)?;
  Ok(atlas)
}

/// Every char missing from, or foreign to, the set, foreign kerning chars, and every value
/// that has no fixed-point form.
fn check_coverage(charset: &CharacterSet, metrics: &FontMetrics) -> Result<(), ValidationError> {
  let kerning_chars = metrics
    .kerning
    .iter()
    .flat_map(|(&l, rights)| std::iter::once(l).chain(rights.keys().copied()));
  ValidationError {
    missing: charset.iter().filter(|ch| !metrics.glyphs.contains_key(ch)).collect(),
    extra: charset.unknown(metrics.glyphs.keys().copied()),
    unknown_kerning: charset.unknown(kerning_chars),
    unrepresentable: unrepresentable(charset, metrics),
    ..Default::default()
  }
  .into_result()
}

fn unrepresentable(charset: &CharacterSet, metrics: &FontMetrics) -> Vec<MismatchKey> {
  let mut out = Vec::new();
  for ch in charset.iter() {
    let Some(g) = metrics.glyph(ch) else {
      continue;
    };
    for (field, v) in GlyphMetrics::FIELDS.into_iter().zip(g.to_array()) {
      if try_quantize(v).is_none() {
        out.push(MismatchKey::Glyph { ch, field });
      }
    }
  }
  for (left, right, v) in kerning_pairs(charset, metrics, |v| v) {
    if try_quantize(v).is_none() {
      out.push(MismatchKey::Kerning { left, right });
    }
  }
  for (field, v) in FontBaselines::FIELDS.into_iter().zip(metrics.baselines.to_array()) {
    if try_quantize(v).is_none() {
      out.push(MismatchKey::Baseline { field });
    }
  }
  if try_quantize(metrics.space_advancement_override).is_none() {
    out.push(MismatchKey::SpaceAdvancement);
  }
  out
}

/// Kerning pairs mapped through `f`, left and right both in set order.
fn kerning_pairs<T>(charset: &CharacterSet, metrics: &FontMetrics, f: impl Fn(f64) -> T) -> Vec<(char, char, T)> {
  let mut out = Vec::new();
  for left in charset.iter() {
    let Some(row) = metrics.kerning.get(&left) else {
      continue;
    };
    let mut rights: Vec<(usize, char, f64)> =
      row.iter().filter_map(|(&r, &v)| charset.index_of(r).map(|i| (i, r, v))).collect();
    rights.sort_unstable_by_key(|&(i, _, _)| i);
    out.extend(rights.into_iter().map(|(_, r, v)| (left, r, f(v))));
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  use pretty_assertions::assert_eq;

  use crate::error::Mismatch;
  use crate::expand::expand;
  use crate::metrics::GlyphPlacement;

  fn glyph(width: f64, left: f64, right: f64, ascent: f64, descent: f64) -> GlyphMetrics {
    GlyphMetrics {
      width,
      actual_bounding_box_left: left,
      actual_bounding_box_right: right,
      actual_bounding_box_ascent: ascent,
      actual_bounding_box_descent: descent,
    }
  }

  fn set() -> CharacterSet {
    CharacterSet::new("AVTo.".chars()).unwrap()
  }

  fn font() -> FontMetrics {
    let mut m = FontMetrics {
      baselines: FontBaselines {
        font_bounding_box_ascent: 11.5,
        font_bounding_box_descent: 3.25,
        hanging_baseline: 9.2,
        alphabetic_baseline: 0.0,
        ideographic_baseline: -3.25,
        pixel_density: 1.0,
      },
      space_advancement_override: 3.3333,
      ..Default::default()
    };
    m.glyphs.insert('A', glyph(8.0, 0.0, 8.0, 9.0, 0.0));
    m.glyphs.insert('V', glyph(8.0, 0.0, 8.0, 9.0, 0.0));
    m.glyphs.insert('T', glyph(7.5, 0.0, 7.5, 9.0, 0.0));
    m.glyphs.insert('o', glyph(6.0, -0.5, 5.5, 6.0, 0.25));
    m.glyphs.insert('.', glyph(2.0, -0.5, 2.0, 1.5, -0.5));
    m.kerning.insert('A', BTreeMap::from([('V', -1.0), ('T', -1.0), ('o', -0.5)]));
    m.kerning.insert('V', BTreeMap::from([('A', -1.0), ('o', -0.75), ('.', -1.5)]));
    m.kerning.insert('T', BTreeMap::from([('o', -0.75), ('.', -1.5), ('A', -1.0)]));
    m
  }

  #[test]
  fn t_round_trip() {
    let record = minify(&set(), &font()).unwrap();
    assert_eq!(expand(&set(), &record).unwrap(), font());
  }

  #[test]
  fn t_record_shape() {
    let record = minify(&set(), &font()).unwrap();
    // 'A' and 'V' share a tuplet; rule 1 applies to A, V and T.
    assert_eq!(record.tuplet_indices[0], record.tuplet_indices[1]);
    assert_eq!(record.glyph_lookup[record.common_left], 0);
    // V and T kern identically, so they share one left token
    let keys: Vec<&str> = record.kerning_table.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["A", "VT"]);
    assert_eq!(record.space_advancement_override, 33_333);
  }

  #[test]
  fn t_deterministic() {
    let a = minify(&set(), &font()).unwrap().to_json().unwrap();
    let b = minify(&set(), &font()).unwrap().to_json().unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn t_coverage_lists_everything() {
    let mut m = font();
    m.glyphs.remove(&'o');
    m.glyphs.remove(&'T');
    m.glyphs.insert('x', GlyphMetrics::default());
    m.kerning.insert('y', BTreeMap::from([('A', 1.0)]));
    let Err(Error::Validation(err)) = minify(&set(), &m) else {
      panic!("expected a validation error");
    };
    assert_eq!(err.missing, vec!['T', 'o']);
    assert_eq!(err.extra, vec!['x']);
    assert_eq!(err.unknown_kerning, vec!['y']);
  }

  #[test]
  fn t_rejects_values_without_fixed_point_form() {
    let mut m = font();
    m.glyphs.get_mut(&'o').unwrap().width = 1e300;
    m.glyphs.get_mut(&'.').unwrap().actual_bounding_box_descent = f64::NAN;
    m.kerning.get_mut(&'V').unwrap().insert('A', f64::NEG_INFINITY);
    m.baselines.pixel_density = 1e15;
    let Err(Error::Validation(err)) = minify(&set(), &m) else {
      panic!("expected a validation error");
    };
    assert_eq!(
      err.unrepresentable,
      vec![
        MismatchKey::Glyph { ch: 'o', field: "width" },
        MismatchKey::Glyph { ch: '.', field: "actualBoundingBoxDescent" },
        MismatchKey::Kerning { left: 'V', right: 'A' },
        MismatchKey::Baseline { field: "pixelDensity" },
      ]
    );
    assert!(err.missing.is_empty());
  }

  #[test]
  fn t_corrupted_glyph_is_named() {
    let set = set();
    let font = font();
    let mut record = minify(&set, &font).unwrap();
    // point 'o' (index 3) at the tuplet of '.'
    record.tuplet_indices[3] = record.tuplet_indices[4];
    let Err(Error::RoundtripMismatch(err)) = validate_roundtrip(&set, &font, &record) else {
      panic!("expected a mismatch");
    };
    assert!(!err.mismatches.is_empty());
    assert!(err.mismatches.iter().all(|m| matches!(m.key, MismatchKey::Glyph { ch: 'o', .. })), "{err}");
  }

  #[test]
  fn t_corrupted_kerning_is_named() {
    let set = set();
    let font = font();
    let mut record = minify(&set, &font).unwrap();
    // A→o is the only pair at -0.5
    let half = record.kerning_lookup.iter().position(|&v| v == -5_000).unwrap();
    let other = (half + 1) % record.kerning_lookup.len();
    for (_, side) in record.kerning_table.iter_mut() {
      for (_, v) in side.0.iter_mut() {
        if *v == half {
          *v = other;
        }
      }
    }
    let Err(Error::RoundtripMismatch(err)) = validate_roundtrip(&set, &font, &record) else {
      panic!("expected a mismatch");
    };
    assert_eq!(err.mismatches.len(), 1);
    assert_eq!(err.mismatches[0].key, MismatchKey::Kerning { left: 'A', right: 'o' });
    assert_eq!(err.mismatches[0].expected, Some(-5_000));
  }

  #[test]
  fn t_empty_kerning() {
    let mut m = font();
    m.kerning.clear();
    let record = minify(&set(), &m).unwrap();
    assert!(record.kerning_table.is_empty());
    assert!(record.kerning_lookup.is_empty());
    assert_eq!(record.to_json().unwrap().split(',').nth(1), Some("{}"));
  }

  #[test]
  fn t_atlas_drops_recomputable_fields() {
    let set = CharacterSet::new(" ab".chars()).unwrap();
    let mut pos = AtlasPositioning::new();
    pos.insert('a', GlyphPlacement { tight_width: 2, tight_height: 3, dx: 0, dy: -3, x_in_atlas: 0 });
    pos.insert('b', GlyphPlacement { tight_width: 3, tight_height: 2, dx: 1, dy: -2, x_in_atlas: 2 });

    let mut px = vec![0u8; 5 * 4 * 4];
    px[(2 * 5) * 4 + 3] = 200;
    px[(5 + 4) * 4 + 3] = 10;
    let buf = PixelBuffer::new(5, 4, &px).unwrap();

    let atlas = minify_atlas(&set, &pos, Some(&buf)).unwrap();
    assert_eq!(atlas.tight_height, None);
    assert_eq!(atlas.to_json().unwrap(), r#"{"tightWidth":{"a":2,"b":3},"dx":{"a":0,"b":1},"dy":{"a":-3,"b":-2}}"#);

    // a wrong height is caught once pixels are available
    pos.get_mut(&'b').unwrap().tight_height = 4;
    let Err(Error::RoundtripMismatch(err)) = minify_atlas(&set, &pos, Some(&buf)) else {
      panic!("expected a mismatch");
    };
    assert_eq!(
      err.mismatches,
      vec![Mismatch {
        key: MismatchKey::AtlasField { ch: 'b', field: "tightHeight" },
        expected: Some(4),
        actual: Some(2),
      }]
    );
    minify_atlas(&set, &pos, None).unwrap();
  }
}
