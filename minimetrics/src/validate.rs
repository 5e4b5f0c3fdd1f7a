//! Round-trip validation.
//!
//! A freshly minified record is expanded again and compared with its input in fixed point,
//! so equality means equality to 1/10 000. An input value with no fixed-point form never
//! compares equal. Every divergent key is collected before failing.

use std::collections::BTreeSet;

use crate::atlas::PixelBuffer;
use crate::charset::CharacterSet;
use crate::error::{Error, Mismatch, MismatchKey, RoundtripMismatchError};
use crate::expand::{expand, expand_atlas};
use crate::metrics::{AtlasPositioning, FontBaselines, FontMetrics, GlyphMetrics, GlyphPlacement};
use crate::quantize::{baselines_to_array, quantize, try_quantize};
use crate::record::{CompactAtlas, CompactRecord};

/// Expand `record` and compare it with `original`.
pub fn validate_roundtrip(charset: &CharacterSet, original: &FontMetrics, record: &CompactRecord) -> Result<(), Error> {
  let expanded = expand(charset, record)?;
  let mut mismatches = Vec::new();
  diff_metrics(charset, original, &expanded, &mut mismatches);
  finish(mismatches)
}

/// Expand `atlas` and compare every placement with `original`.
///
/// Without pixels only the fields that do not need them are compared.
pub fn validate_atlas(
  charset: &CharacterSet,
  original: &AtlasPositioning,
  atlas: &CompactAtlas,
  pixels: Option<&PixelBuffer<'_>>,
) -> Result<(), Error> {
  let mut scan = atlas.clone();
  if pixels.is_none() && scan.tight_height.is_none() {
    // heights cannot be checked; carry the originals through so the rest can be
    scan.tight_height = Some(original.iter().map(|(&ch, p)| (ch, p.tight_height)).collect());
  }
  let expanded = expand_atlas(charset, &scan, pixels)?;

  let mut mismatches = Vec::new();
  for ch in charset.iter() {
    let (a, b) = (original.get(&ch), expanded.get(&ch));
    if a.is_none() && b.is_none() {
      continue;
    }
    let fields: [(&'static str, fn(&GlyphPlacement) -> i64); 5] = [
      ("xInAtlas", |p| p.x_in_atlas as i64),
      ("tightWidth", |p| p.tight_width as i64),
      ("tightHeight", |p| p.tight_height as i64),
      ("dx", |p| p.dx as i64),
      ("dy", |p| p.dy as i64),
    ];
    for (field, get) in fields {
      let (expected, actual) = (a.map(get), b.map(get));
      if expected != actual {
        mismatches.push(Mismatch { key: MismatchKey::AtlasField { ch, field }, expected, actual });
      }
    }
  }
  finish(mismatches)
}

#[inline]
fn finish(mismatches: Vec<Mismatch>) -> Result<(), Error> {
  if mismatches.is_empty() {
    Ok(())
  } else {
    Err(RoundtripMismatchError { mismatches }.into())
  }
}

fn diff_metrics(charset: &CharacterSet, original: &FontMetrics, expanded: &FontMetrics, out: &mut Vec<Mismatch>) {
  for ch in charset.iter() {
    diff_glyph(ch, original.glyph(ch), expanded.glyph(ch), out);
  }

  // kerning: union of both sides, set order
  for left in charset.iter() {
    let rights: BTreeSet<usize> = [&original.kerning, &expanded.kerning]
      .iter()
      .filter_map(|k| k.get(&left))
      .flat_map(|row| row.keys().filter_map(|&r| charset.index_of(r)))
      .collect();
    for right in rights.into_iter().filter_map(|i| charset.get(i)) {
      let expected = original.kerning.get(&left).and_then(|r| r.get(&right)).and_then(|&v| try_quantize(v));
      let actual = expanded.kerning.get(&left).and_then(|r| r.get(&right)).map(|&v| quantize(v));
      if expected != actual {
        out.push(Mismatch { key: MismatchKey::Kerning { left, right }, expected, actual });
      }
    }
  }

  diff_baselines(&original.baselines, &expanded.baselines, out);

  let expected = try_quantize(original.space_advancement_override);
  let actual = Some(quantize(expanded.space_advancement_override));
  if expected != actual {
    out.push(Mismatch { key: MismatchKey::SpaceAdvancement, expected, actual });
  }
}

fn diff_glyph(ch: char, a: Option<&GlyphMetrics>, b: Option<&GlyphMetrics>, out: &mut Vec<Mismatch>) {
  let a = a.map(|g| g.to_array().map(try_quantize));
  let b = b.map(|g| g.to_array().map(quantize));
  for (i, field) in GlyphMetrics::FIELDS.into_iter().enumerate() {
    let (expected, actual) = (a.and_then(|v| v[i]), b.map(|v| v[i]));
    if expected != actual {
      out.push(Mismatch { key: MismatchKey::Glyph { ch, field }, expected, actual });
    }
  }
}

fn diff_baselines(a: &FontBaselines, b: &FontBaselines, out: &mut Vec<Mismatch>) {
  let (a, b) = (a.to_array().map(try_quantize), baselines_to_array(b));
  for (i, field) in FontBaselines::FIELDS.into_iter().enumerate() {
    if a[i] != Some(b[i]) {
      out.push(Mismatch { key: MismatchKey::Baseline { field }, expected: a[i], actual: Some(b[i]) });
    }
  }
}
