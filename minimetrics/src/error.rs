//! Error taxonomy.
//!
//! Build-time failures (`Validation`, `RoundtripMismatch`) abort compression.
//! Load-time failures (`FormatVersion`, `Reconstruction`) abort that load.
//! Everything is deterministic for a given input, so nothing here is retryable.

use core::fmt;

use thiserror::Error;

/// Top-level error returned by codec and expander entry points.
#[derive(Debug, Error)]
pub enum Error {
  /// Input does not match the character set.
  #[error(transparent)]
  Validation(#[from] ValidationError),
  /// A just-produced record does not expand back to its input.
  #[error(transparent)]
  RoundtripMismatch(#[from] RoundtripMismatchError),
  /// Record lacks (or mis-shapes) a field this expander needs.
  #[error(transparent)]
  FormatVersion(#[from] FormatVersionError),
  /// An elided atlas field cannot be recomputed.
  #[error(transparent)]
  Reconstruction(#[from] ReconstructionError),
  /// Record text is not JSON, or not the expected JSON shape.
  #[error("malformed record json: {0}")]
  Json(#[from] serde_json::Error),
}

// ---- validation ----

/// Input/character-set disagreement. Every offending char is listed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Error)]
pub struct ValidationError {
  /// Characters of the set with no glyph metrics.
  pub missing: Vec<char>,
  /// Glyph metrics for characters outside the set.
  pub extra: Vec<char>,
  /// Kerning pairs referencing characters outside the set.
  pub unknown_kerning: Vec<char>,
  /// Atlas entries for characters outside the set.
  pub unknown_atlas: Vec<char>,
  /// Characters listed more than once when building a character set.
  pub duplicate: Vec<char>,
  /// Values that are NaN, infinite or too large for fixed point.
  pub unrepresentable: Vec<MismatchKey>,
}

impl ValidationError {
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.missing.is_empty()
      && self.extra.is_empty()
      && self.unknown_kerning.is_empty()
      && self.unknown_atlas.is_empty()
      && self.duplicate.is_empty()
      && self.unrepresentable.is_empty()
  }

  /// `Ok(())` when nothing was recorded.
  pub(crate) fn into_result(self) -> Result<(), Self> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("input does not match the character set")?;
    let groups: [(&str, &[char]); 5] = [
      ("missing glyphs", &self.missing),
      ("extra glyphs", &self.extra),
      ("unknown kerning chars", &self.unknown_kerning),
      ("unknown atlas chars", &self.unknown_atlas),
      ("duplicate chars", &self.duplicate),
    ];
    for (label, chars) in groups {
      if !chars.is_empty() {
        write!(f, "; {label}: {}", CharList(chars))?;
      }
    }
    for (i, key) in self.unrepresentable.iter().enumerate() {
      f.write_str(if i == 0 { "; unrepresentable values: " } else { ", " })?;
      write!(f, "{key}")?;
    }
    Ok(())
  }
}

struct CharList<'a>(&'a [char]);

impl fmt::Display for CharList<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, ch) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str(", ")?;
      }
      write!(f, "{ch:?}")?;
    }
    Ok(())
  }
}

// ---- round trip ----

/// Which value diverged after a round trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MismatchKey {
  Glyph { ch: char, field: &'static str },
  Kerning { left: char, right: char },
  Baseline { field: &'static str },
  SpaceAdvancement,
  AtlasField { ch: char, field: &'static str },
}

impl fmt::Display for MismatchKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      MismatchKey::Glyph { ch, field } => write!(f, "glyph {ch:?}.{field}"),
      MismatchKey::Kerning { left, right } => write!(f, "kerning {left:?}{right:?}"),
      MismatchKey::Baseline { field } => write!(f, "baseline {field}"),
      MismatchKey::SpaceAdvancement => f.write_str("space advancement override"),
      MismatchKey::AtlasField { ch, field } => write!(f, "atlas {ch:?}.{field}"),
    }
  }
}

/// One divergent value. Fixed-point (×10 000) for metrics, plain pixels for atlas fields.
/// `None` means the value is absent on that side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
  pub key: MismatchKey,
  pub expected: Option<i64>,
  pub actual: Option<i64>,
}

impl fmt::Display for Mismatch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: expected {}, got {}", self.key, OptValue(self.expected), OptValue(self.actual))
  }
}

struct OptValue(Option<i64>);

impl fmt::Display for OptValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.0 {
      Some(v) => write!(f, "{v}"),
      None => f.write_str("<absent>"),
    }
  }
}

/// Every key whose expanded value differs from the original.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub struct RoundtripMismatchError {
  pub mismatches: Vec<Mismatch>,
}

impl fmt::Display for RoundtripMismatchError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "round trip failed with {} mismatch(es)", self.mismatches.len())?;
    for m in &self.mismatches {
      write!(f, "\n  {m}")?;
    }
    Ok(())
  }
}

// ---- load time ----

/// The record was written by a different minifier revision.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub struct FormatVersionError {
  pub field: &'static str,
  /// Position in the compact record array; `None` for atlas fields and the record itself.
  pub position: Option<usize>,
  pub reason: String,
}

impl FormatVersionError {
  pub(crate) fn new(field: &'static str, position: usize, reason: impl Into<String>) -> Self {
    Self { field, position: Some(position), reason: reason.into() }
  }

  pub(crate) fn unpositioned(field: &'static str, reason: impl Into<String>) -> Self {
    Self { field, position: None, reason: reason.into() }
  }
}

impl fmt::Display for FormatVersionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "`{}`", self.field)?;
    if let Some(p) = self.position {
      write!(f, " (record position {p})")?;
    }
    write!(f, " {}; regenerate the font assets with the current minifier", self.reason)
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ReconstructionError {
  /// `tightHeight` is elided and no atlas pixels were supplied.
  #[error("cannot reconstruct `{field}`: the atlas pixel buffer was not supplied")]
  MissingPixelBuffer { field: &'static str },
  /// RGBA buffer length disagrees with its dimensions.
  #[error("pixel buffer is {len} bytes, expected {width}x{height}x4")]
  InvalidPixelBuffer { width: u32, height: u32, len: usize },
  /// Running `xInAtlas` sum no longer fits in `u32`.
  #[error("atlas widths overflow at glyph {ch:?}")]
  AtlasTooWide { ch: char },
  /// Glyph columns extend past the atlas.
  #[error("glyph {ch:?} spans columns {x}..{end} outside atlas width {atlas_width}")]
  GlyphOutOfBounds { ch: char, x: u32, end: u32, atlas_width: u32 },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn t_validation_lists_every_char() {
    let err = ValidationError { missing: vec!['a', 'b'], extra: vec!['é'], ..Default::default() };
    let msg = err.to_string();
    assert!(msg.contains("missing glyphs: 'a', 'b'"), "{msg}");
    assert!(msg.contains("extra glyphs: 'é'"), "{msg}");
    assert!(!msg.contains("kerning"), "{msg}");

    let err = ValidationError {
      unrepresentable: vec![MismatchKey::Glyph { ch: 'a', field: "width" }, MismatchKey::SpaceAdvancement],
      ..Default::default()
    };
    assert!(!err.is_empty());
    assert!(err.to_string().ends_with("unrepresentable values: glyph 'a'.width, space advancement override"));
  }

  #[test]
  fn t_format_version_says_regenerate() {
    let err = FormatVersionError::new("tupletLookup", 4, "is missing");
    assert!(err.to_string().contains("regenerate"));
  }

  #[test]
  fn t_mismatch_display() {
    let err = RoundtripMismatchError {
      mismatches: vec![Mismatch {
        key: MismatchKey::Kerning { left: 'A', right: 'V' },
        expected: Some(-5000),
        actual: None,
      }],
    };
    assert!(err.to_string().contains("kerning 'A''V': expected -5000, got <absent>"));
  }
}
