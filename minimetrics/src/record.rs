//! Serialized forms.
//!
//! ## CompactRecord
//! A fixed-position JSON array:
//!
//! ```text
//! 0  kerningValueLookup       [i64]               fixed-point kerning magnitudes
//! 1  kerningTable             {tok: {tok: idx}}   range-compressed, indices into 0
//! 2  baselines                [i64; 6]            fixed-point font-wide fields
//! 3  glyphValueLookup         [i64]               fixed-point glyph magnitudes
//! 4  tupletLookup             [i64]               shift-and-negate flattened tuplets
//! 5  tupletIndexPerChar       [usize; N]          character-set order
//! 6  spaceAdvancementOverride i64                 fixed-point
//! 7  commonLeftIndex          usize               index into 3
//! ```
//!
//! Atlas `xInAtlas` and `tightHeight` are never part of it.
//!
//! ## CompactAtlas
//! `{ "tightWidth": {..}, "dx": {..}, "dy": {..} }`, keyed by char, visible glyphs only.
//! Older assets may also carry `"tightHeight"`; its presence is the only switch the expander
//! uses to skip pixel scanning.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, FormatVersionError};
use crate::kerning::RangeTable;

pub const KERNING_LOOKUP: usize = 0;
pub const KERNING_TABLE: usize = 1;
pub const BASELINES: usize = 2;
pub const GLYPH_LOOKUP: usize = 3;
pub const TUPLET_LOOKUP: usize = 4;
pub const TUPLET_INDICES: usize = 5;
pub const SPACE_OVERRIDE: usize = 6;
pub const COMMON_LEFT: usize = 7;

/// Field names by position.
pub const FIELDS: [&str; 8] = [
  "kerningValueLookup",
  "kerningTable",
  "baselines",
  "glyphValueLookup",
  "tupletLookup",
  "tupletIndexPerChar",
  "spaceAdvancementOverride",
  "commonLeftIndex",
];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompactRecord {
  pub kerning_lookup: Vec<i64>,
  pub kerning_table: RangeTable<usize>,
  pub baselines: [i64; 6],
  pub glyph_lookup: Vec<i64>,
  pub tuplet_lookup: Vec<i64>,
  pub tuplet_indices: Vec<usize>,
  pub space_advancement_override: i64,
  pub common_left: usize,
}

impl CompactRecord {
  /// Decode the positional layout, reporting the first field this revision cannot read.
  pub fn from_value(value: &Value) -> Result<Self, FormatVersionError> {
    let items = value
      .as_array()
      .ok_or_else(|| FormatVersionError::unpositioned("record", "is not a positional array"))?;
    if items.len() > FIELDS.len() {
      log::debug!("ignoring {} trailing record field(s)", items.len() - FIELDS.len());
    }
    Ok(Self {
      kerning_lookup: field(items, KERNING_LOOKUP)?,
      kerning_table: field(items, KERNING_TABLE)?,
      baselines: field(items, BASELINES)?,
      glyph_lookup: field(items, GLYPH_LOOKUP)?,
      tuplet_lookup: field(items, TUPLET_LOOKUP)?,
      tuplet_indices: field(items, TUPLET_INDICES)?,
      space_advancement_override: field(items, SPACE_OVERRIDE)?,
      common_left: field(items, COMMON_LEFT)?,
    })
  }

  pub fn from_json(text: &str) -> Result<Self, Error> {
    let value: Value = serde_json::from_str(text)?;
    Ok(Self::from_value(&value)?)
  }

  pub fn to_json(&self) -> Result<String, Error> {
    Ok(serde_json::to_string(self)?)
  }
}

fn field<T: DeserializeOwned>(items: &[Value], position: usize) -> Result<T, FormatVersionError> {
  let name = FIELDS[position];
  let raw = items.get(position).ok_or_else(|| FormatVersionError::new(name, position, "is missing"))?;
  T::deserialize(raw).map_err(|e| FormatVersionError::new(name, position, format!("has an unexpected shape ({e})")))
}

impl Serialize for CompactRecord {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut t = serializer.serialize_tuple(FIELDS.len())?;
    t.serialize_element(&self.kerning_lookup)?;
    t.serialize_element(&self.kerning_table)?;
    t.serialize_element(&self.baselines)?;
    t.serialize_element(&self.glyph_lookup)?;
    t.serialize_element(&self.tuplet_lookup)?;
    t.serialize_element(&self.tuplet_indices)?;
    t.serialize_element(&self.space_advancement_override)?;
    t.serialize_element(&self.common_left)?;
    t.end()
  }
}

impl<'de> Deserialize<'de> for CompactRecord {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Self::from_value(&value).map_err(serde::de::Error::custom)
  }
}

/// Atlas positioning without the fields that can be recomputed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactAtlas {
  pub tight_width: BTreeMap<char, u32>,
  pub dx: BTreeMap<char, i32>,
  pub dy: BTreeMap<char, i32>,
  /// Only present in assets written before heights were elided.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tight_height: Option<BTreeMap<char, u32>>,
}

impl CompactAtlas {
  pub fn from_json(text: &str) -> Result<Self, Error> {
    Ok(serde_json::from_str(text)?)
  }

  pub fn to_json(&self) -> Result<String, Error> {
    Ok(serde_json::to_string(self)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use pretty_assertions::assert_eq;

  use crate::kerning::OrderedMap;

  fn sample() -> CompactRecord {
    CompactRecord {
      kerning_lookup: vec![-10_000, 5_000],
      kerning_table: OrderedMap(vec![("A".into(), OrderedMap(vec![("T-V".into(), 0), ("j".into(), 1)]))]),
      baselines: [140_000, 40_000, 110_000, 0, -40_000, 10_000],
      glyph_lookup: vec![0, 70_000],
      tuplet_lookup: vec![2, -1, 1, 2, -2],
      tuplet_indices: vec![0, 1, 0],
      space_advancement_override: 30_000,
      common_left: 0,
    }
  }

  #[test]
  fn t_positional_layout() {
    let json = sample().to_json().unwrap();
    assert_eq!(
      json,
      r#"[[-10000,5000],{"A":{"T-V":0,"j":1}},[140000,40000,110000,0,-40000,10000],[0,70000],[2,-1,1,2,-2],[0,1,0],30000,0]"#
    );
    assert_eq!(CompactRecord::from_json(&json).unwrap(), sample());
  }

  #[test]
  fn t_missing_field_is_format_error() {
    let value = serde_json::json!([[0], {}, [0, 0, 0, 0, 0, 0], [0]]);
    let err = CompactRecord::from_value(&value).unwrap_err();
    assert_eq!(err.field, "tupletLookup");
    assert_eq!(err.position, Some(TUPLET_LOOKUP));
  }

  #[test]
  fn t_nested_tuplets_are_format_error() {
    let value = serde_json::json!([[0], {}, [0, 0, 0, 0, 0, 0], [0], [[0, 0, 0, 0, 0]], [0], 0, 0]);
    let err = CompactRecord::from_value(&value).unwrap_err();
    assert_eq!(err.field, "tupletLookup");
    assert!(err.to_string().contains("regenerate"));
  }

  #[test]
  fn t_malformed_json() {
    assert!(matches!(CompactRecord::from_json("[1,"), Err(Error::Json(_))));
  }

  #[test]
  fn t_atlas_height_is_optional() {
    let atlas = CompactAtlas::from_json(r#"{"tightWidth":{"a":9},"dx":{"a":0},"dy":{"a":-7}}"#).unwrap();
    assert_eq!(atlas.tight_height, None);
    assert_eq!(atlas.to_json().unwrap(), r#"{"tightWidth":{"a":9},"dx":{"a":0},"dy":{"a":-7}}"#);

    let old = CompactAtlas::from_json(r#"{"tightWidth":{"a":9},"dx":{"a":0},"dy":{"a":-7},"tightHeight":{"a":8}}"#)
      .unwrap();
    assert_eq!(old.tight_height.unwrap()[&'a'], 8);
  }
}
