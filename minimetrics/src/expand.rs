//! Load-time expansion of compact records.

use std::collections::BTreeMap;

use crate::atlas::{PixelBuffer, reconstruct_tight_height, reconstruct_x_in_atlas};
use crate::charset::CharacterSet;
use crate::error::{Error, FormatVersionError, ReconstructionError, ValidationError};
use crate::kerning::expand_kerning;
use crate::metrics::{AtlasPositioning, FontMetrics, GlyphMetrics, GlyphPlacement, KerningRelation, LoadedFont};
use crate::quantize::{baselines_from_array, dequantize, unflatten_tuplets};
use crate::record::{COMMON_LEFT, CompactAtlas, CompactRecord, KERNING_TABLE, TUPLET_INDICES, TUPLET_LOOKUP};
use crate::tuplet::restore_tuplet;

/// Rebuild full font metrics from a compact record.
pub fn expand(charset: &CharacterSet, record: &CompactRecord) -> Result<FontMetrics, Error> {
  let tuplets = unflatten_tuplets(&record.tuplet_lookup)?;

  if record.tuplet_indices.len() != charset.len() {
    return Err(
      FormatVersionError::new(
        "tupletIndexPerChar",
        TUPLET_INDICES,
        format!("has {} entries for a {}-char set", record.tuplet_indices.len(), charset.len()),
      )
      .into(),
    );
  }
  if !charset.is_empty() && record.common_left >= record.glyph_lookup.len() {
    return Err(FormatVersionError::new("commonLeftIndex", COMMON_LEFT, "points past the glyph value lookup").into());
  }

  let mut glyphs = BTreeMap::new();
  for (ch, &t) in charset.iter().zip(&record.tuplet_indices) {
    let tuplet = tuplets.get(t).ok_or_else(|| {
      FormatVersionError::new("tupletIndexPerChar", TUPLET_INDICES, format!("{ch:?} points past the tuplet lookup"))
    })?;
    let indices = restore_tuplet(tuplet, record.common_left)?;
    let mut values = [0f64; 5];
    for (slot, &i) in values.iter_mut().zip(&indices) {
      let v = record.glyph_lookup.get(i).ok_or_else(|| {
        FormatVersionError::new("tupletLookup", TUPLET_LOOKUP, format!("{ch:?} points past the glyph value lookup"))
      })?;
      *slot = dequantize(*v);
    }
    glyphs.insert(ch, GlyphMetrics::from_array(values));
  }

  Ok(FontMetrics {
    baselines: baselines_from_array(&record.baselines),
    glyphs,
    kerning: expand_kerning_values(charset, record)?,
    space_advancement_override: dequantize(record.space_advancement_override),
  })
}

fn expand_kerning_values(
  charset: &CharacterSet,
  record: &CompactRecord,
) -> Result<KerningRelation, FormatVersionError> {
  let indexed = expand_kerning(charset, &record.kerning_table)?;
  let mut out = KerningRelation::new();
  for (left, rights) in indexed {
    let mut row = BTreeMap::new();
    for (right, i) in rights {
      let v = record.kerning_lookup.get(i).ok_or_else(|| {
        let reason = format!("{left:?}{right:?} points past the kerning lookup");
        FormatVersionError::new("kerningTable", KERNING_TABLE, reason)
      })?;
      row.insert(right, dequantize(*v));
    }
    out.insert(left, row);
  }
  Ok(out)
}

/// Rebuild atlas positioning.
///
/// `xInAtlas` is always recomputed. `tightHeight` comes from the record when an older asset
/// still carries it and is otherwise scanned from `pixels`.
pub fn expand_atlas(
  charset: &CharacterSet,
  atlas: &CompactAtlas,
  pixels: Option<&PixelBuffer<'_>>,
) -> Result<AtlasPositioning, Error> {
  let unknown = charset.unknown(atlas.tight_width.keys().copied());
  if !unknown.is_empty() {
    return Err(ValidationError { unknown_atlas: unknown, ..Default::default() }.into());
  }
  let xs: BTreeMap<char, u32> = reconstruct_x_in_atlas(charset, &atlas.tight_width)?.into_iter().collect();

  let heights: BTreeMap<char, u32> = match &atlas.tight_height {
    Some(stored) => stored.clone(),
    None => {
      let pixels = pixels.ok_or(ReconstructionError::MissingPixelBuffer { field: "tightHeight" })?;
      reconstruct_tight_height(charset, &atlas.tight_width, &xs, pixels)?.into_iter().collect()
    }
  };

  let mut out = AtlasPositioning::new();
  for (ch, &x_in_atlas) in &xs {
    let ch = *ch;
    out.insert(
      ch,
      GlyphPlacement {
        tight_width: atlas_field(&atlas.tight_width, ch, "tightWidth")?,
        tight_height: atlas_field(&heights, ch, "tightHeight")?,
        dx: atlas_field(&atlas.dx, ch, "dx")?,
        dy: atlas_field(&atlas.dy, ch, "dy")?,
        x_in_atlas,
      },
    );
  }
  Ok(out)
}

#[inline]
fn atlas_field<T: Copy>(map: &BTreeMap<char, T>, ch: char, name: &'static str) -> Result<T, FormatVersionError> {
  map
    .get(&ch)
    .copied()
    .ok_or_else(|| FormatVersionError::unpositioned(name, format!("has no entry for {ch:?} in the atlas record")))
}

/// Full load: metrics plus, when an atlas record is given, its positioning.
pub fn expand_font(
  charset: &CharacterSet,
  record: &CompactRecord,
  atlas: Option<&CompactAtlas>,
  pixels: Option<&PixelBuffer<'_>>,
) -> Result<LoadedFont, Error> {
  let metrics = expand(charset, record)?;
  let atlas = atlas.map(|a| expand_atlas(charset, a, pixels)).transpose()?;
  Ok(LoadedFont { metrics, atlas })
}
