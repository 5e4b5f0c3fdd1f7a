//! In-memory font metrics: the verbose side of the codec.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sparse kerning relation: left char → right char → adjustment.
pub type KerningRelation = BTreeMap<char, BTreeMap<char, f64>>;

/// Per-glyph measurements, as a canvas `TextMetrics` reports them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphMetrics {
  pub width: f64,
  pub actual_bounding_box_left: f64,
  pub actual_bounding_box_right: f64,
  pub actual_bounding_box_ascent: f64,
  pub actual_bounding_box_descent: f64,
}

impl GlyphMetrics {
  /// Field names in tuple order: `[width, left, right, ascent, descent]`.
  pub const FIELDS: [&'static str; 5] = [
    "width",
    "actualBoundingBoxLeft",
    "actualBoundingBoxRight",
    "actualBoundingBoxAscent",
    "actualBoundingBoxDescent",
  ];

  #[inline]
  pub fn to_array(&self) -> [f64; 5] {
    [
      self.width,
      self.actual_bounding_box_left,
      self.actual_bounding_box_right,
      self.actual_bounding_box_ascent,
      self.actual_bounding_box_descent,
    ]
  }

  #[inline]
  pub fn from_array(v: [f64; 5]) -> Self {
    Self {
      width: v[0],
      actual_bounding_box_left: v[1],
      actual_bounding_box_right: v[2],
      actual_bounding_box_ascent: v[3],
      actual_bounding_box_descent: v[4],
    }
  }
}

/// Font-wide measurements shared by every glyph.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontBaselines {
  pub font_bounding_box_ascent: f64,
  pub font_bounding_box_descent: f64,
  pub hanging_baseline: f64,
  pub alphabetic_baseline: f64,
  pub ideographic_baseline: f64,
  pub pixel_density: f64,
}

impl FontBaselines {
  /// Field names in serialized array order.
  pub const FIELDS: [&'static str; 6] = [
    "fontBoundingBoxAscent",
    "fontBoundingBoxDescent",
    "hangingBaseline",
    "alphabeticBaseline",
    "ideographicBaseline",
    "pixelDensity",
  ];

  #[inline]
  pub fn to_array(&self) -> [f64; 6] {
    [
      self.font_bounding_box_ascent,
      self.font_bounding_box_descent,
      self.hanging_baseline,
      self.alphabetic_baseline,
      self.ideographic_baseline,
      self.pixel_density,
    ]
  }
}

/// Complete metrics for one font configuration.
///
/// `glyphs` must hold exactly the members of the character set it is minified with.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontMetrics {
  pub baselines: FontBaselines,
  pub glyphs: BTreeMap<char, GlyphMetrics>,
  #[serde(default)]
  pub kerning: KerningRelation,
  #[serde(default)]
  pub space_advancement_override: f64,
}

impl FontMetrics {
  #[inline]
  pub fn glyph(&self, ch: char) -> Option<&GlyphMetrics> {
    self.glyphs.get(&ch)
  }

  /// Kerning adjustment between two chars, zero when the pair is not materialized.
  #[inline]
  pub fn kerning(&self, left: char, right: char) -> f64 {
    self.kerning.get(&left).and_then(|r| r.get(&right)).copied().unwrap_or(0.0)
  }
}

/// Per-glyph placement inside the packed atlas image.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphPlacement {
  pub tight_width: u32,
  pub tight_height: u32,
  pub dx: i32,
  pub dy: i32,
  pub x_in_atlas: u32,
}

/// Atlas positioning for the visible subset of the character set.
pub type AtlasPositioning = BTreeMap<char, GlyphPlacement>;

/// What the expander hands to a renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LoadedFont {
  pub metrics: FontMetrics,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub atlas: Option<AtlasPositioning>,
}
