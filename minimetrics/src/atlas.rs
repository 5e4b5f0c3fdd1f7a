//! Atlas positioning reconstruction.
//!
//! ## Packing contract
//! The packer must place visible glyphs (those with an atlas entry) left to right in
//! character-set order, top-aligned at `y = 0`, with no gaps between them. Under that
//! contract two fields never need to be stored:
//! - `xInAtlas` is the running sum of the preceding visible `tightWidth`s.
//! - `tightHeight` is one plus the lowest row that has any non-zero alpha inside the glyph's
//!   column span, found by scanning the atlas pixels bottom-up.
//!
//! Invisible characters (space and friends) have no atlas entry and never shift positions.

use std::collections::BTreeMap;

use crate::charset::CharacterSet;
use crate::error::ReconstructionError;

/// Read-only RGBA8 view of the packed atlas, row-major.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer<'a> {
  width: u32,
  height: u32,
  data: &'a [u8],
}

impl<'a> PixelBuffer<'a> {
  pub fn new(width: u32, height: u32, data: &'a [u8]) -> Result<Self, ReconstructionError> {
    let need = width as usize * height as usize * 4;
    if data.len() != need {
      return Err(ReconstructionError::InvalidPixelBuffer { width, height, len: data.len() });
    }
    Ok(Self { width, height, data })
  }

  #[inline]
  pub fn width(&self) -> u32 {
    self.width
  }

  #[inline]
  pub fn height(&self) -> u32 {
    self.height
  }

  /// Alpha channel at `(x, y)`, `None` outside the buffer.
  #[inline]
  pub fn alpha(&self, x: u32, y: u32) -> Option<u8> {
    if x >= self.width || y >= self.height {
      return None;
    }
    self.data.get((y as usize * self.width as usize + x as usize) * 4 + 3).copied()
  }
}

/// Visible glyphs of `widths`, in character-set order.
#[inline]
fn visible<'w>(charset: &'w CharacterSet, widths: &'w BTreeMap<char, u32>) -> impl Iterator<Item = (char, u32)> + 'w {
  charset.iter().filter_map(|ch| widths.get(&ch).map(|&w| (ch, w)))
}

/// `x[i] = Σ width[0..i)` over the visible glyphs.
pub fn reconstruct_x_in_atlas(
  charset: &CharacterSet,
  widths: &BTreeMap<char, u32>,
) -> Result<Vec<(char, u32)>, ReconstructionError> {
  let mut x = 0u32;
  let mut out = Vec::with_capacity(widths.len());
  for (ch, w) in visible(charset, widths) {
    out.push((ch, x));
    x = x.checked_add(w).ok_or(ReconstructionError::AtlasTooWide { ch })?;
  }
  Ok(out)
}

/// Tight heights recovered from alpha coverage.
///
/// A fully transparent glyph should not occur in a valid font; it gets height 1 and a
/// warning.
pub fn reconstruct_tight_height(
  charset: &CharacterSet,
  widths: &BTreeMap<char, u32>,
  xs: &BTreeMap<char, u32>,
  pixels: &PixelBuffer<'_>,
) -> Result<Vec<(char, u32)>, ReconstructionError> {
  let mut out = Vec::with_capacity(widths.len());
  for (ch, w) in visible(charset, widths) {
    let x = xs.get(&ch).copied().unwrap_or(0);
    let end = x.checked_add(w).ok_or(ReconstructionError::AtlasTooWide { ch })?;
    if end > pixels.width() {
      return Err(ReconstructionError::GlyphOutOfBounds { ch, x, end, atlas_width: pixels.width() });
    }

    let inked = |row: u32| (x..end).any(|col| pixels.alpha(col, row).is_some_and(|a| a != 0));
    let lowest = (0..pixels.height()).rev().find(|&row| inked(row));
    let height = match lowest {
      Some(row) => row + 1,
      None => {
        log::warn!("glyph {ch:?} is fully transparent in columns {x}..{end}; using height 1");
        1
      }
    };
    out.push((ch, height));
  }
  Ok(out)
}
