//! Registry of expanded fonts, owned by whoever renders with them.

use std::collections::HashMap;

use crate::atlas::PixelBuffer;
use crate::charset::CharacterSet;
use crate::error::Error;
use crate::expand::expand_font;
use crate::metrics::LoadedFont;
use crate::record::{CompactAtlas, CompactRecord};

/// Loaded fonts keyed by a caller-chosen id (typically name, size and pixel density).
#[derive(Clone, Debug, Default)]
pub struct FontStore {
  fonts: HashMap<String, LoadedFont>,
}

impl FontStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Expand and register a font, replacing any previous entry under `key`.
  ///
  /// A failed load leaves the store untouched.
  pub fn load(
    &mut self,
    key: impl Into<String>,
    charset: &CharacterSet,
    record: &CompactRecord,
    atlas: Option<&CompactAtlas>,
    pixels: Option<&PixelBuffer<'_>>,
  ) -> Result<&LoadedFont, Error> {
    let key = key.into();
    let font = expand_font(charset, record, atlas, pixels)?;
    log::debug!("loaded font {key:?}: {} glyphs", font.metrics.glyphs.len());
    Ok(self.fonts.entry(key).insert_entry(font).into_mut())
  }

  #[inline]
  pub fn get(&self, key: &str) -> Option<&LoadedFont> {
    self.fonts.get(key)
  }

  pub fn remove(&mut self, key: &str) -> Option<LoadedFont> {
    self.fonts.remove(key)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.fonts.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.fonts.is_empty()
  }
}
