//! Compact, lossless-to-1e-4 encoding of bitmap font metrics.
//!
//! A font configuration (glyph measurements, kerning, baselines, atlas positioning) is
//! minified at build time into a positional JSON array and expanded again at load time:
//!
//! ```text
//! FontMetrics ──minify──▶ CompactRecord ──expand──▶ FontMetrics        (equal after quantization)
//! AtlasPositioning ──minify_atlas──▶ CompactAtlas ──expand_atlas(+pixels)──▶ AtlasPositioning
//! ```
//!
//! Compression layers, innermost first:
//! - fixed-point quantization of every float (`round(v * 10_000)`)
//! - frequency-scored value lookups for glyph and kerning magnitudes
//! - per-glyph index tuplets, shortened by symmetry rules and deduplicated
//! - range tokens over character-set order for the sparse kerning relation
//! - atlas fields recomputed from the packing contract and the atlas pixels
//!
//! Every minified record is expanded and compared with its input before it is returned.
//! All orderings derive from the [`CharacterSet`], so output is byte-for-byte deterministic.

mod atlas;
mod charset;
mod error;
mod expand;
mod metrics;
mod minify;
mod store;
mod validate;

pub mod indexer;
pub mod kerning;
pub mod quantize;
pub mod record;
pub mod tuplet;

pub use atlas::{PixelBuffer, reconstruct_tight_height, reconstruct_x_in_atlas};
pub use charset::CharacterSet;
pub use error::{
  Error, FormatVersionError, Mismatch, MismatchKey, ReconstructionError, RoundtripMismatchError, ValidationError,
};
pub use expand::{expand, expand_atlas, expand_font};
pub use kerning::{OrderedMap, RangeTable};
pub use metrics::{
  AtlasPositioning, FontBaselines, FontMetrics, GlyphMetrics, GlyphPlacement, KerningRelation, LoadedFont,
};
pub use minify::{minify, minify_atlas};
pub use record::{CompactAtlas, CompactRecord};
pub use store::FontStore;
pub use validate::{validate_atlas, validate_roundtrip};
