use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use minimetrics::{AtlasPositioning, CharacterSet, CompactAtlas, CompactRecord, FontMetrics, PixelBuffer};
use std::{fs, path::Path, path::PathBuf};

// ---------------------------------------------
// minimetrics: font metrics codec CLI
// Modes:
//   1) minify --metrics <json> [--positioning <json> [--atlas <png>]]  -> compact record (+ compact atlas)
//   2) expand --record <json> [--atlas-record <json> [--atlas <png>]]  -> full metrics (+ positioning)
// Every minified record is expanded and compared with its input before anything is written.
// ---------------------------------------------
#[derive(Parser, Debug)]
#[command(name = "minimetrics", author, version, about = "minimetrics: minify and expand bitmap-font metrics", long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Compress full font metrics (and atlas positioning) into compact records
  Minify {
    /// Font metrics JSON (baselines, glyphs, kerning, spaceAdvancementOverride)
    #[arg(short = 'm', long = "metrics")]
    metrics: PathBuf,

    /// Atlas positioning JSON (char -> tightWidth/tightHeight/dx/dy/xInAtlas)
    #[arg(short = 'p', long = "positioning")]
    positioning: Option<PathBuf>,

    /// Atlas image; when given, glyph heights are checked against its alpha channel
    #[arg(short = 'a', long = "atlas")]
    atlas: Option<PathBuf>,

    /// Character set file, UTF-8, newlines ignored. Default: printable ASCII " " through "~"
    #[arg(short = 'c', long = "charset")]
    charset: Option<PathBuf>,

    /// Output compact record
    #[arg(short, long)]
    output: PathBuf,

    /// Output compact atlas (required with --positioning)
    #[arg(long = "atlas-output")]
    atlas_output: Option<PathBuf>,
  },
  /// Rebuild full font metrics from compact records
  Expand {
    /// Compact record JSON
    #[arg(short = 'r', long = "record")]
    record: PathBuf,

    /// Compact atlas JSON
    #[arg(long = "atlas-record")]
    atlas_record: Option<PathBuf>,

    /// Atlas image, needed to recompute glyph heights
    #[arg(short = 'a', long = "atlas")]
    atlas: Option<PathBuf>,

    /// Character set file, UTF-8, newlines ignored. Default: printable ASCII " " through "~"
    #[arg(short = 'c', long = "charset")]
    charset: Option<PathBuf>,

    /// Output metrics JSON
    #[arg(short, long)]
    output: PathBuf,
  },
}

fn main() -> Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  let cli = Cli::parse();

  match cli.command {
    Command::Minify { metrics, positioning, atlas, charset, output, atlas_output } => {
      if positioning.is_some() != atlas_output.is_some() {
        bail!("--positioning and --atlas-output must be given together");
      }
      if atlas.is_some() && positioning.is_none() {
        bail!("--atlas is only used with --positioning");
      }
      let charset = load_charset(charset.as_deref())?;

      let json_text = fs::read_to_string(&metrics).with_context(|| format!("read metrics {:?}", metrics))?;
      let font: FontMetrics = serde_json::from_str(&json_text).with_context(|| format!("parse metrics {:?}", metrics))?;
      let record = minimetrics::minify(&charset, &font).context("minify metrics")?;
      write_output(&output, &record.to_json()?)?;

      if let (Some(positioning), Some(atlas_output)) = (positioning, atlas_output) {
        let json_text =
          fs::read_to_string(&positioning).with_context(|| format!("read positioning {:?}", positioning))?;
        let placements: AtlasPositioning =
          serde_json::from_str(&json_text).with_context(|| format!("parse positioning {:?}", positioning))?;
        let image = atlas.as_deref().map(read_atlas).transpose()?;
        let pixels = image.as_ref().map(|(w, h, rgba)| PixelBuffer::new(*w, *h, rgba)).transpose()?;
        if pixels.is_none() {
          log::warn!("no --atlas given; glyph heights are not checked");
        }
        let compact = minimetrics::minify_atlas(&charset, &placements, pixels.as_ref()).context("minify atlas")?;
        write_output(&atlas_output, &compact.to_json()?)?;
      }
    }
    Command::Expand { record, atlas_record, atlas, charset, output } => {
      let charset = load_charset(charset.as_deref())?;

      let json_text = fs::read_to_string(&record).with_context(|| format!("read record {:?}", record))?;
      let compact = CompactRecord::from_json(&json_text).with_context(|| format!("parse record {:?}", record))?;

      let compact_atlas = match &atlas_record {
        Some(path) => {
          let json_text = fs::read_to_string(path).with_context(|| format!("read atlas record {:?}", path))?;
          Some(CompactAtlas::from_json(&json_text).with_context(|| format!("parse atlas record {:?}", path))?)
        }
        None => None,
      };
      let image = atlas.as_deref().map(read_atlas).transpose()?;
      let pixels = image.as_ref().map(|(w, h, rgba)| PixelBuffer::new(*w, *h, rgba)).transpose()?;

      let font = minimetrics::expand_font(&charset, &compact, compact_atlas.as_ref(), pixels.as_ref())
        .context("expand record")?;
      write_output(&output, &serde_json::to_string_pretty(&font)?)?;
    }
  }
  Ok(())
}

/// Character set from a UTF-8 file, every char in file order with line breaks dropped.
fn load_charset(path: Option<&Path>) -> Result<CharacterSet> {
  let Some(path) = path else {
    return Ok(CharacterSet::printable_ascii());
  };
  let text = fs::read_to_string(path).with_context(|| format!("read charset {:?}", path))?;
  parse_charset(&text).with_context(|| format!("charset {:?}", path))
}

fn parse_charset(text: &str) -> Result<CharacterSet> {
  let set = CharacterSet::new(text.chars().filter(|&c| c != '\n' && c != '\r'))?;
  if set.is_empty() {
    bail!("character set is empty");
  }
  Ok(set)
}

fn read_atlas(path: &Path) -> Result<(u32, u32, Vec<u8>)> {
  let bytes = fs::read(path).with_context(|| format!("read atlas {:?}", path))?;
  decode_png_to_rgba8(&bytes).with_context(|| format!("decode atlas {:?}", path))
}

/// Decode a PNG (or any supported format) into row-major RGBA8. Implemented via the `image` crate.
fn decode_png_to_rgba8(bytes: &[u8]) -> Result<(u32, u32, Vec<u8>)> {
  use image::ImageReader;
  use std::io::Cursor;

  let img = ImageReader::new(Cursor::new(bytes))
    .with_guessed_format()? // uses magic header to detect PNG/JPEG/etc.
    .decode()?; // -> DynamicImage

  let rgba = img.to_rgba8();
  let (w, h) = rgba.dimensions();
  Ok((w, h, rgba.into_vec()))
}

fn write_output(path: &Path, text: &str) -> Result<()> {
  fs::write(path, text).with_context(|| format!("write {:?}", path))?;
  log::info!("wrote {} bytes to {}", text.len(), path.display());
  Ok(())
}
