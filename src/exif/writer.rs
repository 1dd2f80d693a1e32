use anyhow::{Context, Result, anyhow, bail};
use img_parts::Bytes;
use little_exif::filetype::FileExtension;
use little_exif::metadata::Metadata;
use std::panic::AssertUnwindSafe;
use std::path::Path;

use super::container::{Container, ImageFormat};
use super::raw_ifd;
use super::tags::{TagEntry, TagName};

// little_exif as_u8_vec(JPEG) returns: [APP1 marker 2B][length 2B][Exif\0\0 6B][TIFF data]
// img-parts set_exif() expects just the TIFF data (after Exif\0\0)
const JPEG_EXIF_OVERHEAD: usize = 10; // 2 + 2 + 6

/// What happened to each configured entry.
#[derive(Debug, Default, PartialEq)]
pub struct WriteResult {
    /// Tags set on the file, in config order.
    pub written: Vec<TagName>,
    /// Recognized tags left alone because their value was empty.
    pub skipped_empty: Vec<TagName>,
    /// Config keys that are not a recognized tag.
    pub ignored_keys: Vec<String>,
}

/// Split config entries into the tags to set and a report of the rest.
fn sort_entries(entries: &[TagEntry]) -> (WriteResult, Vec<(TagName, &str)>) {
    let mut result = WriteResult::default();
    let mut tags = Vec::new();

    for entry in entries {
        let Some(tag) = entry.tag() else {
            result.ignored_keys.push(entry.key.clone());
            continue;
        };
        if entry.value.is_empty() {
            result.skipped_empty.push(tag);
            continue;
        }
        log::debug!("  {tag}: {}", entry.value);
        result.written.push(tag);
        tags.push((tag, entry.value.as_str()));
    }

    (result, tags)
}

/// Merge config entries into an EXIF structure.
///
/// Empty values are skipped, never cleared; unknown keys are ignored.
pub fn apply_tags(metadata: &mut Metadata, entries: &[TagEntry]) -> WriteResult {
    let (result, tags) = sort_entries(entries);
    set_all(metadata, &tags);
    result
}

fn set_all(metadata: &mut Metadata, tags: &[(TagName, &str)]) {
    for (tag, value) in tags {
        metadata.set_tag(tag.to_exif_tag(value));
    }
}

/// Write the configured tags into an image file, preserving its other metadata.
///
/// Strategy:
/// 1. Parse the container (JPEG/PNG/WebP via img-parts, TIFF as-is)
/// 2. No EXIF yet: build a fresh block with little_exif
/// 3. Existing EXIF: merge through little_exif, or inject the entries into
///    the raw IFDs when little_exif cannot parse it (always for TIFF files)
/// 4. Re-embed the EXIF block and write the file back in one go
///
/// An existing block that is not a readable TIFF structure is an error, so
/// the file is never rewritten with its original metadata dropped.
pub fn write_tags(path: &Path, entries: &[TagEntry]) -> Result<WriteResult> {
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("Unsupported file type: {}", path.display()))?;
    let file_bytes = std::fs::read(path).context("Failed to read image file")?;
    let container = Container::parse(format, &file_bytes)?;

    let (result, tags) = sort_entries(entries);
    if tags.is_empty() {
        log::debug!("Nothing to write for {}", path.display());
        return Ok(result);
    }

    let tiff = match container.exif() {
        Some(existing) => merge_existing(format, &existing, &tags)?,
        None => {
            log::debug!("No EXIF in {}, starting from an empty block", path.display());
            let mut metadata = Metadata::new();
            set_all(&mut metadata, &tags);
            encode_tiff(&metadata)?
        }
    };

    let output = container.embed(tiff);
    std::fs::write(path, &output).context("Failed to write image file")?;

    Ok(result)
}

/// Build the new EXIF block from an existing one.
fn merge_existing(format: ImageFormat, existing: &[u8], tags: &[(TagName, &str)]) -> Result<Bytes> {
    raw_ifd::check_structure(existing).context("Existing EXIF data is corrupt")?;

    if format != ImageFormat::Tiff {
        match load_existing_metadata(existing) {
            Ok(mut metadata) => {
                log::debug!("little_exif parsed existing EXIF, using merge strategy");
                set_all(&mut metadata, tags);
                return encode_tiff(&metadata);
            }
            Err(e) => log::info!("{e:#}; injecting tags into the raw EXIF data instead"),
        }
    }

    Ok(Bytes::from(raw_ifd::inject_tags(existing, tags)?))
}

/// Load an existing EXIF block (bare TIFF data) with little_exif.
fn load_existing_metadata(tiff: &[u8]) -> Result<Metadata> {
    let buffer = tiff.to_vec();
    let metadata = quietly(|| Metadata::new_from_vec(&buffer, FileExtension::TIFF))
        .ok_or_else(|| anyhow!("little_exif panicked parsing EXIF"))?
        .map_err(|e| anyhow!("little_exif could not parse EXIF: {e}"))?;
    if metadata.data().is_empty() {
        bail!("little_exif found no tags in the existing EXIF block");
    }
    log::debug!("little_exif loaded {} existing EXIF tags", metadata.data().len());
    Ok(metadata)
}

/// Run a little_exif call with panics suppressed.
fn quietly<T>(f: impl FnOnce() -> T) -> Option<T> {
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));
    let result = std::panic::catch_unwind(AssertUnwindSafe(f));
    std::panic::set_hook(prev_hook);
    result.ok()
}

/// Serialize metadata into the bare TIFF structure img-parts embeds.
fn encode_tiff(metadata: &Metadata) -> Result<Bytes> {
    let exif_bytes = quietly(|| metadata.as_u8_vec(FileExtension::JPEG))
        .ok_or_else(|| anyhow!("little_exif panicked encoding EXIF"))?;
    if exif_bytes.len() <= JPEG_EXIF_OVERHEAD {
        bail!("EXIF encoding produced no data");
    }
    Ok(Bytes::from(exif_bytes[JPEG_EXIF_OVERHEAD..].to_vec()))
}
