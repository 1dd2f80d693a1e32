use anyhow::{Context, Result};
use nom_exif::*;
use std::io::Cursor;
use std::path::Path;

use super::container::{ImageFormat, embedded_exif};
use super::raw_ifd;

/// Shown when a file has EXIF but not the requested field.
pub const NOT_AVAILABLE: &str = "N/A";
/// Shown in every field when a file's metadata could not be read at all.
pub const READ_FAILED: &str = "READ FAILED";

/// Camera fields extracted from an image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraInfo {
    pub make: Option<String>,
    pub model: Option<String>,
    pub lens_model: Option<String>,
}

/// One row of the query table.
#[derive(Debug, Clone, PartialEq)]
pub struct ExifSummary {
    pub filename: String,
    pub make: String,
    pub model: String,
    pub lens_model: String,
}

impl ExifSummary {
    fn from_info(filename: String, info: CameraInfo) -> Self {
        let or_na = |v: Option<String>| v.unwrap_or_else(|| NOT_AVAILABLE.to_string());
        Self {
            filename,
            make: or_na(info.make),
            model: or_na(info.model),
            lens_model: or_na(info.lens_model),
        }
    }

    fn read_failed(filename: String) -> Self {
        Self {
            filename,
            make: READ_FAILED.to_string(),
            model: READ_FAILED.to_string(),
            lens_model: READ_FAILED.to_string(),
        }
    }

    pub fn is_read_failure(&self) -> bool {
        self.make == READ_FAILED && self.model == READ_FAILED && self.lens_model == READ_FAILED
    }
}

/// Read Make, Model and LensModel from an image file.
///
/// JPEG, PNG, WebP and TIFF files are checked for an EXIF block first: a
/// file without one yields empty fields. Anything else is handed to
/// nom-exif whole. An unrecognized file, a truncated container or a
/// corrupt EXIF block is an error.
pub fn read_camera_info(path: &Path) -> Result<CameraInfo> {
    let file_bytes = std::fs::read(path).context("Failed to read image file")?;

    let data = match ImageFormat::from_path(path) {
        Some(format) => match embedded_exif(format, &file_bytes)? {
            Some(tiff) => {
                raw_ifd::check_structure(&tiff).context("Corrupt EXIF data")?;
                tiff.to_vec()
            }
            None => {
                log::debug!("No EXIF data found in {}", path.display());
                return Ok(CameraInfo::default());
            }
        },
        None => file_bytes,
    };

    let mut parser = MediaParser::new();
    let ms = MediaSource::seekable(Cursor::new(data)).context("Unrecognized image data")?;
    let iter: ExifIter = parser.parse(ms).context("Failed to parse EXIF data")?;
    let exif: Exif = iter.into();

    Ok(CameraInfo {
        make: exif.get(ExifTag::Make).and_then(entry_to_string),
        model: exif.get(ExifTag::Model).and_then(entry_to_string),
        lens_model: exif.get(ExifTag::LensModel).and_then(entry_to_string),
    })
}

/// Summarize one file for the query table, never failing.
pub fn summarize_file(path: &Path) -> ExifSummary {
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    match read_camera_info(path) {
        Ok(info) => ExifSummary::from_info(filename, info),
        Err(e) => {
            log::warn!("Could not read EXIF from {}: {e:#}", path.display());
            ExifSummary::read_failed(filename)
        }
    }
}

/// Convert an EntryValue to an Option<String>.
fn entry_to_string(val: &EntryValue) -> Option<String> {
    let s = val.to_string();
    let s = s.trim().trim_matches('"').trim_end_matches('\0').trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_jpeg(path: &Path) {
        image::RgbImage::from_pixel(8, 8, image::Rgb([200, 40, 40]))
            .save_with_format(path, image::ImageFormat::Jpeg)
            .unwrap();
    }

    #[test]
    fn jpeg_without_exif_is_not_available() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.jpg");
        write_jpeg(&path);

        let summary = summarize_file(&path);
        assert_eq!(summary.filename, "plain.jpg");
        assert_eq!(summary.make, NOT_AVAILABLE);
        assert_eq!(summary.model, NOT_AVAILABLE);
        assert_eq!(summary.lens_model, NOT_AVAILABLE);
        assert!(!summary.is_read_failure());
    }

    #[test]
    fn corrupt_file_gets_sentinel() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"this is not an image at all").unwrap();

        assert!(read_camera_info(&path).is_err());
        let summary = summarize_file(&path);
        assert!(summary.is_read_failure());
        assert_eq!(summary.filename, "broken.jpg");
    }

    /// A JPEG whose APP1 `Exif\0\0` segment holds a broken TIFF header.
    fn jpeg_with_exif_payload(path: &Path, payload: &[u8]) {
        write_jpeg(path);
        let body = fs::read(path).unwrap();
        let len = u16::try_from(2 + 6 + payload.len()).unwrap();

        let mut bytes = body[..2].to_vec();
        bytes.extend_from_slice(&[0xFF, 0xE1]);
        bytes.extend_from_slice(&len.to_be_bytes());
        bytes.extend_from_slice(b"Exif\0\0");
        bytes.extend_from_slice(payload);
        bytes.extend_from_slice(&body[2..]);
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn corrupt_exif_block_gets_sentinel() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad_exif.jpg");
        jpeg_with_exif_payload(&path, b"XX\0*\0\0\0\x08");

        assert!(read_camera_info(&path).is_err());
        let summary = summarize_file(&path);
        assert!(summary.is_read_failure());
        assert_eq!(summary.filename, "bad_exif.jpg");
    }

    #[test]
    fn dangling_ifd_gets_sentinel() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dangling.jpg");
        // Valid header, IFD0 offset far past the end of the block.
        jpeg_with_exif_payload(&path, b"II*\0\x00\x10\0\0");

        assert!(summarize_file(&path).is_read_failure());
    }

    #[test]
    fn truncated_jpeg_gets_sentinel() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("truncated.jpg");
        write_jpeg(&path);
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..6]).unwrap();

        assert!(summarize_file(&path).is_read_failure());
    }

    #[test]
    fn missing_file_gets_sentinel() {
        let summary = summarize_file(Path::new("/nonexistent/photo.jpg"));
        assert!(summary.is_read_failure());
    }
}
