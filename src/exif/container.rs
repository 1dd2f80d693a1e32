use anyhow::{Result, anyhow, bail};
use img_parts::jpeg::Jpeg;
use img_parts::png::Png;
use img_parts::webp::WebP;
use img_parts::{Bytes, ImageEXIF};
use std::path::Path;

/// Image containers the crate can read and embed EXIF in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Tiff,
}

impl ImageFormat {
    /// Determine the container from a file path extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }
}

/// A parsed image file. JPEG, PNG and WebP carry EXIF as an embedded TIFF
/// block; a TIFF file is its own EXIF structure.
pub(super) enum Container {
    Jpeg(Jpeg),
    Png(Png),
    WebP(WebP),
    Tiff(Bytes),
}

impl Container {
    pub(super) fn parse(format: ImageFormat, file_bytes: &[u8]) -> Result<Self> {
        let bytes = Bytes::from(file_bytes.to_vec());
        Ok(match format {
            ImageFormat::Jpeg => Self::Jpeg(
                Jpeg::from_bytes(bytes).map_err(|e| anyhow!("Failed to parse JPEG: {e}"))?,
            ),
            ImageFormat::Png => {
                Self::Png(Png::from_bytes(bytes).map_err(|e| anyhow!("Failed to parse PNG: {e}"))?)
            }
            ImageFormat::WebP => Self::WebP(
                WebP::from_bytes(bytes).map_err(|e| anyhow!("Failed to parse WebP: {e}"))?,
            ),
            ImageFormat::Tiff => {
                if !(file_bytes.starts_with(b"II*\0") || file_bytes.starts_with(b"MM\0*")) {
                    bail!("Failed to parse TIFF: bad header");
                }
                Self::Tiff(bytes)
            }
        })
    }

    /// The embedded TIFF block (without the `Exif\0\0` prefix), if any.
    pub(super) fn exif(&self) -> Option<Bytes> {
        match self {
            Self::Jpeg(jpeg) => jpeg.exif(),
            Self::Png(png) => png.exif(),
            Self::WebP(webp) => webp.exif(),
            Self::Tiff(bytes) => Some(bytes.clone()),
        }
    }

    /// Produce the new file contents with `tiff` as the EXIF block.
    pub(super) fn embed(self, tiff: Bytes) -> Vec<u8> {
        match self {
            Self::Jpeg(mut jpeg) => {
                let orig_exif_pos = find_exif_segment_pos(&jpeg);
                jpeg.set_exif(Some(tiff));

                // set_exif() inserts at position 3, which may be after XMP APP1.
                // Move the EXIF segment back to where it was (or right after APP0).
                if let Some(new_pos) = find_exif_segment_pos(&jpeg) {
                    let target_pos = orig_exif_pos.unwrap_or(1);
                    if target_pos < new_pos {
                        let segments = jpeg.segments_mut();
                        let seg = segments.remove(new_pos);
                        segments.insert(target_pos, seg);
                    }
                }
                jpeg.encoder().bytes().to_vec()
            }
            Self::Png(mut png) => {
                png.set_exif(Some(tiff));
                png.encoder().bytes().to_vec()
            }
            Self::WebP(mut webp) => {
                webp.set_exif(Some(tiff));
                webp.encoder().bytes().to_vec()
            }
            Self::Tiff(_) => tiff.to_vec(),
        }
    }
}

/// The EXIF block of an image file's contents, or `None` if it has none.
pub(super) fn embedded_exif(format: ImageFormat, file_bytes: &[u8]) -> Result<Option<Bytes>> {
    Ok(Container::parse(format, file_bytes)?.exif())
}

/// Find the position of the EXIF APP1 segment in a JPEG.
/// EXIF segments have marker 0xE1 (APP1) and contents starting with "Exif\0\0".
fn find_exif_segment_pos(jpeg: &Jpeg) -> Option<usize> {
    const EXIF_PREFIX: &[u8] = b"Exif\0\0";
    jpeg.segments()
        .iter()
        .position(|s| s.marker() == 0xE1 && s.contents().starts_with(EXIF_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_format_from_path() {
        assert_eq!(ImageFormat::from_path(Path::new("a.jpg")), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_path(Path::new("A.JPEG")), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_path(Path::new("a.png")), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_path(Path::new("a.webp")), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_path(Path::new("a.TIF")), Some(ImageFormat::Tiff));
        assert_eq!(ImageFormat::from_path(Path::new("a.heic")), None);
        assert_eq!(ImageFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn tiff_header_is_checked() {
        assert!(Container::parse(ImageFormat::Tiff, b"II*\0\x08\0\0\0").is_ok());
        assert!(Container::parse(ImageFormat::Tiff, b"XX*\0\x08\0\0\0").is_err());
    }
}
