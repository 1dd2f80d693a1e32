//! EXIF reading and writing.
//!
//! - [`read_camera_info`] / [`summarize_file`]: Make, Model and LensModel for the query table
//! - [`write_tags`]: merge configured tags into an image's EXIF block
//!
//! Reading goes through `nom-exif`; writing builds the EXIF block with
//! `little_exif` and splices it into the container with `img-parts`, so
//! image data and other segments are left untouched. EXIF that
//! `little_exif` cannot load, and every TIFF file, is patched in place by
//! appending rewritten IFDs.

mod container;
mod raw_ifd;
mod reader;
mod tags;
mod writer;

pub use container::ImageFormat;
pub use reader::{
    CameraInfo, ExifSummary, NOT_AVAILABLE, READ_FAILED, read_camera_info, summarize_file,
};
pub use tags::{Block, TagEntry, TagName, compose_user_comment, encode_user_comment};
pub use writer::{WriteResult, apply_tags, write_tags};
