//! # exif-tagger
//!
//! Batch EXIF tag writer. Stamp artist, copyright, camera and lens metadata from
//! an INI config onto every matching image in a directory tree, with optional
//! `.bak` backups and a read-only query mode.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exif_tagger::pipeline::run_batch;
//! use std::path::Path;
//!
//! fn main() {
//!     let result = run_batch(
//!         Path::new("./photos"),
//!         Path::new("config/config.ini"),
//!         &mut |line| println!("{line}"),
//!     );
//!     if result.is_err() {
//!         std::process::exit(1);
//!     }
//! }
//! ```
//!
//! ## Lower-Level Usage
//!
//! ```rust,no_run
//! use exif_tagger::exif::{TagEntry, read_camera_info, write_tags};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let path = Path::new("photo.jpg");
//!
//!     let before = read_camera_info(path)?;
//!     println!("Camera: {:?}", before.model);
//!
//!     let entries = vec![
//!         TagEntry::new("artist", "Jane Doe"),
//!         TagEntry::new("copyright", "(c) 2024 Jane Doe"),
//!     ];
//!     let result = write_tags(path, &entries)?;
//!     println!("Tags written: {}", result.written.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Formats
//!
//! | Format | Write Strategy |
//! |--------|---------------|
//! | JPEG (`.jpg`, `.jpeg`) | APP1 EXIF segment, replaced in place |
//! | PNG (`.png`) | `eXIf` chunk |
//! | WebP (`.webp`) | `EXIF` RIFF chunk |
//! | TIFF (`.tif`, `.tiff`) | new IFDs appended, image data untouched |
//!
//! ## Modules
//!
//! - [`backup`]: `.bak` copies and recursive cleanup
//! - [`config`]: INI configuration, tag entries and value history
//! - [`exif`]: EXIF reading and writing
//! - [`pipeline`]: directory scanning and the batch orchestrator
//! - [`report`]: query table rendering

pub mod backup;
pub mod config;
pub mod exif;
#[cfg(any(feature = "cli", feature = "gui"))]
pub mod logging;
pub mod pipeline;
pub mod report;
