use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::backup;
use crate::config::{BatchPlan, ConfigError, ConfigFile};
use crate::exif::{self, ExifSummary, TagEntry};

/// Counts for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl fmt::Display for ProcessingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Processing Summary ---")?;
        writeln!(f, "Total files processed: {}", self.total)?;
        writeln!(f, "Successful: {}", self.succeeded)?;
        writeln!(f, "Errors: {}", self.failed)?;
        write!(f, "--------------------------")
    }
}

/// Whether a file name ends with one of the extensions, ignoring case.
pub fn matches_extension(file_name: &str, extensions: &[String]) -> bool {
    let name = file_name.to_lowercase();
    extensions
        .iter()
        .any(|ext| !ext.is_empty() && name.ends_with(&ext.to_lowercase()))
}

/// Collect the files under `root` whose names end with one of `extensions`.
///
/// The tree is walked recursively in file-name order without following
/// symlinks. Unreadable entries are skipped with a warning.
///
/// # Example
///
/// ```rust,no_run
/// use exif_tagger::pipeline::collect_images;
/// use std::path::Path;
///
/// let images = collect_images(Path::new("./photos"), &[".jpg".to_string()]);
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if matches_extension(&name, extensions) {
            images.push(entry.into_path());
        }
    }

    images
}

/// Summarize every matching file under `root`. Unreadable files get the
/// read-failure sentinel; the scan always runs to the end.
pub fn query_directory(root: &Path, extensions: &[String]) -> Vec<ExifSummary> {
    collect_images(root, extensions)
        .iter()
        .map(|path| exif::summarize_file(path))
        .collect()
}

/// Load the config and summarize `root`.
pub fn run_query(root: &Path, config_path: &Path) -> Result<Vec<ExifSummary>, ConfigError> {
    let settings = ConfigFile::load(config_path)?.settings()?;
    Ok(query_directory(root, &settings.target_extensions))
}

/// Write the configured tags to one file. Errors are logged, never propagated.
pub fn tag_file(path: &Path, entries: &[TagEntry]) -> bool {
    log::info!("Processing: {}", path.display());
    match exif::write_tags(path, entries) {
        Ok(result) => {
            if !result.ignored_keys.is_empty() {
                log::debug!("  Ignored keys: {}", result.ignored_keys.join(", "));
            }
            true
        }
        Err(e) => {
            log::error!("Error processing file {}: {e:#}", path.display());
            false
        }
    }
}

/// Back up (if configured) and tag every matching file under `root`.
///
/// `emit` receives the human-readable progress lines. A failing file is
/// counted and skipped; the batch always runs to the end.
pub fn process_directory(
    root: &Path,
    plan: &BatchPlan,
    emit: &mut dyn FnMut(&str),
) -> ProcessingSummary {
    log::info!("Starting to process files in: {}", root.display());
    emit(&format!("Starting to process files in: {}", root.display()));

    let images = collect_images(root, &plan.settings.target_extensions);
    let mut summary = ProcessingSummary::default();

    for path in &images {
        summary.total += 1;

        if plan.settings.create_backup {
            if let Err(e) = backup::backup_file(path) {
                log::error!("Failed to backup {}: {e:#}", path.display());
                emit(&format!("Failed: {} (backup: {e})", path.display()));
                summary.failed += 1;
                continue;
            }
        }

        if tag_file(path, &plan.entries) {
            summary.succeeded += 1;
            emit(&format!("Tagged: {}", path.display()));
        } else {
            summary.failed += 1;
            emit(&format!("Failed: {}", path.display()));
        }
    }

    log::info!("{summary}");
    emit(&summary.to_string());
    summary
}

/// Load and validate the config, then process `root`.
///
/// A configuration problem is logged and emitted exactly once, and no file
/// is touched.
///
/// # Example
///
/// ```rust,no_run
/// use exif_tagger::pipeline::run_batch;
/// use std::path::Path;
///
/// let result = run_batch(
///     Path::new("./photos"),
///     Path::new("config/config.ini"),
///     &mut |line| println!("{line}"),
/// );
/// if let Ok(summary) = result {
///     assert_eq!(summary.total, summary.succeeded + summary.failed);
/// }
/// ```
pub fn run_batch(
    root: &Path,
    config_path: &Path,
    emit: &mut dyn FnMut(&str),
) -> Result<ProcessingSummary, ConfigError> {
    let plan = match ConfigFile::load(config_path).and_then(|cfg| cfg.batch_plan()) {
        Ok(plan) => plan,
        Err(e) => {
            log::error!("{e}");
            emit(&format!("Error: {e}"));
            return Err(e);
        }
    };
    Ok(process_directory(root, &plan, emit))
}
