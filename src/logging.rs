//! Logger setup shared by the binaries.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use env_logger::{Builder, Env, Target};

/// Log file written by the batch CLI and the GUI, relative to the working directory.
pub const LOG_FILE: &str = "exif_tagger.log";

fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Append `timestamp - LEVEL - message` records to `path`.
///
/// Falls back to stderr if the file cannot be opened. `verbose` raises the
/// default filter from `info` to `debug`; `RUST_LOG` overrides both.
pub fn init_file_logger(path: &Path, verbose: bool) {
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter(verbose)));
    builder.format(|buf, record| {
        writeln!(buf, "{} - {} - {}", buf.timestamp(), record.level(), record.args())
    });

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            builder.target(Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("Could not open log file {}: {e}", path.display());
        }
    }

    let _ = builder.try_init();
}

/// Log to stderr; `verbose` raises the default filter to `debug`.
pub fn init_console_logger(verbose: bool) {
    let _ = Builder::from_env(Env::default().default_filter_or(default_filter(verbose)))
        .format_timestamp(None)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_logger_creates_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LOG_FILE);
        init_file_logger(&path, true);
        assert!(path.exists());
    }

    #[test]
    fn verbose_raises_the_level() {
        assert_eq!(default_filter(false), "info");
        assert_eq!(default_filter(true), "debug");
    }
}
