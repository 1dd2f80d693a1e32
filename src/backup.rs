use anyhow::{Context, Result};
use filetime::FileTime;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffix appended to a file's full name to form its backup.
pub const BACKUP_SUFFIX: &str = ".bak";

/// `photo.jpg` -> `photo.jpg.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Create a backup of the original file, keeping its timestamps.
///
/// An existing backup is left as is, so repeated runs keep the first original.
pub fn backup_file(path: &Path) -> Result<PathBuf> {
    let backup_path = backup_path(path);

    if !backup_path.exists() {
        std::fs::copy(path, &backup_path).context("Failed to create backup")?;

        let meta = std::fs::metadata(path).context("Failed to stat original")?;
        filetime::set_file_times(
            &backup_path,
            FileTime::from_last_access_time(&meta),
            FileTime::from_last_modification_time(&meta),
        )
        .context("Failed to copy timestamps to backup")?;
        log::debug!("Backup created: {}", backup_path.display());
    }

    Ok(backup_path)
}

fn is_backup(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(BACKUP_SUFFIX))
        .unwrap_or(false)
}

/// Delete every `*.bak` file under `root`. Returns the number of files removed.
///
/// There is no confirmation and no way back.
pub fn cleanup_backups(root: &Path) -> Result<usize> {
    let mut removed = 0;

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };
        let p = entry.path();
        if entry.file_type().is_file() && is_backup(p) {
            std::fs::remove_file(p)
                .with_context(|| format!("Failed to remove {}", p.display()))?;
            log::debug!("Removed backup: {}", p.display());
            removed += 1;
        }
    }

    log::info!("Removed {removed} backup file(s) under {}", root.display());
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn backup_path_appends_suffix() {
        assert_eq!(backup_path(Path::new("a/b.jpg")), PathBuf::from("a/b.jpg.bak"));
        assert_eq!(backup_path(Path::new("X.JPG")), PathBuf::from("X.JPG.bak"));
    }

    #[test]
    fn backup_copies_content_and_mtime() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("image.jpg");
        fs::write(&original, b"original bytes").unwrap();
        let mtime = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&original, mtime).unwrap();

        let backup = backup_file(&original).unwrap();
        assert_eq!(backup, dir.path().join("image.jpg.bak"));
        assert_eq!(fs::read(&backup).unwrap(), b"original bytes");
        let meta = fs::metadata(&backup).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta), mtime);
    }

    #[test]
    fn backup_keeps_first_original() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("image.jpg");
        fs::write(&original, b"first").unwrap();
        backup_file(&original).unwrap();

        fs::write(&original, b"second").unwrap();
        let backup = backup_file(&original).unwrap();
        assert_eq!(fs::read(backup).unwrap(), b"first");
    }

    #[test]
    fn backup_of_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(backup_file(&dir.path().join("gone.jpg")).is_err());
    }

    // ── cleanup_backups ──────────────────────────────────────────────

    #[test]
    fn cleanup_removes_only_backups() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.bak"), b"a").unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        fs::write(dir.path().join("c.jpeg.bak"), b"c").unwrap();

        let removed = cleanup_backups(dir.path()).unwrap();
        assert_eq!(removed, 2);
        assert!(!dir.path().join("a.bak").exists());
        assert!(!dir.path().join("c.jpeg.bak").exists());
        assert_eq!(fs::read(dir.path().join("b.txt")).unwrap(), b"b");
    }

    #[test]
    fn cleanup_is_recursive() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("nested").join("deeper");
        fs::create_dir_all(&sub).unwrap();
        fs::write(dir.path().join("image1.jpg"), b"x").unwrap();
        fs::write(dir.path().join("image1.jpg.bak"), b"x").unwrap();
        fs::write(sub.join("image2.jpeg.bak"), b"y").unwrap();
        fs::write(sub.join("notes.txt"), b"z").unwrap();

        assert_eq!(cleanup_backups(dir.path()).unwrap(), 2);
        assert!(dir.path().join("image1.jpg").exists());
        assert!(!sub.join("image2.jpeg.bak").exists());
        assert!(sub.join("notes.txt").exists());
    }

    #[test]
    fn cleanup_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert_eq!(cleanup_backups(dir.path()).unwrap(), 0);
    }

    #[test]
    fn cleanup_skips_walk_errors() {
        let dir = TempDir::new().unwrap();
        assert_eq!(cleanup_backups(&dir.path().join("missing")).unwrap(), 0);
    }
}
