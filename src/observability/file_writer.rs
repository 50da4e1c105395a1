//! Size-rotated JSON lines file for exported spans.
//!
//! The open file tracks how many bytes it holds, so a write only touches the
//! file system when it has to rotate. Rotated files are renamed with a
//! timestamp suffix and only the newest backups are kept.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Size at which the trace file is rotated (10 MB).
const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Backups kept after rotation.
const MAX_BACKUP_FILES: usize = 3;

struct OpenFile {
    file: File,
    len: u64,
}

/// Line writer shared by the exporter, rotated by size.
///
/// Nothing is opened until the first line arrives.
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    max_backups: usize,
    current: Mutex<Option<OpenFile>>,
}

impl RotatingFile {
    pub fn new(path: &Path) -> Self {
        Self::with_limits(path, MAX_FILE_SIZE_BYTES, MAX_BACKUP_FILES)
    }

    pub fn with_limits(path: &Path, max_bytes: u64, max_backups: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            max_bytes,
            max_backups,
            current: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line. A file already past the size limit is rotated first.
    ///
    /// # Errors
    ///
    /// Returns the I/O error of opening, renaming or writing the file.
    pub fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);

        if current.as_ref().is_some_and(|open| open.len > self.max_bytes) {
            *current = None;
            self.rotate()?;
        }
        let open = match current.take() {
            Some(open) => open,
            None => self.open()?,
        };
        let open = current.insert(open);

        writeln!(open.file, "{line}")?;
        open.file.flush()?;
        open.len += line.len() as u64 + 1;
        Ok(())
    }

    fn open(&self) -> std::io::Result<OpenFile> {
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let len = file.metadata()?.len();
        if len <= self.max_bytes {
            return Ok(OpenFile { file, len });
        }

        // Left over from an earlier run.
        drop(file);
        self.rotate()?;
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        Ok(OpenFile { file, len: 0 })
    }

    /// Renames the file to `<name>.<unix_nanos>` and prunes old backups.
    fn rotate(&self) -> std::io::Result<()> {
        let stamp = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let mut backup = self.path.clone().into_os_string();
        backup.push(format!(".{stamp}"));

        if self.path.exists() {
            fs::rename(&self.path, PathBuf::from(backup))?;
        }
        self.prune_backups()
    }

    fn prune_backups(&self) -> std::io::Result<()> {
        let (Some(dir), Some(name)) = (self.path.parent(), self.path.file_name().and_then(|n| n.to_str())) else {
            return Ok(());
        };
        let prefix = format!("{name}.");

        let mut backups: Vec<(i64, PathBuf)> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let stamp = entry.file_name().to_str()?.strip_prefix(&prefix)?.parse().ok()?;
                Some((stamp, entry.path()))
            })
            .collect();
        backups.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        for (_, stale) in backups.iter().skip(self.max_backups) {
            if let Err(e) = fs::remove_file(stale) {
                tracing::debug!(path = %stale.display(), error = %e, "could not remove trace backup");
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for RotatingFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFile")
            .field("path", &self.path)
            .field("max_bytes", &self.max_bytes)
            .field("max_backups", &self.max_backups)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backups_in(dir: &Path, name: &str) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&format!("{name}.")))
            .count()
    }

    #[test]
    fn rotates_and_keeps_newest_backups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("erp-listing-otlp.json");
        let writer = RotatingFile::with_limits(&path, 10, 2);

        for i in 0..6 {
            writer.write_line(&format!("{{\"span\":{i:04}}}")).unwrap();
        }

        assert_eq!(backups_in(dir.path(), "erp-listing-otlp.json"), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"span\":0005}\n");
    }

    #[test]
    fn oversized_file_from_earlier_run_is_rotated_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("traces.json");
        fs::write(&path, "x".repeat(64)).unwrap();

        let writer = RotatingFile::with_limits(&path, 32, 3);
        writer.write_line("{}").unwrap();

        assert_eq!(backups_in(dir.path(), "traces.json"), 1);
        assert_eq!(fs::read_to_string(writer.path()).unwrap(), "{}\n");
    }
}
