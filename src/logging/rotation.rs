//! Size-based log file rotation
//!
//! `ha.log` rolls to `ha.log.1`, `ha.log.1` to `ha.log.2` and so on; the
//! oldest backup beyond `backup_count` is overwritten.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Log file that rotates once it would grow past `max_bytes`
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    file: File,
    written: u64,
}

impl RotatingFile {
    /// Open (or create) `path` for appending
    ///
    /// A `max_bytes` of zero disables rotation.
    pub fn open(path: impl AsRef<Path>, max_bytes: u64, backup_count: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            path,
            max_bytes,
            backup_count,
            file,
            written,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self, n: usize) -> PathBuf {
        let mut name: OsString = self.path.as_os_str().to_owned();
        name.push(format!(".{}", n));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backup_count == 0 {
            self.file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.path)?;
        } else {
            for n in (1..self.backup_count).rev() {
                let from = self.backup_path(n);
                if from.exists() {
                    fs::rename(&from, self.backup_path(n + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
            self.file = open_append(&self.path)?;
        }

        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.max_bytes > 0 && self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rotates_and_caps_backups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ha.log");
        let mut file = RotatingFile::open(&path, 10, 2).unwrap();

        file.write_all(b"first----\n").unwrap();
        file.write_all(b"second---\n").unwrap();
        file.write_all(b"third----\n").unwrap();
        file.write_all(b"fourth---\n").unwrap();
        file.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "fourth---\n");
        assert_eq!(fs::read_to_string(dir.path().join("ha.log.1")).unwrap(), "third----\n");
        assert_eq!(fs::read_to_string(dir.path().join("ha.log.2")).unwrap(), "second---\n");
        assert!(!dir.path().join("ha.log.3").exists());
    }

    #[test]
    fn test_zero_backups_truncates_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ha.log");
        let mut file = RotatingFile::open(&path, 8, 0).unwrap();

        file.write_all(b"1234567\n").unwrap();
        file.write_all(b"abc\n").unwrap();
        file.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "abc\n");
        assert!(!dir.path().join("ha.log.1").exists());
    }

    #[test]
    fn test_reopen_counts_existing_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ha.log");
        fs::write(&path, b"existing\n").unwrap();

        let mut file = RotatingFile::open(&path, 12, 1).unwrap();
        assert_eq!(file.path(), path.as_path());
        file.write_all(b"more\n").unwrap();
        file.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "more\n");
        assert_eq!(fs::read_to_string(dir.path().join("ha.log.1")).unwrap(), "existing\n");
    }
}
