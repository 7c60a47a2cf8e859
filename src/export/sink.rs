//! Output sinks: plain writers and an atomic tmp→rename file.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A writer that can be finalized once all output has been written.
pub trait Sink: Write {
    /// Makes everything written so far durable at its final location.
    fn commit(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl Sink for Vec<u8> {}

impl Sink for File {
    fn commit(&mut self) -> io::Result<()> {
        self.flush()?;
        self.sync_all()
    }
}

/// File written under a temporary name and renamed onto its final path on commit.
pub struct AtomicFile {
    file: File,
    tmp_path: PathBuf,
    final_path: PathBuf,
}

impl std::fmt::Debug for AtomicFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomicFile").field("final_path", &self.final_path).finish_non_exhaustive()
    }
}

impl AtomicFile {
    /// Creates `<path>.tmp`, replacing a stale one left by an earlier run.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let final_path = path.as_ref().to_path_buf();
        let tmp_path = tmp_path_for(&final_path);

        if tmp_path.exists() {
            warn!("Removing stale tmp file: {}", tmp_path.display());
            fs::remove_file(&tmp_path)?;
        }

        let file = File::create(&tmp_path)?;
        debug!("Writing {} via {}", final_path.display(), tmp_path.display());

        Ok(Self { file, tmp_path, final_path })
    }

    /// Path the data is written to until commit.
    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Sink for AtomicFile {
    fn commit(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        fs::rename(&self.tmp_path, &self.final_path)
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_tmp_path_for() {
        assert_eq!(tmp_path_for(Path::new("out/acme.json")), PathBuf::from("out/acme.json.tmp"));
    }

    #[test]
    fn test_atomic_file_renames_on_commit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("acme.json");

        let mut sink = AtomicFile::create(&path).unwrap();
        sink.write_all(b"[]").unwrap();

        assert!(!path.exists());
        assert!(sink.tmp_path().exists());

        sink.commit().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
        assert!(!dir.path().join("acme.json.tmp").exists());
    }

    #[test]
    fn test_atomic_file_replaces_stale_tmp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("acme.json");
        fs::write(dir.path().join("acme.json.tmp"), "stale data").unwrap();

        let mut sink = AtomicFile::create(&path).unwrap();
        sink.write_all(b"{}").unwrap();
        sink.commit().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_uncommitted_file_leaves_final_path_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("acme.json");
        fs::write(&path, "previous").unwrap();

        {
            let mut sink = AtomicFile::create(&path).unwrap();
            sink.write_all(b"partial").unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");
    }
}
