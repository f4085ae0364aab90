//! Atomic TOML file operations.
//!
//! The configuration file is shared by several independent settings, so it is
//! handled as a raw [`toml::Table`]: each writer changes only its own keys and
//! every key it does not understand survives the rewrite.

use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use gsa_core::error::{GsaError, Result};
use toml::Table;

/// A handle to a TOML file written via tmp file + fsync + rename, with
/// read-modify-write cycles serialized by an exclusive lock file.
#[derive(Debug, Clone)]
pub struct AtomicTomlFile {
    path: PathBuf,
}

impl AtomicTomlFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file as a table.
    ///
    /// A missing or blank file is an empty table. A file that is not valid
    /// TOML is a `Serialization` error.
    pub fn load(&self) -> Result<Table> {
        if !self.path.exists() {
            return Ok(Table::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Table::new());
        }

        Ok(toml::from_str::<Table>(&content)?)
    }

    /// Writes `table` atomically, creating the parent directory if needed.
    pub fn save(&self, table: &Table) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(table)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Read-modify-write of the whole file under the lock.
    ///
    /// Nothing is written when `f` fails.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Table) -> Result<()>,
    {
        let _lock = FileLock::acquire(&self.path)?;
        let mut table = self.load()?;
        f(&mut table)?;
        self.save(&table)
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| GsaError::io("Path has no parent directory"))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| GsaError::io("Path has no file name"))?;

        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// Exclusive lock released when dropped.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| GsaError::io(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}
