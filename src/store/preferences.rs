/// Preference store
///
/// Owns the single persisted `Preferences` record. Every mutation is one
/// read-modify-write cycle under an exclusive lock, and the record is only
/// ever replaced by renaming a fully written temp file over it.

use crate::config::Config;
use crate::error::{FluxError, Result};
use crate::store::Preferences;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Give up on a contended lock after this long
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause between lock attempts
const LOCK_RETRY: Duration = Duration::from_millis(20);

/// How the record looked when it was read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordState {
    Missing,
    Valid,
    Corrupt,
}

struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Handle to the persisted preferences record
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// Create a store backed by `path`
    ///
    /// Nothing is created until the first mutation.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store at the configured user-scoped location
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.preferences_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current preferences
    ///
    /// A missing or malformed record reads as the empty default.
    pub fn list(&self) -> Preferences {
        self.load().0
    }

    /// Hide a recommendation id for good
    pub fn dismiss(&self, id: &str) -> Result<Preferences> {
        let id = validate_id(id)?;
        self.update(|prefs| {
            prefs.dismiss(id);
        })
    }

    /// Show a previously dismissed id again
    pub fn undismiss(&self, id: &str) -> Result<Preferences> {
        let id = validate_id(id)?;
        self.update(|prefs| {
            prefs.undismiss(id);
        })
    }

    /// Record that the user uses `to` instead of `from`
    pub fn alternative(&self, from: &str, to: &str) -> Result<Preferences> {
        let from = validate_id(from)?;
        let to = validate_id(to)?;
        self.update(|prefs| prefs.set_alternative(from, to))
    }

    /// Drop every dismissal and alternative
    pub fn clear(&self) -> Result<Preferences> {
        self.update(Preferences::clear)
    }

    fn load(&self) -> (Preferences, RecordState) {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return (Preferences::default(), RecordState::Missing);
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "preferences unreadable, using defaults");
                return (Preferences::default(), RecordState::Corrupt);
            }
        };

        match serde_json::from_str(&content) {
            Ok(prefs) => (prefs, RecordState::Valid),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "preferences malformed, using defaults");
                (Preferences::default(), RecordState::Corrupt)
            }
        }
    }

    /// Locked read-modify-write
    ///
    /// Unchanged valid state is not rewritten; a corrupt record is always
    /// replaced.
    fn update<F>(&self, mutate: F) -> Result<Preferences>
    where
        F: FnOnce(&mut Preferences),
    {
        let _lock = self.lock()?;

        let (current, state) = self.load();
        let mut next = current.clone();
        mutate(&mut next);

        if next != current || state == RecordState::Corrupt {
            self.write_atomic(&next)?;
            debug!(path = %self.path.display(), "preferences saved");
        }

        Ok(next)
    }

    fn write_atomic(&self, prefs: &Preferences) -> Result<()> {
        let wrap = |source: std::io::Error| FluxError::StoreWrite {
            path: self.path.clone(),
            source,
        };

        let dir = self.parent_dir();
        fs::create_dir_all(dir).map_err(wrap)?;

        let mut content = serde_json::to_string_pretty(prefs)?;
        content.push('\n');

        // Same directory so the final rename never crosses filesystems
        let mut tmp = NamedTempFile::new_in(dir).map_err(wrap)?;
        tmp.write_all(content.as_bytes()).map_err(wrap)?;
        tmp.as_file().sync_all().map_err(wrap)?;
        tmp.persist(&self.path).map_err(|e| wrap(e.error))?;

        Ok(())
    }

    fn lock(&self) -> Result<StoreLock> {
        let wrap = |source: std::io::Error| FluxError::StoreWrite {
            path: self.path.clone(),
            source,
        };

        fs::create_dir_all(self.parent_dir()).map_err(wrap)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(wrap)?;

        let contended = fs2::lock_contended_error().raw_os_error();
        let start = Instant::now();
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(StoreLock { file }),
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.raw_os_error() == contended => {
                    if start.elapsed() >= LOCK_TIMEOUT {
                        return Err(FluxError::StoreLock(format!(
                            "timed out after {}s waiting for {}",
                            LOCK_TIMEOUT.as_secs(),
                            self.lock_path().display()
                        )));
                    }
                    std::thread::sleep(LOCK_RETRY);
                }
                Err(e) => return Err(wrap(e)),
            }
        }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "preferences.json".into());
        name.push(".lock");
        self.path.with_file_name(name)
    }
}

fn validate_id(id: &str) -> Result<&str> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(FluxError::Usage(
            "identifier must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}
