//! Durable mapping from service name to the PID believed to be running it.
//!
//! The whole map is read and written on every controller invocation. Writers
//! hold [`StoreLock`] across the read-modify-write cycle and replace the file
//! through an atomic rename, so a concurrent reader sees either the old or the
//! new content, never a torn write.
//!
//! A missing or unparsable file is treated as an empty store. Processes that
//! were tracked in a corrupted file keep running but become invisible to the
//! supervisor.

mod lock;

use std::{
    collections::BTreeMap,
    ffi::OsString,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use maestro_types::Pid;

use crate::{error::Result, liveness::Liveness};

pub use lock::StoreLock;

pub type PidMap = BTreeMap<String, Pid>;

#[derive(Debug, Clone)]
pub struct PidStore {
    path: PathBuf,
    lock_timeout: Duration,
}

impl PidStore {
    #[must_use]
    pub fn new(path: PathBuf, lock_timeout: Duration) -> Self {
        Self { path, lock_timeout }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        sibling(&self.path, ".lock")
    }

    /// Take the store lock, waiting at most the configured timeout.
    ///
    /// # Errors
    /// Returns `Error::StoreLocked` if another invocation keeps holding it.
    pub async fn lock(&self) -> Result<StoreLock> {
        StoreLock::acquire(&self.lock_path(), self.lock_timeout).await
    }

    /// Read the store. Never fails: a missing file is an empty store, a
    /// corrupted one is logged and treated as empty.
    #[must_use]
    pub fn load(&self) -> PidMap {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("pid store {} does not exist yet", self.path.display());
                return PidMap::new();
            }
            Err(err) => {
                tracing::warn!(
                    "cannot read pid store {}, starting fresh: {err}",
                    self.path.display()
                );
                return PidMap::new();
            }
        };

        match serde_json::from_slice::<PidMap>(&bytes) {
            Ok(pids) => pids,
            Err(err) => {
                tracing::warn!(
                    "corrupted pid store {}, starting fresh: {err}",
                    self.path.display()
                );
                PidMap::new()
            }
        }
    }

    /// Replace the store content with `pids`.
    ///
    /// # Errors
    /// Returns an error if the temporary file cannot be written or renamed.
    pub fn save(&self, pids: &PidMap) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(pids)?;
        let tmp = sibling(&self.path, &format!(".tmp.{}", std::process::id()));
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&json)?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        if let Err(err) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }

        tracing::trace!("saved {} pid record(s) to {}", pids.len(), self.path.display());
        Ok(())
    }

    /// Drop records whose process is gone. Writes the store only when at
    /// least one record was removed.
    ///
    /// # Errors
    /// Returns an error if the cleaned map cannot be persisted.
    pub fn cleanup_stale<L: Liveness + ?Sized>(&self, mut pids: PidMap, liveness: &L) -> Result<PidMap> {
        let stale: Vec<String> = pids
            .iter()
            .filter(|(_, pid)| !liveness.is_alive(**pid))
            .map(|(name, _)| name.clone())
            .collect();

        if stale.is_empty() {
            return Ok(pids);
        }

        for name in &stale {
            if let Some(pid) = pids.remove(name) {
                tracing::info!("cleaning up stale pid {pid} for {name}");
            }
        }
        self.save(&pids)?;

        Ok(pids)
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("pids"), ToOwned::to_owned);
    name.push(suffix);
    path.with_file_name(name)
}
