use std::{
    fs::{File, OpenOptions},
    os::fd::AsRawFd,
    path::{Path, PathBuf},
    time::Duration,
};

use tokio::time::{sleep, Instant};

use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Exclusive advisory lock over the pid store.
///
/// Held for a whole load/modify/save cycle so that overlapping invocations
/// cannot lose each other's updates. Released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    pub(crate) async fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let start = Instant::now();
        loop {
            #[allow(unsafe_code)]
            let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
            if rc == 0 {
                tracing::trace!("acquired store lock {}", path.display());
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            let err = std::io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EWOULDBLOCK | libc::EINTR) => {}
                _ => return Err(Error::IOError(err)),
            }

            let waited = start.elapsed();
            if waited >= timeout {
                return Err(Error::StoreLocked {
                    path: path.to_path_buf(),
                    waited,
                });
            }
            tracing::debug!("store lock {} is busy, retrying", path.display());
            sleep(POLL_INTERVAL).await;
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        #[allow(unsafe_code)]
        unsafe {
            libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
        }
        tracing::trace!("released store lock {}", self.path.display());
    }
}
