use std::{path::PathBuf, time::Duration};

use maestro_config::{Config, Registry, Settings};
use maestro_types::Pid;
use tokio::time::{sleep, Instant};

use crate::{liveness::Liveness, process_manager::ProcessManager, store::PidStore};

const LIVENESS_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Controls the registered services of one configuration.
///
/// Every operation is a short critical section over the pid store: lock,
/// load, drop stale records, act, save. Nothing is kept between calls except
/// what is written to the store.
#[derive(Debug)]
pub struct Supervisor<P: ProcessManager, L: Liveness> {
    pub(super) registry: Registry,
    pub(super) settings: Settings,
    pub(super) store: PidStore,
    pub(super) process_manager: P,
    pub(super) liveness: L,
}

impl<P: ProcessManager, L: Liveness> Supervisor<P, L> {
    pub fn new(config: Config, process_manager: P, liveness: L) -> Self {
        Self::from_parts(config.registry, config.settings, process_manager, liveness)
    }

    pub fn from_parts(registry: Registry, settings: Settings, process_manager: P, liveness: L) -> Self {
        let store = PidStore::new(settings.state_file.clone(), settings.lock_timeout);
        Self {
            registry,
            settings,
            store,
            process_manager,
            liveness,
        }
    }

    #[must_use]
    pub fn store(&self) -> &PidStore {
        &self.store
    }

    /// File collecting the stderr of the most recent run of `service`.
    #[must_use]
    pub fn log_file(&self, service: &str) -> PathBuf {
        self.settings.log_dir.join(format!("{service}.log"))
    }

    /// Poll until `pid` is gone. Returns `false` if it is still alive after `timeout`.
    pub(super) async fn wait_for_exit(&self, pid: Pid, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            if !self.liveness.is_alive(pid) {
                return true;
            }
            if start.elapsed() >= timeout {
                return false;
            }
            sleep(LIVENESS_POLL_INTERVAL).await;
        }
    }
}
