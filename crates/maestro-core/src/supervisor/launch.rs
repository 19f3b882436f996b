use std::path::Path;

use maestro_types::Pid;

use crate::{
    error::{Error, Result},
    liveness::Liveness,
    process_manager::{CommandSpec, ProcessManager},
    supervisor::Supervisor,
    types::Action,
};

/// Outcome of a start, before it is folded into an [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Launched {
    Started(Pid),
    AlreadyRunning(Pid),
}

impl Launched {
    pub(super) fn pid(self) -> Pid {
        match self {
            Launched::Started(pid) | Launched::AlreadyRunning(pid) => pid,
        }
    }
}

impl From<Launched> for Action {
    fn from(launched: Launched) -> Self {
        match launched {
            Launched::Started(pid) => Action::Started(pid),
            Launched::AlreadyRunning(pid) => Action::AlreadyRunning(pid),
        }
    }
}

/// Lines of stderr kept when a service dies during startup.
const DIAGNOSTIC_LINES: usize = 20;

impl<P: ProcessManager, L: Liveness> Supervisor<P, L> {
    /// Start `name` unless it is already running.
    ///
    /// The service must survive the start grace window to be recorded.
    ///
    /// # Errors
    /// `Error::Configuration` for an unknown service or missing executable,
    /// `Error::TransientStartFailure` if the process died right away.
    pub async fn start(&mut self, name: &str) -> Result<Action> {
        self.launch(name).await.map(Action::from)
    }

    #[tracing::instrument(skip(self))]
    pub(super) async fn launch(&mut self, name: &str) -> Result<Launched> {
        let service = self.registry.resolve(name)?.clone();

        let _lock = self.store.lock().await?;
        let mut pids = self.store.cleanup_stale(self.store.load(), &self.liveness)?;

        if let Some(&pid) = pids.get(name) {
            tracing::info!("{name} already running (pid {pid})");
            return Ok(Launched::AlreadyRunning(pid));
        }

        let log_file = self.log_file(name);
        let spawned = self
            .process_manager
            .spawn(CommandSpec::for_service(&service, log_file.clone()))
            .await?;

        if let Some(reason) = self
            .process_manager
            .wait(spawned.id, self.settings.start_grace)
            .await?
        {
            tracing::error!("{name} (pid {}) exited during startup: {reason}", spawned.pid);
            return Err(Error::TransientStartFailure {
                service: name.to_owned(),
                reason,
                diagnostics: read_diagnostics(&log_file),
            });
        }
        self.process_manager.release(spawned.id);

        pids.insert(name.to_owned(), spawned.pid);
        self.store.save(&pids)?;

        tracing::info!("{name} started (pid {})", spawned.pid);
        Ok(Launched::Started(spawned.pid))
    }
}

fn read_diagnostics(log_file: &Path) -> String {
    let Ok(bytes) = std::fs::read(log_file) else {
        return String::new();
    };
    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.trim().lines().collect();
    lines[lines.len().saturating_sub(DIAGNOSTIC_LINES)..].join("\n")
}
