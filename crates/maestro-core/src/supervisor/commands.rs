use std::fmt;

use maestro_config::ALL_TARGET;
use maestro_types::Pid;
use tokio::time::sleep;

use crate::{
    error::Result,
    liveness::Liveness,
    process_manager::ProcessManager,
    supervisor::Supervisor,
    types::{Action, BatchOutcome, ServiceState, StatusReport},
    usage,
};

/// One service or every registered service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    All,
    Service(String),
}

impl Target {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case(ALL_TARGET) {
            Target::All
        } else {
            Target::Service(raw.to_owned())
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::All => f.write_str(ALL_TARGET),
            Target::Service(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorCommand {
    Start(Target),
    Stop(Target),
    Restart(Target),
    /// Restart using the graceful stop variant.
    Graceful(Target),
    Status,
}

#[derive(Debug)]
pub enum CommandOutcome {
    Batch(BatchOutcome),
    Status(StatusReport),
}

impl CommandOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            CommandOutcome::Batch(batch) => batch.is_success(),
            CommandOutcome::Status(_) => true,
        }
    }
}

impl<P: ProcessManager, L: Liveness> Supervisor<P, L> {
    /// Run a command.
    ///
    /// # Errors
    /// Only configuration errors for a single named target are returned
    /// directly; every other failure is reported per service.
    pub async fn execute(&mut self, command: SupervisorCommand) -> Result<CommandOutcome> {
        tracing::debug!("executing {command:?}");

        let batch = match command {
            SupervisorCommand::Status => return Ok(CommandOutcome::Status(self.status().await?)),
            SupervisorCommand::Start(Target::All) => self.start_all().await,
            SupervisorCommand::Stop(Target::All) => self.stop_all(false).await,
            SupervisorCommand::Restart(Target::All) => self.restart_all(false).await,
            SupervisorCommand::Graceful(Target::All) => self.restart_all(true).await,
            SupervisorCommand::Start(Target::Service(name)) => {
                let result = self.start(&name).await;
                single(&name, result)?
            }
            SupervisorCommand::Stop(Target::Service(name)) => {
                let result = self.stop(&name, false).await;
                single(&name, result)?
            }
            SupervisorCommand::Restart(Target::Service(name)) => {
                let result = self.restart(&name, false).await;
                single(&name, result)?
            }
            SupervisorCommand::Graceful(Target::Service(name)) => {
                let result = self.restart(&name, true).await;
                single(&name, result)?
            }
        };

        Ok(CommandOutcome::Batch(batch))
    }

    pub async fn start_all(&mut self) -> BatchOutcome {
        let names = self.service_names();
        tracing::info!("starting all services: {}", names.join(", "));

        let mut outcome = BatchOutcome::default();
        for name in &names {
            let result = self.start(name).await;
            outcome.push(name, result);
        }
        tracing::info!("started {}/{} services", outcome.succeeded(), outcome.total());
        outcome
    }

    pub async fn stop_all(&mut self, graceful: bool) -> BatchOutcome {
        let names = self.service_names();
        tracing::info!("stopping all services: {}", names.join(", "));

        let mut outcome = BatchOutcome::default();
        for name in &names {
            let result = self.stop(name, graceful).await;
            outcome.push(name, result);
        }
        tracing::info!("stopped {}/{} services", outcome.succeeded(), outcome.total());
        outcome
    }

    /// Stop, pause, start.
    ///
    /// # Errors
    /// Fails without stopping anything if the service cannot be resolved,
    /// and without starting anything if the stop failed.
    pub async fn restart(&mut self, name: &str, graceful: bool) -> Result<Action> {
        self.registry.resolve(name)?;

        let previous = stopped_pid(self.stop(name, graceful).await?);
        sleep(self.settings.restart_pause).await;
        let pid = self.launch(name).await?.pid();

        Ok(Action::Restarted { previous, pid })
    }

    /// Stop every service, pause once, then start every service.
    ///
    /// Services that cannot be resolved are reported and left untouched.
    /// Services whose stop failed are not started again.
    pub async fn restart_all(&mut self, graceful: bool) -> BatchOutcome {
        let names = self.service_names();
        tracing::info!("restarting all services: {}", names.join(", "));

        let mut stopped = Vec::with_capacity(names.len());
        for name in names {
            let resolved = self.registry.resolve(&name).map(|_| ());
            let result = match resolved {
                Ok(()) => self.stop(&name, graceful).await,
                Err(err) => {
                    tracing::error!("not restarting {name}: {err}");
                    Err(err.into())
                }
            };
            stopped.push((name, result));
        }
        sleep(self.settings.restart_all_pause).await;

        let mut outcome = BatchOutcome::default();
        for (name, result) in stopped {
            let result = match result {
                Ok(action) => {
                    let previous = stopped_pid(action);
                    self.launch(&name)
                        .await
                        .map(|launched| Action::Restarted {
                            previous,
                            pid: launched.pid(),
                        })
                }
                Err(err) => Err(err),
            };
            outcome.push(&name, result);
        }
        tracing::info!("restarted {}/{} services", outcome.succeeded(), outcome.total());
        outcome
    }

    /// Report which registered services are running, reconciling stale
    /// records first.
    ///
    /// # Errors
    /// Fails only if the store cannot be locked or the cleaned store cannot
    /// be written.
    #[tracing::instrument(skip(self))]
    pub async fn status(&self) -> Result<StatusReport> {
        let pids = {
            let _lock = self.store.lock().await?;
            self.store.cleanup_stale(self.store.load(), &self.liveness)?
        };

        let mut report = StatusReport::default();
        for name in self.registry.names() {
            match pids.get(name) {
                Some(&pid) => report.running.push(ServiceState {
                    name: name.to_owned(),
                    pid,
                    usage: None,
                }),
                None => report.stopped.push(name.to_owned()),
            }
        }
        report.unmanaged = pids
            .iter()
            .filter(|(name, _)| !self.registry.exists(name))
            .map(|(name, pid)| (name.clone(), *pid))
            .collect();

        let tracked: Vec<_> = report.running.iter().map(|s| s.pid).collect();
        let usage = usage::sample(&tracked).await;
        for service in &mut report.running {
            service.usage = usage.get(&service.pid).copied();
        }

        Ok(report)
    }

    fn service_names(&self) -> Vec<String> {
        self.registry.names().map(ToOwned::to_owned).collect()
    }
}

fn single(name: &str, result: Result<Action>) -> Result<BatchOutcome> {
    match result {
        Err(err) if err.is_configuration() => Err(err),
        result => {
            let mut outcome = BatchOutcome::default();
            outcome.push(name, result);
            Ok(outcome)
        }
    }
}

fn stopped_pid(action: Action) -> Option<Pid> {
    match action {
        Action::Stopped { pid, .. } => Some(pid),
        _ => None,
    }
}
