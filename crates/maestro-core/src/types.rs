use maestro_types::Pid;

use crate::error::Error;

/// What a single-service operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Started(Pid),
    AlreadyRunning(Pid),
    Stopped { pid: Pid, escalated: bool },
    NotRunning,
    Restarted { previous: Option<Pid>, pid: Pid },
}

#[derive(Debug)]
pub struct ServiceReport {
    pub service: String,
    pub result: Result<Action, Error>,
}

/// Per-service results of a command, in registry order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub reports: Vec<ServiceReport>,
}

impl BatchOutcome {
    #[must_use]
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.result.is_ok()).count()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.succeeded() == self.total()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.reports
            .iter()
            .filter_map(|r| r.result.as_ref().err().map(|err| (r.service.as_str(), err)))
    }

    pub(crate) fn push(&mut self, service: &str, result: Result<Action, Error>) {
        self.reports.push(ServiceReport {
            service: service.to_owned(),
            result,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceUsage {
    pub cpu_percent: f32,
    pub memory_bytes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceState {
    pub name: String,
    pub pid: Pid,
    /// Best effort; `None` when the figures could not be read.
    pub usage: Option<ResourceUsage>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusReport {
    pub running: Vec<ServiceState>,
    pub stopped: Vec<String>,
    /// Live records for names that are no longer registered.
    pub unmanaged: Vec<(String, Pid)>,
}

impl StatusReport {
    #[must_use]
    pub fn pid_of(&self, name: &str) -> Option<Pid> {
        self.running.iter().find(|s| s.name == name).map(|s| s.pid)
    }
}
