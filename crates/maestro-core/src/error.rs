use std::{fmt, path::PathBuf, time::Duration};

use maestro_config::ConfigError;
use maestro_types::{Pid, Signal};

pub type Result<R, E = Error> = std::result::Result<R, E>;

/// How a process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Code(i32),
    Signal(i32),
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Code(code) => write!(f, "exit code {code}"),
            ExitReason::Signal(signal) => write!(f, "signal {signal}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("service `{service}` exited during startup ({reason}){}", format_diagnostics(diagnostics))]
    TransientStartFailure {
        service: String,
        reason: ExitReason,
        diagnostics: String,
    },

    #[error("cannot spawn service `{service}`: {source}")]
    Spawn {
        service: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot deliver {signal} to service `{service}` (pid {pid}): {source}")]
    SignalDelivery {
        service: String,
        pid: Pid,
        signal: Signal,
        #[source]
        source: std::io::Error,
    },

    #[error("pid store {} is locked by another invocation (waited {waited:?})", path.display())]
    StoreLocked { path: PathBuf, waited: Duration },

    #[error("cannot encode pid store: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("io error: {0}")]
    IOError(#[from] std::io::Error),
}

impl Error {
    /// Errors raised before anything was touched, which abort a command.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}

fn format_diagnostics(diagnostics: &str) -> String {
    if diagnostics.is_empty() {
        String::new()
    } else {
        format!(": {diagnostics}")
    }
}
