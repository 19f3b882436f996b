use std::{collections::HashMap, fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

/// Operating system process identifier of a managed service.
///
/// Always positive and representable as a `pid_t`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Pid(u32);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid pid {0}: must be in 1..=2147483647")]
pub struct InvalidPid(pub u32);

impl Pid {
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn as_raw(self) -> i32 {
        // Checked against i32::MAX on construction.
        self.0 as i32
    }
}

impl TryFrom<u32> for Pid {
    type Error = InvalidPid;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 || i32::try_from(value).is_err() {
            return Err(InvalidPid(value));
        }
        Ok(Pid(value))
    }
}

impl From<Pid> for u32 {
    fn from(pid: Pid) -> Self {
        pid.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Termination request that can be delivered to a managed service.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Signal {
    Hup,
    Int,
    Quit,
    Term,
    Kill,
    Usr1,
    Usr2,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown signal name `{0}`")]
pub struct UnknownSignal(pub String);

impl FromStr for Signal {
    type Err = UnknownSignal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        let raw = normalized.strip_prefix("SIG").unwrap_or(&normalized);
        match raw {
            "HUP" => Ok(Signal::Hup),
            "INT" => Ok(Signal::Int),
            "QUIT" => Ok(Signal::Quit),
            "TERM" => Ok(Signal::Term),
            "KILL" => Ok(Signal::Kill),
            "USR1" => Ok(Signal::Usr1),
            "USR2" => Ok(Signal::Usr2),
            _ => Err(UnknownSignal(s.to_owned())),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Signal::Hup => "SIGHUP",
            Signal::Int => "SIGINT",
            Signal::Quit => "SIGQUIT",
            Signal::Term => "SIGTERM",
            Signal::Kill => "SIGKILL",
            Signal::Usr1 => "SIGUSR1",
            Signal::Usr2 => "SIGUSR2",
        };
        f.write_str(name)
    }
}

/// A registered service: a unique name and the executable that runs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: String,
    pub path: PathBuf,
    pub interpreter: Option<String>,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
}

impl ServiceDescriptor {
    /// Program and arguments used to launch the service.
    #[must_use]
    pub fn command_line(&self) -> Vec<String> {
        let mut cmd = Vec::with_capacity(self.args.len() + 2);
        if let Some(interpreter) = &self.interpreter {
            cmd.push(interpreter.clone());
        }
        cmd.push(self.path.to_string_lossy().into_owned());
        cmd.extend(self.args.iter().cloned());
        cmd
    }
}
