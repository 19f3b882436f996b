use std::path::PathBuf;

use maestro_types::{Pid, ServiceDescriptor};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub cmd: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    /// File receiving the service's stderr; truncated on every spawn.
    pub log_file: PathBuf,
}

impl CommandSpec {
    #[must_use]
    pub fn for_service(service: &ServiceDescriptor, log_file: PathBuf) -> Self {
        let mut env: Vec<_> = service
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        env.sort();

        Self {
            name: service.name.clone(),
            cmd: service.command_line(),
            cwd: service.cwd.clone(),
            env,
            log_file,
        }
    }
}

/// Index of a process spawned by the current invocation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ProcId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawned {
    pub id: ProcId,
    pub pid: Pid,
}

/// Result of delivering a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Nothing left to signal.
    AlreadyExited,
}
