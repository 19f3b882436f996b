use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use maestro_types::{Pid, Signal};

use crate::{
    error::{ExitReason, Result},
    liveness::Liveness,
    process_manager::{CommandSpec, Delivery, ProcId, ProcessManager, Spawned},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Spawn(String),
    Signal(Pid, Signal),
}

#[derive(Debug, Default)]
pub struct MockState {
    next_pid: u32,
    pub alive: HashSet<Pid>,
    pub spawned: Vec<CommandSpec>,
    pub events: Vec<MockEvent>,
    /// Services that die right after being spawned, with their stderr.
    pub crash_on_start: HashMap<String, String>,
    /// Pids that swallow every signal except `SIGKILL` and `SIGTERM`.
    pub ignore_graceful: HashSet<Pid>,
    /// Pids owned by another user.
    pub foreign: HashSet<Pid>,
    /// Pids that exit between the liveness probe and the signal, failing
    /// delivery with `ESRCH`.
    pub vanishing: HashSet<Pid>,
    crashed: HashSet<u64>,
}

/// In-memory process table. Clones share state, so one clone can act as
/// the process manager and another as the liveness probe.
#[derive(Debug, Clone, Default)]
pub struct MockProcessManager {
    state: Arc<Mutex<MockState>>,
}

impl MockProcessManager {
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn kill_externally(&self, pid: Pid) {
        self.state().alive.remove(&pid);
    }

    pub fn signals(&self) -> Vec<(Pid, Signal)> {
        self.state()
            .events
            .iter()
            .filter_map(|event| match event {
                MockEvent::Signal(pid, signal) => Some((*pid, *signal)),
                MockEvent::Spawn(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl ProcessManager for MockProcessManager {
    async fn spawn(&mut self, spec: CommandSpec) -> Result<Spawned> {
        let mut state = self.state();
        state.next_pid += 1;
        let pid = Pid::try_from(1000 + state.next_pid).unwrap();
        let id = ProcId(u64::from(state.next_pid));

        if let Some(stderr) = state.crash_on_start.get(&spec.name).cloned() {
            if let Some(parent) = spec.log_file.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&spec.log_file, stderr)?;
            state.crashed.insert(id.0);
        } else {
            state.alive.insert(pid);
        }
        state.events.push(MockEvent::Spawn(spec.name.clone()));
        state.spawned.push(spec);

        Ok(Spawned { id, pid })
    }

    async fn wait(&mut self, id: ProcId, _d: Duration) -> Result<Option<ExitReason>> {
        let state = self.state();
        Ok(state.crashed.contains(&id.0).then_some(ExitReason::Code(1)))
    }

    fn release(&mut self, _id: ProcId) {}

    async fn signal(&mut self, pid: Pid, signal: Signal) -> std::io::Result<Delivery> {
        let mut state = self.state();
        if !state.alive.contains(&pid) {
            return Ok(Delivery::AlreadyExited);
        }
        if state.vanishing.remove(&pid) {
            state.alive.remove(&pid);
            return Err(std::io::Error::from_raw_os_error(libc::ESRCH));
        }
        if state.foreign.contains(&pid) {
            return Err(std::io::Error::from_raw_os_error(libc::EPERM));
        }
        state.events.push(MockEvent::Signal(pid, signal));
        let ignored = state.ignore_graceful.contains(&pid)
            && !matches!(signal, Signal::Term | Signal::Kill);
        if !ignored {
            state.alive.remove(&pid);
        }
        Ok(Delivery::Delivered)
    }
}

impl Liveness for MockProcessManager {
    fn is_alive(&self, pid: Pid) -> bool {
        self.state().alive.contains(&pid)
    }
}
