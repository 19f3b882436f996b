use std::time::Duration;

use maestro_types::{Pid, Signal};

use crate::{
    error::{ExitReason, Result},
    process_manager::types::{CommandSpec, Delivery, ProcId, Spawned},
};

#[async_trait::async_trait]
pub trait ProcessManager: Send + Sync {
    /// Spawn a detached service process.
    async fn spawn(&mut self, spec: CommandSpec) -> Result<Spawned>;
    /// Wait for a process spawned by this manager to exit.
    async fn wait(&mut self, id: ProcId, d: Duration) -> Result<Option<ExitReason>>;
    /// Forget a spawned process, leaving it running on its own.
    fn release(&mut self, id: ProcId);
    /// Deliver a signal to a service process, spawned by any invocation.
    async fn signal(&mut self, pid: Pid, signal: Signal) -> std::io::Result<Delivery>;
}
