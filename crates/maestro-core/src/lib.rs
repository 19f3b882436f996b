mod error;
mod liveness;
mod process_manager;
mod store;
mod supervisor;
mod types;
mod usage;

pub use error::{Error, ExitReason, Result};
pub use liveness::{Liveness, UnixLiveness};
pub use maestro_types::{Pid, Signal};
pub use process_manager::{CommandSpec, Delivery, ProcId, ProcessManager, Spawned, UnixProcessManager};
pub use store::{PidMap, PidStore, StoreLock};
pub use supervisor::{CommandOutcome, Supervisor, SupervisorCommand, Target};
pub use types::{Action, BatchOutcome, ResourceUsage, ServiceReport, ServiceState, StatusReport};
