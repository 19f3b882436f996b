mod commands;
mod launch;
mod main;
mod signal;


pub use commands::{CommandOutcome, SupervisorCommand, Target};
pub use main::Supervisor;
