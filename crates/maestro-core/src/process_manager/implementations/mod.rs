#[cfg(test)]
mod mock;
#[cfg(unix)]
mod unix;

#[cfg(test)]
pub use mock::{MockEvent, MockProcessManager};
#[cfg(unix)]
pub use unix::UnixProcessManager;
