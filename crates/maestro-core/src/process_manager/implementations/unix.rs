use std::{os::unix::process::ExitStatusExt, process::Stdio, time::Duration};

use libc::{kill, killpg, setsid};
use maestro_types::{Pid, Signal};
use tokio::{
    process::{Child, Command},
    time::{sleep, Instant},
};

use crate::{
    error::{Error, ExitReason, Result},
    process_manager::{
        base::ProcessManager,
        types::{CommandSpec, Delivery, ProcId, Spawned},
    },
};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug)]
struct ChildRec {
    child: Child,
    name: String,
}

/// Unix-specific process manager.
///
/// Services are started in their own session so they outlive the controller
/// and can be signalled as a process group.
#[derive(Debug)]
pub struct UnixProcessManager {
    processes: Vec<Option<ChildRec>>,
}

impl Default for UnixProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UnixProcessManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
        }
    }

    fn index(id: ProcId) -> Result<usize> {
        usize::try_from(id.0).map_err(|_| {
            Error::IOError(std::io::Error::other("Cannot convert process id to usize"))
        })
    }
}

fn signal_number(signal: Signal) -> libc::c_int {
    match signal {
        Signal::Hup => libc::SIGHUP,
        Signal::Int => libc::SIGINT,
        Signal::Quit => libc::SIGQUIT,
        Signal::Term => libc::SIGTERM,
        Signal::Kill => libc::SIGKILL,
        Signal::Usr1 => libc::SIGUSR1,
        Signal::Usr2 => libc::SIGUSR2,
    }
}

#[async_trait::async_trait]
impl ProcessManager for UnixProcessManager {
    async fn spawn(&mut self, spec: CommandSpec) -> Result<Spawned> {
        let spawn_error = |source: std::io::Error| Error::Spawn {
            service: spec.name.clone(),
            source,
        };

        let Some((program, args)) = spec.cmd.split_first() else {
            return Err(spawn_error(std::io::Error::other("empty command line")));
        };

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        for (k, v) in &spec.env {
            cmd.env(k, v);
        }

        #[allow(unsafe_code)]
        unsafe {
            cmd.pre_exec(|| {
                if setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        if let Some(parent) = spec.log_file.parent() {
            std::fs::create_dir_all(parent).map_err(spawn_error)?;
        }
        let log = std::fs::File::create(&spec.log_file).map_err(spawn_error)?;

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log));

        let child = cmd.spawn().map_err(spawn_error)?;

        let pid = child
            .id()
            .ok_or_else(|| spawn_error(std::io::Error::other("pid not available")))?;
        let pid = Pid::try_from(pid).map_err(|err| spawn_error(std::io::Error::other(err)))?;

        tracing::debug!("spawned {} as pid {pid}", spec.name);

        let id = ProcId(self.processes.len() as u64);
        self.processes.push(Some(ChildRec {
            child,
            name: spec.name,
        }));

        Ok(Spawned { id, pid })
    }

    async fn wait(&mut self, id: ProcId, d: Duration) -> Result<Option<ExitReason>> {
        let index = Self::index(id)?;
        let proc = self
            .processes
            .get_mut(index)
            .ok_or_else(|| Error::IOError(std::io::Error::other(format!("unknown process id {id:?}"))))?
            .as_mut()
            .ok_or_else(|| {
                Error::IOError(std::io::Error::other(format!("released process id {id:?}")))
            })?;

        let start = Instant::now();
        loop {
            if let Some(status) = proc.child.try_wait()? {
                tracing::debug!("{} exited with {status}", proc.name);
                self.processes[index] = None;
                let reason = status.code().map_or_else(
                    || ExitReason::Signal(status.signal().unwrap_or_default()),
                    ExitReason::Code,
                );
                return Ok(Some(reason));
            }

            if start.elapsed() >= d {
                return Ok(None);
            }
            sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    fn release(&mut self, id: ProcId) {
        let Ok(index) = Self::index(id) else {
            return;
        };
        if let Some(slot) = self.processes.get_mut(index) {
            // Dropping a tokio `Child` leaves the process running.
            if let Some(rec) = slot.take() {
                tracing::trace!("released {}", rec.name);
            }
        }
    }

    async fn signal(&mut self, pid: Pid, signal: Signal) -> std::io::Result<Delivery> {
        let signum = signal_number(signal);

        // Services lead their own process group; reach their children too.
        #[allow(unsafe_code)]
        let rc = unsafe { killpg(pid.as_raw(), signum) };
        if rc == 0 {
            return Ok(Delivery::Delivered);
        }
        let err = std::io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ESRCH | libc::EPERM) => {
                tracing::trace!("cannot signal process group {pid}: {err}, trying the pid");
            }
            _ => return Err(err),
        }

        #[allow(unsafe_code)]
        let rc = unsafe { kill(pid.as_raw(), signum) };
        if rc == 0 {
            return Ok(Delivery::Delivered);
        }
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            return Ok(Delivery::AlreadyExited);
        }
        Err(err)
    }
}
