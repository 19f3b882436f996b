use maestro_types::Pid;

/// Answers whether a PID currently refers to a live process.
pub trait Liveness: Send + Sync {
    fn is_alive(&self, pid: Pid) -> bool;
}

/// Null-signal probe.
///
/// A process we are not allowed to signal still exists, so `EPERM` counts
/// as alive. Zombies are reported dead: they hold a PID but will never run
/// again.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixLiveness;

impl UnixLiveness {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Liveness for UnixLiveness {
    fn is_alive(&self, pid: Pid) -> bool {
        #[allow(unsafe_code)]
        let rc = unsafe { libc::kill(pid.as_raw(), 0) };
        if rc == 0 {
            return !is_zombie(pid);
        }

        match std::io::Error::last_os_error().raw_os_error() {
            Some(libc::EPERM) => true,
            Some(libc::ESRCH) => false,
            errno => {
                tracing::debug!("liveness probe of pid {pid} failed with errno {errno:?}");
                false
            }
        }
    }
}

#[cfg(target_os = "linux")]
fn is_zombie(pid: Pid) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // Format: `pid (comm) state ...`; comm may itself contain parentheses.
    stat.rfind(')')
        .and_then(|idx| stat[idx + 1..].trim_start().chars().next())
        .is_some_and(|state| state == 'Z')
}

#[cfg(not(target_os = "linux"))]
fn is_zombie(_pid: Pid) -> bool {
    false
}
