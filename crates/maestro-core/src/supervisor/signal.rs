use maestro_types::{Pid, Signal};

use crate::{
    error::{Error, Result},
    liveness::Liveness,
    process_manager::{Delivery, ProcessManager},
    supervisor::Supervisor,
    types::Action,
};

impl<P: ProcessManager, L: Liveness> Supervisor<P, L> {
    /// Stop `name` if it is running.
    ///
    /// A graceful stop sends the graceful signal and escalates to the
    /// forceful one when the service is still alive after the escalation
    /// window. Stopping a service that is not running succeeds.
    ///
    /// # Errors
    /// `Error::Configuration` for an unknown service, `Error::SignalDelivery`
    /// if a live service cannot be signalled. The record is kept in that case.
    #[tracing::instrument(skip(self))]
    pub async fn stop(&mut self, name: &str, graceful: bool) -> Result<Action> {
        self.registry.get(name)?;

        let _lock = self.store.lock().await?;
        let mut pids = self.store.cleanup_stale(self.store.load(), &self.liveness)?;

        let Some(&pid) = pids.get(name) else {
            tracing::info!("{name} is not running");
            return Ok(Action::NotRunning);
        };

        let mut escalated = false;
        if graceful {
            let signal = self.settings.graceful_signal;
            if self.deliver(name, pid, signal).await? == Delivery::Delivered
                && !self.wait_for_exit(pid, self.settings.graceful_timeout).await
            {
                tracing::warn!(
                    "{name} (pid {pid}) ignored {signal} for {:?}, forcing",
                    self.settings.graceful_timeout
                );
                self.deliver(name, pid, self.settings.forceful_signal).await?;
                escalated = true;
            }
        } else {
            self.deliver(name, pid, self.settings.forceful_signal).await?;
        }

        pids.remove(name);
        self.store.save(&pids)?;

        tracing::info!("{name} stopped (pid {pid})");
        Ok(Action::Stopped { pid, escalated })
    }

    /// Send `signal`, classifying failures.
    ///
    /// Permission errors count only while the process is provably alive;
    /// anything that vanished in between is treated as already stopped.
    async fn deliver(&mut self, name: &str, pid: Pid, signal: Signal) -> Result<Delivery> {
        tracing::debug!("sending {signal} to {name} (pid {pid})");

        match self.process_manager.signal(pid, signal).await {
            Ok(delivery) => {
                if delivery == Delivery::AlreadyExited {
                    tracing::info!("{name} (pid {pid}) already exited");
                }
                Ok(delivery)
            }
            Err(err) if !self.liveness.is_alive(pid) => {
                tracing::debug!("{name} (pid {pid}) vanished while signalling: {err}");
                Ok(Delivery::AlreadyExited)
            }
            Err(source) => {
                tracing::error!("cannot send {signal} to {name} (pid {pid}): {source}");
                Err(Error::SignalDelivery {
                    service: name.to_owned(),
                    pid,
                    signal,
                    source,
                })
            }
        }
    }
}
