use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use maestro_config::load_from_path;
use maestro_core::{
    Action, BatchOutcome, CommandOutcome, Supervisor, SupervisorCommand, UnixLiveness,
    UnixProcessManager,
};

use crate::{
    commands::render_status,
    config::{discover, DEFAULT_FILENAMES},
    logger::Logger,
};

/// Load the configuration, run one command and report what happened.
///
/// Returns `true` when every part of the command succeeded.
pub async fn control<W: Write>(
    file: Option<PathBuf>,
    state_file: Option<PathBuf>,
    command: SupervisorCommand,
    logger: &mut Logger<W>,
) -> Result<bool> {
    let cwd = std::env::current_dir().context("cannot read the current directory")?;
    let path = discover(file, &cwd, dirs::config_dir().as_deref()).with_context(|| {
        format!(
            "no configuration file found (looked for {} and the user config directory)",
            DEFAULT_FILENAMES.join(", ")
        )
    })?;

    let mut config =
        load_from_path(&path).with_context(|| format!("cannot load {}", path.display()))?;
    if let Some(state_file) = state_file {
        config.settings.state_file = state_file;
    }
    tracing::debug!(
        "loaded {} services from {}",
        config.registry.len(),
        config.path.display()
    );

    let mut supervisor = Supervisor::new(config, UnixProcessManager::new(), UnixLiveness::new());
    let outcome = supervisor.execute(command).await?;

    match &outcome {
        CommandOutcome::Batch(batch) => render_batch(logger, batch),
        CommandOutcome::Status(report) => render_status(logger, report),
    }

    Ok(outcome.is_success())
}

pub fn render_batch<W: Write>(logger: &mut Logger<W>, batch: &BatchOutcome) {
    for report in &batch.reports {
        match &report.result {
            Ok(action) => logger.log(&report.service, &describe(action)),
            Err(err) => logger.error(&format!("{}: {err}", report.service)),
        }
    }

    if batch.total() != 1 {
        logger.system(&format!(
            "{}/{} services succeeded",
            batch.succeeded(),
            batch.total()
        ));
    }
}

fn describe(action: &Action) -> String {
    match action {
        Action::Started(pid) => format!("started (pid {pid})"),
        Action::AlreadyRunning(pid) => format!("already running (pid {pid})"),
        Action::Stopped {
            pid,
            escalated: false,
        } => format!("stopped (pid {pid})"),
        Action::Stopped {
            pid,
            escalated: true,
        } => format!("stopped (pid {pid}), forced after the graceful timeout"),
        Action::NotRunning => "not running".to_owned(),
        Action::Restarted {
            previous: Some(previous),
            pid,
        } => format!("restarted (pid {previous} -> {pid})"),
        Action::Restarted {
            previous: None,
            pid,
        } => format!("was not running, started (pid {pid})"),
    }
}
