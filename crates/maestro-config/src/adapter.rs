use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use maestro_types::{ServiceDescriptor, Signal};

use crate::{
    model::{Config, Registry, Settings},
    raw::{RawConfig, RawService, RawSettings},
    ConfigError,
};

impl RawConfig {
    pub fn to_config(&self, path: &Path) -> Result<Config, ConfigError> {
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        if self.services.is_empty() {
            return Err(ConfigError::Validation("no services defined".into()));
        }

        let services = self
            .services
            .iter()
            .map(|(name, raw_service)| raw_service.to_descriptor(name, base))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Config {
            path: path.to_path_buf(),
            settings: self.settings.to_settings(base)?,
            registry: Registry::new(services)?,
        })
    }
}

impl RawService {
    fn to_descriptor(&self, name: &str, base: &Path) -> Result<ServiceDescriptor, ConfigError> {
        if self.path.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "service `{name}`: path is empty"
            )));
        }
        if let Some(interpreter) = &self.interpreter {
            if interpreter.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "service `{name}`: interpreter is empty"
                )));
            }
        }

        Ok(ServiceDescriptor {
            name: name.to_owned(),
            path: resolve_path(&self.path, base),
            interpreter: self.interpreter.clone(),
            args: self.args.clone().unwrap_or_default(),
            cwd: self.cwd.as_deref().map(|cwd| resolve_path(cwd, base)),
            env: self.env.clone().unwrap_or_default(),
        })
    }
}

impl RawSettings {
    fn to_settings(&self, base: &Path) -> Result<Settings, ConfigError> {
        let defaults = Settings::default();

        let start_grace = positive("start_grace_ms", self.start_grace_ms, defaults.start_grace)?;
        let graceful_timeout = positive(
            "graceful_timeout_ms",
            self.graceful_timeout_ms,
            defaults.graceful_timeout,
        )?;
        let lock_timeout = positive("lock_timeout_ms", self.lock_timeout_ms, defaults.lock_timeout)?;

        Ok(Settings {
            state_file: self
                .state_file
                .as_deref()
                .map_or(defaults.state_file, |p| resolve_path(p, base)),
            log_dir: self
                .log_dir
                .as_deref()
                .map_or(defaults.log_dir, |p| resolve_path(p, base)),
            start_grace,
            graceful_timeout,
            restart_pause: self
                .restart_pause_ms
                .map_or(defaults.restart_pause, Duration::from_millis),
            restart_all_pause: self
                .restart_all_pause_ms
                .map_or(defaults.restart_all_pause, Duration::from_millis),
            lock_timeout,
            graceful_signal: parse_signal(self.graceful_signal.as_deref(), defaults.graceful_signal)?,
            forceful_signal: parse_signal(self.forceful_signal.as_deref(), defaults.forceful_signal)?,
        })
    }
}

/// Durations bounding a wait must not be zero.
fn positive(key: &str, raw: Option<u64>, default: Duration) -> Result<Duration, ConfigError> {
    let value = raw.map_or(default, Duration::from_millis);
    if value.is_zero() {
        return Err(ConfigError::Validation(format!(
            "{key} must be greater than zero"
        )));
    }
    Ok(value)
}

fn parse_signal(raw: Option<&str>, default: Signal) -> Result<Signal, ConfigError> {
    raw.map_or(Ok(default), |name| {
        name.parse()
            .map_err(|err| ConfigError::Validation(format!("{err}")))
    })
}

/// Expand a leading `~/` and anchor relative paths at `base`.
pub fn resolve_path(raw: &str, base: &Path) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
