use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use maestro_types::{ServiceDescriptor, Signal};

use crate::ConfigError;

/// Name reserved for addressing every registered service at once.
pub const ALL_TARGET: &str = "all";

pub const DEFAULT_STATE_FILE: &str = ".maestro_pids.json";
pub const DEFAULT_LOG_DIR: &str = ".maestro/logs";

#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub settings: Settings,
    pub registry: Registry,
}

/// Timing and signal policy of the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub state_file: PathBuf,
    pub log_dir: PathBuf,
    /// How long a freshly spawned service must survive to count as started.
    pub start_grace: Duration,
    /// How long a graceful stop waits before escalating.
    pub graceful_timeout: Duration,
    pub restart_pause: Duration,
    pub restart_all_pause: Duration,
    pub lock_timeout: Duration,
    pub graceful_signal: Signal,
    pub forceful_signal: Signal,
}

impl Default for Settings {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            state_file: home.join(DEFAULT_STATE_FILE),
            log_dir: home.join(DEFAULT_LOG_DIR),
            start_grace: Duration::from_millis(1000),
            graceful_timeout: Duration::from_millis(2000),
            restart_pause: Duration::from_millis(1000),
            restart_all_pause: Duration::from_millis(2000),
            lock_timeout: Duration::from_millis(10_000),
            graceful_signal: Signal::Hup,
            forceful_signal: Signal::Term,
        }
    }
}

/// Fixed set of services the supervisor is allowed to manage.
///
/// Iteration order is sorted by name, so batched operations are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    services: BTreeMap<String, ServiceDescriptor>,
}

impl Registry {
    /// Build a registry from service descriptors.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` on an invalid or duplicated service name.
    pub fn new(services: impl IntoIterator<Item = ServiceDescriptor>) -> Result<Self, ConfigError> {
        let mut map = BTreeMap::new();
        for service in services {
            validate_name(&service.name)?;
            if service.path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "service `{}`: path is empty",
                    service.name
                )));
            }
            if map.contains_key(&service.name) {
                return Err(ConfigError::Validation(format!(
                    "service `{}` is defined twice",
                    service.name
                )));
            }
            map.insert(service.name.clone(), service);
        }
        Ok(Self { services: map })
    }

    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Look a service up by name without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownService` if the name is not registered.
    pub fn get(&self, name: &str) -> Result<&ServiceDescriptor, ConfigError> {
        self.services
            .get(name)
            .ok_or_else(|| ConfigError::UnknownService {
                name: name.to_owned(),
                available: self.names().map(ToOwned::to_owned).collect(),
            })
    }

    /// Look a service up and check that its executable is present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownService` for an unregistered name and
    /// `ConfigError::MissingExecutable` if the path does not exist.
    pub fn resolve(&self, name: &str) -> Result<&ServiceDescriptor, ConfigError> {
        let service = self.get(name)?;
        if !service.path.exists() {
            return Err(ConfigError::MissingExecutable {
                service: name.to_owned(),
                path: service.path.clone(),
            });
        }
        Ok(service)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation("service name is empty".into()));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "service `{name}`: name contains whitespace"
        )));
    }
    if name.eq_ignore_ascii_case(ALL_TARGET) {
        return Err(ConfigError::Validation(format!(
            "service name `{name}` is reserved"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn descriptor(name: &str, path: &str) -> ServiceDescriptor {
        ServiceDescriptor {
            name: name.to_owned(),
            path: PathBuf::from(path),
            interpreter: None,
            args: vec![],
            cwd: None,
            env: HashMap::new(),
        }
    }

    #[test]
    fn test_registry_order_is_sorted() {
        let registry = Registry::new(vec![
            descriptor("observe", "/bin/sh"),
            descriptor("jira", "/bin/sh"),
            descriptor("linear", "/bin/sh"),
        ])
        .unwrap();

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["jira", "linear", "observe"]);
    }

    #[test]
    fn test_unknown_service() {
        let registry = Registry::new(vec![descriptor("jira", "/bin/sh")]).unwrap();

        assert!(registry.exists("jira"));
        assert!(!registry.exists("slack"));
        match registry.resolve("slack") {
            Err(ConfigError::UnknownService { name, available }) => {
                assert_eq!(name, "slack");
                assert_eq!(available, vec!["jira".to_owned()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_executable() {
        let registry =
            Registry::new(vec![descriptor("jira", "/nonexistent/jira_server.py")]).unwrap();

        assert!(registry.get("jira").is_ok());
        assert!(matches!(
            registry.resolve("jira"),
            Err(ConfigError::MissingExecutable { .. })
        ));
    }

    #[test]
    fn test_invalid_names() {
        assert!(Registry::new(vec![descriptor("", "/bin/sh")]).is_err());
        assert!(Registry::new(vec![descriptor("my service", "/bin/sh")]).is_err());
        assert!(Registry::new(vec![descriptor("ALL", "/bin/sh")]).is_err());
        assert!(Registry::new(vec![descriptor("jira", "")]).is_err());
        assert!(
            Registry::new(vec![descriptor("jira", "/bin/sh"), descriptor("jira", "/bin/sh")])
                .is_err()
        );
    }
}
