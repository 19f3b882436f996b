use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use maestro_core::{SupervisorCommand, Target};

/// File names looked up in the current directory when `--file` is not given.
pub const DEFAULT_FILENAMES: [&str; 2] = ["maestro.toml", ".maestro.toml"];

/// CLI for maestro
#[derive(Parser, Debug)]
#[command(name = "maestro", version, about = "Controller for long-running local services")]
pub struct Cli {
    /// File path to the configuration file (TOML)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Overrides the pid store location from the configuration
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start a service, or every service with `all`
    Start { target: Option<String> },
    /// Stop a service, or every service with `all`
    Stop { target: Option<String> },
    /// Stop then start a service, or every service with `all`
    Restart { target: Option<String> },
    /// Restart asking services to drain first
    Graceful { target: Option<String> },
    /// Show which services are running
    Status {
        /// Ignored
        #[arg(hide = true)]
        target: Option<String>,
    },
}

impl Commands {
    /// Convert into a supervisor command.
    ///
    /// # Errors
    ///
    /// Returns the command name when a target is required but missing.
    pub fn into_supervisor_command(self) -> Result<SupervisorCommand, &'static str> {
        match self {
            Commands::Status { .. } => Ok(SupervisorCommand::Status),
            Commands::Start { target } => target
                .map(|t| SupervisorCommand::Start(Target::parse(&t)))
                .ok_or("start"),
            Commands::Stop { target } => target
                .map(|t| SupervisorCommand::Stop(Target::parse(&t)))
                .ok_or("stop"),
            Commands::Restart { target } => target
                .map(|t| SupervisorCommand::Restart(Target::parse(&t)))
                .ok_or("restart"),
            Commands::Graceful { target } => target
                .map(|t| SupervisorCommand::Graceful(Target::parse(&t)))
                .ok_or("gracefully restart"),
        }
    }
}

/// Pick the configuration file: the explicit one, then the current
/// directory, then the user configuration directory.
pub fn discover(explicit: Option<PathBuf>, cwd: &Path, config_dir: Option<&Path>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }

    let user = config_dir.map(|dir| dir.join("maestro").join(DEFAULT_FILENAMES[0]));
    DEFAULT_FILENAMES
        .iter()
        .map(|name| cwd.join(name))
        .chain(user)
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_all() {
        let cli = Cli::try_parse_from(["maestro", "start", "all"]).unwrap();
        assert_eq!(
            cli.command.into_supervisor_command(),
            Ok(SupervisorCommand::Start(Target::All))
        );
    }

    #[test]
    fn test_parse_global_flags_after_command() {
        let cli = Cli::try_parse_from([
            "maestro",
            "graceful",
            "jira",
            "--file",
            "conf/maestro.toml",
            "--state-file",
            "/tmp/pids.json",
        ])
        .unwrap();

        assert_eq!(cli.file, Some(PathBuf::from("conf/maestro.toml")));
        assert_eq!(cli.state_file, Some(PathBuf::from("/tmp/pids.json")));
        assert_eq!(
            cli.command.into_supervisor_command(),
            Ok(SupervisorCommand::Graceful(Target::Service("jira".into())))
        );
    }

    #[test]
    fn test_status_ignores_target() {
        let cli = Cli::try_parse_from(["maestro", "status", "jira"]).unwrap();
        assert_eq!(
            cli.command.into_supervisor_command(),
            Ok(SupervisorCommand::Status)
        );
    }

    #[test]
    fn test_missing_target() {
        let cli = Cli::try_parse_from(["maestro", "stop"]).unwrap();
        assert_eq!(cli.command.into_supervisor_command(), Err("stop"));
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let err = Cli::try_parse_from(["maestro", "reload", "all"]).unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn test_help_is_not_an_error() {
        let err = Cli::try_parse_from(["maestro", "--help"]).unwrap_err();
        assert!(!err.use_stderr());
    }

    #[test]
    fn test_discover_order() {
        let cwd = tempfile::tempdir().unwrap();
        let config_dir = tempfile::tempdir().unwrap();
        let user = config_dir.path().join("maestro").join("maestro.toml");
        std::fs::create_dir_all(user.parent().unwrap()).unwrap();
        std::fs::write(&user, "").unwrap();

        assert_eq!(
            discover(None, cwd.path(), Some(config_dir.path())),
            Some(user.clone())
        );

        let hidden = cwd.path().join(".maestro.toml");
        std::fs::write(&hidden, "").unwrap();
        assert_eq!(
            discover(None, cwd.path(), Some(config_dir.path())),
            Some(hidden)
        );

        let local = cwd.path().join("maestro.toml");
        std::fs::write(&local, "").unwrap();
        assert_eq!(
            discover(None, cwd.path(), Some(config_dir.path())),
            Some(local)
        );

        let explicit = PathBuf::from("elsewhere.toml");
        assert_eq!(
            discover(Some(explicit.clone()), cwd.path(), Some(config_dir.path())),
            Some(explicit)
        );
    }

    #[test]
    fn test_discover_nothing() {
        let cwd = tempfile::tempdir().unwrap();
        assert_eq!(discover(None, cwd.path(), None), None);
    }
}
