#![cfg(unix)]

use std::{path::PathBuf, time::Duration};

use maestro_core::{CommandSpec, Delivery, ExitReason, ProcessManager, Signal, UnixProcessManager};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn spec(name: &str, script: &str, log_file: PathBuf) -> CommandSpec {
    CommandSpec {
        name: name.to_owned(),
        cmd: vec!["bash".to_owned(), fixture(script)],
        cwd: None,
        env: vec![],
        log_file,
    }
}

#[tokio::test]
async fn test_process_manager_captures_stderr_of_crash() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("logs").join("crash.log");
    let mut pm = UnixProcessManager::new();

    let spawned = pm
        .spawn(spec("crash", "crash.sh", log_file.clone()))
        .await
        .unwrap();

    let result = pm.wait(spawned.id, Duration::from_secs(5)).await.unwrap();
    assert_eq!(result, Some(ExitReason::Code(3)));

    let stderr = std::fs::read_to_string(&log_file).unwrap();
    assert_eq!(stderr, "fatal: JIRA_API_TOKEN is not set\n");
}

#[tokio::test]
async fn test_process_manager_passes_env_and_cwd() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("env.log");
    let mut pm = UnixProcessManager::new();

    let spawned = pm
        .spawn(CommandSpec {
            name: "env".to_owned(),
            cmd: vec![
                "bash".to_owned(),
                "-c".to_owned(),
                "echo \"$MAESTRO_TEST_VALUE $(pwd)\" >&2".to_owned(),
            ],
            cwd: Some(dir.path().to_path_buf()),
            env: vec![("MAESTRO_TEST_VALUE".to_owned(), "hello".to_owned())],
            log_file: log_file.clone(),
        })
        .await
        .unwrap();

    let result = pm.wait(spawned.id, Duration::from_secs(5)).await.unwrap();
    assert_eq!(result, Some(ExitReason::Code(0)));

    let stderr = std::fs::read_to_string(&log_file).unwrap();
    let cwd = dir.path().canonicalize().unwrap();
    assert_eq!(stderr.trim(), format!("hello {}", cwd.display()));
}

#[tokio::test]
async fn test_process_manager_forceful_signal() {
    let dir = tempfile::tempdir().unwrap();
    let mut pm = UnixProcessManager::new();

    let spawned = pm
        .spawn(spec("sleeper", "sleeper.sh", dir.path().join("sleeper.log")))
        .await
        .unwrap();

    let result = pm.wait(spawned.id, Duration::from_millis(300)).await.unwrap();
    assert_eq!(result, None);

    let delivery = pm.signal(spawned.pid, Signal::Term).await.unwrap();
    assert_eq!(delivery, Delivery::Delivered);
    let result = pm.wait(spawned.id, Duration::from_secs(5)).await.unwrap();
    assert_eq!(result, Some(ExitReason::Signal(libc::SIGTERM)));
}

#[tokio::test]
async fn test_process_manager_ignored_graceful_signal() {
    let dir = tempfile::tempdir().unwrap();
    let mut pm = UnixProcessManager::new();

    let spawned = pm
        .spawn(spec(
            "ignore_hup",
            "ignore_hup.sh",
            dir.path().join("ignore_hup.log"),
        ))
        .await
        .unwrap();
    // Let bash install its trap.
    tokio::time::sleep(Duration::from_millis(200)).await;

    pm.signal(spawned.pid, Signal::Hup).await.unwrap();
    let result = pm.wait(spawned.id, Duration::from_millis(300)).await.unwrap();
    assert_eq!(result, None);

    pm.signal(spawned.pid, Signal::Kill).await.unwrap();
    let result = pm.wait(spawned.id, Duration::from_secs(5)).await.unwrap();
    assert_eq!(result, Some(ExitReason::Signal(libc::SIGKILL)));
}

#[tokio::test]
async fn test_process_manager_signal_after_exit() {
    let dir = tempfile::tempdir().unwrap();
    let mut pm = UnixProcessManager::new();

    let spawned = pm
        .spawn(spec("crash", "crash.sh", dir.path().join("crash.log")))
        .await
        .unwrap();
    pm.wait(spawned.id, Duration::from_secs(5)).await.unwrap();

    let delivery = pm.signal(spawned.pid, Signal::Term).await.unwrap();
    assert_eq!(delivery, Delivery::AlreadyExited);
}

#[tokio::test]
async fn test_process_manager_missing_program() {
    let dir = tempfile::tempdir().unwrap();
    let mut pm = UnixProcessManager::new();

    let result = pm
        .spawn(CommandSpec {
            name: "missing".to_owned(),
            cmd: vec!["/nonexistent/maestro-test-binary".to_owned()],
            cwd: None,
            env: vec![],
            log_file: dir.path().join("missing.log"),
        })
        .await;

    assert!(matches!(result, Err(maestro_core::Error::Spawn { .. })));
}
