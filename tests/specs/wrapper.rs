//! The wrapper command's artifact protocol, exercised under real bash
//! against a tempdir.

use std::process::Command;

use rj_core::parse_metadata;
use rj_remote::{build_wrapper_command, WrapperSpec};

struct Artifacts {
    dir: tempfile::TempDir,
}

impl Artifacts {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).display().to_string()
    }

    fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).unwrap_or_default()
    }

    fn exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }
}

fn run_wrapper(artifacts: &Artifacts, command: &str, env_vars: &[String]) -> i32 {
    let working_dir = artifacts.dir.path().display().to_string();
    run_wrapper_in(artifacts, &working_dir, command, env_vars, None)
}

fn run_wrapper_in(
    artifacts: &Artifacts,
    working_dir: &str,
    command: &str,
    env_vars: &[String],
    meta: Option<(&str, &str)>,
) -> i32 {
    let log = artifacts.path("job.log");
    let status = artifacts.path("job.status");
    let pid = artifacts.path("job.pid");
    let (meta_file, meta_lines) = match meta {
        Some((file, lines)) => (Some(artifacts.path(file)), Some(lines.to_string())),
        None => (None, None),
    };
    let wrapped = build_wrapper_command(&WrapperSpec {
        job_id: 7,
        working_dir,
        command,
        log_file: &log,
        status_file: &status,
        pid_file: &pid,
        env_vars,
        meta_file: meta_file.as_deref(),
        meta_lines: meta_lines.as_deref(),
    });
    let output = Command::new("bash").arg("-c").arg(&wrapped).output().unwrap();
    output.status.code().unwrap_or(-1)
}

#[test]
fn happy_path_leaves_log_pid_and_status() {
    let artifacts = Artifacts::new();
    run_wrapper(&artifacts, "echo hello", &[]);

    let log = artifacts.read("job.log");
    assert!(log.contains("=== START"), "log header missing:\n{log}");
    assert!(log.contains("job_id: 7"));
    assert!(log.contains("cmd: echo hello"));
    assert!(log.contains("hello"));
    assert!(log.contains("=== END exit=0"), "log trailer missing:\n{log}");

    assert_eq!(artifacts.read("job.status").trim(), "0");

    let pid: i32 = artifacts.read("job.pid").trim().parse().unwrap();
    assert!(pid > 0);
}

#[test]
fn status_file_carries_the_command_exit_code() {
    let artifacts = Artifacts::new();
    run_wrapper(&artifacts, "exit 42", &[]);
    assert_eq!(artifacts.read("job.status").trim(), "42");
    assert!(artifacts.read("job.log").contains("=== END exit=42"));
}

#[test]
fn failing_command_still_gets_a_status_file() {
    let artifacts = Artifacts::new();
    run_wrapper(&artifacts, "false", &[]);
    assert_eq!(artifacts.read("job.status").trim(), "1");
}

#[test]
fn env_vars_reach_the_command_literally() {
    let artifacts = Artifacts::new();
    run_wrapper(
        &artifacts,
        r#"printf '<%s>' "$GREETING""#,
        &["GREETING=it's $HOME".to_string()],
    );
    // Literal export: no expansion of the embedded $HOME.
    assert!(artifacts.read("job.log").contains("<it's $HOME>"));
}

#[test]
fn commands_with_quotes_survive() {
    let artifacts = Artifacts::new();
    run_wrapper(&artifacts, r#"printf '%s' "it's fine""#, &[]);
    assert!(artifacts.read("job.log").contains("it's fine"));
    assert_eq!(artifacts.read("job.status").trim(), "0");
}

#[test]
fn pid_file_is_the_user_commands_pid() {
    let artifacts = Artifacts::new();
    // The subshell execs into the user command, so $$ seen by the
    // command equals the pid written beforehand.
    run_wrapper(&artifacts, "echo pid=$$", &[]);
    let pid = artifacts.read("job.pid").trim().to_string();
    assert!(
        artifacts.read("job.log").contains(&format!("pid={pid}")),
        "pid file {pid} does not match the command's $$"
    );
}

#[test]
fn cd_failure_aborts_with_status_1() {
    let artifacts = Artifacts::new();
    let missing = artifacts.path("does-not-exist");
    let code = run_wrapper_in(&artifacts, &missing, "echo unreachable", &[], None);
    assert_eq!(code, 1);
    assert_eq!(artifacts.read("job.status").trim(), "1");
    let log = artifacts.read("job.log");
    assert!(log.contains("cd failed"), "log:\n{log}");
    assert!(!log.contains("unreachable"));
}

#[test]
fn status_is_written_exactly_once_at_the_end() {
    let artifacts = Artifacts::new();
    // While the command runs, the status file must not exist: its
    // presence IS the completion signal.
    let status = artifacts.path("job.status");
    let probe = format!(
        "if [ -e {status} ]; then echo EARLY-STATUS; else echo NO-STATUS-YET; fi"
    );
    run_wrapper(&artifacts, &probe, &[]);
    let log = artifacts.read("job.log");
    assert!(log.contains("NO-STATUS-YET"), "log:\n{log}");
    assert!(artifacts.exists("job.status"));
}

#[test]
fn meta_stamp_writes_metadata_with_launch_start_time() {
    let artifacts = Artifacts::new();
    run_wrapper_in(
        &artifacts,
        &artifacts.dir.path().display().to_string(),
        "true",
        &[],
        Some(("job.meta", "job_id:7\nhost:host-a\ncommand:true")),
    );
    let meta = parse_metadata(&artifacts.read("job.meta"));
    assert_eq!(meta.job_id, Some(7));
    assert_eq!(meta.host.as_deref(), Some("host-a"));
    let start = meta.start_time.unwrap();
    assert!(start > 1_600_000_000, "start_time not stamped: {start}");
}

#[test]
fn tilde_artifact_paths_expand_under_the_remote_home() {
    let artifacts = Artifacts::new();
    let wrapped = build_wrapper_command(&WrapperSpec {
        job_id: 9,
        working_dir: "~",
        command: "echo tilde-ok",
        log_file: "~/job.log",
        status_file: "~/job.status",
        pid_file: "~/job.pid",
        env_vars: &[],
        meta_file: None,
        meta_lines: None,
    });
    let output = Command::new("bash")
        .arg("-c")
        .arg(&wrapped)
        .env("HOME", artifacts.dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(artifacts.read("job.status").trim(), "0");
    assert!(artifacts.read("job.log").contains("tilde-ok"));
}
