use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::Local;

pub const LOG_FILE: &str = "logs.txt";
pub const NPM_PROBE_TIMEOUT_SECS: u64 = 15;
pub const NPM_CACHE_TIMEOUT_SECS: u64 = 120;

/// Returns the directory npmu writes its own log file to. Uses NPMU_LOG_DIR
/// if set; otherwise Windows: %USERPROFILE%\.npmu, Unix: $HOME/.npmu
pub fn log_dir() -> PathBuf {
    if let Ok(dir) = env::var("NPMU_LOG_DIR") {
        return PathBuf::from(dir);
    }
    let base = if cfg!(target_os = "windows") {
        env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string())
    } else {
        env::var("HOME").unwrap_or_else(|_| ".".to_string())
    };
    PathBuf::from(base).join(".npmu")
}

fn is_quiet() -> bool {
    if env::var("NPMU_QUIET").map(|v| v == "1" || v == "true").unwrap_or(false) {
        return true;
    }
    env::var("NPMU_LOG")
        .map(|v| v.to_lowercase() == "quiet" || v.to_lowercase() == "error")
        .unwrap_or(false)
}

pub fn log(message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let log_message = format!("[{}] {}", timestamp, message);

    if !is_quiet() {
        eprintln!("{}", log_message);
    }

    let dir = log_dir();
    let _ = fs::create_dir_all(&dir);
    let log_path = dir.join(LOG_FILE);
    // Append-only: no read-back, no duplicate check.
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
        let _ = writeln!(file, "{}", log_message);
    }
}

pub fn log_error(message: &str) {
    eprintln!("{}", message);
    log(message);
}

/// Run a command, killing it after timeout_secs. The kill thread waits on a
/// channel rather than an unconditional sleep, so a fast child returns
/// immediately instead of stalling until the timeout elapses.
pub fn run_command_timeout(
    program: &str,
    args: &[&str],
    timeout_secs: u64,
) -> std::io::Result<Output> {
    let child = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let pid = child.id();
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let kill_handle = thread::spawn(move || {
        // Err(Timeout) means the child is still running past the deadline.
        if done_rx.recv_timeout(Duration::from_secs(timeout_secs)).is_err() {
            #[cfg(unix)]
            {
                let _ = Command::new("kill").arg("-9").arg(pid.to_string()).output();
            }
            #[cfg(windows)]
            {
                let _ = Command::new("taskkill").args(["/F", "/PID", &pid.to_string()]).output();
            }
        }
    });

    let out = child.wait_with_output();
    let _ = done_tx.send(());
    let _ = kill_handle.join();
    out
}

/// Run the npm CLI and return trimmed stdout. Non-zero exit or spawn failure
/// is an Err carrying npm's own stderr (or the spawn error) verbatim.
pub fn run_npm(args: &[&str], timeout_secs: u64) -> Result<String, String> {
    let out = run_command_timeout("npm", args, timeout_secs)
        .map_err(|e| format!("npm {}: {}", args.join(" "), e))?;
    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(stderr.trim().to_string());
    }
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}

/// Split a package spec into (name, version selector).
/// "lodash@4.17.21" -> ("lodash", Some("4.17.21")); "@scope/pkg" -> ("@scope/pkg", None).
pub fn split_spec(spec: &str) -> (&str, Option<&str>) {
    let spec = spec.trim();
    if let Some(idx) = spec.rfind('@') {
        if idx > 0 {
            return (&spec[..idx], Some(&spec[idx + 1..]));
        }
    }
    (spec, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_spec_plain() {
        assert_eq!(split_spec("lodash"), ("lodash", None));
        assert_eq!(split_spec("lodash@4.17.21"), ("lodash", Some("4.17.21")));
    }

    #[test]
    fn test_split_spec_scoped() {
        assert_eq!(split_spec("@babel/core"), ("@babel/core", None));
        assert_eq!(split_spec("@babel/core@7.0.0"), ("@babel/core", Some("7.0.0")));
    }

    #[test]
    fn test_split_spec_trims() {
        assert_eq!(split_spec("  left-pad@1.3.0 "), ("left-pad", Some("1.3.0")));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_command_timeout_returns_as_soon_as_child_exits() {
        let start = std::time::Instant::now();
        let out = run_command_timeout("echo", &["hi"], 5).expect("echo runs");
        assert!(out.status.success());
        assert!(String::from_utf8_lossy(&out.stdout).contains("hi"));
        assert!(
            start.elapsed() < Duration::from_secs(2),
            "fast child should not wait out the timeout, took {:?}",
            start.elapsed()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_command_timeout_kills_overrunning_child() {
        let start = std::time::Instant::now();
        let out = run_command_timeout("sleep", &["10"], 1).expect("sleep spawns");
        assert!(!out.status.success(), "killed child should not report success");
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "child should be killed at the deadline, took {:?}",
            start.elapsed()
        );
    }

    #[test]
    fn test_log_dir_env_override() {
        let td = tempfile::tempdir().expect("tmp");
        std::env::set_var("NPMU_LOG_DIR", td.path());
        assert_eq!(log_dir(), td.path());
        std::env::remove_var("NPMU_LOG_DIR");
    }
}
