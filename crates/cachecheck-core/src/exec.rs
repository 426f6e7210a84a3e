//! Subprocess execution of one candidate on one workload.
//!
//! The workload file is handed to the child as its stdin (streamed, never
//! read into memory here). stdout and stderr are captured in full. The wait
//! is bounded by the per-case timeout; on expiry the child is killed and
//! reaped. On every exit path the child's process group gets a final SIGKILL,
//! so background processes it started do not outlive the case.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Exit code reported for a case killed by the timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code reported when the candidate could not be started.
pub const SPAWN_FAILED_EXIT_CODE: i32 = 126;

/// Infrastructure failure of a single case.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("cannot open workload {}: {source}", path.display())]
    OpenWorkload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot spawn {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("waiting for {}: {source}", path.display())]
    Wait {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of one execution.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseOutput {
    pub exit_code: i32,
    /// stdout, trimmed.
    pub stdout: String,
    /// stderr, trimmed.
    pub stderr: String,
    pub elapsed: Duration,
    pub timed_out: bool,
}

impl CaseOutput {
    /// Failed-case stand-in for an [`ExecError`].
    pub fn from_exec_error(err: &ExecError, elapsed: Duration) -> Self {
        Self {
            exit_code: SPAWN_FAILED_EXIT_CODE,
            stdout: String::new(),
            stderr: err.to_string(),
            elapsed,
            timed_out: false,
        }
    }

    fn timed_out(elapsed: Duration) -> Self {
        Self {
            exit_code: TIMEOUT_EXIT_CODE,
            stdout: String::new(),
            stderr: format!("TIMEOUT after {:.2}s", elapsed.as_secs_f64()),
            elapsed,
            timed_out: true,
        }
    }
}

/// Run `exe < workload` with a wall-clock `timeout`.
pub async fn execute(
    exe: &Path,
    workload: &Path,
    timeout: Duration,
) -> Result<CaseOutput, ExecError> {
    let stdin = std::fs::File::open(workload).map_err(|source| ExecError::OpenWorkload {
        path: workload.to_path_buf(),
        source,
    })?;

    let mut std_command = std::process::Command::new(exe);
    std_command
        .stdin(Stdio::from(stdin))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        std_command.process_group(0);
    }
    let mut command = Command::from(std_command);
    command.kill_on_drop(true);

    let start = Instant::now();
    let mut child = command.spawn().map_err(|source| ExecError::Spawn {
        path: exe.to_path_buf(),
        source,
    })?;
    // The child leads its own process group; the id stays valid for killpg
    // after the leader is reaped, while any member of the group remains.
    let pgid = child.id();
    debug!(exe = %exe.display(), workload = %workload.display(), pid = ?pgid, "spawned");

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let waited = tokio::time::timeout(timeout, async {
        tokio::try_join!(drain(stdout), drain(stderr), child.wait())
    })
    .await;

    match waited {
        Ok(Ok((out, err, status))) => {
            let elapsed = start.elapsed();
            kill_group(pgid);
            let exit_code = exit_code_of(status);
            debug!(exe = %exe.display(), exit_code, elapsed_ms = elapsed.as_millis() as u64, "exited");
            Ok(CaseOutput {
                exit_code,
                stdout: normalize(&out),
                stderr: normalize(&err),
                elapsed,
                timed_out: false,
            })
        }
        Ok(Err(source)) => {
            terminate(&mut child, pgid).await;
            Err(ExecError::Wait {
                path: exe.to_path_buf(),
                source,
            })
        }
        Err(_) => {
            terminate(&mut child, pgid).await;
            let elapsed = start.elapsed();
            warn!(
                exe = %exe.display(),
                workload = %workload.display(),
                elapsed_ms = elapsed.as_millis() as u64,
                "timed out, killed"
            );
            Ok(CaseOutput::timed_out(elapsed))
        }
    }
}

async fn drain<R>(stream: Option<R>) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        stream.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Kill the child's process group, then the child itself if it has not been
/// reaped yet.
async fn terminate(child: &mut Child, pgid: Option<u32>) {
    kill_group(pgid);
    if child.id().is_none() {
        return;
    }
    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill child");
    }
}

/// SIGKILL whatever is left of the case's process group. An empty group
/// (`ESRCH`) is the normal outcome.
fn kill_group(pgid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pid) = pgid {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;
        match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => debug!(pid, error = %e, "killpg failed"),
        }
    }
    #[cfg(not(unix))]
    let _ = pgid;
}

fn normalize(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::write_script;
    use std::fs;
    use tempfile::TempDir;

    fn workload(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("test_000001.txt");
        fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn captures_trimmed_output_and_exit_code() {
        let dir = TempDir::new().unwrap();
        let exe = write_script(
            dir.path(),
            "echo-cap",
            "read cap n rest\necho \"  $cap \"\necho 'note' >&2\nexit 0",
        );
        let input = workload(dir.path(), "4 2 1 2\n");

        let out = execute(&exe, &input, Duration::from_secs(5)).await.unwrap();
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout, "4");
        assert_eq!(out.stderr, "note");
        assert!(!out.timed_out);
    }

    #[tokio::test]
    async fn stdin_is_the_workload_file() {
        let dir = TempDir::new().unwrap();
        let exe = write_script(dir.path(), "cat-input", "cat");
        let input = workload(dir.path(), "3 3 7 8 9\n");

        let out = execute(&exe, &input, Duration::from_secs(5)).await.unwrap();
        assert_eq!(out.stdout, "3 3 7 8 9");
    }

    #[tokio::test]
    async fn reports_nonzero_exit() {
        let dir = TempDir::new().unwrap();
        let exe = write_script(dir.path(), "fails", "echo partial\nexit 3");
        let input = workload(dir.path(), "1 0\n");

        let out = execute(&exe, &input, Duration::from_secs(5)).await.unwrap();
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.stdout, "partial");
    }

    #[tokio::test]
    async fn timeout_kills_and_reports_sentinel() {
        let dir = TempDir::new().unwrap();
        let exe = write_script(dir.path(), "sleeper", "exec sleep 30");
        let input = workload(dir.path(), "1 0\n");

        let started = Instant::now();
        let out = execute(&exe, &input, Duration::from_millis(200))
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(out.exit_code, TIMEOUT_EXIT_CODE);
        assert!(out.timed_out);
        assert!(out.stderr.starts_with("TIMEOUT after "), "{}", out.stderr);
        assert!(out.stdout.is_empty());
    }

    #[tokio::test]
    async fn timeout_also_kills_grandchildren() {
        let dir = TempDir::new().unwrap();
        // The shell keeps the pipe open through a background child.
        let exe = write_script(dir.path(), "forker", "sleep 30 &\nwait");
        let input = workload(dir.path(), "1 0\n");

        let started = Instant::now();
        let out = execute(&exe, &input, Duration::from_millis(200))
            .await
            .unwrap();
        assert!(out.timed_out);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    /// Whether `pid` is still running. Zombies count as gone.
    #[cfg(target_os = "linux")]
    fn running(pid: &str) -> bool {
        match fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => stat
                .rsplit_once(')')
                .and_then(|(_, rest)| rest.split_whitespace().next())
                .is_some_and(|state| state != "Z" && state != "X"),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    fn assert_gone(pid_file: &Path) {
        let pid = fs::read_to_string(pid_file).unwrap();
        let pid = pid.trim();
        let deadline = Instant::now() + Duration::from_secs(5);
        while running(pid) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(!running(pid), "background process {pid} outlived its case");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn timeout_kills_grandchild_after_parent_exited() {
        let dir = TempDir::new().unwrap();
        let pid_file = dir.path().join("grandchild.pid");
        // The parent exits at once; the background sleep keeps stdout open.
        let exe = write_script(
            dir.path(),
            "leaves-child",
            &format!("sleep 31 &\necho $! > {}\necho 1\nexit 0", pid_file.display()),
        );
        let input = workload(dir.path(), "1 0\n");

        let out = execute(&exe, &input, Duration::from_millis(300))
            .await
            .unwrap();
        assert_eq!(out.exit_code, TIMEOUT_EXIT_CODE);
        assert!(out.timed_out);
        assert_gone(&pid_file);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn detached_grandchild_is_killed_after_normal_exit() {
        let dir = TempDir::new().unwrap();
        let pid_file = dir.path().join("grandchild.pid");
        let exe = write_script(
            dir.path(),
            "detaches",
            &format!(
                "sleep 31 >/dev/null 2>&1 &\necho $! > {}\necho 1",
                pid_file.display()
            ),
        );
        let input = workload(dir.path(), "1 0\n");

        let out = execute(&exe, &input, Duration::from_secs(5)).await.unwrap();
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout, "1");
        assert_gone(&pid_file);
    }

    #[tokio::test]
    async fn signal_exit_maps_to_128_plus_signal() {
        let dir = TempDir::new().unwrap();
        let exe = write_script(dir.path(), "self-kill", "kill -9 $$");
        let input = workload(dir.path(), "1 0\n");

        let out = execute(&exe, &input, Duration::from_secs(5)).await.unwrap();
        assert_eq!(out.exit_code, 128 + 9);
    }

    #[tokio::test]
    async fn missing_workload_and_executable_are_errors() {
        let dir = TempDir::new().unwrap();
        let exe = write_script(dir.path(), "ok", "echo 1");
        let err = execute(&exe, &dir.path().join("absent.txt"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::OpenWorkload { .. }));

        let input = workload(dir.path(), "1 0\n");
        let err = execute(&dir.path().join("absent"), &input, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));

        let out = CaseOutput::from_exec_error(&err, Duration::ZERO);
        assert_eq!(out.exit_code, SPAWN_FAILED_EXIT_CODE);
        assert!(out.stderr.starts_with("cannot spawn"));
    }
}
