//! Shell invocation with output capture and an optional hard timeout.
//!
//! Start commands, command health probes, and patch-validation test targets
//! all funnel through `run_shell()`, so every external invocation shares the
//! same timeout and output-capping behaviour.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

/// Result of one shell invocation.
#[derive(Debug, Clone)]
pub struct ShellOutcome {
    pub success: bool,
    pub output: String,
    pub timed_out: bool,
    pub duration_ms: u64,
}

/// Execute `command` via `sh -c` in `cwd`, with an optional timeout.
///
/// Uses dedicated threads for stdout/stderr reading (avoiding pipe-buffer
/// deadlocks) and a waiter thread with `mpsc::recv_timeout` for timeout
/// support. `None` timeout means wait indefinitely.
pub fn run_shell(command: &str, cwd: &Path, timeout: Option<Duration>) -> ShellOutcome {
    let start = std::time::Instant::now();

    if command.trim().is_empty() {
        return ShellOutcome {
            success: false,
            output: "command is empty".to_string(),
            timed_out: false,
            duration_ms: 0,
        };
    }

    let mut child = match Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(c) => c,
        Err(e) => {
            return ShellOutcome {
                success: false,
                output: format!("failed to spawn: {e}"),
                timed_out: false,
                duration_ms: start.elapsed().as_millis() as u64,
            }
        }
    };

    let child_pid = child.id();

    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> String {
        let mut buf = String::new();
        if let Some(mut r) = stdout_handle {
            use std::io::Read;
            let _ = r.read_to_string(&mut buf);
        }
        buf
    });
    let stderr_thread = std::thread::spawn(move || -> String {
        let mut buf = String::new();
        if let Some(mut r) = stderr_handle {
            use std::io::Read;
            let _ = r.read_to_string(&mut buf);
        }
        buf
    });

    let wait_result = match timeout {
        None => child.wait(),
        Some(timeout_dur) => {
            // The child is moved to the waiter thread; on timeout we kill by
            // PID. The waiter unblocks once the killed process exits and the
            // reader threads get EOF on the closed pipes.
            let (tx, rx) = std::sync::mpsc::channel();
            std::thread::spawn(move || {
                let _ = tx.send(child.wait());
            });

            match rx.recv_timeout(timeout_dur) {
                Ok(result) => result,
                Err(_) => {
                    kill_process(child_pid);
                    let secs = timeout_dur.as_secs_f64();
                    return ShellOutcome {
                        success: false,
                        output: format!("timed out after {secs}s"),
                        timed_out: true,
                        duration_ms: start.elapsed().as_millis() as u64,
                    };
                }
            }
        }
    };

    let stdout_buf = stdout_thread.join().unwrap_or_default();
    let stderr_buf = stderr_thread.join().unwrap_or_default();

    let status = match wait_result {
        Ok(s) => s,
        Err(e) => {
            return ShellOutcome {
                success: false,
                output: format!("wait failed: {e}"),
                timed_out: false,
                duration_ms: start.elapsed().as_millis() as u64,
            }
        }
    };

    let (success, output) = format_output(status.success(), &stdout_buf, &stderr_buf);
    ShellOutcome {
        success,
        output,
        timed_out: false,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

/// Combine stdout/stderr and cap to 10KB (keeping the tail).
fn format_output(success: bool, stdout: &str, stderr: &str) -> (bool, String) {
    let output = if stderr.is_empty() {
        stdout.to_string()
    } else if stdout.is_empty() {
        stderr.to_string()
    } else {
        format!("{stdout}\n{stderr}")
    };
    const MAX_OUTPUT: usize = 10 * 1024;
    let trimmed = output.trim();
    let capped = if trimmed.len() > MAX_OUTPUT {
        // Round the cut forward to a char boundary so multi-byte output
        // can never split a character.
        let mut idx = trimmed.len() - MAX_OUTPUT;
        while !trimmed.is_char_boundary(idx) {
            idx += 1;
        }
        &trimmed[idx..]
    } else {
        trimmed
    };
    (success, capped.to_string())
}

/// Terminate a process by PID using SIGKILL. Best-effort; errors are ignored.
fn kill_process(pid: u32) {
    let _ = Command::new("kill")
        .arg("-9")
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}
