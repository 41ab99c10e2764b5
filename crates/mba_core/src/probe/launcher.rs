//! ffprobe process launching and output streaming.
//!
//! Both probe passes (JSON metadata, per-packet listing) go through
//! `ProbeStream`: stdout is piped for forward reading while a background
//! thread drains stderr, so a chatty probe can never deadlock on a full
//! pipe buffer.

use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

use crate::probe::types::{ProbeError, ProbeResult};

/// The probe executable, resolved through PATH.
pub const PROBE_TOOL: &str = "ffprobe";

/// Verify that ffprobe can be launched at all.
///
/// Runs `ffprobe -version` and discards its output. A missing executable
/// is the only fatal startup condition; callers should check this once
/// before starting any batch.
pub fn ensure_available() -> ProbeResult<()> {
    let spawned = Command::new(PROBE_TOOL)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    match spawned {
        Ok(mut child) => {
            let _ = child.wait();
            Ok(())
        }
        Err(e) => Err(map_spawn_error(e)),
    }
}

fn map_spawn_error(e: std::io::Error) -> ProbeError {
    if e.kind() == std::io::ErrorKind::NotFound {
        ProbeError::tool_not_found(PROBE_TOOL)
    } else {
        ProbeError::launch_failed(PROBE_TOOL, e)
    }
}

/// Exit status of a finished probe process.
#[derive(Debug)]
pub struct ProbeExit {
    pub success: bool,
    pub code: i32,
    /// Everything the process wrote to stderr.
    pub stderr: String,
}

impl ProbeExit {
    /// Convert a non-zero exit into `ProbeFailed` carrying the captured
    /// stderr text.
    pub fn into_result(self) -> ProbeResult<()> {
        if self.success {
            Ok(())
        } else {
            Err(ProbeError::probe_failed(
                PROBE_TOOL,
                self.code,
                self.stderr.trim().to_string(),
            ))
        }
    }
}

/// Handle over a running ffprobe process.
pub struct ProbeStream {
    child: Child,
    stdout: Option<BufReader<ChildStdout>>,
    stderr_thread: Option<JoinHandle<String>>,
}

impl ProbeStream {
    /// Spawn ffprobe with the given argument vector.
    pub fn spawn<I, S>(args: I) -> ProbeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(PROBE_TOOL);
        cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());

        tracing::debug!("Running probe: {:?}", cmd);

        let mut child = cmd.spawn().map_err(map_spawn_error)?;

        let stdout = child
            .stdout
            .take()
            .map(|out| BufReader::with_capacity(64 * 1024, out));

        let stderr_handle = child.stderr.take();
        let stderr_thread = thread::spawn(move || {
            let mut text = String::new();
            if let Some(mut err) = stderr_handle {
                let _ = err.read_to_string(&mut text);
            }
            text
        });

        Ok(Self {
            child,
            stdout,
            stderr_thread: Some(stderr_thread),
        })
    }

    /// Iterate over stdout lines in a single forward pass.
    ///
    /// Iteration stops at the first read error; lines read before that
    /// point are yielded as-is.
    pub fn lines(&mut self) -> impl Iterator<Item = String> {
        self.stdout
            .take()
            .into_iter()
            .flat_map(|reader| reader.lines().map_while(Result::ok))
    }

    /// Read the rest of stdout into one string.
    pub fn read_to_string(&mut self) -> ProbeResult<String> {
        let mut text = String::new();
        if let Some(mut reader) = self.stdout.take() {
            reader
                .read_to_string(&mut text)
                .map_err(|e| ProbeError::io("reading probe stdout", e))?;
        }
        Ok(text)
    }

    /// Wait for the process to exit and collect its stderr.
    pub fn wait(mut self) -> ProbeResult<ProbeExit> {
        // Closing our end of the pipe lets the process finish even if
        // the caller stopped reading mid-stream.
        drop(self.stdout.take());
        let status = self
            .child
            .wait()
            .map_err(|e| ProbeError::io("waiting for probe exit", e))?;
        let stderr = self
            .stderr_thread
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        Ok(ProbeExit {
            success: status.success(),
            code: status.code().unwrap_or(-1),
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_executable_maps_to_tool_not_found() {
        let e = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(matches!(map_spawn_error(e), ProbeError::ToolNotFound { .. }));
    }

    #[test]
    fn other_spawn_errors_map_to_launch_failed() {
        let e = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(map_spawn_error(e), ProbeError::LaunchFailed { .. }));
    }

    #[test]
    fn failed_exit_carries_stderr() {
        let exit = ProbeExit {
            success: false,
            code: 1,
            stderr: "  something went wrong\n".to_string(),
        };
        match exit.into_result() {
            Err(ProbeError::ProbeFailed {
                exit_code, stderr, ..
            }) => {
                assert_eq!(exit_code, 1);
                assert_eq!(stderr, "something went wrong");
            }
            other => panic!("unexpected: {:?}", other.err()),
        }
    }

    #[test]
    fn successful_exit_is_ok() {
        let exit = ProbeExit {
            success: true,
            code: 0,
            stderr: String::new(),
        };
        assert!(exit.into_result().is_ok());
    }
}
