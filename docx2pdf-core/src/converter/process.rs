//! Running a converter executable with a bounded wait.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, trace, warn};

use crate::error::ConvertError;

/// Upper bound on how much converter stderr is carried inside an error.
const STDERR_TAIL_BYTES: usize = 2048;

/// Spawn `cmd`, wait at most `timeout` for it to exit and translate the
/// outcome into a [`ConvertError`].
///
/// The child runs in its own process group. If the wait times out or the
/// returned future is dropped, the whole group is killed, so helper
/// processes the converter forked (LibreOffice's `soffice.bin`) cannot keep
/// writing into the caller's temp files afterwards.
pub(crate) async fn run(
    mut cmd: Command,
    program: &str,
    timeout: Duration,
) -> Result<(), ConvertError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    debug!(program, args = ?cmd.as_std().get_args().collect::<Vec<_>>(), "spawning converter");

    let child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConvertError::ConverterNotFound { program: program.to_owned() }
        } else {
            ConvertError::Spawn { program: program.to_owned(), source: e }
        }
    })?;

    let group = ProcessGroup(child.id());
    let started = Instant::now();
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => {
            group.disarm();
            output?
        }
        Err(_) => {
            warn!(
                program,
                timeout_secs = timeout.as_secs(),
                "converter timed out; killing process"
            );
            return Err(ConvertError::Timeout { program: program.to_owned(), timeout });
        }
    };

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        trace!(program, converter_stdout = %line, "converter log");
    }

    if !output.status.success() {
        let stderr = stderr_tail(&output.stderr);
        warn!(program, code = ?output.status.code(), stderr = %stderr, "converter failed");
        return Err(ConvertError::Failed {
            program: program.to_owned(),
            code: output.status.code(),
            stderr,
        });
    }

    debug!(program, elapsed_ms = started.elapsed().as_millis(), "converter finished");
    Ok(())
}

/// Kills the process group led by the child when dropped, unless the child
/// was waited for to completion.
struct ProcessGroup(Option<u32>);

impl ProcessGroup {
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        let Some(pgid) = self.0.take() else {
            return;
        };
        #[cfg(unix)]
        {
            // SAFETY: killpg takes plain integers and touches no memory.
            let rc = unsafe { libc::killpg(pgid as libc::pid_t, libc::SIGKILL) };
            if rc != 0 {
                let error = std::io::Error::last_os_error();
                debug!(pgid, error = %error, "process group already gone");
            } else {
                debug!(pgid, "killed converter process group");
            }
        }
        #[cfg(not(unix))]
        let _ = pgid;
    }
}

/// Last [`STDERR_TAIL_BYTES`] of `stderr`, trimmed, cut on a char boundary.
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_TAIL_BYTES {
        return text.to_owned();
    }
    let mut start = text.len() - STDERR_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}
