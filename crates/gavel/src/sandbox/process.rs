//! Process spawning and I/O
//!
//! Spawns one command, feeds its stdin, drains its output and enforces the
//! wall clock limit.

use std::os::unix::process::ExitStatusExt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::sandbox::SandboxError;
use crate::sandbox::command::SandboxCommand;

/// How long output readers may keep running once the process group is gone.
/// A descendant that left the group can keep the pipes open indefinitely.
const READER_GRACE: Duration = Duration::from_secs(1);

const READ_CHUNK: usize = 8192;

/// What a finished process left behind
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Exit code if the process exited normally
    pub exit_code: Option<i32>,

    /// Signal number if the process was killed by a signal
    pub signal: Option<i32>,

    pub stdout: Vec<u8>,

    pub stderr: Vec<u8>,

    pub wall_time: Duration,

    /// Whether either stream was cut at the output cap
    pub truncated: bool,
}

impl ProcessOutput {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Run a command to completion or until its wall clock limit
///
/// The command runs as the leader of its own process group. Whether it
/// exits or times out, the whole group is killed before this returns, so
/// background children cannot outlive the call. On timeout the leader is
/// also reaped before [`SandboxError::TimedOut`] is returned.
#[instrument(skip(command), fields(program = ?command.program()))]
pub async fn run_process(command: SandboxCommand) -> Result<ProcessOutput, SandboxError> {
    let program = command
        .program()
        .ok_or(SandboxError::EmptyCommand)?
        .to_owned();
    let limit = command.timeout_duration();
    let max_output = command.max_output_bytes();

    debug!(argv = ?command.argv(), ?limit, "spawning process");

    let start = Instant::now();
    let mut child = command
        .build()?
        .spawn()
        .map_err(|source| SandboxError::SpawnFailed {
            program: program.clone(),
            source,
        })?;
    let mut group = ProcessGroup::of(&child);

    let stdin_task = child.stdin.take().map(|mut stdin| {
        let data = command.stdin_data().to_vec();
        tokio::spawn(async move {
            // The program may exit without reading its input
            if let Err(e) = stdin.write_all(&data).await
                && e.kind() != std::io::ErrorKind::BrokenPipe
            {
                debug!(error = %e, "failed to write stdin");
            }
            // stdin is dropped here, signalling EOF
        })
    });
    let stdout_task = child.stdout.take().map(|out| spawn_reader(out, max_output));
    let stderr_task = child.stderr.take().map(|err| spawn_reader(err, max_output));

    let (status, timed_out) = match tokio::time::timeout(limit, child.wait()).await {
        Ok(status) => {
            let status = status?;
            group.kill();
            (Some(status), false)
        }
        Err(_) => {
            debug!(?limit, "wall clock limit exceeded, killing process group");
            group.kill();
            // kill() also waits, so the leader is reaped once this returns
            if let Err(e) = child.kill().await {
                warn!(error = %e, "failed to kill timed out process");
            }
            (None, true)
        }
    };
    let wall_time = start.elapsed();

    if let Some(task) = stdin_task {
        task.abort();
    }
    let (stdout, stdout_truncated) = collect(stdout_task).await;
    let (stderr, stderr_truncated) = collect(stderr_task).await;
    let truncated = stdout_truncated || stderr_truncated;
    if truncated {
        warn!(max_output, "process output truncated");
    }

    let mut output = ProcessOutput {
        exit_code: None,
        signal: None,
        stdout,
        stderr,
        wall_time,
        truncated,
    };

    if timed_out {
        return Err(SandboxError::TimedOut {
            limit,
            partial: Box::new(output),
        });
    }

    if let Some(status) = status {
        output.exit_code = status.code();
        output.signal = status.signal();
    }

    debug!(
        exit_code = ?output.exit_code,
        signal = ?output.signal,
        wall_time = ?output.wall_time,
        "process finished"
    );

    Ok(output)
}

/// The process group led by a spawned child
///
/// Dropping it kills the group, which covers a caller that abandons the
/// future mid-run.
#[derive(Debug)]
struct ProcessGroup {
    pgid: Option<libc::pid_t>,
}

impl ProcessGroup {
    fn of(child: &tokio::process::Child) -> Self {
        let pgid = child.id().and_then(|id| libc::pid_t::try_from(id).ok());
        Self { pgid }
    }

    /// SIGKILL every process still in the group, once
    fn kill(&mut self) {
        let Some(pgid) = self.pgid.take() else {
            return;
        };
        // SAFETY: killpg has no memory effects; the group was created by
        // `process_group(0)` at spawn time
        if unsafe { libc::killpg(pgid, libc::SIGKILL) } == 0 {
            return;
        }
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!(pgid, error = %err, "failed to kill process group");
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[derive(Debug, Default)]
struct Captured {
    kept: Vec<u8>,
    truncated: bool,
}

/// A stream being drained on its own task
///
/// Bytes land in a shared buffer as they are read, so whatever arrived is
/// still there if the task has to be abandoned.
struct OutputReader {
    captured: Arc<Mutex<Captured>>,
    task: JoinHandle<std::io::Result<()>>,
}

/// Drain a stream, keeping at most `limit` bytes
///
/// Reading continues past the limit so the writer never blocks on a full pipe.
fn spawn_reader<R>(mut reader: R, limit: usize) -> OutputReader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let captured = Arc::new(Mutex::new(Captured::default()));
    let sink = Arc::clone(&captured);
    let task = tokio::spawn(async move {
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                return Ok(());
            }
            let mut buf = sink.lock().unwrap_or_else(PoisonError::into_inner);
            let room = limit.saturating_sub(buf.kept.len());
            if room < n {
                buf.truncated = true;
            }
            buf.kept.extend_from_slice(&chunk[..n.min(room)]);
        }
    });
    OutputReader { captured, task }
}

async fn collect(reader: Option<OutputReader>) -> (Vec<u8>, bool) {
    let Some(OutputReader { captured, mut task }) = reader else {
        return (Vec::new(), false);
    };
    match tokio::time::timeout(READER_GRACE, &mut task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => warn!(error = %e, "failed to read process output"),
        Ok(Err(e)) => warn!(error = %e, "output reader task failed"),
        Err(_) => {
            task.abort();
            warn!("output stream still open after exit, keeping what was read");
        }
    }
    let mut captured = captured.lock().unwrap_or_else(PoisonError::into_inner);
    (std::mem::take(&mut captured.kept), captured.truncated)
}
