use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// How long to keep reading pipes once the child is gone. Grandchildren that
/// survived the kill may hold them open indefinitely.
pub const DRAIN_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum Completion {
    Exited(ExitStatus),
    TimedOut(Duration),
}

/// Outcome of a child run with both streams captured as lossy UTF-8.
#[derive(Debug)]
pub struct Captured {
    pub completion: Completion,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

enum Chunk {
    Data(Stream, Vec<u8>),
    Eof,
    Failed(&'static str, std::io::Error),
}

/// Spawn `cmd` with piped stdout/stderr and wait for it, killing the child's
/// process group once `timeout` elapses. `None` waits indefinitely.
pub fn run_captured(cmd: &mut Command, timeout: Option<Duration>) -> Result<Captured, ProcessError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let started = Instant::now();
    let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
        program: program.clone(),
        source,
    })?;
    debug!(pid = child.id(), %program, "spawned");

    // Drain pipes while waiting so a chatty engine can't block on a full
    // stdout/stderr buffer.
    let (tx, rx) = mpsc::channel();
    let readers = [
        spawn_reader(child.stdout.take(), Stream::Stdout, "read stdout", tx.clone()),
        spawn_reader(child.stderr.take(), Stream::Stderr, "read stderr", tx),
    ];

    let waited = wait_or_kill(&mut child, timeout, started);
    if waited.is_err() {
        kill_tree(&mut child);
        let _ = child.wait();
    }
    let drained = drain(&rx, readers, DRAIN_GRACE);
    let completion = waited?;
    let (stdout, stderr) = drained?;

    Ok(Captured {
        completion,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        elapsed: started.elapsed(),
    })
}

fn wait_or_kill(
    child: &mut Child,
    timeout: Option<Duration>,
    started: Instant,
) -> Result<Completion, ProcessError> {
    loop {
        let polled = child.try_wait().map_err(|source| ProcessError::Io {
            context: "try_wait",
            source,
        })?;
        if let Some(status) = polled {
            return Ok(Completion::Exited(status));
        }

        if let Some(limit) = timeout {
            if started.elapsed() > limit {
                warn!(pid = child.id(), "process timed out after {:?}", limit);
                kill_tree(child);
                child.wait().map_err(|source| ProcessError::Io {
                    context: "wait after kill",
                    source,
                })?;
                return Ok(Completion::TimedOut(limit));
            }
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Kill the child and everything it started in its process group.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: plain kill(2) on the group created by `process_group(0)`.
            unsafe {
                libc::kill(-pgid, libc::SIGKILL);
            }
        }
    }
    // The child may have exited between the poll and the kill.
    let _ = child.kill();
}

fn spawn_reader<R: Read + Send + 'static>(
    reader: Option<R>,
    stream: Stream,
    context: &'static str,
    tx: Sender<Chunk>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let Some(mut r) = reader else {
            let _ = tx.send(Chunk::Eof);
            return;
        };
        let mut buf = [0u8; 8192];
        loop {
            match r.read(&mut buf) {
                Ok(0) => {
                    let _ = tx.send(Chunk::Eof);
                    return;
                }
                Ok(n) => {
                    if tx.send(Chunk::Data(stream, buf[..n].to_vec())).is_err() {
                        return;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    let _ = tx.send(Chunk::Failed(context, e));
                    return;
                }
            }
        }
    })
}

/// Collect reader output until both pipes close or `grace` runs out.
/// Readers that finished are joined; stragglers end on their own once the
/// last holder of the pipe exits.
fn drain(
    rx: &Receiver<Chunk>,
    readers: [JoinHandle<()>; 2],
    grace: Duration,
) -> Result<(Vec<u8>, Vec<u8>), ProcessError> {
    let deadline = Instant::now() + grace;
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut open = readers.len();
    let mut failure = None;

    while open > 0 {
        let left = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(left) {
            Ok(Chunk::Data(Stream::Stdout, bytes)) => stdout.extend_from_slice(&bytes),
            Ok(Chunk::Data(Stream::Stderr, bytes)) => stderr.extend_from_slice(&bytes),
            Ok(Chunk::Eof) => open -= 1,
            Ok(Chunk::Failed(context, source)) => {
                open -= 1;
                failure.get_or_insert(ProcessError::Io { context, source });
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!("output pipes still open {:?} after exit; keeping partial output", grace);
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if open == 0 {
        for handle in readers {
            let _ = handle.join();
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok((stdout, stderr)),
    }
}
