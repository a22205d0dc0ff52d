use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use nix::sys::signal::Signal;
use tokio::process::Command;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info, warn};

use crate::error::StartError;

// Shared runtime data, guarded by the supervisor's single lock.
// Both the tick path and the exit-watcher go through it.
pub type SupervisorState = Arc<Mutex<RuntimeJob>>;

pub struct RuntimeJob {
    pub process: ProcessHandle,
    pub consecutive_failures: u32,
}

/// A freshly launched child.
///
/// `exit` owns the OS child and resolves once it has been reaped. A message
/// on `kill` asks that future to kill the child; once the child is reaped
/// the receiver is gone and the request is dropped, so a pid is never
/// signalled after it could have been reused.
pub struct ChildHandle {
    pub pid: u32,
    pub kill: oneshot::Sender<()>,
    pub exit: BoxFuture<'static, io::Result<ExitStatus>>,
}

/// Launch seam between the supervisor and the OS.
pub trait ProcessSpawner: Send + Sync + 'static {
    fn spawn(&self, command: &str, args: &[String]) -> io::Result<ChildHandle>;
}

/// Real processes via `tokio::process`, output forwarded to our own stdout/stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandSpawner;

impl ProcessSpawner for CommandSpawner {
    fn spawn(&self, command: &str, args: &[String]) -> io::Result<ChildHandle> {
        let mut child = Command::new(command)
            .args(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;

        let pid = child
            .id()
            .ok_or_else(|| io::Error::other("child exited before its pid was read"))?;

        let (kill, kill_rx) = oneshot::channel();
        let exit = async move {
            tokio::select! {
                status = child.wait() => status,
                Ok(()) = kill_rx => {
                    // SIGKILL, through the owned handle
                    if let Err(e) = child.start_kill() {
                        warn!(pid, error = %e, "failed to kill app");
                    }
                    child.wait().await
                }
            }
        };

        Ok(ChildHandle {
            pid,
            kill,
            exit: exit.boxed(),
        })
    }
}

#[derive(Debug)]
struct Tracked {
    pid: u32,
    launch: u64,
    kill: oneshot::Sender<()>,
}

/// Owner of at most one running child.
pub struct ProcessHandle {
    spawner: Arc<dyn ProcessSpawner>,
    current: Option<Tracked>,
    launches: u64,
}

impl ProcessHandle {
    pub(crate) fn new(spawner: Arc<dyn ProcessSpawner>) -> Self {
        Self {
            spawner,
            current: None,
            launches: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    pub fn pid(&self) -> Option<u32> {
        self.current.as_ref().map(|t| t.pid)
    }

    /*
        @@@
        @start();
        . Refuses to launch while a child is tracked (AlreadyRunning).
        . Launches the command, records it under a fresh launch id.
        . Detaches an exit-watcher that clears the handle under the shared lock once the child terminates.
    */
    pub(crate) fn start(
        &mut self,
        command: &str,
        args: &[String],
        state: &SupervisorState,
    ) -> Result<u32, StartError> {
        if let Some(tracked) = &self.current {
            return Err(StartError::AlreadyRunning { pid: tracked.pid });
        }

        info!(command, "Starting app");
        let child = self.spawner.spawn(command, args).map_err(StartError::Spawn)?;

        self.launches += 1;
        let (pid, launch) = (child.pid, self.launches);
        self.current = Some(Tracked {
            pid,
            launch,
            kill: child.kill,
        });
        info!(pid, "App started");

        watch_exit(state.clone(), pid, launch, child.exit);
        Ok(pid)
    }

    /// Kill the tracked child, if any, and forget it right away.
    pub(crate) fn stop(&mut self) {
        let Some(tracked) = self.current.take() else {
            return;
        };

        info!(pid = tracked.pid, "Stopping app");
        if tracked.kill.send(()).is_err() {
            info!(pid = tracked.pid, "App already exited");
        }
    }

    // Called by the exit-watcher. A watcher for an older launch must not
    // clear a child started after it.
    fn clear_if_current(&mut self, launch: u64) -> bool {
        if self.current.as_ref().is_some_and(|t| t.launch == launch) {
            self.current = None;
            true
        } else {
            false
        }
    }
}

fn watch_exit(
    state: SupervisorState,
    pid: u32,
    launch: u64,
    exit: BoxFuture<'static, io::Result<ExitStatus>>,
) {
    tokio::spawn(async move {
        let status = exit.await;

        let mut job = state.lock().await;
        match &status {
            Ok(s) if s.success() => info!(pid, "App exited normally"),
            Ok(s) => warn!(pid, cause = %describe_exit(s), "App exited with error"),
            Err(e) => error!(pid, error = %e, "App exited with error"),
        }
        job.process.clear_if_current(launch);
    });
}

/// Human readable exit cause: `exit code 3`, `killed by SIGKILL`.
pub fn describe_exit(status: &ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exit code {code}");
    }
    match status.signal() {
        Some(raw) => match Signal::try_from(raw) {
            Ok(sig) => format!("killed by {}", sig.as_str()),
            Err(_) => format!("killed by signal {raw}"),
        },
        None => "unknown exit cause".to_string(),
    }
}
