//! Lifecycle of the supervised server process.
//!
//! One async mutex guards the status, the console pipe and the run
//! bookkeeping. A watcher task owns the `Child` for each run and publishes
//! its exit through a watch channel, so `stop` waits without holding the
//! lock and `status` never blocks on the child.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use papervisor_core::{LaunchSpec, ServerController, ServerError, ServerStatus, Settings};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex, oneshot, watch};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::pipeline::{spawn_log_pipeline, spawn_stderr_drain};
use super::shutdown::kill_and_reap;
use crate::console::Console;
use crate::sessions::SessionTracker;

/// Console command that shuts the server down cleanly.
pub const STOP_COMMAND: &str = "stop";

const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

type ExitOutcome = Result<ExitStatus, String>;

/// How to launch and stop the server.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub launch: LaunchSpec,
    /// Kill the server if it has not exited this long after `stop`.
    pub stop_timeout: Option<Duration>,
    /// Upper bound on one console write.
    pub command_timeout: Duration,
}

impl SupervisorConfig {
    pub const fn new(launch: LaunchSpec) -> Self {
        Self {
            launch,
            stop_timeout: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            launch: settings.launch_spec(),
            stop_timeout: settings.stop_timeout,
            command_timeout: settings.command_timeout,
        }
    }

    #[must_use]
    pub fn with_stop_timeout(mut self, limit: Duration) -> Self {
        self.stop_timeout = Some(limit);
        self
    }

    #[must_use]
    pub fn with_command_timeout(mut self, limit: Duration) -> Self {
        self.command_timeout = limit;
        self
    }
}

#[derive(Default)]
struct State {
    status: ServerStatus,
    stdin: Option<ChildStdin>,
    pid: Option<u32>,
    /// Incremented on every successful start.
    run: u64,
    /// Set while `stop` owns the teardown of the current run.
    stopping: bool,
    exit_rx: Option<watch::Receiver<Option<ExitOutcome>>>,
    kill_tx: Option<oneshot::Sender<()>>,
}

impl State {
    fn clear(&mut self) {
        self.status = ServerStatus::Stopped;
        self.stdin = None;
        self.pid = None;
        self.stopping = false;
        self.exit_rx = None;
        self.kill_tx = None;
    }
}

struct Inner {
    config: SupervisorConfig,
    state: Mutex<State>,
    console: Arc<Console>,
    sessions: SessionTracker,
}

/// Owner of the server process. Cheap to clone.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Inner>,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig, console: Arc<Console>, sessions: SessionTracker) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(State::default()),
                console,
                sessions,
            }),
        }
    }

    pub fn console(&self) -> &Arc<Console> {
        &self.inner.console
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.inner.sessions
    }

    /// Spawn the server and start streaming its output.
    pub async fn start(&self) -> Result<(), ServerError> {
        let mut state = self.inner.state.lock().await;
        if state.status != ServerStatus::Stopped {
            return Err(ServerError::AlreadyRunning);
        }
        state.status = ServerStatus::Starting;

        let launch = &self.inner.config.launch;
        info!(
            program = %launch.program.display(),
            work_dir = %launch.work_dir.display(),
            args = ?launch.args,
            "Starting server"
        );

        let mut child = match build_command(launch).spawn() {
            Ok(child) => child,
            Err(e) => {
                state.status = ServerStatus::Stopped;
                error!(error = %e, "Failed to spawn server");
                return Err(ServerError::Spawn(e.to_string()));
            }
        };

        let (stdin, stdout, stderr) = match take_pipes(&mut child) {
            Ok(pipes) => pipes,
            Err(missing) => {
                if let Err(e) = kill_and_reap(&mut child).await {
                    warn!(error = %e, "Failed to reap server after pipe setup failure");
                }
                state.status = ServerStatus::Stopped;
                return Err(ServerError::PipeUnavailable(missing));
            }
        };

        state.run += 1;
        let run = state.run;
        let (exit_tx, exit_rx) = watch::channel(None);
        let (kill_tx, kill_rx) = oneshot::channel();
        state.pid = child.id();
        state.stdin = Some(stdin);
        state.exit_rx = Some(exit_rx);
        state.kill_tx = Some(kill_tx);
        state.stopping = false;
        state.status = ServerStatus::Running;

        self.inner.sessions.begin(run);
        spawn_log_pipeline(
            stdout,
            run,
            self.inner.console.clone(),
            self.inner.sessions.clone(),
        );
        spawn_stderr_drain(stderr, self.inner.console.clone());
        tokio::spawn(watch_exit(
            self.inner.clone(),
            child,
            run,
            exit_tx,
            kill_rx,
        ));

        info!(pid = ?state.pid, run, "Server started");
        Ok(())
    }

    /// Send `stop` and wait for the process to exit.
    ///
    /// The status is `Stopped` when this returns, whatever the outcome.
    pub async fn stop(&self) -> Result<(), ServerError> {
        let (run, mut exit_rx, mut kill_tx, sent) = {
            let mut state = self.inner.state.lock().await;
            if !state.status.is_running() {
                return Err(ServerError::AlreadyStopped);
            }
            let Some(exit_rx) = state.exit_rx.clone() else {
                state.clear();
                return Err(ServerError::AlreadyStopped);
            };
            let run = state.run;

            // The process can exit on its own before its watcher gets the lock.
            let exited = exit_rx.borrow().clone();
            if let Some(outcome) = exited {
                state.clear();
                self.inner.sessions.end(run);
                drop(state);
                let description = describe(&outcome);
                info!(run, %description, "Server had already exited");
                self.inner
                    .console
                    .broadcast(format!("[System] Server had already exited ({description})"));
                return exit_result(outcome);
            }

            state.stopping = true;
            let sent = match state.stdin.as_mut() {
                Some(stdin) => {
                    write_line(stdin, STOP_COMMAND, self.inner.config.command_timeout).await
                }
                None => Err(ServerError::NoInputPipe),
            };
            (run, exit_rx, state.kill_tx.take(), sent)
        };

        info!(run, "Stopping server");
        if let Err(e) = &sent {
            warn!(error = %e, "Could not send stop command, killing server");
            request_kill(&mut kill_tx);
        }

        let mut timed_out = None;
        let outcome = match self.inner.config.stop_timeout {
            Some(limit) if sent.is_ok() => {
                if let Ok(outcome) = timeout(limit, wait_for_exit(&mut exit_rx)).await {
                    outcome
                } else {
                    warn!(run, timeout_secs = limit.as_secs(), "Server ignored stop, killing");
                    timed_out = Some(limit);
                    request_kill(&mut kill_tx);
                    wait_for_exit(&mut exit_rx).await
                }
            }
            _ => wait_for_exit(&mut exit_rx).await,
        };

        {
            let mut state = self.inner.state.lock().await;
            if state.run == run {
                state.clear();
            }
            // Queued under the lock so it cannot overtake the next run's begin.
            self.inner.sessions.end(run);
        }
        info!(run, outcome = ?outcome, "Server stopped");

        if let Some(limit) = timed_out {
            return Err(ServerError::StopTimedOut(limit.as_secs()));
        }
        sent?;
        exit_result(outcome)
    }

    /// Write one console command followed by a newline.
    pub async fn send_command(&self, command: &str) -> Result<(), ServerError> {
        let mut state = self.inner.state.lock().await;
        if !state.status.is_running() {
            return Err(ServerError::NotRunning);
        }
        let stdin = state.stdin.as_mut().ok_or(ServerError::NoInputPipe)?;
        debug!(command, "Sending console command");
        write_line(stdin, command, self.inner.config.command_timeout).await
    }

    pub async fn status(&self) -> ServerStatus {
        self.inner.state.lock().await.status
    }

    /// OS process id while running.
    pub async fn pid(&self) -> Option<u32> {
        let state = self.inner.state.lock().await;
        state.status.is_running().then_some(state.pid).flatten()
    }
}

#[async_trait]
impl ServerController for Supervisor {
    async fn start(&self) -> Result<(), ServerError> {
        Self::start(self).await
    }

    async fn stop(&self) -> Result<(), ServerError> {
        Self::stop(self).await
    }

    async fn send_command(&self, command: &str) -> Result<(), ServerError> {
        Self::send_command(self, command).await
    }

    async fn status(&self) -> ServerStatus {
        Self::status(self).await
    }
}

fn build_command(launch: &LaunchSpec) -> Command {
    let mut cmd = Command::new(&launch.program);
    cmd.args(&launch.args)
        .current_dir(&launch.work_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

fn take_pipes(child: &mut Child) -> Result<(ChildStdin, ChildStdout, ChildStderr), &'static str> {
    let stdin = child.stdin.take().ok_or("stdin")?;
    let stdout = child.stdout.take().ok_or("stdout")?;
    let stderr = child.stderr.take().ok_or("stderr")?;
    Ok((stdin, stdout, stderr))
}

async fn write_line(stdin: &mut ChildStdin, line: &str, limit: Duration) -> Result<(), ServerError> {
    let payload = format!("{line}\n");
    let write = async {
        stdin.write_all(payload.as_bytes()).await?;
        stdin.flush().await
    };
    match timeout(limit, write).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ServerError::Io(e.to_string())),
        Err(_) => Err(ServerError::CommandTimedOut(limit.as_secs())),
    }
}

fn request_kill(kill_tx: &mut Option<oneshot::Sender<()>>) {
    if let Some(tx) = kill_tx.take() {
        let _ = tx.send(());
    }
}

fn describe(outcome: &ExitOutcome) -> String {
    match outcome {
        Ok(status) => status.to_string(),
        Err(e) => e.clone(),
    }
}

fn exit_result(outcome: ExitOutcome) -> Result<(), ServerError> {
    match outcome {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(ServerError::Wait(status.to_string())),
        Err(e) => Err(ServerError::Wait(e)),
    }
}

async fn wait_for_exit(exit_rx: &mut watch::Receiver<Option<ExitOutcome>>) -> ExitOutcome {
    match exit_rx.wait_for(Option::is_some).await {
        Ok(value) => match &*value {
            Some(outcome) => outcome.clone(),
            None => Err("exit status unavailable".to_string()),
        },
        Err(_) => Err("exit watcher ended without reporting".to_string()),
    }
}

/// Owns the child for one run. Reports the exit and, if nobody was
/// stopping the server, tears the run down itself.
async fn watch_exit(
    inner: Arc<Inner>,
    mut child: Child,
    run: u64,
    exit_tx: watch::Sender<Option<ExitOutcome>>,
    kill_rx: oneshot::Receiver<()>,
) {
    let exited = tokio::select! {
        status = child.wait() => Some(status),
        Ok(()) = kill_rx => None,
    };
    let outcome = match exited {
        Some(status) => status,
        None => kill_and_reap(&mut child).await,
    }
    .map_err(|e| e.to_string());

    exit_tx.send_replace(Some(outcome.clone()));

    let mut state = inner.state.lock().await;
    // A newer run, a `stop` in progress, or a `stop` that already saw the exit.
    if state.run != run || state.stopping || !state.status.is_running() {
        return;
    }
    state.clear();
    inner.sessions.end(run);
    drop(state);

    let description = describe(&outcome);
    warn!(run, %description, "Server exited unexpectedly");
    inner
        .console
        .broadcast(format!("[System] Server exited unexpectedly ({description})"));
}
