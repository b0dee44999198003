//! Spawning the platform CLI.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pat_testing::TimeoutTier;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::CfError;
use crate::session::{Exit, Session};

/// How long to keep draining output after a command was killed. Children the
/// CLI forked may hold the pipes open past the kill.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

const REDACTED: &str = "[REDACTED]";

/// A configured CLI invocation template.
///
/// Each [`Cf::run`] spawns a fresh process; the builder values apply to all of
/// them. Cloning is cheap enough to derive variants per scenario.
#[derive(Debug, Clone)]
pub struct Cf {
    binary: PathBuf,
    home: Option<PathBuf>,
    env: BTreeMap<String, String>,
    stdin: Option<String>,
    timeout_scale: f64,
}

impl Cf {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            home: None,
            env: BTreeMap::new(),
            stdin: None,
            timeout_scale: 1.0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.cf_binary).with_timeout_scale(config.timeout_scale)
    }

    /// Runs every command with `CF_HOME` set to `home`.
    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Overlays one variable on the inherited environment.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Feeds `text` to every command's stdin.
    #[must_use]
    pub fn with_stdin(mut self, text: impl Into<String>) -> Self {
        self.stdin = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_timeout_scale(mut self, scale: f64) -> Self {
        self.timeout_scale = scale;
        self
    }

    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    #[must_use]
    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Deadline for `tier` under this runner's scale.
    #[must_use]
    pub fn timeout(&self, tier: TimeoutTier) -> Duration {
        tier.scaled(self.timeout_scale)
    }

    /// Runs the CLI with the deadline of `tier`.
    pub async fn run<I, S>(&self, args: I, tier: TimeoutTier) -> Result<Session, CfError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.run_for(args, self.timeout(tier)).await
    }

    /// Runs the CLI, killing it if it is still running after `limit`.
    ///
    /// Any exit status is a successful run; only a failure to spawn or wait
    /// is an error.
    pub async fn run_for<I, S>(&self, args: I, limit: Duration) -> Result<Session, CfError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        let shown = redact(&args);
        let command_line = format!("cf {}", shown.join(" "));

        let mut command = Command::new(&self.binary);
        command
            .args(&args)
            .envs(&self.env)
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(home) = &self.home {
            command.env("CF_HOME", home);
        }

        debug!(command = %command_line, timeout = ?limit, "running");
        let start = Instant::now();
        let mut child = command.spawn().map_err(|source| CfError::Spawn {
            binary: self.binary.clone(),
            source,
        })?;

        if let (Some(text), Some(mut stdin)) = (self.stdin.clone(), child.stdin.take()) {
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(text.as_bytes()).await {
                    debug!(error = %e, "stdin closed before all input was written");
                }
            });
        }

        let stdout = Capture::start(child.stdout.take());
        let stderr = Capture::start(child.stderr.take());

        let exit = match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => exit_from(status.map_err(|source| CfError::Wait {
                command: command_line.clone(),
                source,
            })?),
            Err(_) => {
                warn!(command = %command_line, timeout = ?limit, "deadline passed, killing");
                if let Err(e) = child.kill().await {
                    warn!(command = %command_line, error = %e, "kill failed");
                }
                Exit::TimedOut(limit)
            }
        };

        let session = Session {
            args: shown,
            exit,
            stdout: stdout.finish().await,
            stderr: stderr.finish().await,
            elapsed: start.elapsed(),
        };
        debug!(
            command = %command_line,
            exit = %session.exit,
            elapsed = ?session.elapsed,
            "finished"
        );
        Ok(session)
    }
}

/// A pipe drained into a shared buffer as output arrives.
struct Capture {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: Option<JoinHandle<()>>,
}

impl Capture {
    fn start<R>(reader: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let task = reader.map(|mut reader| {
            let buffer = Arc::clone(&buffer);
            tokio::spawn(async move {
                let mut chunk = [0u8; 8192];
                loop {
                    match reader.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if let Ok(mut buf) = buffer.lock() {
                                buf.extend_from_slice(&chunk[..n]);
                            }
                        }
                    }
                }
            })
        });
        Self { buffer, task }
    }

    async fn finish(self) -> String {
        if let Some(mut task) = self.task {
            if tokio::time::timeout(DRAIN_GRACE, &mut task).await.is_err() {
                task.abort();
            }
        }
        let bytes = match self.buffer.lock() {
            Ok(buf) => buf.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

fn redact(args: &[String]) -> Vec<String> {
    let mut shown = args.to_vec();
    if shown.first().map(String::as_str) == Some("auth") && shown.len() > 2 {
        shown[2] = REDACTED.to_string();
    }
    shown
}

fn exit_from(status: ExitStatus) -> Exit {
    match status.code() {
        Some(code) => Exit::Code(code),
        None => Exit::Signal(signal_of(status)),
    }
}

#[cfg(unix)]
fn signal_of(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal_of(_status: ExitStatus) -> Option<i32> {
    None
}
