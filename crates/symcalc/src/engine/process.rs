//! Native engine session: a long-lived Python worker process
//!
//! The worker runs [`ENGINE_PROGRAM`] as a script and speaks the JSON-lines
//! envelope from [`super::protocol`] over its stdin/stdout. One worker is
//! started by `open_session` and reused for every later call.

use super::protocol::{ensure_mode, EngineCommand, EngineReply};
use super::{MathEngine, SamplingPlan, ENGINE_PROGRAM};
use crate::core::{CalculationRequest, CalculationResult, EngineError, EngineResult};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Default interpreter looked up on `PATH`
pub const DEFAULT_PYTHON: &str = "python3";

#[derive(Debug)]
struct WorkerSession {
    // Held so the worker is killed when the session goes away
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl WorkerSession {
    async fn roundtrip(&mut self, line: &str) -> EngineResult<EngineReply> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> EngineResult<EngineReply> {
        match self.stdout.next_line().await? {
            Some(line) => EngineReply::parse(&line),
            None => Err(EngineError::protocol("engine process closed its output")),
        }
    }
}

/// Python worker process implementing [`MathEngine`]
#[derive(Debug)]
pub struct ProcessEngine {
    python: String,
    session: Mutex<Option<WorkerSession>>,
}

impl Default for ProcessEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PYTHON)
    }
}

impl ProcessEngine {
    /// Creates an engine that will launch `python` on `open_session`
    #[must_use]
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
            session: Mutex::new(None),
        }
    }

    /// Interpreter this engine launches
    #[must_use]
    pub fn python(&self) -> &str {
        &self.python
    }

    /// Whether a worker is running
    pub async fn is_open(&self) -> bool {
        self.session.lock().await.is_some()
    }

    async fn send(&self, command: &EngineCommand<'_>) -> EngineResult<EngineReply> {
        let line = command.to_line()?;
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(EngineError::SessionUnavailable)?;
        debug!(bytes = line.len(), "engine command");
        session.roundtrip(&line).await
    }
}

#[async_trait(?Send)]
impl MathEngine for ProcessEngine {
    async fn open_session(&self) -> EngineResult<()> {
        let mut guard = self.session.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        let mut child = Command::new(&self.python)
            .arg("-u")
            .arg("-c")
            .arg(ENGINE_PROGRAM)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::startup(format!("cannot launch {}: {e}", self.python)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::startup("worker stdin not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::startup("worker stdout not captured"))?;

        let mut session = WorkerSession {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        let greeting = session
            .read_reply()
            .await
            .map_err(|e| EngineError::startup(e.to_string()))?;
        if !greeting.ready {
            return Err(EngineError::startup("worker did not report ready"));
        }

        info!(python = %self.python, "engine worker started");
        *guard = Some(session);
        Ok(())
    }

    async fn load_package(&self, name: &str) -> EngineResult<()> {
        self.send(&EngineCommand::Load { package: name })
            .await?
            .into_ack()
            .map_err(|e| EngineError::package_load(name, e.to_string()))
    }

    async fn evaluate(
        &self,
        request: &CalculationRequest,
        plan: &SamplingPlan,
    ) -> EngineResult<CalculationResult> {
        let reply = self.send(&EngineCommand::Evaluate { request, plan }).await?;
        ensure_mode(request, reply.into_result()?)
    }

    fn name(&self) -> &str {
        "python-worker"
    }
}
