//! Engine abstraction
//!
//! The engine is the external orchestrator that turns a deployment document
//! into cloud API calls. stackflow only hands the document over and reads
//! back the report.

use crate::document::{DeploymentDocument, DocumentFormat};
use crate::error::{CloudError, Result};
use crate::report::EngineReport;
use crate::store::HandoffStore;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Seam between stackflow and the external orchestrator
#[async_trait]
pub trait Engine: Send + Sync {
    /// Engine name for logs and UI
    fn name(&self) -> &str;

    /// Hand over a document and return whatever the engine reported
    async fn submit(&self, document: &DeploymentDocument) -> Result<EngineReport>;
}

/// Leaves the document in the handoff store for an orchestrator that polls it
pub struct FileEngine {
    store: HandoffStore,
}

impl FileEngine {
    pub fn new(store: HandoffStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Engine for FileEngine {
    fn name(&self) -> &str {
        "file"
    }

    async fn submit(&self, document: &DeploymentDocument) -> Result<EngineReport> {
        let path = self.store.save_document(document).await?;
        tracing::info!("Deployment document written to {}", path.display());
        Ok(EngineReport::new())
    }
}

/// Pipes the document into an orchestrator command and parses its JSON report
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    /// Split a whitespace-separated command line, e.g. `orchestrator apply --json`
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| CloudError::InvalidConfig("engine command is empty".to_string()))?;
        Ok(Self::new(program, parts.collect()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, input: String) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        tracing::debug!("Running: {} {}", self.program, self.args.join(" "));

        let mut child = cmd.spawn().map_err(|e| {
            CloudError::CommandFailed(format!("failed to start {}: {}", self.program, e))
        })?;

        // stdin is written while stdout is drained
        let stdin = child.stdin.take();
        let writer = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(input.as_bytes()).await?;
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        });

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    CloudError::Timeout(format!("{} did not finish in {:?}", self.program, limit))
                })??,
            None => child.wait_with_output().await?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CloudError::CommandFailed(stderr.trim().to_string()));
        }

        match writer.await {
            Ok(Ok(())) => {}
            // The engine exited successfully without reading all of the document
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {
                tracing::debug!("{} closed stdin early", self.program);
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(e) => {
                return Err(CloudError::CommandFailed(format!(
                    "failed to write document to {}: {}",
                    self.program, e
                )));
            }
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl Engine for CommandEngine {
    fn name(&self) -> &str {
        &self.program
    }

    async fn submit(&self, document: &DeploymentDocument) -> Result<EngineReport> {
        let start = std::time::Instant::now();
        let input = document.render(DocumentFormat::Json)?;
        let stdout = self.run(input).await?;

        let mut report: EngineReport = if stdout.trim().is_empty() {
            EngineReport::new()
        } else {
            serde_json::from_str(&stdout)?
        };
        if report.duration_ms == 0 {
            report.duration_ms = start.elapsed().as_millis() as u64;
        }

        tracing::info!(
            engine = %self.program,
            resources = report.resources.len(),
            failures = report.failures.len(),
            "Engine finished"
        );
        Ok(report)
    }
}
