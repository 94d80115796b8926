//! Session-facing operations behind the HTTP routes.

use crate::config::{WorkerConfig, MAX_COMMAND_ARGS, MAX_COMMAND_BYTES};
use crate::types::{CreateSandboxRequest, ExecRequest, ExecResponse};
use sprout_machines::{
    CommandExecutor, MachinesApi, MachinesError, RetryPolicy, Sandbox, SandboxProvisioner,
    SandboxSpec,
};
use sprout_term::{render, TerminalLine};

/// Errors surfaced by [`WorkerService`].
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The caller sent something the worker refuses to forward.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Remote sandbox operation failed.
    #[error(transparent)]
    Machines(#[from] MachinesError),
}

/// Sizing applied when a create request leaves fields unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxDefaults {
    pub region: String,
    pub image: String,
    pub cpus: u32,
    pub memory_mb: u32,
}

impl SandboxDefaults {
    /// Defaults taken from the worker configuration.
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self {
            region: config.sandbox_region.clone(),
            image: config.sandbox_image.clone(),
            cpus: config.sandbox_cpus,
            memory_mb: config.sandbox_memory_mb,
        }
    }
}

/// Sandbox lifecycle plus rendered command execution.
///
/// Cheap to clone; clones share the same API client.
#[derive(Clone)]
pub struct WorkerService {
    provisioner: SandboxProvisioner,
    executor: CommandExecutor,
    defaults: SandboxDefaults,
}

impl WorkerService {
    /// Build the service against the real Machines API.
    pub fn new(config: &WorkerConfig) -> Result<Self, ServiceError> {
        let api = MachinesApi::from_config(&config.machines_config())?;
        Ok(Self::with_api(
            api,
            config.retry_policy(),
            SandboxDefaults::from_config(config),
        ))
    }

    /// Build the service on an existing API client.
    pub fn with_api(api: MachinesApi, retry: RetryPolicy, defaults: SandboxDefaults) -> Self {
        Self {
            provisioner: SandboxProvisioner::new(api.clone(), retry),
            executor: CommandExecutor::new(api, retry),
            defaults,
        }
    }

    /// Provision a sandbox for a session.
    pub async fn create(&self, request: CreateSandboxRequest) -> Result<Sandbox, ServiceError> {
        let session_id = request
            .session_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let spec = SandboxSpec::builder(session_id)
            .region(request.region.unwrap_or_else(|| self.defaults.region.clone()))
            .image(request.image.unwrap_or_else(|| self.defaults.image.clone()))
            .cpus(request.cpus.unwrap_or(self.defaults.cpus))
            .memory_mb(request.memory_mb.unwrap_or(self.defaults.memory_mb))
            .envs(request.env)
            .build()?;

        Ok(self.provisioner.create(&spec).await?)
    }

    /// Look up a sandbox; `None` when the provider doesn't know it.
    pub async fn get(&self, id: &str) -> Result<Option<Sandbox>, ServiceError> {
        Ok(self.provisioner.get(id).await?)
    }

    /// Force-destroy a sandbox.
    pub async fn destroy(&self, id: &str) -> Result<(), ServiceError> {
        Ok(self.provisioner.destroy(id).await?)
    }

    /// Run a command and render its output.
    pub async fn exec(&self, id: &str, request: ExecRequest) -> Result<ExecResponse, ServiceError> {
        validate_command(&request.cmd)?;

        let result = self.executor.exec(id, &request.cmd).await?;

        let lines = result
            .stdout_lines()
            .map(TerminalLine::stdout)
            .chain(result.stderr_lines().map(TerminalLine::stderr))
            .map(|line| render(&line))
            .collect();

        Ok(ExecResponse {
            exit_code: result.exit_code,
            stdout: result.stdout,
            stderr: result.stderr,
            lines,
        })
    }
}

/// Reject commands the provider should never see.
fn validate_command(cmd: &[String]) -> Result<(), ServiceError> {
    if cmd.is_empty() {
        return Err(ServiceError::InvalidRequest("cmd must not be empty".into()));
    }
    if cmd[0].trim().is_empty() {
        return Err(ServiceError::InvalidRequest(
            "cmd[0] must name a program".into(),
        ));
    }
    if cmd.len() > MAX_COMMAND_ARGS {
        return Err(ServiceError::InvalidRequest(format!(
            "cmd has {} arguments (max {})",
            cmd.len(),
            MAX_COMMAND_ARGS
        )));
    }
    let total: usize = cmd.iter().map(String::len).sum();
    if total > MAX_COMMAND_BYTES {
        return Err(ServiceError::InvalidRequest(format!(
            "cmd is {} bytes (max {})",
            total, MAX_COMMAND_BYTES
        )));
    }
    Ok(())
}
