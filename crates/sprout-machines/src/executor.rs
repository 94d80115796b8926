//! Command execution inside a running sandbox.

use crate::api::MachinesApi;
use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::sandbox::ExecResult;

/// Runs commands through the provider's exec endpoint.
///
/// Concurrent calls against the same sandbox are not serialized here;
/// callers that need ordering must provide it.
#[derive(Clone)]
pub struct CommandExecutor {
    api: MachinesApi,
    retry: RetryPolicy,
}

impl CommandExecutor {
    /// Create an executor over `api`, retrying with `retry`.
    pub fn new(api: MachinesApi, retry: RetryPolicy) -> Self {
        Self { api, retry }
    }

    /// Execute `command` (argv form) in `sandbox_id`.
    pub async fn exec(&self, sandbox_id: &str, command: &[String]) -> Result<ExecResult> {
        tracing::debug!(sandbox_id = %sandbox_id, ?command, "Executing command");

        let api = &self.api;
        match self
            .retry
            .execute("exec", move || api.exec(sandbox_id, command))
            .await
        {
            Ok(resp) => {
                let result = ExecResult::from(resp);
                tracing::debug!(
                    sandbox_id = %sandbox_id,
                    exit_code = result.exit_code,
                    stdout_len = result.stdout.len(),
                    stderr_len = result.stderr.len(),
                    "Command completed"
                );
                Ok(result)
            }
            Err(e) => {
                tracing::error!(sandbox_id = %sandbox_id, ?command, error = %e, "Command execution failed");
                Err(e)
            }
        }
    }
}
