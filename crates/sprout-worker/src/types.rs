//! Request and response bodies for the worker HTTP API.

use serde::{Deserialize, Serialize};
use sprout_term::RenderedLine;
use std::collections::BTreeMap;

// ============================================================================
// Sandbox Lifecycle
// ============================================================================

/// Body of `POST /sandboxes`.
///
/// Every field is optional; the worker's configured defaults fill the gaps.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSandboxRequest {
    /// Owning session (default: a fresh UUID).
    #[serde(default)]
    pub session_id: Option<String>,

    /// Provider region.
    #[serde(default)]
    pub region: Option<String>,

    /// Container image reference.
    #[serde(default)]
    pub image: Option<String>,

    /// Shared vCPU count.
    #[serde(default)]
    pub cpus: Option<u32>,

    /// Memory in MB.
    #[serde(default)]
    pub memory_mb: Option<u32>,

    /// Extra environment for the sandbox.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

// ============================================================================
// Command Execution
// ============================================================================

/// Body of `POST /sandboxes/{id}/exec`.
#[derive(Debug, Deserialize)]
pub struct ExecRequest {
    /// Program and arguments, passed without a shell.
    pub cmd: Vec<String>,
}

/// Result of a command, with output rendered for the terminal view.
#[derive(Debug, Serialize)]
pub struct ExecResponse {
    /// Exit code of the command.
    pub exit_code: i32,

    /// Raw standard output.
    pub stdout: String,

    /// Raw standard error.
    pub stderr: String,

    /// Stdout lines followed by stderr lines, decoded and classified.
    pub lines: Vec<RenderedLine>,
}

// ============================================================================
// Errors
// ============================================================================

/// JSON body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}
