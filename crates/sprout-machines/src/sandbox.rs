//! Sandbox handle and command results.

use crate::api::{machine_name, ExecResponse, MachineRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A remote compute instance owned by one coding session.
///
/// `state` is whatever the provider reports (`created`, `started`,
/// `stopping`, `destroyed`, ...). It is forwarded, not interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sandbox {
    /// Provider machine ID.
    pub id: String,
    /// `session-<sessionId>`
    pub name: String,
    /// Provider-reported state.
    pub state: String,
    /// Region code.
    pub region: String,
    /// Private network address; empty when the provider omits it.
    pub private_ip: String,
    /// Creation time reported by the provider, if it sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Sandbox {
    /// Name a sandbox gets for `session_id`.
    pub fn name_for_session(session_id: &str) -> String {
        machine_name(session_id)
    }
}

impl From<MachineRecord> for Sandbox {
    fn from(record: MachineRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            state: record.state,
            region: record.region,
            private_ip: record.private_ip,
            created_at: record.created_at,
        }
    }
}

/// Result from command execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Process exit code.
    pub exit_code: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl ExecResult {
    /// Check if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Lines of standard output.
    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        split_output(&self.stdout)
    }

    /// Lines of standard error.
    pub fn stderr_lines(&self) -> impl Iterator<Item = &str> {
        split_output(&self.stderr)
    }
}

impl From<ExecResponse> for ExecResult {
    fn from(resp: ExecResponse) -> Self {
        Self {
            exit_code: resp.exit_code.unwrap_or(0),
            stdout: resp.stdout.unwrap_or_default(),
            stderr: resp.stderr.unwrap_or_default(),
        }
    }
}

/// `lines()` semantics: split on `\n`, drop a trailing `\r`, no empty
/// fragment after a final newline.
fn split_output(output: &str) -> impl Iterator<Item = &str> {
    output.lines()
}
