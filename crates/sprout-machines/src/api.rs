//! Typed calls against `/apps/{app}/machines`.

use crate::config::{MachinesConfig, SandboxSpec};
use crate::error::{MachinesError, Result};
use crate::transport::{ApiRequest, HttpTransport, MachinesTransport, Method};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Body of `POST /apps/{app}/machines`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateMachineRequest {
    /// Machine name (`session-<sessionId>`)
    pub name: String,
    /// Region code
    pub region: String,
    /// Machine configuration
    pub config: MachineConfigPayload,
}

/// `config` object of a create request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineConfigPayload {
    /// Image reference
    pub image: String,
    /// Guest sizing
    pub guest: GuestConfig,
    /// Environment variables
    pub env: BTreeMap<String, String>,
    /// Reclaim the machine when its main process exits
    pub auto_destroy: bool,
}

/// Guest sizing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuestConfig {
    /// Always `shared`
    pub cpu_kind: String,
    /// vCPU count
    pub cpus: u32,
    /// Memory in MB
    pub memory_mb: u32,
}

impl CreateMachineRequest {
    /// Provider payload for a sandbox spec.
    pub fn for_spec(spec: &SandboxSpec) -> Self {
        Self {
            name: machine_name(&spec.session_id),
            region: spec.region.clone(),
            config: MachineConfigPayload {
                image: spec.image.clone(),
                guest: GuestConfig {
                    cpu_kind: "shared".to_string(),
                    cpus: spec.cpus,
                    memory_mb: spec.memory_mb,
                },
                env: spec.merged_env(),
                auto_destroy: true,
            },
        }
    }
}

/// Deterministic machine name for a session.
pub fn machine_name(session_id: &str) -> String {
    format!("session-{session_id}")
}

/// Machine as reported by the provider.
///
/// Only `id` is required. The other fields accept `null` and absence, and
/// an unparseable `created_at` decodes as `None`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MachineRecord {
    /// Provider machine ID
    pub id: String,
    /// Machine name
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// Provider state string
    #[serde(default, deserialize_with = "null_as_empty")]
    pub state: String,
    /// Region code
    #[serde(default, deserialize_with = "null_as_empty")]
    pub region: String,
    /// Private network address
    #[serde(default, deserialize_with = "null_as_empty")]
    pub private_ip: String,
    /// Creation time, if the provider sent a valid RFC 3339 timestamp
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc)))
}

/// Response of `POST /apps/{app}/machines/{id}/exec`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExecResponse {
    /// Exit status (absent means 0)
    #[serde(default)]
    pub exit_code: Option<i32>,
    /// Standard output
    #[serde(default)]
    pub stdout: Option<String>,
    /// Standard error
    #[serde(default)]
    pub stderr: Option<String>,
}

/// Machines API client shared by the provisioner and executor.
///
/// Cloning is cheap; the transport is reference counted.
#[derive(Clone)]
pub struct MachinesApi {
    transport: Arc<dyn MachinesTransport>,
    app: String,
}

impl MachinesApi {
    /// Wrap an existing transport.
    pub fn new(transport: Arc<dyn MachinesTransport>, app: impl Into<String>) -> Self {
        Self {
            transport,
            app: app.into(),
        }
    }

    /// Build an API client over [`HttpTransport`].
    pub fn from_config(config: &MachinesConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), config.app_name.clone()))
    }

    /// Provider app name.
    pub fn app(&self) -> &str {
        &self.app
    }

    fn machines_path(&self) -> String {
        format!("/apps/{}/machines", self.app)
    }

    fn machine_path(&self, id: &str) -> Result<String> {
        validate_machine_id(id)?;
        Ok(format!("{}/{}", self.machines_path(), id))
    }

    /// `POST /apps/{app}/machines`
    pub async fn create_machine(&self, payload: &CreateMachineRequest) -> Result<MachineRecord> {
        let request =
            ApiRequest::new(Method::Post, self.machines_path()).json(serde_json::to_value(payload)?);
        self.call_json(request).await
    }

    /// `GET /apps/{app}/machines/{id}`; a missing machine is an HTTP 404 error.
    pub async fn get_machine(&self, id: &str) -> Result<MachineRecord> {
        let request = ApiRequest::new(Method::Get, self.machine_path(id)?);
        self.call_json(request).await
    }

    /// `DELETE /apps/{app}/machines/{id}?force=...`
    pub async fn delete_machine(&self, id: &str, force: bool) -> Result<()> {
        let request =
            ApiRequest::new(Method::Delete, self.machine_path(id)?).query("force", force.to_string());
        self.call(request).await?;
        Ok(())
    }

    /// `POST /apps/{app}/machines/{id}/exec`
    pub async fn exec(&self, id: &str, cmd: &[String]) -> Result<ExecResponse> {
        let path = format!("{}/exec", self.machine_path(id)?);
        let request = ApiRequest::new(Method::Post, path).json(serde_json::json!({ "cmd": cmd }));
        self.call_json(request).await
    }

    async fn call_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        let body = self.call(request).await?;
        serde_json::from_str(&body).map_err(MachinesError::from)
    }

    /// Send a request and turn non-2xx statuses into [`MachinesError::Http`].
    async fn call(&self, request: ApiRequest) -> Result<String> {
        let method = request.method;
        let path = request.path.clone();
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            tracing::debug!(%method, path = %path, status = response.status, "Machines API error response");
            return Err(MachinesError::Http {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response.body)
    }
}

/// Machine IDs are interpolated into URL paths, so only allow URL-safe
/// identifier characters.
fn validate_machine_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(MachinesError::Config(format!("invalid machine id: {id:?}")))
    }
}
