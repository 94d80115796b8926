//! Sandbox lifecycle: create, inspect, destroy.

use crate::api::{CreateMachineRequest, MachinesApi};
use crate::config::SandboxSpec;
use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::sandbox::Sandbox;
use std::time::Instant;

/// Creates, inspects, and destroys sandboxes.
///
/// Holds no per-sandbox state; any number of operations may run
/// concurrently against one provisioner.
#[derive(Clone)]
pub struct SandboxProvisioner {
    api: MachinesApi,
    retry: RetryPolicy,
}

impl SandboxProvisioner {
    /// Create a provisioner over `api`, retrying mutations with `retry`.
    pub fn new(api: MachinesApi, retry: RetryPolicy) -> Self {
        Self { api, retry }
    }

    /// Provision a sandbox for `spec.session_id`.
    ///
    /// The machine is created with `auto_destroy` so the provider reclaims
    /// it even if [`destroy`](Self::destroy) is never called. Calling this
    /// twice for one session sends the same machine name twice; how the
    /// provider reacts to the duplicate is passed through unchanged.
    pub async fn create(&self, spec: &SandboxSpec) -> Result<Sandbox> {
        spec.validate()?;
        let payload = CreateMachineRequest::for_spec(spec);
        let start = Instant::now();
        tracing::info!(
            session_id = %spec.session_id,
            name = %payload.name,
            region = %spec.region,
            cpus = spec.cpus,
            memory_mb = spec.memory_mb,
            "Creating sandbox"
        );

        let api = &self.api;
        let payload = &payload;
        match self
            .retry
            .execute("create_sandbox", move || api.create_machine(payload))
            .await
        {
            Ok(record) => {
                let sandbox = Sandbox::from(record);
                tracing::info!(
                    session_id = %spec.session_id,
                    sandbox_id = %sandbox.id,
                    state = %sandbox.state,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Sandbox created"
                );
                Ok(sandbox)
            }
            Err(e) => {
                tracing::error!(session_id = %spec.session_id, error = %e, "Failed to create sandbox");
                Err(e)
            }
        }
    }

    /// Look up a sandbox. `Ok(None)` when the provider has no such machine.
    ///
    /// Not retried: a transient failure surfaces immediately.
    pub async fn get(&self, id: &str) -> Result<Option<Sandbox>> {
        tracing::debug!(sandbox_id = %id, "Fetching sandbox");
        match self.api.get_machine(id).await {
            Ok(record) => Ok(Some(Sandbox::from(record))),
            Err(e) if e.is_not_found() => {
                tracing::debug!(sandbox_id = %id, "Sandbox not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Force-destroy a sandbox.
    ///
    /// A 404 is an ordinary client error here, unlike in [`get`](Self::get).
    pub async fn destroy(&self, id: &str) -> Result<()> {
        let start = Instant::now();
        tracing::info!(sandbox_id = %id, "Destroying sandbox");

        let api = &self.api;
        match self
            .retry
            .execute("destroy_sandbox", move || api.delete_machine(id, true))
            .await
        {
            Ok(()) => {
                tracing::info!(
                    sandbox_id = %id,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Sandbox destroyed"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(sandbox_id = %id, error = %e, "Failed to destroy sandbox");
                Err(e)
            }
        }
    }
}
