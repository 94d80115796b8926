//! # sprout-machines
//!
//! Remote sandbox lifecycle for Sprout coding sessions.
//!
//! Each session gets one ephemeral machine from a cloud Machines API. This
//! crate creates it, looks it up, runs commands in it, and tears it down,
//! retrying transient failures with exponential backoff.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     sprout-machines                      │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │  ┌────────────────────┐      ┌─────────────────────┐     │
//! │  │ SandboxProvisioner │      │  CommandExecutor    │     │
//! │  │   - create()  ─┐   │      │   - exec()  ─┐      │     │
//! │  │   - get()      │   │      │              │      │     │
//! │  │   - destroy() ─┤   │      │              │      │     │
//! │  └────────────────┼───┘      └──────────────┼──────┘     │
//! │                   ▼                         ▼            │
//! │          ┌──────────────────────────────────────┐        │
//! │          │ RetryPolicy (3 attempts, 1s·2^n)     │        │
//! │          └──────────────────┬───────────────────┘        │
//! │                             ▼                            │
//! │          ┌──────────────────────────────────────┐        │
//! │          │ MachinesApi  /apps/{app}/machines    │        │
//! │          └──────────────────┬───────────────────┘        │
//! │                             ▼                            │
//! │          ┌──────────────────────────────────────┐        │
//! │          │ dyn MachinesTransport (HttpTransport)│        │
//! │          └──────────────────────────────────────┘        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! `get` bypasses the retry layer and maps a 404 to `None`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sprout_machines::{
//!     CommandExecutor, MachinesApi, MachinesConfig, SandboxProvisioner, SandboxSpec,
//! };
//!
//! # async fn example() -> sprout_machines::Result<()> {
//! let config = MachinesConfig::builder()
//!     .app_name("sprout-sandboxes")
//!     .api_token("fly-token")
//!     .build()?;
//!
//! let api = MachinesApi::from_config(&config)?;
//! let provisioner = SandboxProvisioner::new(api.clone(), config.retry);
//! let executor = CommandExecutor::new(api, config.retry);
//!
//! let spec = SandboxSpec::builder("session-42")
//!     .region("iad")
//!     .image("registry.fly.io/sprout-sandbox:latest")
//!     .build()?;
//!
//! let sandbox = provisioner.create(&spec).await?;
//! let result = executor
//!     .exec(&sandbox.id, &["node".to_string(), "--version".to_string()])
//!     .await?;
//! println!("{}", result.stdout);
//!
//! provisioner.destroy(&sandbox.id).await?;
//! # Ok(())
//! # }
//! ```

mod api;
mod config;
mod error;
mod executor;
mod provisioner;
mod retry;
mod sandbox;
mod transport;

pub use api::{
    machine_name, CreateMachineRequest, ExecResponse, GuestConfig, MachineConfigPayload,
    MachineRecord, MachinesApi,
};
pub use config::{
    MachinesConfig, MachinesConfigBuilder, SandboxSpec, SandboxSpecBuilder, DEFAULT_API_BASE_URL,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use error::{MachinesError, Result, Retryable, TransportErrorKind};
pub use executor::CommandExecutor;
pub use provisioner::SandboxProvisioner;
pub use retry::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};
pub use sandbox::{ExecResult, Sandbox};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, MachinesTransport, Method};
