//! # sprout-worker
//!
//! HTTP worker that gives each coding session a remote sandbox.
//!
//! The worker owns no state of its own. Every request is forwarded to the
//! Machines API through [`sprout_machines`], and command output is rendered
//! with [`sprout_term`] before it is returned.
//!
//! ## Configuration
//!
//! See [`WorkerConfig::from_env`] for the environment variables.

pub mod config;
pub mod http;
pub mod service;
pub mod types;

pub use config::{ConfigError, WorkerConfig, MAX_COMMAND_ARGS, MAX_COMMAND_BYTES};
pub use service::{SandboxDefaults, ServiceError, WorkerService};
