//! Configuration for the worker service.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use sprout_machines::{MachinesConfig, RetryPolicy, SandboxSpec, DEFAULT_API_BASE_URL};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Maximum number of arguments in one exec command.
pub const MAX_COMMAND_ARGS: usize = 256;

/// Maximum total argument bytes in one exec command.
pub const MAX_COMMAND_BYTES: usize = 1024 * 1024; // 1 MB

/// Configuration for the Sprout worker.
#[derive(Clone)]
pub struct WorkerConfig {
    /// Machines API base URL.
    pub machines_api_url: String,

    /// Provider app that owns session sandboxes.
    pub machines_app: String,

    /// Machines API bearer token (required).
    pub machines_token: String,

    /// Fixed transport timeout (default: 30s).
    pub request_timeout: Duration,

    /// Attempts per mutating call (default: 3).
    pub retry_max_attempts: u32,

    /// Backoff base delay (default: 1000ms).
    pub retry_base_delay: Duration,

    /// Default sandbox region (default: iad).
    pub sandbox_region: String,

    /// Default sandbox image.
    pub sandbox_image: String,

    /// Default shared vCPUs (default: 1).
    pub sandbox_cpus: u32,

    /// Default memory in MB (default: 1024).
    pub sandbox_memory_mb: u32,

    /// HTTP server bind address.
    pub http_addr: SocketAddr,
}

/// Configuration validation error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No API token was configured.
    #[error("SPROUT_MACHINES_TOKEN is not set")]
    MissingToken,

    /// A variable holds an unusable value.
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            machines_api_url: DEFAULT_API_BASE_URL.to_string(),
            machines_app: "sprout-sandboxes".to_string(),
            machines_token: String::new(),
            request_timeout: Duration::from_secs(30),
            retry_max_attempts: 3,
            retry_base_delay: Duration::from_millis(1000),
            sandbox_region: "iad".to_string(),
            sandbox_image: "registry.fly.io/sprout-sandbox:latest".to_string(),
            sandbox_cpus: 1,
            sandbox_memory_mb: 1024,
            http_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 8080),
        }
    }
}

impl fmt::Debug for WorkerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerConfig")
            .field("machines_api_url", &self.machines_api_url)
            .field("machines_app", &self.machines_app)
            .field("machines_token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("retry_max_attempts", &self.retry_max_attempts)
            .field("retry_base_delay", &self.retry_base_delay)
            .field("sandbox_region", &self.sandbox_region)
            .field("sandbox_image", &self.sandbox_image)
            .field("sandbox_cpus", &self.sandbox_cpus)
            .field("sandbox_memory_mb", &self.sandbox_memory_mb)
            .field("http_addr", &self.http_addr)
            .finish()
    }
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SPROUT_MACHINES_API_URL` | `https://api.machines.dev/v1` |
    /// | `SPROUT_MACHINES_APP` | `sprout-sandboxes` |
    /// | `SPROUT_MACHINES_TOKEN` | *(required)* |
    /// | `SPROUT_REQUEST_TIMEOUT_SECS` | `30` |
    /// | `SPROUT_RETRY_MAX_ATTEMPTS` | `3` |
    /// | `SPROUT_RETRY_BASE_DELAY_MS` | `1000` |
    /// | `SPROUT_SANDBOX_REGION` | `iad` |
    /// | `SPROUT_SANDBOX_IMAGE` | `registry.fly.io/sprout-sandbox:latest` |
    /// | `SPROUT_SANDBOX_CPUS` | `1` |
    /// | `SPROUT_SANDBOX_MEMORY_MB` | `1024` |
    /// | `SPROUT_HTTP_HOST` | `0.0.0.0` |
    /// | `SPROUT_HTTP_PORT` | `8080` |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparseable numbers fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let http_host: IpAddr = lookup("SPROUT_HTTP_HOST")
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.http_addr.ip());

        let http_port: u16 = lookup("SPROUT_HTTP_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.http_addr.port());

        Self {
            machines_api_url: lookup("SPROUT_MACHINES_API_URL").unwrap_or(default.machines_api_url),
            machines_app: lookup("SPROUT_MACHINES_APP").unwrap_or(default.machines_app),
            machines_token: lookup("SPROUT_MACHINES_TOKEN").unwrap_or(default.machines_token),
            request_timeout: parsed("SPROUT_REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(default.request_timeout),
            retry_max_attempts: lookup("SPROUT_RETRY_MAX_ATTEMPTS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default.retry_max_attempts),
            retry_base_delay: parsed("SPROUT_RETRY_BASE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(default.retry_base_delay),
            sandbox_region: lookup("SPROUT_SANDBOX_REGION").unwrap_or(default.sandbox_region),
            sandbox_image: lookup("SPROUT_SANDBOX_IMAGE").unwrap_or(default.sandbox_image),
            sandbox_cpus: lookup("SPROUT_SANDBOX_CPUS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default.sandbox_cpus),
            sandbox_memory_mb: lookup("SPROUT_SANDBOX_MEMORY_MB")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default.sandbox_memory_mb),
            http_addr: SocketAddr::new(http_host, http_port),
        }
    }

    /// Validate the configuration.
    ///
    /// Call this at startup to get clear error messages before serving.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.machines_token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.machines_app.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "SPROUT_MACHINES_APP",
                reason: "must not be empty".into(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "SPROUT_REQUEST_TIMEOUT_SECS",
                reason: "must be > 0".into(),
            });
        }
        if self.retry_max_attempts == 0 {
            return Err(ConfigError::Invalid {
                name: "SPROUT_RETRY_MAX_ATTEMPTS",
                reason: "must be > 0".into(),
            });
        }

        // Default sandbox sizing must itself be provisionable.
        SandboxSpec::builder("config-check")
            .region(&self.sandbox_region)
            .image(&self.sandbox_image)
            .cpus(self.sandbox_cpus)
            .memory_mb(self.sandbox_memory_mb)
            .build()
            .map_err(|e| ConfigError::Invalid {
                name: "SPROUT_SANDBOX_*",
                reason: e.to_string(),
            })?;

        self.machines_config()
            .validate()
            .map_err(|e| ConfigError::Invalid {
                name: "SPROUT_MACHINES_*",
                reason: e.to_string(),
            })
    }

    /// Retry policy for remote mutations.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_max_attempts, self.retry_base_delay)
    }

    /// Client configuration for sprout-machines.
    pub fn machines_config(&self) -> MachinesConfig {
        MachinesConfig {
            api_base_url: self.machines_api_url.clone(),
            app_name: self.machines_app.clone(),
            api_token: self.machines_token.clone(),
            request_timeout: self.request_timeout,
            retry: self.retry_policy(),
        }
    }
}
