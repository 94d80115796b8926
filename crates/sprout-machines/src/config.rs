//! Client and sandbox configuration types.

use crate::error::MachinesError;
use crate::retry::RetryPolicy;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Default Machines API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.machines.dev/v1";

/// Default fixed timeout applied to every request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the Machines API.
///
/// Read-only once built; clone it freely across tasks.
#[derive(Clone)]
pub struct MachinesConfig {
    /// API base URL, without the `/apps/...` suffix.
    pub api_base_url: String,
    /// Provider application that owns the sandboxes.
    pub app_name: String,
    /// Bearer token sent on every request.
    pub api_token: String,
    /// Fixed transport timeout; a request exceeding it fails as retryable.
    pub request_timeout: Duration,
    /// Retry policy for mutating calls.
    pub retry: RetryPolicy,
}

impl Default for MachinesConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            app_name: String::new(),
            api_token: String::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl fmt::Debug for MachinesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachinesConfig")
            .field("api_base_url", &self.api_base_url)
            .field("app_name", &self.app_name)
            .field("api_token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl MachinesConfig {
    /// Create a new config builder.
    pub fn builder() -> MachinesConfigBuilder {
        MachinesConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), MachinesError> {
        if self.api_base_url.trim().is_empty() {
            return Err(MachinesError::Config("api_base_url is required".into()));
        }
        if self.app_name.trim().is_empty() {
            return Err(MachinesError::Config("app_name is required".into()));
        }
        if self.api_token.trim().is_empty() {
            return Err(MachinesError::Config("api_token is required".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(MachinesError::Config("request_timeout must be > 0".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(MachinesError::Config("retry.max_attempts must be > 0".into()));
        }
        Ok(())
    }
}

/// Builder for MachinesConfig.
#[derive(Debug, Default)]
pub struct MachinesConfigBuilder {
    config: MachinesConfig,
}

impl MachinesConfigBuilder {
    /// Set the API base URL.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    /// Set the provider app name.
    pub fn app_name(mut self, app: impl Into<String>) -> Self {
        self.config.app_name = app.into();
        self
    }

    /// Set the bearer token.
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.config.api_token = token.into();
        self
    }

    /// Set the fixed request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Build the configuration, validating all required fields.
    pub fn build(self) -> Result<MachinesConfig, MachinesError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// What to provision for one coding session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxSpec {
    /// Owning session; also determines the sandbox name.
    pub session_id: String,
    /// Provider region code (e.g. `iad`).
    pub region: String,
    /// Container image to boot.
    pub image: String,
    /// Shared vCPUs.
    pub cpus: u32,
    /// Memory in MB.
    pub memory_mb: u32,
    /// Extra environment, merged after `SESSION_ID`.
    pub env: BTreeMap<String, String>,
}

impl SandboxSpec {
    /// Start building a spec for `session_id`.
    pub fn builder(session_id: impl Into<String>) -> SandboxSpecBuilder {
        SandboxSpecBuilder {
            spec: SandboxSpec {
                session_id: session_id.into(),
                region: String::new(),
                image: String::new(),
                cpus: 1,
                memory_mb: 1024,
                env: BTreeMap::new(),
            },
        }
    }

    /// Validate the spec.
    pub fn validate(&self) -> Result<(), MachinesError> {
        if self.session_id.trim().is_empty() {
            return Err(MachinesError::Config("session_id is required".into()));
        }
        if self.region.trim().is_empty() {
            return Err(MachinesError::Config("region is required".into()));
        }
        if self.image.trim().is_empty() {
            return Err(MachinesError::Config("image is required".into()));
        }
        if self.cpus == 0 {
            return Err(MachinesError::Config("cpus must be > 0".into()));
        }
        if self.memory_mb == 0 {
            return Err(MachinesError::Config("memory_mb must be > 0".into()));
        }
        Ok(())
    }

    /// Environment handed to the sandbox: `SESSION_ID` first, then the
    /// caller's entries, which win on conflict.
    pub fn merged_env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("SESSION_ID".to_string(), self.session_id.clone());
        env.extend(self.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }
}

/// Builder for SandboxSpec.
#[derive(Debug)]
pub struct SandboxSpecBuilder {
    spec: SandboxSpec,
}

impl SandboxSpecBuilder {
    /// Set the region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.spec.region = region.into();
        self
    }

    /// Set the image.
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.spec.image = image.into();
        self
    }

    /// Set shared vCPU count (default: 1).
    pub fn cpus(mut self, cpus: u32) -> Self {
        self.spec.cpus = cpus;
        self
    }

    /// Set memory in MB (default: 1024).
    pub fn memory_mb(mut self, memory_mb: u32) -> Self {
        self.spec.memory_mb = memory_mb;
        self
    }

    /// Add one environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.env.insert(key.into(), value.into());
        self
    }

    /// Add several environment variables.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.spec
            .env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Build the spec, validating all required fields.
    pub fn build(self) -> Result<SandboxSpec, MachinesError> {
        self.spec.validate()?;
        Ok(self.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = MachinesConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_config_requires_token() {
        let result = MachinesConfig::builder().app_name("sprout").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_requires_app() {
        let result = MachinesConfig::builder().api_token("secret").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        let result = MachinesConfig::builder()
            .app_name("sprout")
            .api_token("secret")
            .request_timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let config = MachinesConfig::builder()
            .app_name("sprout")
            .api_token("super-secret-token")
            .build()
            .expect("should build successfully");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_spec_builder_success() {
        let spec = SandboxSpec::builder("abc123")
            .region("iad")
            .image("registry.fly.io/sandbox:latest")
            .cpus(2)
            .memory_mb(2048)
            .env("NODE_ENV", "development")
            .build()
            .expect("should build successfully");

        assert_eq!(spec.session_id, "abc123");
        assert_eq!(spec.cpus, 2);
        assert_eq!(spec.memory_mb, 2048);
        assert_eq!(spec.env.get("NODE_ENV").map(String::as_str), Some("development"));
    }

    #[test]
    fn test_spec_validation() {
        assert!(SandboxSpec::builder("").region("iad").image("img").build().is_err());
        assert!(SandboxSpec::builder("s").image("img").build().is_err());
        assert!(SandboxSpec::builder("s").region("iad").build().is_err());
        assert!(SandboxSpec::builder("s")
            .region("iad")
            .image("img")
            .cpus(0)
            .build()
            .is_err());
        assert!(SandboxSpec::builder("s")
            .region("iad")
            .image("img")
            .memory_mb(0)
            .build()
            .is_err());
    }

    #[test]
    fn test_merged_env_includes_session_id() {
        let spec = SandboxSpec::builder("abc123")
            .region("iad")
            .image("img")
            .envs([("A", "1"), ("B", "2")])
            .build()
            .expect("should build successfully");

        let env = spec.merged_env();
        assert_eq!(env.len(), 3);
        assert_eq!(env["SESSION_ID"], "abc123");
        assert_eq!(env["A"], "1");
        assert_eq!(env["B"], "2");
    }

    #[test]
    fn test_merged_env_caller_wins() {
        let spec = SandboxSpec::builder("abc123")
            .region("iad")
            .image("img")
            .env("SESSION_ID", "override")
            .build()
            .expect("should build successfully");

        assert_eq!(spec.merged_env()["SESSION_ID"], "override");
    }
}
