// src/config.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Explicit connection settings.
//!
//! Nothing here is global: an `S3Config` is built (by hand or from the
//! environment) and handed to [`crate::S3Tools::connect`], which builds one
//! client for that handle.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_OPERATION_TIMEOUT};
use crate::error::{Result, S3ToolsError};

#[derive(Clone)]
pub struct S3Config {
    /// Region; `None` falls back to the AWS provider chain, then `us-east-1`.
    pub region: Option<String>,
    /// Custom endpoint (MinIO, Ceph, LocalStack, ...).
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// Named profile from the shared AWS config files.
    pub profile: Option<String>,
    /// PEM bundle replacing the default trust roots.
    pub ca_bundle_path: Option<PathBuf>,
    /// Path-style addressing (`endpoint/bucket/key`), required by most S3-compatible services.
    pub force_path_style: bool,
    pub connect_timeout: Duration,
    pub operation_timeout: Duration,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: None,
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            profile: None,
            ca_bundle_path: None,
            force_path_style: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

// Hand-written so the secret never reaches a log line.
impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "<redacted>"))
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("profile", &self.profile)
            .field("ca_bundle_path", &self.ca_bundle_path)
            .field("force_path_style", &self.force_path_style)
            .field("connect_timeout", &self.connect_timeout)
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

impl S3Config {
    /// Build a config from `AWS_*` / `S3TOOLS_*` environment variables.
    ///
    /// Loads `.env` first so its values are visible; variables already set in
    /// the process environment win over the file.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut cfg = S3Config {
            region: env_opt("AWS_REGION"),
            endpoint_url: env_opt("AWS_ENDPOINT_URL"),
            access_key_id: env_opt("AWS_ACCESS_KEY_ID"),
            secret_access_key: env_opt("AWS_SECRET_ACCESS_KEY"),
            session_token: env_opt("AWS_SESSION_TOKEN"),
            profile: env_opt("AWS_PROFILE"),
            ca_bundle_path: env_opt("AWS_CA_BUNDLE_PATH").map(PathBuf::from),
            ..Default::default()
        };

        if let Some(v) = env_opt("S3TOOLS_FORCE_PATH_STYLE") {
            cfg.force_path_style = parse_bool("S3TOOLS_FORCE_PATH_STYLE", &v)?;
        } else {
            // Custom endpoints are almost always S3-compatible services.
            cfg.force_path_style = cfg.endpoint_url.is_some();
        }
        if let Some(v) = env_opt("S3TOOLS_OPERATION_TIMEOUT_SECS") {
            let secs: u64 = v.parse().map_err(|_| {
                S3ToolsError::Config(format!("S3TOOLS_OPERATION_TIMEOUT_SECS must be an integer, got {v:?}"))
            })?;
            cfg.operation_timeout = Duration::from_secs(secs);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint.into());
        self
    }

    pub fn with_credentials(mut self, access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    pub fn with_path_style(mut self, force: bool) -> Self {
        self.force_path_style = force;
        self
    }

    pub fn validate(&self) -> Result<()> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(_), None) => Err(S3ToolsError::Config(
                "AWS_ACCESS_KEY_ID is set but AWS_SECRET_ACCESS_KEY is missing".into(),
            )),
            (None, Some(_)) => Err(S3ToolsError::Config(
                "AWS_SECRET_ACCESS_KEY is set but AWS_ACCESS_KEY_ID is missing".into(),
            )),
            _ if self.session_token.is_some() && self.access_key_id.is_none() => Err(S3ToolsError::Config(
                "AWS_SESSION_TOKEN requires static credentials".into(),
            )),
            _ if self.operation_timeout.is_zero() => {
                Err(S3ToolsError::Config("operation timeout must be greater than zero".into()))
            }
            _ => Ok(()),
        }
    }

    /// True when static credentials are configured (otherwise the SDK chain is used).
    pub fn has_static_credentials(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enable" => Ok(true),
        "false" | "0" | "no" | "off" | "disable" => Ok(false),
        other => Err(S3ToolsError::Config(format!("{name} must be a boolean, got {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_configured_credentials_are_rejected() {
        let cfg = S3Config { access_key_id: Some("AKIA".into()), ..Default::default() };
        assert!(matches!(cfg.validate(), Err(S3ToolsError::Config(_))));

        let cfg = S3Config::default().with_credentials("AKIA", "secret");
        assert!(cfg.validate().is_ok());
        assert!(cfg.has_static_credentials());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = S3Config::default().with_credentials("AKIA", "super-secret");
        let shown = format!("{cfg:?}");
        assert!(shown.contains("AKIA"));
        assert!(!shown.contains("super-secret"));
    }

    #[test]
    fn bool_parsing() {
        assert!(parse_bool("X", "Yes").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }
}
