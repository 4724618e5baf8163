// src/s3_client.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Builds an AWS S3 client from an explicit [`S3Config`].
//!
//! One client per `S3Tools` handle; there is no process-wide client.

use aws_config::meta::region::RegionProviderChain;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client;
use aws_smithy_http_client::tls::rustls_provider::CryptoMode;
use aws_smithy_http_client::{tls, Builder as HttpClientBuilder};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::config::S3Config;
use crate::constants::DEFAULT_REGION;
use crate::error::{Result, S3ToolsError};

// -----------------------------------------------------------------------------
// TLS helper, for CA bundle
// -----------------------------------------------------------------------------

/// Create a TLS context using a CA bundle file
fn tls_context_from_pem(filename: &Path) -> Result<tls::TlsContext> {
    let pem_contents = fs::read(filename).map_err(|e| S3ToolsError::io(filename, e))?;

    let trust_store = tls::TrustStore::empty().with_pem_certificate(pem_contents.as_slice());

    tls::TlsContext::builder()
        .with_trust_store(trust_store)
        .build()
        .map_err(|e| {
            S3ToolsError::Config(format!(
                "failed to build TLS context from PEM {}: {e}",
                filename.display()
            ))
        })
}

// -----------------------------------------------------------------------------
// Client factory
// -----------------------------------------------------------------------------

/// Build a client for `config`.
///
/// Region resolution: `config.region`, then the SDK provider chain, then
/// `us-east-1`. Credentials: static keys when both are set, otherwise the
/// named profile or the default chain.
pub async fn build_client(config: &S3Config) -> Result<Client> {
    config.validate()?;

    let region = RegionProviderChain::first_try(config.region.clone().map(Region::new))
        .or_default_provider()
        .or_else(Region::new(DEFAULT_REGION));

    let timeout_config = TimeoutConfig::builder()
        .connect_timeout(config.connect_timeout)
        .operation_timeout(config.operation_timeout)
        .build();

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(region)
        .timeout_config(timeout_config);

    if let Some(endpoint) = &config.endpoint_url {
        debug!("using custom endpoint {}", endpoint);
        loader = loader.endpoint_url(endpoint);
    }
    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }
    if let (Some(access_key), Some(secret_key)) = (&config.access_key_id, &config.secret_access_key) {
        let creds = Credentials::new(
            access_key,
            secret_key,
            config.session_token.clone(),
            None,
            "s3tools-static",
        );
        loader = loader.credentials_provider(creds);
    }
    if let Some(ca_bundle) = &config.ca_bundle_path {
        info!("loading CA bundle from {}", ca_bundle.display());
        let tls_context = tls_context_from_pem(ca_bundle)?;
        let http_client = HttpClientBuilder::new()
            .tls_provider(tls::Provider::Rustls(CryptoMode::AwsLc))
            .tls_context(tls_context)
            .build_https();
        loader = loader.http_client(http_client);
    }

    let sdk_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(config.force_path_style)
        .build();
    Ok(Client::from_conf(s3_config))
}

/// Base URL that object URLs are reported against.
pub fn endpoint_base(config: &S3Config, client: &Client) -> String {
    match &config.endpoint_url {
        Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
        None => {
            let region = client
                .config()
                .region()
                .map(|r| r.as_ref().to_string())
                .unwrap_or_else(|| DEFAULT_REGION.to_string());
            format!("https://s3.{region}.amazonaws.com")
        }
    }
}
