/// Factory: build the token verifiers from application `Config`.
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::services::auth::{
    IntrospectionClient, IntrospectionVerifier, JwtVerifier, key_set::KeySet,
};

pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to create HTTP client")
}

/// Fetches the JWKS. Callers must treat an error as fatal.
pub async fn build_jwt_verifier(config: &Config) -> Result<Arc<JwtVerifier>> {
    let http = build_http_client(config.jwks_fetch_timeout)?;
    let jwks_url = config.jwks_url();

    let keys = KeySet::load(&http, &jwks_url)
        .await
        .with_context(|| format!("failed to load signing keys from {jwks_url}"))?;

    Ok(Arc::new(JwtVerifier::new(
        Arc::new(keys),
        config.auth_issuer.clone(),
        config.auth_audiences.clone(),
        config.access_token_leeway_seconds,
    )))
}

pub fn build_introspection_verifier(config: &Config) -> Result<Arc<IntrospectionVerifier>> {
    let http = build_http_client(config.introspection_timeout)?;

    let client = IntrospectionClient::new(
        http,
        config.introspection_url(),
        config.auth_client_id.clone(),
        config.auth_client_secret.clone(),
        config.introspection_max_in_flight,
    );

    Ok(Arc::new(IntrospectionVerifier::new(client)))
}
