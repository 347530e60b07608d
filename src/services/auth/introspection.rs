//! RFC 7662 token introspection against the identity provider.
//!
//! Each call costs one round trip but reflects live revocation state. Results
//! are never cached across requests.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::services::auth::error::{AuthError, VerificationMethod};
use crate::services::auth::verifier::{Identity, TokenVerifier};

/// Introspection response body. `active` is `false` when the provider omits it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectionResult {
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Posts tokens to the introspection endpoint with the service's client
/// credentials.
///
/// The request timeout lives on `http_client`. Concurrent calls are capped by
/// `in_flight`.
pub struct IntrospectionClient {
    http_client: reqwest::Client,
    endpoint: String,
    client_id: String,
    client_secret: String,
    in_flight: Semaphore,
}

impl std::fmt::Debug for IntrospectionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the client secret
        f.debug_struct("IntrospectionClient")
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.client_id)
            .field("available_permits", &self.in_flight.available_permits())
            .finish()
    }
}

impl IntrospectionClient {
    pub fn new(
        http_client: reqwest::Client,
        endpoint: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        max_in_flight: usize,
    ) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            in_flight: Semaphore::new(max_in_flight.max(1)),
        }
    }

    /// Ask the provider about `token`.
    ///
    /// An inactive token is `Ok` with `active == false`; callers decide what
    /// that means.
    pub async fn introspect(&self, token: &str) -> Result<IntrospectionResult, AuthError> {
        let _permit = self.in_flight.acquire().await.map_err(|_| {
            AuthError::IntrospectionUnreachable("introspection client is closed".to_string())
        })?;

        let started = Instant::now();
        let params = [
            ("token", token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::IntrospectionUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // The body may echo request data; keep it out of the error.
            return Err(AuthError::IntrospectionUnreachable(format!(
                "introspection failed with status {}",
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::IntrospectionUnreachable(e.to_string()))?;

        let result: IntrospectionResult = serde_json::from_slice(&body)
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        debug!(
            active = result.active,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "token introspected"
        );

        Ok(result)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Remote strategy: the provider's `active` verdict is the answer.
#[derive(Debug)]
pub struct IntrospectionVerifier {
    client: IntrospectionClient,
}

impl IntrospectionVerifier {
    pub fn new(client: IntrospectionClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &IntrospectionClient {
        &self.client
    }
}

#[async_trait]
impl TokenVerifier for IntrospectionVerifier {
    fn method(&self) -> VerificationMethod {
        VerificationMethod::Introspection
    }

    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let result = self.client.introspect(token).await?;

        if !result.active {
            return Err(AuthError::InactiveToken);
        }

        Ok(Identity {
            user_id: result.sub,
            email: result.email,
        })
    }
}
