use async_trait::async_trait;

use crate::services::auth::error::{AuthError, VerificationMethod};

/// Who a verified token represents. This is the only state handed to
/// downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<String>,
    pub email: Option<String>,
}

/// A bearer token verification strategy.
///
/// The auth gate is generic over this trait, so a route picks local
/// signature checks or remote introspection by which verifier it layers.
#[async_trait]
pub trait TokenVerifier: Send + Sync + 'static {
    fn method(&self) -> VerificationMethod;

    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}
