/*
 * Responsibility
 * - Bearer 認証で起こり得る失敗の分類 (AuthError)
 * - machine-readable code と HTTP status への対応づけ
 * - どの検証方式で弾かれたか (VerificationMethod) の表現
 */
use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Why a presented bearer token was not accepted.
///
/// Everything except the two introspection transport variants is an
/// authentication verdict (401). Those two mean the identity provider could
/// not give a verdict at all, so they surface as 500.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization header required")]
    MissingHeader,

    #[error("invalid authorization header format, expected: Bearer <token>")]
    MalformedHeader,

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("no public key found for kid: {0}")]
    UnknownKey(String),

    #[error("token signature verification failed")]
    BadSignature,

    #[error("invalid issuer: expected {expected}, got {actual}")]
    InvalidIssuer { expected: String, actual: String },

    #[error("token has expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,

    #[error("invalid audience")]
    InvalidAudience,

    #[error("token is not active or has been revoked")]
    InactiveToken,

    #[error("failed to introspect token: {0}")]
    IntrospectionUnreachable(String),

    #[error("failed to parse introspection response: {0}")]
    MalformedResponse(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::IntrospectionUnreachable(_) | Self::MalformedResponse(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Stable identifier for clients and log queries.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_authorization_header",
            Self::MalformedHeader => "malformed_authorization_header",
            Self::MalformedToken(_) => "malformed_token",
            Self::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            Self::UnknownKey(_) => "unknown_key",
            Self::BadSignature => "bad_signature",
            Self::InvalidIssuer { .. } => "invalid_issuer",
            Self::Expired => "token_expired",
            Self::NotYetValid => "token_not_yet_valid",
            Self::InvalidAudience => "invalid_audience",
            Self::InactiveToken => "token_inactive",
            Self::IntrospectionUnreachable(_) => "introspection_unreachable",
            Self::MalformedResponse(_) => "malformed_introspection_response",
        }
    }
}

/// Which pipeline produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerificationMethod {
    #[serde(rename = "JWT Validation")]
    Jwt,
    #[serde(rename = "Token Introspection")]
    Introspection,
}

impl VerificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jwt => "JWT Validation",
            Self::Introspection => "Token Introspection",
        }
    }
}

impl std::fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
