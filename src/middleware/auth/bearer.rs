//! `Authorization: Bearer <token>` の取り出し

use axum::http::{HeaderMap, header};

use crate::services::auth::AuthError;

/// Pull the raw token out of the `Authorization` header.
///
/// The value must be exactly `Bearer` + one space + token. The token is
/// returned as-is; no trimming or decoding.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(AuthError::MissingHeader);
    };
    if value.is_empty() {
        return Err(AuthError::MissingHeader);
    }

    let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}
