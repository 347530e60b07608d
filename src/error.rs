/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - 認証エラーは検証方式 (method) 付きで返す
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::{AuthError, VerificationMethod};

/// Body of every error response.
///
/// `error` is a stable code, `detail` is for humans, and `method` names the
/// verification pipeline for auth rejections.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<VerificationMethod>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{source}")]
    Auth {
        source: AuthError,
        method: VerificationMethod,
    },
    #[error("{path} not found")]
    NotFound { path: String },
    #[error("request timed out")]
    Timeout,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Auth { source, .. } => source.status(),
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();

        let (error, method) = match &self {
            AppError::Auth { source, method } => (source.code(), Some(*method)),
            AppError::NotFound { .. } => ("not_found", None),
            AppError::Timeout => ("request_timeout", None),
            AppError::Internal => ("internal_server_error", None),
        };

        let body = ErrorResponse {
            error,
            detail,
            method,
        };

        (status, Json(body)).into_response()
    }
}
