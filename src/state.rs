/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - 起動時に組み立てた検証器 (JWT / introspection)
 * - Clone 前提で持つ (内部は Arc)
 */
use std::sync::Arc;

use crate::services::auth::{IntrospectionVerifier, JwtVerifier};

#[derive(Clone, Debug)]
pub struct AppState {
    pub jwt: Arc<JwtVerifier>,
    pub introspection: Arc<IntrospectionVerifier>,
}

impl AppState {
    pub fn new(jwt: Arc<JwtVerifier>, introspection: Arc<IntrospectionVerifier>) -> Self {
        Self { jwt, introspection }
    }
}
