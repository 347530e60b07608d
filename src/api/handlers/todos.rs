/*
 * Responsibility
 * - /todos 系 handler
 * - private 系は検証方式に依らず同じ handler (AuthCtx を受け取るだけ)
 */
use axum::Json;

use crate::api::dto::todos::{PrivateTodosResponse, PublicTodosResponse, TODOS};
use crate::api::extractors::AuthCtxExtractor;

pub async fn public_todos() -> Json<PublicTodosResponse> {
    Json(PublicTodosResponse {
        message: "Public endpoint - no authentication required",
        data: &TODOS,
    })
}

pub async fn private_todos(
    AuthCtxExtractor(user): AuthCtxExtractor,
) -> Json<PrivateTodosResponse> {
    Json(PrivateTodosResponse {
        message: "Protected endpoint - authentication required",
        data: &TODOS,
        authenticated_user: user,
    })
}
