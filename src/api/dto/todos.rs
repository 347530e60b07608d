/*
 * Responsibility
 * - Todos の response DTO
 * - デモ用の固定データ (ストレージは持たない)
 */
use serde::Serialize;

use crate::api::extractors::AuthCtx;

#[derive(Debug, Clone, Serialize)]
pub struct Todo {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub completed: bool,
}

pub static TODOS: [Todo; 3] = [
    Todo {
        id: "1",
        title: "Learn Rust",
        description: "Study ownership, borrowing and async Rust",
        completed: false,
    },
    Todo {
        id: "2",
        title: "Build API",
        description: "Create REST API with axum",
        completed: false,
    },
    Todo {
        id: "3",
        title: "Integrate Keycloak",
        description: "Add authentication with Keycloak",
        completed: true,
    },
];

#[derive(Debug, Serialize)]
pub struct PublicTodosResponse {
    pub message: &'static str,
    pub data: &'static [Todo],
}

#[derive(Debug, Serialize)]
pub struct PrivateTodosResponse {
    pub message: &'static str,
    pub data: &'static [Todo],
    pub authenticated_user: AuthCtx,
}
