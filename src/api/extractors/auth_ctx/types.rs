/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - gate middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - JWT 検証 / introspection の中身は services 側の責務
 * - どちらの検証方式でも同じ形になる
 */
use serde::Serialize;

use crate::services::auth::Identity;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `user_id` は IdP の subject (`sub`)
/// - `email` は IdP が返した場合のみ
///
/// レスポンスの `authenticated_user` としてそのまま serialize される。
/// 値が無いフィールドは `null` になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthCtx {
    pub user_id: Option<String>,
    pub email: Option<String>,
}

impl From<Identity> for AuthCtx {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id,
            email: identity.email,
        }
    }
}
