/*
 * Responsibility
 * - /api 配下の URL 構造を定義
 * - 認証 gate をどの route にどの検証方式で掛けるかもここで決める
 */
use axum::{Router, routing::get};

use crate::api::handlers::todos::{private_todos, public_todos};
use crate::middleware::auth::gate;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let public = Router::new().route("/todos/public", get(public_todos));

    // 署名検証のみ (IdP への通信なし)
    let jwt = gate::apply(
        Router::new().route("/todos/private/jwt", get(private_todos)),
        state.jwt.clone(),
    );

    // 毎リクエスト IdP に問い合わせる (失効を即時反映)
    let introspect = gate::apply(
        Router::new().route("/todos/private/token-introspect", get(private_todos)),
        state.introspection.clone(),
    );

    public.merge(jwt).merge(introspect)
}
