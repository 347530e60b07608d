//! Bearer token 検証 → AuthCtx を extensions に入れる
//!
//! One middleware for both strategies: it is generic over `TokenVerifier`, and
//! each protected route layers it with the verifier it wants.
//!
//! Per request: extract token → verify → either insert `AuthCtx` and run the
//! handler, or answer with the rejection. No retries.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};
use sha2::{Digest, Sha256};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::middleware::auth::bearer::extract_bearer;
use crate::services::auth::{AuthError, TokenVerifier, VerificationMethod};
use crate::state::AppState;

/// Protect every route of `router` with `verifier`.
///
/// 例：
/// ```ignore
/// let jwt_routes = Router::new().route("/todos/private/jwt", get(private_todos));
/// let jwt_routes = middleware::auth::gate::apply(jwt_routes, state.jwt.clone());
/// ```
pub fn apply<V: TokenVerifier>(router: Router<AppState>, verifier: Arc<V>) -> Router<AppState> {
    // route_layer: unmatched paths still fall through to 404 instead of 401
    router.route_layer(middleware::from_fn_with_state(verifier, gate::<V>))
}

async fn gate<V: TokenVerifier>(
    State(verifier): State<Arc<V>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let method = verifier.method();

    let token = extract_bearer(req.headers())
        .map_err(|err| reject(err, method, None))?
        .to_owned();

    let identity = verifier
        .verify(&token)
        .await
        .map_err(|err| reject(err, method, Some(&token)))?;

    tracing::debug!(
        method = %method,
        user_id = ?identity.user_id,
        "request authenticated"
    );

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::from(identity));

    Ok(next.run(req).await)
}

fn reject(err: AuthError, method: VerificationMethod, token: Option<&str>) -> AppError {
    let token_fp = token.map(fingerprint);

    if err.status().is_server_error() {
        tracing::error!(error = %err, code = err.code(), method = %method, token_fp = ?token_fp, "token verification unavailable");
    } else {
        tracing::warn!(error = %err, code = err.code(), method = %method, token_fp = ?token_fp, "token rejected");
    }

    AppError::Auth { source: err, method }
}

// Short SHA-256 prefix so log lines can be correlated without leaking the token.
fn fingerprint(token: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(token.as_bytes()));
    digest[..12].to_string()
}
