/*
 * Responsibility
 * - Config読み込み → 依存生成 (JWKS 取得を含む) → Router 組み立て
 * - Middleware の適用 (HTTP 共通 / 認証 gate は routes 側)
 * - axum::serve() で起動、Ctrl-C で graceful shutdown
 */
use std::{panic, process};

use anyhow::{Context, Result};
use axum::{Router, http::Uri, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::handlers::health::health;
use crate::config::Config;
use crate::error::AppError;
use crate::middleware;
use crate::services::auth::{build_introspection_verifier, build_jwt_verifier};
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG があればそちらを優先
    // Ex: RUST_LOG=info,token_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: プロセスごと落として即座に気付けるようにする
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("invalid configuration")?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        env = ?config.app_env,
        addr = %config.addr,
        issuer = %config.auth_issuer,
        "starting token gate"
    );

    let state = build_state(&config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    tracing::info!(addr = %config.addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

/// Process-level services. The signing keys are fetched here, before the
/// listener binds; a failure aborts startup.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let jwt = build_jwt_verifier(config).await?;
    tracing::info!(
        jwks_url = %config.jwks_url(),
        "signing keys loaded"
    );

    let introspection = build_introspection_verifier(config)?;

    Ok(AppState::new(jwt, introspection))
}

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api", api::routes(&state))
        .fallback(not_found)
        .with_state(state);

    middleware::http::apply(router)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::not_found(uri.path())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
