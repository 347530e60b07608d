/*
 * Responsibility
 * - 環境変数や設定の読み込み (issuer, client credentials, timeouts など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

pub const DEFAULT_JWKS_PATH: &str = "/protocol/openid-connect/certs";
pub const DEFAULT_INTROSPECTION_PATH: &str = "/protocol/openid-connect/token/introspect";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // Realm URL, e.g. http://localhost:8080/realms/users. Also the expected `iss`.
    pub auth_issuer: String,
    pub auth_jwks_path: String,
    pub auth_introspection_path: String,
    pub auth_audiences: Vec<String>,
    pub access_token_leeway_seconds: u64,

    // Confidential client used for introspection
    pub auth_client_id: String,
    pub auth_client_secret: String,

    pub jwks_fetch_timeout: Duration,
    pub introspection_timeout: Duration,
    pub introspection_max_in_flight: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("auth_issuer", &self.auth_issuer)
            .field("auth_jwks_path", &self.auth_jwks_path)
            .field("auth_introspection_path", &self.auth_introspection_path)
            .field("auth_audiences", &self.auth_audiences)
            .field(
                "access_token_leeway_seconds",
                &self.access_token_leeway_seconds,
            )
            .field("auth_client_id", &self.auth_client_id)
            .field("jwks_fetch_timeout", &self.jwks_fetch_timeout)
            .field("introspection_timeout", &self.introspection_timeout)
            .field(
                "introspection_max_in_flight",
                &self.introspection_max_in_flight,
            )
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source. `from_env` uses the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let port: u16 = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 9000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        // Kept verbatim: this is also the exact `iss` value tokens must carry.
        let auth_issuer = required("AUTH_ISSUER")?.trim().to_string();
        match Url::parse(&auth_issuer) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(ConfigError::Invalid("AUTH_ISSUER")),
        }

        let auth_jwks_path = path_or_default(lookup("AUTH_JWKS_PATH"), DEFAULT_JWKS_PATH);
        let auth_introspection_path = path_or_default(
            lookup("AUTH_INTROSPECTION_PATH"),
            DEFAULT_INTROSPECTION_PATH,
        );

        let auth_audiences = lookup("AUTH_AUDIENCE")
            .unwrap_or_else(|| "account".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        if auth_audiences.is_empty() {
            return Err(ConfigError::Invalid("AUTH_AUDIENCE"));
        }

        let auth_client_id = required("AUTH_CLIENT_ID")?;
        let auth_client_secret = required("AUTH_CLIENT_SECRET")?;

        let access_token_leeway_seconds =
            parse_or(&lookup, "ACCESS_TOKEN_LEEWAY_SECONDS", 0u64)?;
        let jwks_fetch_timeout =
            Duration::from_secs(parse_or(&lookup, "JWKS_FETCH_TIMEOUT_SECONDS", 10u64)?);
        let introspection_timeout =
            Duration::from_secs(parse_or(&lookup, "INTROSPECTION_TIMEOUT_SECONDS", 10u64)?);

        let introspection_max_in_flight =
            parse_or(&lookup, "INTROSPECTION_MAX_IN_FLIGHT", 64usize)?;
        if introspection_max_in_flight == 0 {
            return Err(ConfigError::Invalid("INTROSPECTION_MAX_IN_FLIGHT"));
        }

        Ok(Self {
            addr,
            app_env,
            auth_issuer,
            auth_jwks_path,
            auth_introspection_path,
            auth_audiences,
            access_token_leeway_seconds,
            auth_client_id,
            auth_client_secret,
            jwks_fetch_timeout,
            introspection_timeout,
            introspection_max_in_flight,
        })
    }

    pub fn jwks_url(&self) -> String {
        self.endpoint(&self.auth_jwks_path)
    }

    pub fn introspection_url(&self) -> String {
        self.endpoint(&self.auth_introspection_path)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.auth_issuer.trim_end_matches('/'), path)
    }
}

fn path_or_default(raw: Option<String>, default: &str) -> String {
    let path = raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string());

    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}
