use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::services::auth::error::{AuthError, VerificationMethod};
use crate::services::auth::key_set::KeySet;
use crate::services::auth::verifier::{Identity, TokenVerifier};

/// `aud` may be a single string or an array of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    #[default]
    None,
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn is_empty(&self) -> bool {
        match self {
            Audience::None => true,
            Audience::Single(_) => false,
            Audience::Multiple(v) => v.is_empty(),
        }
    }

    pub fn contains(&self, aud: &str) -> bool {
        match self {
            Audience::None => false,
            Audience::Single(s) => s == aud,
            Audience::Multiple(v) => v.iter().any(|a| a == aud),
        }
    }
}

/// Access token claims issued by the realm.
///
/// Everything is optional here; `JwtVerifier` decides what is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Audience::is_empty")]
    pub aud: Audience,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// Only what key selection needs from the JOSE header.
#[derive(Debug, Deserialize)]
struct JoseHeader {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

/// Local RS256/RS384/RS512 verification against the startup key set.
///
/// No network I/O happens here; cost is one RSA verify plus JSON parsing.
#[derive(Clone)]
pub struct JwtVerifier {
    keys: Arc<KeySet>,
    issuer: String,
    audiences: Vec<String>,
    leeway_seconds: u64,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("issuer", &self.issuer)
            .field("audiences", &self.audiences)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("kids", &self.keys.kids())
            .finish()
    }
}

impl JwtVerifier {
    pub fn new(
        keys: Arc<KeySet>,
        issuer: impl Into<String>,
        audiences: Vec<String>,
        leeway_seconds: u64,
    ) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            audiences,
            leeway_seconds,
        }
    }

    /// Verify signature and claims against the current wall clock.
    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.verify_token_at(token, chrono::Utc::now().timestamp())
    }

    /// Same as `verify_token`, with `now` as unix seconds.
    pub fn verify_token_at(&self, token: &str, now: i64) -> Result<TokenClaims, AuthError> {
        let header = decode_jose_header(token)?;
        let algorithm = rsa_algorithm(&header.alg)?;

        let kid = header
            .kid
            .ok_or_else(|| AuthError::UnknownKey("(missing)".to_string()))?;

        let Some(key) = self.keys.lookup(&kid) else {
            // Also what a provider-side key rotation looks like from here.
            tracing::warn!(kid = %kid, known = ?self.keys.kids(), "token signed with unknown kid");
            return Err(AuthError::UnknownKey(kid));
        };

        if let Some(key_alg) = key.alg()
            && key_alg != header.alg
        {
            return Err(AuthError::UnsupportedAlgorithm(format!(
                "{} does not match key algorithm {}",
                header.alg, key_alg
            )));
        }

        // Signature only; claims are checked below so each failure keeps its own variant.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<TokenClaims>(token, key.decoding_key(), &validation)
            .map_err(map_decode_error)?;

        self.validate_claims(&data.claims, now)?;

        Ok(data.claims)
    }

    fn validate_claims(&self, claims: &TokenClaims, now: i64) -> Result<(), AuthError> {
        match claims.iss.as_deref() {
            Some(iss) if iss == self.issuer => {}
            other => {
                return Err(AuthError::InvalidIssuer {
                    expected: self.issuer.clone(),
                    actual: other.unwrap_or_default().to_string(),
                });
            }
        }

        let leeway = i64::try_from(self.leeway_seconds).unwrap_or(i64::MAX);

        if let Some(exp) = claims.exp
            && exp.saturating_add(leeway) <= now
        {
            return Err(AuthError::Expired);
        }

        if let Some(nbf) = claims.nbf
            && nbf.saturating_sub(leeway) > now
        {
            return Err(AuthError::NotYetValid);
        }

        if !claims.aud.is_empty() && !self.audiences.iter().any(|a| claims.aud.contains(a)) {
            return Err(AuthError::InvalidAudience);
        }

        Ok(())
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    fn method(&self) -> VerificationMethod {
        VerificationMethod::Jwt
    }

    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.verify_token(token)?;

        Ok(Identity {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

fn decode_jose_header(token: &str) -> Result<JoseHeader, AuthError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::MalformedToken(
            "expected three dot-separated segments".to_string(),
        ));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|e| AuthError::MalformedToken(format!("header is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::MalformedToken(format!("header is not valid JSON: {e}")))
}

// RSASSA-PKCS1-v1_5 only; `none` and HMAC are unsupported.
fn rsa_algorithm(alg: &str) -> Result<Algorithm, AuthError> {
    match alg {
        "RS256" => Ok(Algorithm::RS256),
        "RS384" => Ok(Algorithm::RS384),
        "RS512" => Ok(Algorithm::RS512),
        other => Err(AuthError::UnsupportedAlgorithm(other.to_string())),
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature => AuthError::BadSignature,
        ErrorKind::InvalidAlgorithm => AuthError::UnsupportedAlgorithm(err.to_string()),
        _ => AuthError::MalformedToken(err.to_string()),
    }
}
