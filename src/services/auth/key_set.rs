//! Identity provider signing keys (JWKS), fetched once at startup.
//!
//! The set is built in `app::build_state` before the listener is bound and is
//! shared as `Arc<KeySet>` afterwards. It is never mutated again, so lookups
//! on the request path need no locking. A key rotation at the provider
//! requires a restart.

use std::collections::HashMap;
use std::fmt;

use base64::{
    Engine,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, general_purpose},
};
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

// Providers normally omit padding, but some emit it.
const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    general_purpose::NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Widest RSA public exponent we accept, in bytes.
const MAX_EXPONENT_BYTES: usize = 8;

#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("failed to fetch JWKS: {0}")]
    Fetch(#[source] reqwest::Error),

    #[error("JWKS endpoint returned status {0}")]
    Status(u16),

    #[error("failed to parse JWKS: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid JWK (kid '{kid}'): {reason}")]
    InvalidKey { kid: String, reason: String },

    #[error("no usable signing keys in JWKS")]
    Empty,
}

/// JWKS document as published at `<issuer>/protocol/openid-connect/certs`.
#[derive(Debug, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// A single JWK record. Only RSA members are read.
#[derive(Debug, Deserialize)]
pub struct Jwk {
    #[serde(default)]
    pub kid: String,
    pub kty: String,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
}

/// An RSA public key ready for signature verification.
///
/// `modulus` and `exponent` are unsigned big-endian integers with leading
/// zero bytes stripped.
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    alg: Option<String>,
    key_use: Option<String>,
    modulus: Vec<u8>,
    exponent: Vec<u8>,
    decoding_key: DecodingKey,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material stays out of logs
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("alg", &self.alg)
            .field("use", &self.key_use)
            .field("modulus_bits", &self.modulus_bits())
            .field("exponent", &self.exponent_u64())
            .finish()
    }
}

impl SigningKey {
    /// Build a key from an RSA JWK record.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, KeySetError> {
        let invalid = |reason: &str| KeySetError::InvalidKey {
            kid: jwk.kid.clone(),
            reason: reason.to_string(),
        };

        let n = jwk.n.as_deref().ok_or_else(|| invalid("RSA key missing 'n'"))?;
        let e = jwk.e.as_deref().ok_or_else(|| invalid("RSA key missing 'e'"))?;

        let modulus = decode_unsigned(n).map_err(|reason| invalid(&format!("modulus: {reason}")))?;
        let exponent =
            decode_unsigned(e).map_err(|reason| invalid(&format!("exponent: {reason}")))?;

        if modulus.is_empty() {
            return Err(invalid("modulus is zero"));
        }
        if exponent.is_empty() {
            return Err(invalid("exponent is zero"));
        }
        if exponent.len() > MAX_EXPONENT_BYTES {
            return Err(invalid("exponent does not fit in 64 bits"));
        }

        let decoding_key = DecodingKey::from_rsa_raw_components(&modulus, &exponent);

        Ok(Self {
            kid: jwk.kid.clone(),
            alg: jwk.alg.clone(),
            key_use: jwk.key_use.clone(),
            modulus,
            exponent,
            decoding_key,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn alg(&self) -> Option<&str> {
        self.alg.as_deref()
    }

    pub fn key_use(&self) -> Option<&str> {
        self.key_use.as_deref()
    }

    pub fn exponent(&self) -> &[u8] {
        &self.exponent
    }

    /// Exponent as a native integer. Always fits: width is checked on load.
    pub fn exponent_u64(&self) -> u64 {
        self.exponent
            .iter()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
    }

    pub fn modulus_bits(&self) -> usize {
        match self.modulus.first() {
            Some(first) => self.modulus.len() * 8 - first.leading_zeros() as usize,
            None => 0,
        }
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

/// Decode a base64url unsigned big-endian integer, dropping leading zeros.
fn decode_unsigned(value: &str) -> Result<Vec<u8>, String> {
    let mut bytes = BASE64URL.decode(value).map_err(|e| e.to_string())?;
    let first_significant = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes.drain(..first_significant);
    Ok(bytes)
}

/// Immutable `kid -> SigningKey` map.
#[derive(Debug, Default)]
pub struct KeySet {
    keys: HashMap<String, SigningKey>,
}

impl KeySet {
    /// Fetch and convert the provider's JWKS.
    ///
    /// Any failure here is meant to abort startup: the JWT pipeline cannot run
    /// without keys.
    pub async fn load(client: &reqwest::Client, jwks_url: &str) -> Result<Self, KeySetError> {
        debug!(url = %jwks_url, "fetching JWKS");

        let response = client
            .get(jwks_url)
            .send()
            .await
            .map_err(KeySetError::Fetch)?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeySetError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(KeySetError::Fetch)?;
        let document: Jwks = serde_json::from_slice(&body)?;

        let key_set = Self::from_jwks(document)?;

        info!(
            url = %jwks_url,
            key_count = key_set.len(),
            kids = ?key_set.kids(),
            "JWKS loaded"
        );

        Ok(key_set)
    }

    /// Convert a parsed JWKS document. No I/O.
    pub fn from_jwks(document: Jwks) -> Result<Self, KeySetError> {
        let mut keys = HashMap::new();

        for jwk in document.keys {
            if jwk.key_use.as_deref() == Some("enc") {
                debug!(kid = %jwk.kid, "skipping encryption key");
                continue;
            }
            if jwk.kty != "RSA" {
                warn!(kid = %jwk.kid, kty = %jwk.kty, "skipping non-RSA key");
                continue;
            }
            if jwk.kid.is_empty() {
                warn!("skipping RSA key without kid");
                continue;
            }

            let key = SigningKey::from_jwk(&jwk)?;
            debug!(kid = %key.kid(), bits = key.modulus_bits(), "loaded JWK");

            if keys.insert(key.kid().to_string(), key).is_some() {
                warn!(kid = %jwk.kid, "duplicate kid in JWKS, keeping the last one");
            }
        }

        if keys.is_empty() {
            return Err(KeySetError::Empty);
        }

        Ok(Self { keys })
    }

    pub fn lookup(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn kids(&self) -> Vec<&str> {
        let mut kids: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        kids.sort_unstable();
        kids
    }
}
