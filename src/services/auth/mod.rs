pub mod error;
pub mod factory;
pub mod introspection;
pub mod jwt;
pub mod key_set;
pub mod verifier;

pub use error::{AuthError, VerificationMethod};
pub use factory::{build_introspection_verifier, build_jwt_verifier};
pub use introspection::{IntrospectionClient, IntrospectionResult, IntrospectionVerifier};
pub use jwt::{JwtVerifier, TokenClaims};
pub use key_set::{KeySet, KeySetError, SigningKey};
pub use verifier::{Identity, TokenVerifier};
