//! Bearer token verification.
//!
//! Tokens are HS256 JWTs issued by the external auth service. The `id` claim
//! (or the standard `sub`) carries the caller's user id; `exp` is enforced.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use notekeep_core::ObjectId;

use crate::error::ApiError;
use crate::state::AppState;

/// Message for every rejected token.
pub const NOT_AUTHORIZED_MSG: &str = "Not authorized to access this route";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(alias = "sub")]
    pub id: String,
    pub exp: usize,
}

/// Verifies bearer tokens against a shared secret.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Decode `token` and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<ObjectId, ApiError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            debug!(subsystem = "api", component = "auth", error = %e, "Token rejected");
            ApiError::Unauthorized(NOT_AUTHORIZED_MSG.to_string())
        })?;
        data.claims
            .id
            .parse()
            .map_err(|_| ApiError::Unauthorized(NOT_AUTHORIZED_MSG.to_string()))
    }
}

/// The authenticated caller. Rejects the request with 401 when the bearer
/// token is missing or invalid.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: ObjectId,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized(NOT_AUTHORIZED_MSG.to_string()))?;

        let id = state.verifier.verify(token)?;
        Ok(AuthUser { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token_with(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn far_future() -> usize {
        4_102_444_800 // 2100-01-01
    }

    #[test]
    fn test_valid_token_yields_user_id() {
        let user = ObjectId::new();
        let token = token_with(
            serde_json::json!({"id": user.to_hex(), "exp": far_future()}),
            SECRET,
        );
        assert_eq!(JwtVerifier::new(SECRET).verify(&token).unwrap(), user);
    }

    #[test]
    fn test_sub_claim_is_accepted() {
        let user = ObjectId::new();
        let token = token_with(
            serde_json::json!({"sub": user.to_hex(), "exp": far_future()}),
            SECRET,
        );
        assert_eq!(JwtVerifier::new(SECRET).verify(&token).unwrap(), user);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = token_with(
            serde_json::json!({"id": ObjectId::new().to_hex(), "exp": far_future()}),
            "other-secret",
        );
        assert!(matches!(
            JwtVerifier::new(SECRET).verify(&token),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = token_with(
            serde_json::json!({"id": ObjectId::new().to_hex(), "exp": 1_000_000}),
            SECRET,
        );
        assert!(JwtVerifier::new(SECRET).verify(&token).is_err());
    }

    #[test]
    fn test_non_object_id_subject_is_rejected() {
        let token = token_with(
            serde_json::json!({"id": "user-42", "exp": far_future()}),
            SECRET,
        );
        assert!(JwtVerifier::new(SECRET).verify(&token).is_err());
    }
}
