//! HMAC double-submit CSRF protection for mutating verbs.
//!
//! Tokens are `base64(timestamp:user_id:hmac_sha256_hex)`, signed over
//! `timestamp:user_id` with the shared CSRF secret. Clients fetch a token
//! from `GET /api/{service}/csrf-token` and echo it back in the
//! `x-csrf-token` header on every POST/PUT/PATCH/DELETE. Validation binds
//! the token to the authenticated user and enforces a TTL, so a token
//! lifted from one session is useless in another.

use axum::{
    Json,
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::state::GatewayState;

/// Header carrying the CSRF token on mutating requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Name of the readable CSRF cookie set at login.
pub const CSRF_COOKIE: &str = "csrf_token";

type HmacSha256 = Hmac<Sha256>;

/// Stateless CSRF token generator and validator.
#[derive(Clone)]
pub struct CsrfSigner {
    secret: SecretString,
    ttl_secs: u64,
}

impl CsrfSigner {
    #[must_use]
    pub const fn new(secret: SecretString, ttl_secs: u64) -> Self {
        Self { secret, ttl_secs }
    }

    fn sign(&self, payload: &str) -> Result<String, ApiError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| ApiError::Internal(format!("invalid CSRF key length: {e}")))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Generate a token bound to `user_id` and the current time.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Internal` if the HMAC key is rejected.
    pub fn generate(&self, user_id: &str) -> Result<String, ApiError> {
        let timestamp = Utc::now().timestamp();
        let payload = format!("{timestamp}:{user_id}");
        let signature = self.sign(&payload)?;
        Ok(BASE64.encode(format!("{payload}:{signature}")))
    }

    /// Validate a token against the expected user id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` if the token is malformed, expired,
    /// bound to a different user, or carries a bad signature.
    pub fn validate(&self, token: &str, user_id: &str) -> Result<(), ApiError> {
        let decoded = BASE64
            .decode(token)
            .map_err(|_| ApiError::Forbidden("malformed CSRF token".to_owned()))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| ApiError::Forbidden("malformed CSRF token".to_owned()))?;

        let mut parts = decoded.splitn(3, ':');
        let (Some(timestamp), Some(token_user), Some(signature)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(ApiError::Forbidden("malformed CSRF token".to_owned()));
        };

        let issued_at: i64 = timestamp
            .parse()
            .map_err(|_| ApiError::Forbidden("malformed CSRF token".to_owned()))?;

        let age = Utc::now().timestamp().saturating_sub(issued_at);
        // Negative age means a timestamp from the future, which is as bad
        // as an expired one.
        if u64::try_from(age).is_err() || age.unsigned_abs() > self.ttl_secs {
            return Err(ApiError::Forbidden("CSRF token expired".to_owned()));
        }

        if token_user.as_bytes().ct_eq(user_id.as_bytes()).unwrap_u8() != 1 {
            return Err(ApiError::Forbidden(
                "CSRF token bound to another session".to_owned(),
            ));
        }

        let expected = self.sign(&format!("{timestamp}:{token_user}"))?;
        if expected.as_bytes().ct_eq(signature.as_bytes()).unwrap_u8() != 1 {
            return Err(ApiError::Forbidden("invalid CSRF token".to_owned()));
        }

        Ok(())
    }
}

/// CSRF middleware for the guarded router.
///
/// Safe methods (GET/HEAD/OPTIONS) pass through. Mutating requests must
/// carry a valid `x-csrf-token` header bound to the authenticated user;
/// otherwise the request is rejected with 403.
pub async fn csrf_protection(
    State(state): State<GatewayState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if matches!(
        *request.method(),
        Method::GET | Method::HEAD | Method::OPTIONS
    ) {
        return Ok(next.run(request).await);
    }

    let identity = request
        .extensions()
        .get::<Identity>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("authentication required".to_owned()))?;

    let token = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Forbidden("missing CSRF token".to_owned()))?;

    state
        .csrf
        .validate(token, &identity.user_id.to_string())?;

    Ok(next.run(request).await)
}

/// Build the readable CSRF cookie set at login.
///
/// Deliberately not HttpOnly: the frontend reads it to populate the
/// `x-csrf-token` header (double-submit).
#[must_use]
pub fn csrf_cookie(token: String) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE, token))
        .path("/")
        .http_only(false)
        .same_site(SameSite::Lax)
        .build()
}

/// Build the expired CSRF cookie set at logout.
#[must_use]
pub fn clear_csrf_cookie() -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE, ""))
        .path("/")
        .same_site(SameSite::Lax)
        .removal()
        .build()
}

#[derive(Debug, Serialize)]
struct CsrfTokenBody {
    #[serde(rename = "csrfToken")]
    csrf_token: String,
}

/// `GET /csrf-token` handler, mounted inside each service's guarded router.
///
/// # Errors
///
/// Returns `ApiError::Internal` if token generation fails.
pub async fn issue_csrf_token(
    State(state): State<GatewayState>,
    identity: Identity,
) -> Result<Json<impl Serialize>, ApiError> {
    let token = state.csrf.generate(&identity.user_id.to_string())?;
    Ok(Json(CsrfTokenBody { csrf_token: token }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signer() -> CsrfSigner {
        CsrfSigner::new(
            SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6q"),
            3600,
        )
    }

    #[test]
    fn test_generate_validate_roundtrip() {
        let signer = signer();
        let token = signer.generate("65f1a2b3c4d5e6f708192a3b").unwrap();
        assert!(signer.validate(&token, "65f1a2b3c4d5e6f708192a3b").is_ok());
    }

    #[test]
    fn test_token_bound_to_user() {
        let signer = signer();
        let token = signer.generate("65f1a2b3c4d5e6f708192a3b").unwrap();
        assert!(signer.validate(&token, "65f1a2b3c4d5e6f708192a3c").is_err());
    }

    #[test]
    fn test_rejects_tampered_token() {
        let signer = signer();
        let token = signer.generate("65f1a2b3c4d5e6f708192a3b").unwrap();

        let mut decoded = String::from_utf8(BASE64.decode(&token).unwrap()).unwrap();
        decoded.pop();
        decoded.push('0');
        let tampered = BASE64.encode(decoded);

        assert!(signer.validate(&tampered, "65f1a2b3c4d5e6f708192a3b").is_err());
    }

    #[test]
    fn test_rejects_expired_token() {
        let zero_ttl = CsrfSigner::new(
            SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6q"),
            0,
        );
        let payload = format!("{}:u1", Utc::now().timestamp() - 10);
        let signature = zero_ttl.sign(&payload).unwrap();
        let token = BASE64.encode(format!("{payload}:{signature}"));

        assert!(zero_ttl.validate(&token, "u1").is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        let signer = signer();
        assert!(signer.validate("not-base64!!", "u1").is_err());
        assert!(signer.validate(&BASE64.encode("no-colons"), "u1").is_err());
        assert!(signer.validate("", "u1").is_err());
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let token = signer().generate("u1").unwrap();
        let other = CsrfSigner::new(
            SecretString::from("Qw3!rT8@yU2#iO6$pA1%sD5^fG9&hJ4*"),
            3600,
        );
        assert!(other.validate(&token, "u1").is_err());
    }
}
