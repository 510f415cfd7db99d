//! Session-token authentication middleware and extractors.
//!
//! Sessions are a signed JWT carried in an HttpOnly cookie. There is no
//! refresh and no revocation list; a token is valid until the expiry baked
//! into it. On success the middleware attaches an [`Identity`] to the
//! request extensions, which later middleware (CSRF) and handlers read.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use bazaar_core::{Role, UserId};

use crate::error::ApiError;
use crate::state::GatewayState;

/// Name of the HttpOnly session cookie.
pub const AUTH_COOKIE: &str = "bazaar_session";

/// Claims carried inside the session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, hex `ObjectId`.
    pub sub: String,
    /// User role at login time.
    pub role: Role,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
}

/// The authenticated caller, decoded from the session cookie.
///
/// Inserted into request extensions by [`require_auth`]; handlers take it
/// as an extractor.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("authentication required".to_owned()))
    }
}

/// Signing and verification keys for session tokens.
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    session_ttl_secs: i64,
}

impl AuthKeys {
    /// Build keys from the shared signing secret.
    #[must_use]
    pub fn new(secret: &SecretString, session_ttl_secs: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            session_ttl_secs,
        }
    }

    /// Issue a session token for a freshly authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Internal` if signing fails.
    pub fn issue(&self, user_id: UserId, role: Role) -> Result<String, ApiError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: now + self.session_ttl_secs,
            iat: now,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("failed to sign session token: {e}")))
    }

    /// Verify a session token and decode the caller's identity.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is malformed, has a
    /// bad signature, or has expired.
    pub fn verify(&self, token: &str) -> Result<Identity, ApiError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| ApiError::Unauthorized("invalid or expired session".to_owned()))?;

        let user_id = UserId::parse(&data.claims.sub)
            .map_err(|_| ApiError::Unauthorized("invalid session subject".to_owned()))?;

        Ok(Identity {
            user_id,
            role: data.claims.role,
        })
    }
}

/// Authentication middleware.
///
/// Extracts the session cookie, verifies it, and inserts an [`Identity`]
/// into the request extensions. Responds 401 when the cookie is absent or
/// the token does not verify.
pub async fn require_auth(
    State(state): State<GatewayState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(AUTH_COOKIE)
        .map(Cookie::value)
        .ok_or_else(|| ApiError::Unauthorized("missing session cookie".to_owned()))?;

    let identity = state.auth.verify(token)?;

    tracing::debug!(user_id = %identity.user_id, role = %identity.role, "session verified");
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Build the HttpOnly session cookie set at login.
#[must_use]
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Build the expired session cookie set at logout.
#[must_use]
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .removal()
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn keys() -> AuthKeys {
        AuthKeys::new(&SecretString::from("k9#mQ2$vX7!pL4@wZ8&nB5^rT1*uE6%j"), 3600)
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = keys();
        let user_id = UserId::new();

        let token = keys.issue(user_id, Role::Merchant).unwrap();
        let identity = keys.verify(&token).unwrap();

        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.role, Role::Merchant);
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let keys = keys();
        assert!(keys.verify("not.a.token").is_err());
        assert!(keys.verify("").is_err());
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let token = keys().issue(UserId::new(), Role::Buyer).unwrap();
        let other = AuthKeys::new(
            &SecretString::from("Qw3!rT8@yU2#iO6$pA1%sD5^fG9&hJ4*"),
            3600,
        );
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_verify_rejects_expired() {
        // ttl of -10 puts exp in the past; leeway is zero
        let keys = AuthKeys::new(&SecretString::from("k9#mQ2$vX7!pL4@wZ8&nB5^rT1*uE6%j"), -10);
        let token = keys.issue(UserId::new(), Role::Buyer).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn test_session_cookie_flags() {
        let cookie = session_cookie("abc".to_owned());
        assert_eq!(cookie.name(), AUTH_COOKIE);
        assert!(cookie.http_only().unwrap_or(false));
        assert_eq!(cookie.path(), Some("/"));
    }
}
