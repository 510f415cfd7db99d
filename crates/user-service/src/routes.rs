//! `/api/user` routes.

use axum::{
    Json, Router, middleware,
    extract::{Path, State},
    routing::{delete, get, patch, post},
};
use axum_extra::extract::CookieJar;
use bson::doc;
use serde_json::json;

use bazaar_core::{Role, StoreId, UserId, sanitize::escape_html};
use bazaar_gateway::{
    ApiError, Identity, Result, clear_csrf_cookie, clear_session_cookie, csrf_cookie,
    csrf_protection, disable_cache, issue_csrf_token, require_auth, session_cookie,
};

use crate::models::{
    LinkStoreRequest, LoginRequest, PublicUser, SignupRequest, StoreAccessTokenRequest,
    UpdateProfileRequest, User,
};
use crate::services::{hash_password, validate_password, verify_password};
use crate::state::AppState;

/// Build the `/api/user` router with the full middleware chain.
pub fn router(state: AppState) -> Router {
    let gateway = state.gateway.clone();

    let public = Router::new()
        .route("/login", post(login))
        .route("/signup", post(signup))
        .with_state(state.clone());

    let guarded = Router::new()
        .route("/", get(list_users))
        .route("/logout", post(logout))
        .route("/admin/usercount", get(user_count))
        .route("/access-token/{userName}/{role}", get(get_access_token))
        .route("/access-token", patch(store_access_token))
        .route("/update", patch(update_profile))
        .route("/updateUserStore", patch(link_store))
        .route("/deleteUser/{id}", delete(delete_user))
        .route("/{id}/{role}", get(get_user))
        .with_state(state)
        .merge(
            Router::new()
                .route("/csrf-token", get(issue_csrf_token))
                .with_state(gateway.clone()),
        )
        .layer(middleware::from_fn_with_state(
            gateway.clone(),
            csrf_protection,
        ))
        .layer(middleware::from_fn_with_state(gateway, require_auth));

    Router::new()
        .nest("/api/user", public.merge(guarded))
        .layer(middleware::from_fn(disable_cache))
}

/// Issue both session cookies for a freshly authenticated user.
fn login_cookies(state: &AppState, jar: CookieJar, user: &User) -> Result<CookieJar> {
    let user_id = user
        .id
        .ok_or_else(|| ApiError::Internal("stored user has no id".to_owned()))?;

    let session = state.gateway.auth.issue(user_id, user.role)?;
    let csrf = state.gateway.csrf.generate(&user_id.to_string())?;

    Ok(jar.add(session_cookie(session)).add(csrf_cookie(csrf)))
}

async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<SignupRequest>,
) -> Result<(CookieJar, Json<PublicUser>)> {
    validate_password(&body.password)?;

    let user = User {
        id: None,
        user_name: escape_html(&body.user_name),
        email: escape_html(&body.email),
        password: hash_password(&body.password)?,
        role: body.role,
        store_id: None,
        access_token: None,
    };

    let user = state.users.create(user).await?;
    tracing::info!(user_name = %user.user_name, role = %user.role, "user created");

    let jar = login_cookies(&state, jar, &user)?;
    Ok((jar, Json(user.into())))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<PublicUser>)> {
    let user = state
        .users
        .find_by_user_name(&escape_html(&body.user_name))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_owned()))?;

    verify_password(&body.password, &user.password)?;
    tracing::info!(user_name = %user.user_name, "login");

    let jar = login_cookies(&state, jar, &user)?;
    Ok((jar, Json(user.into())))
}

async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let jar = jar.add(clear_session_cookie()).add(clear_csrf_cookie());
    (jar, Json(json!({ "status": "ok" })))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<PublicUser>>> {
    let users = state.users.find_all().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

async fn user_count(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let count = state.users.count().await?;
    Ok(Json(json!({ "userCount": count })))
}

async fn get_user(
    State(state): State<AppState>,
    Path((id, role)): Path<(String, String)>,
) -> Result<Json<PublicUser>> {
    let id = UserId::parse(&id)?;
    let role: Role = role.parse()?;

    let user = state
        .users
        .find_by_id_and_role(id, role)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".to_owned()))?;

    Ok(Json(user.into()))
}

async fn get_access_token(
    State(state): State<AppState>,
    Path((user_name, role)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>> {
    let role: Role = role.parse()?;
    let token = state.users.access_token(&user_name, role).await?;
    Ok(Json(json!({ "accessToken": token })))
}

async fn update_profile(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>> {
    let mut set = doc! {};
    if let Some(user_name) = &body.user_name {
        set.insert("userName", escape_html(user_name));
    }
    if let Some(email) = &body.email {
        set.insert("email", escape_html(email));
    }
    if let Some(password) = &body.password {
        validate_password(password)?;
        set.insert("password", hash_password(password)?);
    }
    if set.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".to_owned()));
    }

    let user = state.users.apply_set(identity.user_id, set).await?;
    Ok(Json(user.into()))
}

async fn link_store(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<LinkStoreRequest>,
) -> Result<Json<PublicUser>> {
    let store_id = StoreId::parse(&body.store_id)?;
    let user = state.users.link_store(identity.user_id, store_id).await?;
    tracing::info!(user_id = %identity.user_id, store_id = %store_id, "merchant linked to store");
    Ok(Json(user.into()))
}

async fn store_access_token(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<StoreAccessTokenRequest>,
) -> Result<Json<PublicUser>> {
    let user = state
        .users
        .set_access_token(identity.user_id, &body.access_token)
        .await?;
    Ok(Json(user.into()))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let id = UserId::parse(&id)?;
    state.users.delete(id).await?;
    tracing::info!(user_id = %id, "user deleted");
    Ok(Json(json!({ "status": "ok" })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    //! Guard-chain tests over the real router.
    //!
    //! The database client is lazy, so these exercise everything up to
    //! (but never into) the repository layer: auth rejections, CSRF
    //! rejections, and identifier validation.

    use std::net::IpAddr;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use secrecy::SecretString;
    use tower::ServiceExt;

    use bazaar_gateway::{GatewayState, ServiceConfig, auth::AUTH_COOKIE};

    use super::*;

    fn test_config() -> ServiceConfig {
        ServiceConfig {
            host: "127.0.0.1".parse::<IpAddr>().unwrap(),
            port: 0,
            mongo_uri: SecretString::from("mongodb://localhost:27017"),
            database: "bazaar_test".to_owned(),
            jwt_secret: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6q"),
            csrf_secret: SecretString::from("Qw3!rT8@yU2#iO6$pA1%sD5^fG9&hJ4*"),
            session_ttl_secs: 3600,
            csrf_ttl_secs: 3600,
            sentry_dsn: None,
        }
    }

    async fn test_app() -> (Router, GatewayState) {
        let config = test_config();
        let gateway = GatewayState::from_config(&config);
        // Lazy client; nothing in these tests performs I/O against it.
        let db = bazaar_gateway::db::connect(&config.mongo_uri, &config.database)
            .await
            .unwrap();
        let state = AppState::new(gateway.clone(), db);
        (router(state), gateway)
    }

    fn session(gateway: &GatewayState) -> String {
        let token = gateway.auth.issue(UserId::new(), Role::Admin).unwrap();
        format!("{AUTH_COOKIE}={token}")
    }

    #[tokio::test]
    async fn test_list_users_requires_session() {
        let (app, _) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/user/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_delete_user_requires_csrf() {
        let (app, gateway) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/user/deleteUser/{}", UserId::new()))
                    .header(header::COOKIE, session(&gateway))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_malformed_user_id_is_400_before_lookup() {
        let (app, gateway) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/user/not-an-object-id/Buyer")
                    .header(header::COOKIE, session(&gateway))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_role_is_400() {
        let (app, gateway) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/user/{}/Superuser", UserId::new()))
                    .header(header::COOKIE, session(&gateway))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
