//! User documents and request/response shapes.

use serde::{Deserialize, Serialize};

use bazaar_core::{Role, StoreId, UserId};

/// Stored user document. Never serialized to clients directly; the
/// password hash leaves the service only through [`PublicUser`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    pub user_name: String,
    pub email: String,
    /// Argon2id PHC string.
    pub password: String,
    pub role: Role,
    #[serde(rename = "storeID", skip_serializing_if = "Option::is_none")]
    pub store_id: Option<StoreId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Client-facing user shape, password hash stripped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    pub user_name: String,
    pub email: String,
    pub role: Role,
    #[serde(rename = "storeID", skip_serializing_if = "Option::is_none")]
    pub store_id: Option<StoreId>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            user_name: user.user_name,
            email: user.email,
            role: user.role,
            store_id: user.store_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_name: String,
    pub password: String,
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LinkStoreRequest {
    #[serde(rename = "storeID")]
    pub store_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreAccessTokenRequest {
    pub access_token: String,
}
