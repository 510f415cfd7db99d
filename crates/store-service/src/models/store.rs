//! Store documents.

use serde::{Deserialize, Serialize};

use bazaar_core::{ItemId, StoreId, UserId};

/// An inventory entry embedded in a store document. Mirrors the catalog
/// item it was copied from; `item_id` is the join key for the positional
/// mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreItem {
    #[serde(rename = "itemID")]
    pub item_id: ItemId,
    pub item_name: String,
    pub item_description: String,
    pub item_price: f64,
    pub item_quantity: i64,
    pub discount: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_image: Option<String>,
}

/// A buyer review embedded in a store document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreReview {
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
}

/// A store with its embedded inventory and reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<StoreId>,
    pub store_name: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owning merchant.
    #[serde(rename = "ownerID")]
    pub owner_id: UserId,
    #[serde(default)]
    pub items: Vec<StoreItem>,
    #[serde(default)]
    pub reviews: Vec<StoreReview>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStoreRequest {
    pub store_name: String,
    pub location: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoreRequest {
    #[serde(rename = "storeID")]
    pub store_id: String,
    pub store_name: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Push or replace one embedded inventory entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreItemRequest {
    #[serde(rename = "storeID")]
    pub store_id: String,
    #[serde(rename = "itemID")]
    pub item_id: String,
    pub item_name: String,
    pub item_description: String,
    pub item_price: f64,
    pub item_quantity: i64,
    pub discount: u32,
    pub item_image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteStoreItemRequest {
    #[serde(rename = "storeID")]
    pub store_id: String,
    #[serde(rename = "itemID")]
    pub item_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreReviewRequest {
    #[serde(rename = "storeID")]
    pub store_id: String,
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
}
