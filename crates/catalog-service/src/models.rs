//! Catalog item documents and request shapes.

use serde::{Deserialize, Serialize};

use bazaar_core::{ItemId, StoreId, UserId};

/// A buyer review embedded in an item document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
}

/// A catalog item. Reviews are embedded; there is one review per user at
/// most, enforced at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    #[serde(rename = "storeID")]
    pub store_id: StoreId,
    pub item_name: String,
    pub item_description: String,
    pub item_price: f64,
    pub item_quantity: i64,
    pub discount: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_image: Option<String>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

/// Whether `user_id` has already reviewed this item.
#[must_use]
pub fn has_review_by(reviews: &[Review], user_id: UserId) -> bool {
    reviews.iter().any(|r| r.user_id == user_id)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    #[serde(rename = "storeID")]
    pub store_id: String,
    pub item_name: String,
    pub item_description: String,
    pub item_price: f64,
    pub item_quantity: i64,
    pub discount: u32,
    pub item_image: Option<String>,
}

/// Partial item update; absent fields are left untouched.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[serde(rename = "itemID")]
    pub item_id: String,
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    pub item_price: Option<f64>,
    pub item_quantity: Option<i64>,
    pub discount: Option<u32>,
    pub item_image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    #[serde(rename = "itemID")]
    pub item_id: String,
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReviewRequest {
    #[serde(rename = "itemID")]
    pub item_id: String,
}

#[derive(Debug, Deserialize)]
pub struct FindOneQuery {
    #[serde(rename = "itemID")]
    pub item_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(user_id: UserId) -> Review {
        Review {
            user_id,
            user_name: "ada".to_owned(),
            rating: 5,
            comment: "great".to_owned(),
        }
    }

    #[test]
    fn test_has_review_by() {
        let reviewer = UserId::new();
        let reviews = vec![review(reviewer), review(UserId::new())];

        assert!(has_review_by(&reviews, reviewer));
        assert!(!has_review_by(&reviews, UserId::new()));
        assert!(!has_review_by(&[], reviewer));
    }
}
