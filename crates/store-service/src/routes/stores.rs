//! Store handlers.

use axum::{
    Json, Router, middleware,
    extract::{Path, State},
    routing::{delete, get, patch, put, post},
};
use bson::doc;
use serde_json::json;

use bazaar_core::{
    Discount, ItemId, Price, Quantity, Rating, StoreId, sanitize::escape_html,
};
use bazaar_gateway::{
    ApiError, Identity, RateLimitConfig, Result, fixed_window,
};

use crate::models::{
    AddStoreRequest, DeleteStoreItemRequest, Store, StoreItem, StoreItemRequest, StoreReview,
    StoreReviewRequest, UpdateStoreRequest,
};
use crate::state::AppState;

const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later";

pub fn router(state: AppState) -> Router {
    let gateway = state.gateway.clone();

    let create = Router::new()
        .route("/add", post(add_store))
        .route_layer(middleware::from_fn_with_state(
            gateway.limiter("store:create", RateLimitConfig::per_minute(5, RATE_LIMIT_MESSAGE)),
            fixed_window,
        ))
        .with_state(state.clone());

    let mutate = Router::new()
        .route("/update", put(update_store))
        .route("/updateItem", patch(push_item))
        .route("/modifyItem", patch(replace_item))
        .route("/deleteStoreItem", patch(pull_item))
        .route("/addReview", patch(add_review))
        .route("/delete/{id}", delete(delete_store))
        .route_layer(middleware::from_fn_with_state(
            gateway.limiter("store:mutate", RateLimitConfig::per_minute(10, RATE_LIMIT_MESSAGE)),
            fixed_window,
        ))
        .with_state(state.clone());

    Router::new()
        .route("/", get(list_stores))
        .route("/get/{id}", get(get_store))
        .route("/getStoreItemCount/{id}", get(store_item_count))
        .with_state(state)
        .merge(create)
        .merge(mutate)
}

async fn add_store(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<AddStoreRequest>,
) -> Result<Json<Store>> {
    let store = Store {
        id: None,
        store_name: escape_html(&body.store_name),
        location: escape_html(&body.location),
        description: body.description.as_deref().map(escape_html),
        owner_id: identity.user_id,
        items: Vec::new(),
        reviews: Vec::new(),
    };

    let store = state.stores.create(store).await?;
    tracing::info!(owner = %identity.user_id, store_name = %store.store_name, "store created");
    Ok(Json(store))
}

async fn list_stores(State(state): State<AppState>) -> Result<Json<Vec<Store>>> {
    Ok(Json(state.stores.find_all().await?))
}

async fn get_store(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Store>> {
    let id = StoreId::parse(&id)?;
    let store = state
        .stores
        .find_one(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("store not found".to_owned()))?;
    Ok(Json(store))
}

async fn store_item_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let id = StoreId::parse(&id)?;
    let count = state.stores.item_count(id).await?;
    Ok(Json(json!({ "itemCount": count })))
}

/// `$set` document for a partial store update, free text escaped.
fn update_set(body: &UpdateStoreRequest) -> bson::Document {
    let mut set = doc! {};
    if let Some(name) = &body.store_name {
        set.insert("storeName", escape_html(name));
    }
    if let Some(location) = &body.location {
        set.insert("location", escape_html(location));
    }
    if let Some(description) = &body.description {
        set.insert("description", escape_html(description));
    }
    set
}

async fn update_store(
    State(state): State<AppState>,
    Json(body): Json<UpdateStoreRequest>,
) -> Result<Json<Store>> {
    let id = StoreId::parse(&body.store_id)?;

    let set = update_set(&body);
    if set.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".to_owned()));
    }

    Ok(Json(state.stores.apply_set(id, set).await?))
}

fn store_item_from(body: &StoreItemRequest) -> Result<(StoreId, StoreItem)> {
    let store_id = StoreId::parse(&body.store_id)?;
    let item_id = ItemId::parse(&body.item_id)?;
    let price = Price::parse(body.item_price)?;
    let quantity = Quantity::parse(body.item_quantity)?;
    let discount = Discount::parse(body.discount)?;

    let item = StoreItem {
        item_id,
        item_name: escape_html(&body.item_name),
        item_description: escape_html(&body.item_description),
        item_price: price.get(),
        item_quantity: quantity.get(),
        discount: discount.get(),
        item_image: body.item_image.clone(),
    };
    Ok((store_id, item))
}

async fn push_item(
    State(state): State<AppState>,
    Json(body): Json<StoreItemRequest>,
) -> Result<Json<Store>> {
    let (store_id, item) = store_item_from(&body)?;
    let store = state.stores.push_item(store_id, &item).await?;
    tracing::info!(store_id = %store_id, item_id = %item.item_id, "item pushed to store");
    Ok(Json(store))
}

async fn replace_item(
    State(state): State<AppState>,
    Json(body): Json<StoreItemRequest>,
) -> Result<Json<Store>> {
    let (store_id, item) = store_item_from(&body)?;
    Ok(Json(state.stores.replace_item(store_id, &item).await?))
}

async fn pull_item(
    State(state): State<AppState>,
    Json(body): Json<DeleteStoreItemRequest>,
) -> Result<Json<Store>> {
    let store_id = StoreId::parse(&body.store_id)?;
    let item_id = ItemId::parse(&body.item_id)?;
    let store = state.stores.pull_item(store_id, item_id).await?;
    tracing::info!(store_id = %store_id, item_id = %item_id, "item pulled from store");
    Ok(Json(store))
}

async fn add_review(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<StoreReviewRequest>,
) -> Result<Json<Store>> {
    let store_id = StoreId::parse(&body.store_id)?;
    let rating = Rating::parse(body.rating)?;

    let review = StoreReview {
        user_id: identity.user_id,
        user_name: escape_html(&body.user_name),
        rating: rating.get(),
        comment: escape_html(&body.comment),
    };

    Ok(Json(state.stores.push_review(store_id, &review).await?))
}

async fn delete_store(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let id = StoreId::parse(&id)?;
    state.stores.delete(id).await?;
    tracing::info!(store_id = %id, "store deleted");
    Ok(Json(json!({ "status": "ok" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(
        name: Option<&str>,
        location: Option<&str>,
        description: Option<&str>,
    ) -> UpdateStoreRequest {
        UpdateStoreRequest {
            store_id: "65f1a2b3c4d5e6f708192a3b".to_owned(),
            store_name: name.map(str::to_owned),
            location: location.map(str::to_owned),
            description: description.map(str::to_owned),
        }
    }

    #[test]
    fn test_update_set_covers_description() {
        let set = update_set(&update(Some("corner shop"), None, Some("open late")));
        assert_eq!(
            set,
            doc! { "storeName": "corner shop", "description": "open late" }
        );
    }

    #[test]
    fn test_update_set_escapes_free_text() {
        let set = update_set(&update(None, None, Some("<b>deals</b>")));
        assert_eq!(
            set,
            doc! { "description": "&lt;b&gt;deals&lt;&#x2F;b&gt;" }
        );
    }

    #[test]
    fn test_update_set_empty_when_no_fields() {
        assert!(update_set(&update(None, None, None)).is_empty());
    }
}
