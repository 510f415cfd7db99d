//! `/api/product` routes.

use axum::{
    Json, Router, middleware,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
};
use bson::doc;
use serde_json::json;

use bazaar_core::{
    Discount, ItemId, Price, Quantity, Rating, StoreId, sanitize::escape_html,
};
use bazaar_gateway::{
    ApiError, Identity, RateLimitConfig, Result, csrf_protection, disable_cache, fixed_window,
    issue_csrf_token, require_auth,
};

use crate::models::{
    AddItemRequest, DeleteReviewRequest, FindOneQuery, Item, PaginationQuery, Review,
    ReviewRequest, UpdateItemRequest,
};
use crate::state::AppState;

const DEFAULT_PAGE_LIMIT: i64 = 10;
const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later";

/// Build the `/api/product` router with the full middleware chain.
///
/// Catalog reads are public; everything that writes sits behind the
/// session and CSRF guards. The listing, pagination, and item-update
/// routes carry their own fixed-window budgets.
pub fn router(state: AppState) -> Router {
    let gateway = state.gateway.clone();

    let listing = Router::new()
        .route("/", get(list_items))
        .route_layer(middleware::from_fn_with_state(
            gateway.limiter("product:list", RateLimitConfig::per_minute(10, RATE_LIMIT_MESSAGE)),
            fixed_window,
        ))
        .with_state(state.clone());

    let pagination = Router::new()
        .route("/pagination", get(paginate_items))
        .route_layer(middleware::from_fn_with_state(
            gateway.limiter(
                "product:pagination",
                RateLimitConfig::per_minute(10, RATE_LIMIT_MESSAGE),
            ),
            fixed_window,
        ))
        .with_state(state.clone());

    let public = Router::new()
        .route("/findOne", get(find_one))
        .with_state(state.clone())
        .merge(listing)
        .merge(pagination);

    let update_item_route = Router::new()
        .route("/updateItem", patch(update_item))
        .route_layer(middleware::from_fn_with_state(
            gateway.limiter(
                "product:update",
                RateLimitConfig::per_minute(10, RATE_LIMIT_MESSAGE),
            ),
            fixed_window,
        ))
        .with_state(state.clone());

    let guarded = Router::new()
        .route("/addItem", post(add_item))
        .route("/addReview", patch(add_review))
        .route("/modifyReview", patch(modify_review))
        .route("/deleteReview", patch(delete_review))
        .route("/deleteItem/{id}", delete(delete_item))
        .route("/deleteStoreItems/{id}", delete(delete_store_items))
        .with_state(state)
        .merge(update_item_route)
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
        .nest("/api/product", public.merge(guarded))
        .layer(middleware::from_fn(disable_cache))
}

async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>> {
    Ok(Json(state.items.find_all().await?))
}

async fn find_one(
    State(state): State<AppState>,
    Query(query): Query<FindOneQuery>,
) -> Result<Json<Item>> {
    let id = ItemId::parse(&query.item_id)?;
    let item = state
        .items
        .find_one(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("item not found".to_owned()))?;
    Ok(Json(item))
}

async fn paginate_items(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<serde_json::Value>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if limit <= 0 {
        return Err(ApiError::BadRequest("limit must be positive".to_owned()));
    }

    let (items, total_pages) = state.items.paginate(page, limit).await?;
    Ok(Json(json!({
        "items": items,
        "page": page,
        "totalPages": total_pages,
    })))
}

async fn add_item(
    State(state): State<AppState>,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<Item>> {
    let store_id = StoreId::parse(&body.store_id)?;
    let price = Price::parse(body.item_price)?;
    let quantity = Quantity::parse(body.item_quantity)?;
    let discount = Discount::parse(body.discount)?;

    let item = Item {
        id: None,
        store_id,
        item_name: escape_html(&body.item_name),
        item_description: escape_html(&body.item_description),
        item_price: price.get(),
        item_quantity: quantity.get(),
        discount: discount.get(),
        item_image: body.item_image,
        reviews: Vec::new(),
    };

    let item = state.items.create(item).await?;
    tracing::info!(store_id = %store_id, item_name = %item.item_name, "item created");
    Ok(Json(item))
}

async fn update_item(
    State(state): State<AppState>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<Item>> {
    let id = ItemId::parse(&body.item_id)?;

    let mut set = doc! {};
    if let Some(name) = &body.item_name {
        set.insert("itemName", escape_html(name));
    }
    if let Some(description) = &body.item_description {
        set.insert("itemDescription", escape_html(description));
    }
    if let Some(price) = body.item_price {
        set.insert("itemPrice", Price::parse(price)?.get());
    }
    if let Some(quantity) = body.item_quantity {
        set.insert("itemQuantity", Quantity::parse(quantity)?.get());
    }
    if let Some(discount) = body.discount {
        set.insert("discount", i64::from(Discount::parse(discount)?.get()));
    }
    if let Some(image) = &body.item_image {
        set.insert("itemImage", image);
    }
    if set.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".to_owned()));
    }

    Ok(Json(state.items.apply_set(id, set).await?))
}

fn review_from(body: &ReviewRequest, identity: &Identity) -> Result<(ItemId, Review)> {
    let id = ItemId::parse(&body.item_id)?;
    let rating = Rating::parse(body.rating)?;

    let review = Review {
        user_id: identity.user_id,
        user_name: escape_html(&body.user_name),
        rating: rating.get(),
        comment: escape_html(&body.comment),
    };
    Ok((id, review))
}

async fn add_review(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<Item>> {
    let (id, review) = review_from(&body, &identity)?;
    let item = state.items.add_review(id, &review).await?;
    tracing::info!(item_id = %id, user_id = %identity.user_id, "review added");
    Ok(Json(item))
}

async fn modify_review(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<Item>> {
    let (id, review) = review_from(&body, &identity)?;
    Ok(Json(state.items.modify_review(id, &review).await?))
}

async fn delete_review(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<DeleteReviewRequest>,
) -> Result<Json<Item>> {
    let id = ItemId::parse(&body.item_id)?;
    Ok(Json(state.items.delete_review(id, identity.user_id).await?))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let id = ItemId::parse(&id)?;
    state.items.delete(id).await?;
    tracing::info!(item_id = %id, "item deleted");
    Ok(Json(json!({ "status": "ok" })))
}

async fn delete_store_items(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let store_id = StoreId::parse(&id)?;
    let deleted = state.items.delete_store_items(store_id).await?;
    tracing::info!(store_id = %store_id, deleted, "store items deleted");
    Ok(Json(json!({ "deletedCount": deleted })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    //! Guard-chain tests over the real router; the lazy database client
    //! means nothing here performs I/O.

    use std::net::IpAddr;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use secrecy::SecretString;
    use tower::ServiceExt;

    use bazaar_core::{Role, UserId};
    use bazaar_gateway::{GatewayState, ServiceConfig, auth::AUTH_COOKIE, csrf::CSRF_HEADER};

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
        let db = bazaar_gateway::db::connect(&config.mongo_uri, &config.database)
            .await
            .unwrap();
        let state = AppState::new(gateway.clone(), db);
        (router(state), gateway)
    }

    #[tokio::test]
    async fn test_add_item_requires_session() {
        let (app, _) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/product/addItem")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_add_review_requires_csrf() {
        let (app, gateway) = test_app().await;
        let token = gateway.auth.issue(UserId::new(), Role::Buyer).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/api/product/addReview")
                    .header(header::COOKIE, format!("{AUTH_COOKIE}={token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_malformed_item_id_is_400_before_lookup() {
        let (app, gateway) = test_app().await;
        let user_id = UserId::new();
        let session = gateway.auth.issue(user_id, Role::Buyer).unwrap();
        let csrf = gateway.csrf.generate(&user_id.to_string()).unwrap();

        let body = serde_json::json!({
            "itemID": "garbage",
            "userName": "ada",
            "rating": 5,
            "comment": "nice",
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/api/product/addReview")
                    .header(header::COOKIE, format!("{AUTH_COOKIE}={session}"))
                    .header(CSRF_HEADER, csrf)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_listing_rate_limited_after_budget() {
        let (app, _) = test_app().await;

        // limit=0 fails validation before any repository call, so every
        // request stays in-process. The tenth request within a window is
        // the budget; the eleventh must get 429 instead of 400.
        let mut last = StatusCode::OK;
        for _ in 0..11 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/api/product/pagination?limit=0")
                        .header("x-forwarded-for", "203.0.113.50")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            last = response.status();
        }

        assert_eq!(last, StatusCode::TOO_MANY_REQUESTS);
    }
}
