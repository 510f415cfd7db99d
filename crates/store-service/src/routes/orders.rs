//! Order handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use serde_json::json;

use bazaar_core::{
    ItemId, OrderId, OrderStatus, PaymentId, Price, Quantity, StoreId, UserId,
    sanitize::escape_html,
};
use bazaar_gateway::{ApiError, Identity, Result};

use crate::models::{
    AddOrderRequest, Order, OrderItem, OrderWithTotal, UpdateOrderStatusRequest, with_totals,
};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/add", post(add_order))
        .route("/", get(list_orders))
        .route("/get/{id}", get(get_order))
        .route("/getStoreOrder/{id}", get(store_orders_with_total))
        .route("/getAllStoreOrders", get(list_orders_slim))
        .route("/getAllStoreOrders/{id}", get(user_orders))
        .route("/getOrderCountForAdmin", get(order_count))
        .route("/update", patch(update_status))
        .route("/updateOrderStatus", patch(update_status))
        .route("/setReviewStatus/{id}", patch(set_review_status))
        .with_state(state)
}

async fn add_order(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<AddOrderRequest>,
) -> Result<Json<Order>> {
    let store_id = StoreId::parse(&body.store_id)?;
    let payment_id = PaymentId::parse(&body.payment_id)?;
    if body.items.is_empty() {
        return Err(ApiError::BadRequest("order has no items".to_owned()));
    }

    // Line prices and quantities are taken from the client as submitted;
    // they are not cross-checked against the catalog (see models::order).
    let mut items = Vec::with_capacity(body.items.len());
    for line in &body.items {
        items.push(OrderItem {
            item_id: ItemId::parse(&line.item_id)?,
            item_name: escape_html(&line.item_name),
            item_price: Price::parse(line.item_price)?.get(),
            item_quantity: Quantity::parse(line.item_quantity)?.get(),
            item_image: line.item_image.clone(),
        });
    }

    let order = Order {
        id: None,
        user_id: identity.user_id,
        store_id,
        payment_id,
        items,
        status: OrderStatus::Pending,
        reviewed: false,
    };

    let order = state.orders.create(order).await?;
    tracing::info!(user_id = %identity.user_id, store_id = %store_id, "order created");
    Ok(Json(order))
}

async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.orders.find_all().await?))
}

async fn list_orders_slim(State(state): State<AppState>) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.orders.find_all_slim().await?))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    let id = OrderId::parse(&id)?;
    let order = state
        .orders
        .find_one(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("order not found".to_owned()))?;
    Ok(Json(order))
}

/// One store's orders, each carrying its computed `totalAmount`.
async fn store_orders_with_total(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrderWithTotal>>> {
    let store_id = StoreId::parse(&id)?;
    let orders = state.orders.find_by_store(store_id).await?;
    Ok(Json(with_totals(orders)))
}

async fn user_orders(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Order>>> {
    let user_id = UserId::parse(&id)?;
    Ok(Json(state.orders.find_by_user(user_id).await?))
}

async fn order_count(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let count = state.orders.count().await?;
    Ok(Json(json!({ "orderCount": count })))
}

async fn update_status(
    State(state): State<AppState>,
    Json(body): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Order>> {
    let id = OrderId::parse(&body.order_id)?;
    let status: OrderStatus = body.status.parse()?;

    let order = state.orders.update_status(id, status).await?;
    tracing::info!(order_id = %id, status = %status, "order status updated");
    Ok(Json(order))
}

async fn set_review_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    let id = OrderId::parse(&id)?;
    Ok(Json(state.orders.set_reviewed(id).await?))
}
