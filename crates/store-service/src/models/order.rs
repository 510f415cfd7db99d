//! Order documents.
//!
//! An order snapshots the purchased items at submission time; later
//! catalog edits never rewrite history. Prices and quantities come from
//! the client and are NOT cross-checked against the catalog service; a
//! malicious client can understate its own total. Closing that gap needs
//! a catalog lookup at submission time and is tracked as a known limit of
//! the current flow.

use serde::{Deserialize, Serialize};

use bazaar_core::{ItemId, OrderId, OrderStatus, PaymentId, StoreId, UserId};

/// One purchased line, snapshotted from the catalog at submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(rename = "itemID")]
    pub item_id: ItemId,
    pub item_name: String,
    pub item_price: f64,
    pub item_quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<OrderId>,
    #[serde(rename = "userID")]
    pub user_id: UserId,
    #[serde(rename = "storeID")]
    pub store_id: StoreId,
    /// The payment the buyer opened for this order.
    #[serde(rename = "paymentID")]
    pub payment_id: PaymentId,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    /// Whether the buyer has left a review for this order.
    pub reviewed: bool,
}

/// An order decorated with its own line total, as the per-store listing
/// returns it.
#[derive(Debug, Serialize)]
pub struct OrderWithTotal {
    #[serde(flatten)]
    pub order: Order,
    #[serde(rename = "totalAmount")]
    pub total_amount: f64,
}

/// Attach each order's computed total.
#[must_use]
pub fn with_totals(orders: Vec<Order>) -> Vec<OrderWithTotal> {
    orders
        .into_iter()
        .map(|order| OrderWithTotal {
            total_amount: order_total(&order.items),
            order,
        })
        .collect()
}

/// Sum of price times quantity over the order lines.
#[must_use]
pub fn order_total(items: &[OrderItem]) -> f64 {
    items
        .iter()
        .map(|item| {
            #[allow(clippy::cast_precision_loss)]
            let quantity = item.item_quantity as f64;
            item.item_price * quantity
        })
        .sum()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOrderItem {
    #[serde(rename = "itemID")]
    pub item_id: String,
    pub item_name: String,
    pub item_price: f64,
    pub item_quantity: i64,
    pub item_image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOrderRequest {
    #[serde(rename = "storeID")]
    pub store_id: String,
    #[serde(rename = "paymentID")]
    pub payment_id: String,
    pub items: Vec<AddOrderItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    #[serde(rename = "orderID")]
    pub order_id: String,
    pub status: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(price: f64, quantity: i64) -> OrderItem {
        OrderItem {
            item_id: ItemId::new(),
            item_name: "thing".to_owned(),
            item_price: price,
            item_quantity: quantity,
            item_image: None,
        }
    }

    fn order(items: Vec<OrderItem>) -> Order {
        Order {
            id: Some(OrderId::new()),
            user_id: UserId::new(),
            store_id: StoreId::new(),
            payment_id: PaymentId::new(),
            items,
            status: OrderStatus::Pending,
            reviewed: false,
        }
    }

    #[test]
    fn test_order_total() {
        let items = vec![line(10.0, 2), line(5.0, 1)];
        assert!((order_total(&items) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_order_total_empty() {
        assert!((order_total(&[]) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_order_carries_payment_id_on_the_wire() {
        let order = order(vec![line(10.0, 1)]);
        let payment_id = order.payment_id.to_string();

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["paymentID"], serde_json::json!(payment_id));
    }

    #[test]
    fn test_each_store_order_gets_its_own_total() {
        let decorated = with_totals(vec![
            order(vec![line(10.0, 2), line(5.0, 1)]),
            order(vec![line(3.0, 4)]),
        ]);

        let json = serde_json::to_value(&decorated).unwrap();
        assert_eq!(json[0]["totalAmount"], serde_json::json!(25.0));
        assert_eq!(json[1]["totalAmount"], serde_json::json!(12.0));
        // The decoration flattens the order itself alongside the total.
        assert!(json[0]["userID"].is_string());
        assert!(json[0]["items"].is_array());
    }
}
