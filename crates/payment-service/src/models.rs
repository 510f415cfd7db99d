//! Payment documents and request shapes.

use serde::{Deserialize, Serialize};

use bazaar_core::{OrderId, PaymentId, PaymentStatus, StoreId};

/// A payment record against one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<PaymentId>,
    #[serde(rename = "orderID")]
    pub order_id: OrderId,
    #[serde(rename = "storeID")]
    pub store_id: StoreId,
    pub amount: f64,
    pub status: PaymentStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPaymentRequest {
    #[serde(rename = "orderID")]
    pub order_id: String,
    #[serde(rename = "storeID")]
    pub store_id: String,
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentStatusRequest {
    #[serde(rename = "paymentID")]
    pub payment_id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePaymentRequest {
    #[serde(rename = "paymentID")]
    pub payment_id: String,
}
