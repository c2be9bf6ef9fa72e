use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{Order, OrderHistoryEntry, OrderItem},
    order_status::OrderStatus,
};

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 120, message = "customer name is required"))]
    pub customer_name: String,
    #[validate(email(message = "customer email is not a valid address"))]
    pub customer_email: String,
    #[validate(length(max = 32))]
    pub customer_phone: Option<String>,
    #[validate(length(min = 1, max = 1000, message = "shipping address is required"))]
    pub shipping_address: String,
    #[validate(length(min = 1, message = "order must contain at least one item"))]
    #[validate(nested)]
    pub items: Vec<CreateOrderItem>,
}

/// One cart line. Display fields and `unit_price` are what the client saw; the
/// order is priced and snapshotted from the catalog row read at commit time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateOrderItem {
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub unit_price: Option<i64>,
    #[validate(range(min = 1, max = 9999, message = "quantity must be between 1 and 9999"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreatedOrder {
    pub order_id: Uuid,
    pub order_number: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub tracking_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct CancelOrderRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct StockCheckRequest {
    #[validate(length(min = 1))]
    #[validate(nested)]
    pub items: Vec<StockCheckLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct StockCheckLine {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: Vec<OrderHistoryEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
