use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{
        order_history::Model as HistoryModel, order_items::Model as OrderItemModel,
        orders::Model as OrderModel,
    },
    error::AppResult,
    order_status::OrderStatus,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub status: OrderStatus,
    pub subtotal: i64,
    pub tax: i64,
    pub shipping_cost: i64,
    pub total: i64,
    pub shipping_address: String,
    pub payment_method: String,
    pub payment_status: String,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<String>,
    pub cancelled_by_role: Option<String>,
    pub cancellation_reason: Option<String>,
    pub item_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub line_number: i32,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub unit_price: i64,
    pub quantity: i32,
    pub total_price: i64,
    pub discount_amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderHistoryEntry {
    pub id: Uuid,
    pub order_id: Uuid,
    pub previous_status: Option<OrderStatus>,
    pub new_status: OrderStatus,
    pub actor_id: String,
    pub actor_email: Option<String>,
    pub actor_role: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Who performed a change. Supplied pre-verified by the auth layer, or
/// [`Actor::system`] for changes the engine makes on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub email: Option<String>,
    pub role: ActorRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    Admin,
    System,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Customer => "customer",
            ActorRole::Admin => "admin",
            ActorRole::System => "system",
        }
    }
}

impl Actor {
    pub fn system() -> Self {
        Self {
            id: "system".to_string(),
            email: None,
            role: ActorRole::System,
        }
    }
}

pub(crate) fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        order_number: model.order_number,
        user_id: model.user_id,
        customer_name: model.customer_name,
        customer_email: model.customer_email,
        customer_phone: model.customer_phone,
        status: model.status.parse()?,
        subtotal: model.subtotal,
        tax: model.tax,
        shipping_cost: model.shipping_cost,
        total: model.total,
        shipping_address: model.shipping_address,
        payment_method: model.payment_method,
        payment_status: model.payment_status,
        tracking_number: model.tracking_number,
        shipped_at: model.shipped_at.map(|dt| dt.with_timezone(&Utc)),
        delivered_at: model.delivered_at.map(|dt| dt.with_timezone(&Utc)),
        cancelled_at: model.cancelled_at.map(|dt| dt.with_timezone(&Utc)),
        cancelled_by: model.cancelled_by,
        cancelled_by_role: model.cancelled_by_role,
        cancellation_reason: model.cancellation_reason,
        item_count: model.item_count,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub(crate) fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        line_number: model.line_number,
        product_id: model.product_id,
        product_name: model.product_name,
        sku: model.sku,
        image_url: model.image_url,
        unit_price: model.unit_price,
        quantity: model.quantity,
        total_price: model.total_price,
        discount_amount: model.discount_amount,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub(crate) fn history_from_entity(model: HistoryModel) -> AppResult<OrderHistoryEntry> {
    Ok(OrderHistoryEntry {
        id: model.id,
        order_id: model.order_id,
        previous_status: model.previous_status.as_deref().map(str::parse).transpose()?,
        new_status: model.new_status.parse()?,
        actor_id: model.actor_id,
        actor_email: model.actor_email,
        actor_role: model.actor_role,
        reason: model.reason,
        created_at: model.created_at.with_timezone(&Utc),
    })
}
