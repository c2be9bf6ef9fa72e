//! Advisory stock check.
//!
//! Runs on data fetched before any transaction starts, so a passing result can
//! still be invalidated by a concurrent checkout. The authoritative check lives
//! inside the order creation transaction.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StockCheckItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub requested_quantity: i32,
    pub available_stock: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StockValidation {
    pub valid: bool,
    pub valid_items: Vec<StockCheckItem>,
    pub invalid_items: Vec<StockCheckItem>,
}

pub fn validate_stock(items: Vec<StockCheckItem>) -> StockValidation {
    let (invalid_items, valid_items): (Vec<_>, Vec<_>) = items
        .into_iter()
        .partition(|item| item.requested_quantity > item.available_stock);

    StockValidation {
        valid: invalid_items.is_empty(),
        valid_items,
        invalid_items,
    }
}
