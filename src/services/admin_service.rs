use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::orders::{OrderDetails, UpdateOrderStatusRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Order,
    response::Meta,
    routes::params::OrderListQuery,
    services::order_service::{self, StatusChange},
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<(Vec<Order>, Meta)> {
    ensure_admin(user)?;
    order_service::list_orders(state, None, query).await
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<OrderDetails> {
    ensure_admin(user)?;
    order_service::get_order_details(&state.orm, id)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<Order> {
    ensure_admin(user)?;
    payload.validate()?;

    order_service::update_order_status(
        state,
        id,
        StatusChange {
            new_status: payload.status,
            actor: user.actor(),
            reason: payload.reason,
            tracking_number: payload.tracking_number,
        },
    )
    .await
}
