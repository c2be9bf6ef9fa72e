use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        CancelOrderRequest, CreateOrderRequest, CreatedOrder, OrderDetails, OrderList,
        StockCheckRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
    stock::StockValidation,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/stock-check", post(check_stock))
        .route("/{id}", get(get_order))
        .route("/{id}/cancel", post(cancel_order))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<CreatedOrder>),
        (status = 400, description = "Invalid order"),
        (status = 409, description = "Insufficient stock or concurrent update"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreatedOrder>>)> {
    let created = order_service::create_order(&state, user.user_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Order placed",
            created,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/api/orders/stock-check",
    request_body = StockCheckRequest,
    responses(
        (status = 200, description = "Stock availability per product", body = ApiResponse<StockValidation>),
        (status = 400, description = "Invalid request"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn check_stock(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<StockCheckRequest>,
) -> AppResult<Json<ApiResponse<StockValidation>>> {
    let result = order_service::check_stock(&state, payload).await?;
    Ok(Json(ApiResponse::success(
        "Stock checked",
        result,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Orders of the current user", body = ApiResponse<OrderList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let (items, meta) = order_service::list_orders(&state, Some(user.user_id), query).await?;
    Ok(Json(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items and history", body = ApiResponse<OrderDetails>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDetails>>> {
    let details = order_service::get_order(&state, &user, id).await?;
    Ok(Json(ApiResponse::success("OK", details, Some(Meta::empty()))))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order cancelled", body = ApiResponse<Order>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order can no longer be cancelled"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<CancelOrderRequest>>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let order = order_service::cancel_order(&state, &user, id, payload).await?;
    Ok(Json(ApiResponse::success(
        "Order cancelled",
        order,
        Some(Meta::empty()),
    )))
}
