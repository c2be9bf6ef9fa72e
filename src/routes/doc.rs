use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::orders::{
        CancelOrderRequest, CreateOrderItem, CreateOrderRequest, CreatedOrder, OrderDetails,
        OrderList, StockCheckLine, StockCheckRequest, UpdateOrderStatusRequest,
    },
    models::{ActorRole, Order, OrderHistoryEntry, OrderItem},
    order_status::OrderStatus,
    response::{ApiResponse, Meta},
    routes::{admin, health, orders, params},
    stock::{StockCheckItem, StockValidation},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        orders::create_order,
        orders::check_stock,
        orders::list_orders,
        orders::get_order,
        orders::cancel_order,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status
    ),
    components(
        schemas(
            Order,
            OrderItem,
            OrderHistoryEntry,
            OrderStatus,
            ActorRole,
            CreateOrderRequest,
            CreateOrderItem,
            CreatedOrder,
            CancelOrderRequest,
            UpdateOrderStatusRequest,
            StockCheckRequest,
            StockCheckLine,
            StockCheckItem,
            StockValidation,
            OrderDetails,
            OrderList,
            params::OrderListQuery,
            params::SortOrder,
            Meta,
            ApiResponse<CreatedOrder>,
            ApiResponse<Order>,
            ApiResponse<OrderDetails>,
            ApiResponse<OrderList>,
            ApiResponse<StockValidation>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Checkout and customer order endpoints"),
        (name = "Admin", description = "Order administration endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
