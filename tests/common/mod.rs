#![allow(dead_code)]

use chrono::Utc;
use sea_orm::{EntityTrait, Set};
use storefront_orders::{
    config::OrderConfig,
    db::{create_orm_conn, run_migrations},
    dto::orders::{CreateOrderItem, CreateOrderRequest},
    entity::products::{ActiveModel as ProductActive, Entity as Products},
    middleware::auth::AuthUser,
    state::AppState,
};
use uuid::Uuid;

/// Fresh state over `TEST_DATABASE_URL`, or a private in-memory SQLite database.
///
/// Every test creates its own products and users, so a shared Postgres
/// database does not need truncating between tests.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let database_url =
        std::env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm, OrderConfig::default(), "test-secret"))
}

pub async fn create_product(
    state: &AppState,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let product = ProductActive {
        id: Set(id),
        name: Set(name.to_string()),
        sku: Set(Some(format!("SKU-{}", &id.simple().to_string()[..8]))),
        image_url: Set(None),
        price: Set(price),
        stock: Set(stock),
        created_at: Set(Utc::now().into()),
    };
    Products::insert(product)
        .exec_without_returning(&state.orm)
        .await?;
    Ok(id)
}

pub async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {product_id} missing"))?;
    Ok(product.stock)
}

pub fn customer() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        email: Some("customer@example.com".into()),
        role: "user".into(),
    }
}

pub fn admin() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        email: Some("admin@example.com".into()),
        role: "admin".into(),
    }
}

pub fn item(product_id: Uuid, quantity: i32) -> CreateOrderItem {
    CreateOrderItem {
        product_id,
        product_name: None,
        sku: None,
        image_url: None,
        unit_price: None,
        quantity,
    }
}

pub fn checkout(items: Vec<CreateOrderItem>) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_name: "Asha Rao".into(),
        customer_email: "asha@example.com".into(),
        customer_phone: Some("+91 98450 00000".into()),
        shipping_address: "12 MG Road, Bengaluru 560001".into(),
        items,
    }
}
