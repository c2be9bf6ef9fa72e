use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use storefront_orders::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
    middleware::auth::Claims,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    seed_products(&orm).await?;

    // There is no login endpoint in this service; print tokens for local testing.
    let admin_token = dev_token(&config.jwt_secret, "admin@example.com", "admin")?;
    let user_token = dev_token(&config.jwt_secret, "user@example.com", "user")?;
    println!("Admin token: {admin_token}");
    println!("User token: {user_token}");
    Ok(())
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let products = vec![
        ("LED Bulb 9W Cool Day Light", "LED-9W-CDL", 9900, 500),
        ("Modular Switch 6A (Pack of 10)", "SW-6A-10", 45000, 120),
        ("Copper Wire 1.5 sq mm, 90 m", "WIRE-1.5-90", 189000, 40),
        ("Ceiling Fan 1200 mm BLDC", "FAN-1200-BLDC", 349900, 25),
        ("MCB Single Pole 16A", "MCB-SP-16", 18500, 200),
        ("Extension Board 4 Socket", "EXT-4S", 59900, 80),
    ];

    for (name, sku, price, stock) in products {
        let existing = Products::find()
            .filter(ProdCol::Sku.eq(sku))
            .one(orm)
            .await?;
        if existing.is_some() {
            continue;
        }
        ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            sku: Set(Some(sku.to_string())),
            image_url: Set(None),
            price: Set(price),
            stock: Set(stock),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

fn dev_token(secret: &str, email: &str, role: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        email: Some(email.to_string()),
        role: role.to_string(),
        exp: usize::try_from((Utc::now() + Duration::days(7)).timestamp())?,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}
