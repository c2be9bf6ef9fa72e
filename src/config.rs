use std::{env, str::FromStr};

use anyhow::Context;
use rust_decimal::Decimal;

use crate::pricing::TotalsConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub orders: OrderConfig,
}

/// Knobs for the order engine. Every field has a default so tests can use
/// `OrderConfig::default()` directly.
#[derive(Debug, Clone)]
pub struct OrderConfig {
    pub totals: TotalsConfig,
    pub order_number_prefix: String,
    /// How many times a creation or status update transaction is attempted
    /// when the database reports a conflict.
    pub max_txn_attempts: u32,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            totals: TotalsConfig::default(),
            order_number_prefix: "ORD".to_string(),
            max_txn_attempts: 3,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            orders: OrderConfig::from_env()?,
        })
    }
}

impl OrderConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = OrderConfig::default();
        let totals = TotalsConfig {
            free_shipping_threshold: env_or(
                "FREE_SHIPPING_THRESHOLD",
                defaults.totals.free_shipping_threshold,
            )?,
            base_shipping_cost: env_or("BASE_SHIPPING_COST", defaults.totals.base_shipping_cost)?,
            tax_rate: env_or::<Decimal>("TAX_RATE", defaults.totals.tax_rate)?,
        };
        if totals.tax_rate.is_sign_negative() {
            anyhow::bail!("TAX_RATE must not be negative");
        }

        let max_txn_attempts = env_or("ORDER_TXN_MAX_ATTEMPTS", defaults.max_txn_attempts)?.max(1);

        Ok(Self {
            totals,
            order_number_prefix: env::var("ORDER_NUMBER_PREFIX")
                .unwrap_or(defaults.order_number_prefix),
            max_txn_attempts,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw}")),
        Err(_) => Ok(default),
    }
}
