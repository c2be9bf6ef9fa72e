use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::OrderConfig;

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub orders: Arc<OrderConfig>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, orders: OrderConfig, jwt_secret: &str) -> Self {
        Self {
            orm,
            orders: Arc::new(orders),
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}
