pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod order_number;
pub mod order_status;
pub mod pricing;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod stock;
