pub mod order_history;
pub mod order_items;
pub mod orders;
pub mod products;

pub use order_history::Entity as OrderHistory;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
