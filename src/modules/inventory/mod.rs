pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{CreateItemRequest, InventoryItem, MovementType, NewStockMovement, StockMovement};
pub use repositories::{InventoryRepository, MemoryInventoryRepository, MySqlInventoryRepository};
pub use services::{InventoryService, LogLowStockNotifier, LowStockNotifier};
