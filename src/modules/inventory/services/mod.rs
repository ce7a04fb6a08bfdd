mod inventory_service;
mod low_stock;

pub use inventory_service::InventoryService;
pub use low_stock::{LogLowStockNotifier, LowStockNotifier};
