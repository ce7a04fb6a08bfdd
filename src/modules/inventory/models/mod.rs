mod item;
mod stock_movement;

pub use item::{CreateItemRequest, InventoryItem};
pub use stock_movement::{MovementType, NewStockMovement, StockMovement};
