use async_trait::async_trait;

use crate::modules::inventory::models::InventoryItem;

/// Fire-and-forget port for low-stock alerts.
///
/// Dispatch runs on a detached task after the stock mutation commits; it
/// can never block or fail the mutation that triggered it. Delivery
/// channels (email etc.) live behind this port, outside the engine.
#[async_trait]
pub trait LowStockNotifier: Send + Sync {
    async fn low_stock(&self, item: InventoryItem);
}

/// Default notifier: a structured log line.
pub struct LogLowStockNotifier;

#[async_trait]
impl LowStockNotifier for LogLowStockNotifier {
    async fn low_stock(&self, item: InventoryItem) {
        tracing::warn!(
            sku = %item.sku,
            quantity = item.quantity,
            min_stock = item.min_stock,
            "Inventory item at or below minimum stock"
        );
    }
}
