use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::inventory::models::{
    InventoryItem, MovementType, NewStockMovement, StockMovement,
};

use super::InventoryRepository;

#[derive(Default)]
struct Store {
    items: HashMap<String, InventoryItem>,
    movements: Vec<StockMovement>,
}

/// In-memory inventory store for service-level tests and demos.
///
/// A single mutex covers items and movements, so the guard-and-write in
/// `adjust_quantity` is atomic exactly like its SQL counterpart.
#[derive(Default)]
pub struct MemoryInventoryRepository {
    store: Mutex<Store>,
}

impl MemoryInventoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryRepository for MemoryInventoryRepository {
    async fn insert(&self, item: &InventoryItem) -> Result<()> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        if store.items.values().any(|existing| existing.sku == item.sku) {
            return Err(AppError::conflict(format!(
                "Inventory item with SKU '{}' already exists",
                item.sku
            )));
        }
        store.items.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<InventoryItem>> {
        Ok(self
            .store
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .items
            .get(id)
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<InventoryItem>> {
        let store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        let mut items: Vec<InventoryItem> = store
            .items
            .values()
            .filter(|item| item.is_active)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn adjust_quantity(
        &self,
        item_id: &str,
        movement: NewStockMovement,
    ) -> Result<InventoryItem> {
        let now = Utc::now();
        let delta = movement.quantity_change;
        let is_sale_decrement = movement.movement_type == MovementType::Sale && delta < 0;

        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());

        let item = store
            .items
            .get_mut(item_id)
            .ok_or_else(|| AppError::not_found(format!("Inventory item '{}' not found", item_id)))?;

        if is_sale_decrement && !item.is_active {
            return Err(AppError::conflict(format!(
                "Inventory item '{}' is inactive",
                item.sku
            )));
        }
        if item.quantity + delta < 0 {
            return Err(AppError::InsufficientStock {
                sku: item.sku.clone(),
                requested: -delta,
                available: item.quantity,
            });
        }

        item.quantity += delta;
        if is_sale_decrement {
            item.total_sold += i64::from(-delta);
            item.last_sale_date = Some(now);
        }
        item.updated_at = now;
        let updated = item.clone();

        store.movements.push(StockMovement {
            id: Uuid::new_v4().to_string(),
            item_id: item_id.to_string(),
            movement_type: movement.movement_type,
            quantity_change: movement.quantity_change,
            actor: movement.actor,
            note: movement.note,
            reference: movement.reference,
            created_at: now,
        });

        Ok(updated)
    }

    async fn movements(&self, item_id: &str) -> Result<Vec<StockMovement>> {
        Ok(self
            .store
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .movements
            .iter()
            .filter(|movement| movement.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn deactivate(&self, id: &str) -> Result<()> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        let item = store
            .items
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("Inventory item '{}' not found", id)))?;
        item.is_active = false;
        item.updated_at = Utc::now();
        Ok(())
    }
}
