use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::customers::repositories::CustomerRepository;
use crate::modules::inventory::models::{
    CreateItemRequest, InventoryItem, MovementType, NewStockMovement, StockMovement,
};
use crate::modules::inventory::repositories::InventoryRepository;
use crate::modules::taxes::models::GstProfile;

use super::low_stock::LowStockNotifier;

/// Inventory ledger: owns stock levels and their movement history.
///
/// All quantity changes flow through `adjust_stock`, which delegates the
/// atomic guard-and-write to the repository and appends the movement.
pub struct InventoryService {
    inventory_repo: Arc<dyn InventoryRepository>,
    customer_repo: Arc<dyn CustomerRepository>,
    notifier: Arc<dyn LowStockNotifier>,
}

impl InventoryService {
    pub fn new(
        inventory_repo: Arc<dyn InventoryRepository>,
        customer_repo: Arc<dyn CustomerRepository>,
        notifier: Arc<dyn LowStockNotifier>,
    ) -> Self {
        Self {
            inventory_repo,
            customer_repo,
            notifier,
        }
    }

    /// Takes a new item into stock.
    pub async fn create_item(&self, request: CreateItemRequest) -> Result<InventoryItem> {
        if request.sku.trim().is_empty() {
            return Err(AppError::validation("SKU cannot be empty"));
        }
        if request.name.trim().is_empty() {
            return Err(AppError::validation("Item name cannot be empty"));
        }
        if request.quantity < 0 {
            return Err(AppError::validation(format!(
                "Opening quantity must be non-negative, got: {}",
                request.quantity
            )));
        }
        if request.unit_price < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Unit price must be non-negative, got: {}",
                request.unit_price
            )));
        }
        if request.min_stock < 0 {
            return Err(AppError::validation(format!(
                "Minimum stock must be non-negative, got: {}",
                request.min_stock
            )));
        }

        let gst = request.gst.unwrap_or_else(GstProfile::exempt);
        if gst.rate < Decimal::ZERO || gst.rate > Decimal::ONE_HUNDRED {
            return Err(AppError::validation(format!(
                "GST rate must be between 0 and 100, got: {}",
                gst.rate
            )));
        }

        let now = Utc::now();
        let item = InventoryItem {
            id: Uuid::new_v4().to_string(),
            sku: request.sku.trim().to_string(),
            name: request.name.trim().to_string(),
            category: request.category,
            quantity: request.quantity,
            unit_price: request.unit_price,
            min_stock: request.min_stock,
            gst,
            total_sold: 0,
            last_sale_date: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.inventory_repo.insert(&item).await?;

        tracing::info!(sku = %item.sku, quantity = item.quantity, "Inventory item created");
        Ok(item)
    }

    pub async fn get_item(&self, id: &str) -> Result<InventoryItem> {
        self.inventory_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Inventory item '{}' not found", id)))
    }

    pub async fn list_items(&self) -> Result<Vec<InventoryItem>> {
        self.inventory_repo.list_active().await
    }

    pub async fn movement_history(&self, item_id: &str) -> Result<Vec<StockMovement>> {
        // Surface a 404 rather than an empty history for unknown items
        self.get_item(item_id).await?;
        self.inventory_repo.movements(item_id).await
    }

    /// Applies a signed stock delta with its audit movement.
    ///
    /// Rejected when the delta is zero or would take quantity below zero;
    /// sale decrements of inactive items are rejected by the repository's
    /// atomic guard.
    pub async fn adjust_stock(
        &self,
        item_id: &str,
        delta: i32,
        movement_type: MovementType,
        actor: &str,
        note: Option<String>,
        reference: Option<String>,
    ) -> Result<InventoryItem> {
        if delta == 0 {
            return Err(AppError::validation("Stock adjustment cannot be zero"));
        }

        let movement = NewStockMovement {
            movement_type,
            quantity_change: delta,
            actor: actor.to_string(),
            note,
            reference,
        };

        let item = self.inventory_repo.adjust_quantity(item_id, movement).await?;

        tracing::info!(
            sku = %item.sku,
            delta,
            movement_type = %movement_type,
            quantity = item.quantity,
            "Stock adjusted"
        );

        if delta < 0 && item.is_low_stock() {
            let notifier = Arc::clone(&self.notifier);
            let snapshot = item.clone();
            tokio::spawn(async move {
                notifier.low_stock(snapshot).await;
            });
        }

        Ok(item)
    }

    /// Dispenses an item against a pet's record, outside of a full sale
    /// (e.g. medication handed over during a visit).
    pub async fn sell_to_pet(
        &self,
        item_id: &str,
        pet_id: &str,
        owner_id: &str,
        quantity: i32,
        actor: &str,
        note: Option<String>,
    ) -> Result<InventoryItem> {
        if quantity <= 0 {
            return Err(AppError::validation(format!(
                "Quantity must be positive, got: {}",
                quantity
            )));
        }

        self.customer_repo
            .find_owner(owner_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Owner '{}' not found", owner_id)))?;

        let pet = self
            .customer_repo
            .find_pet(pet_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Pet '{}' not found", pet_id)))?;

        if pet.owner_id != owner_id {
            return Err(AppError::validation(format!(
                "Pet '{}' does not belong to owner '{}'",
                pet_id, owner_id
            )));
        }

        self.adjust_stock(
            item_id,
            -quantity,
            MovementType::Sale,
            actor,
            note,
            Some(format!("pet:{}", pet_id)),
        )
        .await
    }

    /// Compensating increment used by sale cancellation. Increasing stock
    /// cannot underflow, so this fails only for unknown items.
    pub async fn restore_stock(
        &self,
        item_id: &str,
        quantity: i32,
        reference: &str,
    ) -> Result<InventoryItem> {
        if quantity <= 0 {
            return Err(AppError::validation(format!(
                "Restore quantity must be positive, got: {}",
                quantity
            )));
        }

        self.adjust_stock(
            item_id,
            quantity,
            MovementType::Adjustment,
            "system",
            Some("sale cancellation".to_string()),
            Some(reference.to_string()),
        )
        .await
    }

    pub async fn deactivate_item(&self, id: &str) -> Result<()> {
        self.inventory_repo.deactivate(id).await?;
        tracing::info!(item_id = %id, "Inventory item deactivated");
        Ok(())
    }
}
