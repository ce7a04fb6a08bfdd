use async_trait::async_trait;
use chrono::Utc;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, Row, Transaction};
use std::str::FromStr;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::inventory::models::{
    InventoryItem, MovementType, NewStockMovement, StockMovement,
};
use crate::modules::taxes::models::{GstProfile, GstType};

/// Storage port for inventory items and their movement log.
///
/// `adjust_quantity` is the only way quantity changes: the guard
/// (`quantity + delta >= 0`, and active for sale decrements) and the write
/// happen in one atomic step, so concurrent sales of the same SKU cannot
/// oversell.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn insert(&self, item: &InventoryItem) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<InventoryItem>>;

    async fn list_active(&self) -> Result<Vec<InventoryItem>>;

    /// Applies the movement's signed delta under the non-negative guard and
    /// appends the movement. Sale deltas also bump `total_sold` and
    /// `last_sale_date`. Returns the updated item.
    async fn adjust_quantity(
        &self,
        item_id: &str,
        movement: NewStockMovement,
    ) -> Result<InventoryItem>;

    async fn movements(&self, item_id: &str) -> Result<Vec<StockMovement>>;

    /// Soft-deactivates an item; history stays intact.
    async fn deactivate(&self, id: &str) -> Result<()>;
}

/// MySQL-backed inventory repository
pub struct MySqlInventoryRepository {
    pool: MySqlPool,
}

impl MySqlInventoryRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_item(row: &MySqlRow) -> Result<InventoryItem> {
        let gst_type: String = row.try_get("gst_type")?;
        Ok(InventoryItem {
            id: row.try_get("id")?,
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get("unit_price")?,
            min_stock: row.try_get("min_stock")?,
            gst: GstProfile {
                applicable: row.try_get("gst_applicable")?,
                rate: row.try_get("gst_rate")?,
                gst_type: GstType::from_str(&gst_type).map_err(AppError::internal)?,
                hsn_sac_code: row.try_get("hsn_sac_code")?,
                cess_rate: row.try_get("cess_rate")?,
            },
            total_sold: row.try_get("total_sold")?,
            last_sale_date: row.try_get("last_sale_date")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn fetch_in_tx(
        tx: &mut Transaction<'_, MySql>,
        id: &str,
    ) -> Result<Option<InventoryItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, sku, name, category, quantity, unit_price, min_stock,
                   gst_applicable, gst_rate, gst_type, hsn_sac_code, cess_rate,
                   total_sold, last_sale_date, is_active, created_at, updated_at
            FROM inventory_items
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        row.as_ref().map(Self::row_to_item).transpose()
    }
}

#[async_trait]
impl InventoryRepository for MySqlInventoryRepository {
    async fn insert(&self, item: &InventoryItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, sku, name, category, quantity, unit_price, min_stock,
                gst_applicable, gst_rate, gst_type, hsn_sac_code, cess_rate,
                total_sold, last_sale_date, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.min_stock)
        .bind(item.gst.applicable)
        .bind(item.gst.rate)
        .bind(item.gst.gst_type.to_string())
        .bind(&item.gst.hsn_sac_code)
        .bind(item.gst.cess_rate)
        .bind(item.total_sold)
        .bind(item.last_sale_date)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::conflict(format!(
                        "Inventory item with SKU '{}' already exists",
                        item.sku
                    ));
                }
            }
            AppError::Database(e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<InventoryItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, sku, name, category, quantity, unit_price, min_stock,
                   gst_applicable, gst_rate, gst_type, hsn_sac_code, cess_rate,
                   total_sold, last_sale_date, is_active, created_at, updated_at
            FROM inventory_items
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_item).transpose()
    }

    async fn list_active(&self) -> Result<Vec<InventoryItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, sku, name, category, quantity, unit_price, min_stock,
                   gst_applicable, gst_rate, gst_type, hsn_sac_code, cess_rate,
                   total_sold, last_sale_date, is_active, created_at, updated_at
            FROM inventory_items
            WHERE is_active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }

    async fn adjust_quantity(
        &self,
        item_id: &str,
        movement: NewStockMovement,
    ) -> Result<InventoryItem> {
        let now = Utc::now();
        let delta = movement.quantity_change;
        let is_sale = movement.movement_type == MovementType::Sale;
        let sold_delta = if is_sale && delta < 0 { i64::from(-delta) } else { 0 };

        let mut tx = self.pool.begin().await?;

        // Guard and write in one statement. Sale decrements additionally
        // require the item to still be active.
        let result = sqlx::query(
            r#"
            UPDATE inventory_items
            SET quantity = quantity + ?,
                total_sold = total_sold + ?,
                last_sale_date = COALESCE(?, last_sale_date),
                updated_at = ?
            WHERE id = ?
              AND quantity + ? >= 0
              AND (? = 0 OR is_active = 1)
            "#,
        )
        .bind(delta)
        .bind(sold_delta)
        .bind(if sold_delta > 0 { Some(now) } else { None })
        .bind(now)
        .bind(item_id)
        .bind(delta)
        .bind(i32::from(is_sale && delta < 0))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Re-read to report which precondition failed
            let current = Self::fetch_in_tx(&mut tx, item_id).await?;
            return Err(match current {
                None => AppError::not_found(format!("Inventory item '{}' not found", item_id)),
                Some(item) if is_sale && delta < 0 && !item.is_active => AppError::conflict(
                    format!("Inventory item '{}' is inactive", item.sku),
                ),
                Some(item) => AppError::InsufficientStock {
                    sku: item.sku,
                    requested: -delta,
                    available: item.quantity,
                },
            });
        }

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, item_id, movement_type, quantity_change, actor, note,
                reference, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(item_id)
        .bind(movement.movement_type.to_string())
        .bind(movement.quantity_change)
        .bind(&movement.actor)
        .bind(&movement.note)
        .bind(&movement.reference)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let updated = Self::fetch_in_tx(&mut tx, item_id)
            .await?
            .ok_or_else(|| AppError::internal("Adjusted item vanished mid-transaction"))?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn movements(&self, item_id: &str) -> Result<Vec<StockMovement>> {
        let rows = sqlx::query(
            r#"
            SELECT id, item_id, movement_type, quantity_change, actor, note,
                   reference, created_at
            FROM stock_movements
            WHERE item_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let movement_type: String = row.try_get("movement_type")?;
                Ok(StockMovement {
                    id: row.try_get("id")?,
                    item_id: row.try_get("item_id")?,
                    movement_type: MovementType::from_str(&movement_type)
                        .map_err(AppError::internal)?,
                    quantity_change: row.try_get("quantity_change")?,
                    actor: row.try_get("actor")?,
                    note: row.try_get("note")?,
                    reference: row.try_get("reference")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn deactivate(&self, id: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_items
            SET is_active = 0, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Inventory item '{}' not found",
                id
            )));
        }

        Ok(())
    }
}
