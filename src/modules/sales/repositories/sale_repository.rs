use async_trait::async_trait;
use chrono::Utc;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, Row, Transaction};
use std::str::FromStr;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::sales::models::{
    PaymentMethod, PaymentStatus, Sale, SaleLineItem, SalePayment, SaleStatus,
};
use crate::modules::sequences::NumberSource;
use crate::modules::taxes::models::{DiscountType, GstType};

/// Storage port for sales.
///
/// `insert` must reject duplicate sale numbers with `Conflict`; that is
/// what drives the number-collision retry loop in the sale engine.
#[async_trait]
pub trait SaleRepository: NumberSource {
    async fn insert(&self, sale: &Sale) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Sale>>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Sale>>;

    async fn update_status(&self, id: &str, status: SaleStatus, is_active: bool) -> Result<()>;

    async fn set_invoice_id(&self, sale_id: &str, invoice_id: &str) -> Result<()>;

    async fn update_payment(&self, sale_id: &str, payment: &SalePayment) -> Result<()>;
}

/// MySQL-backed sale repository
pub struct MySqlSaleRepository {
    pool: MySqlPool,
}

impl MySqlSaleRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_sale(row: &MySqlRow, items: Vec<SaleLineItem>) -> Result<Sale> {
        let status: String = row.try_get("status")?;
        let method: String = row.try_get("payment_method")?;
        let payment_status: String = row.try_get("payment_status")?;

        Ok(Sale {
            id: row.try_get("id")?,
            sale_number: row.try_get("sale_number")?,
            owner_id: row.try_get("owner_id")?,
            pet_id: row.try_get("pet_id")?,
            items,
            subtotal: row.try_get("subtotal")?,
            total_discount: row.try_get("total_discount")?,
            total_taxable: row.try_get("total_taxable")?,
            total_gst: row.try_get("total_gst")?,
            grand_total: row.try_get("grand_total")?,
            payment: SalePayment {
                method: PaymentMethod::from_str(&method).map_err(AppError::internal)?,
                status: PaymentStatus::from_str(&payment_status).map_err(AppError::internal)?,
                paid_amount: row.try_get("paid_amount")?,
                due_amount: row.try_get("due_amount")?,
                transaction_id: row.try_get("payment_transaction_id")?,
                paid_at: row.try_get("paid_at")?,
            },
            status: SaleStatus::from_str(&status).map_err(AppError::internal)?,
            invoice_id: row.try_get("invoice_id")?,
            notes: row.try_get("notes")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_line_item(row: &MySqlRow) -> Result<SaleLineItem> {
        let discount_type: String = row.try_get("discount_type")?;
        let gst_type: String = row.try_get("gst_type")?;

        Ok(SaleLineItem {
            item_id: row.try_get("item_id")?,
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            hsn_sac_code: row.try_get("hsn_sac_code")?,
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get("unit_price")?,
            discount: row.try_get("discount")?,
            discount_type: DiscountType::from_str(&discount_type).map_err(AppError::internal)?,
            gst_applicable: row.try_get("gst_applicable")?,
            gst_rate: row.try_get("gst_rate")?,
            gst_type: GstType::from_str(&gst_type).map_err(AppError::internal)?,
            cess_rate: row.try_get("cess_rate")?,
            subtotal: row.try_get("subtotal")?,
            discount_amount: row.try_get("discount_amount")?,
            taxable_amount: row.try_get("taxable_amount")?,
            gst_amount: row.try_get("gst_amount")?,
            cess_amount: row.try_get("cess_amount")?,
            total: row.try_get("total")?,
        })
    }

    async fn fetch_line_items(&self, sale_id: &str) -> Result<Vec<SaleLineItem>> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, sku, name, hsn_sac_code, quantity, unit_price,
                   discount, discount_type, gst_applicable, gst_rate, gst_type,
                   cess_rate, subtotal, discount_amount, taxable_amount,
                   gst_amount, cess_amount, total
            FROM sale_items
            WHERE sale_id = ?
            ORDER BY position
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_line_item).collect()
    }

    async fn insert_line_items(
        tx: &mut Transaction<'_, MySql>,
        sale: &Sale,
    ) -> Result<()> {
        for (position, item) in sale.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, position, item_id, sku, name, hsn_sac_code,
                    quantity, unit_price, discount, discount_type,
                    gst_applicable, gst_rate, gst_type, cess_rate,
                    subtotal, discount_amount, taxable_amount, gst_amount,
                    cess_amount, total
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale.id)
            .bind(position as i32)
            .bind(&item.item_id)
            .bind(&item.sku)
            .bind(&item.name)
            .bind(&item.hsn_sac_code)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.discount)
            .bind(item.discount_type.to_string())
            .bind(item.gst_applicable)
            .bind(item.gst_rate)
            .bind(item.gst_type.to_string())
            .bind(item.cess_rate)
            .bind(item.subtotal)
            .bind(item.discount_amount)
            .bind(item.taxable_amount)
            .bind(item.gst_amount)
            .bind(item.cess_amount)
            .bind(item.total)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl NumberSource for MySqlSaleRepository {
    async fn latest_number(&self, prefix: &str) -> Result<Option<String>> {
        let latest: Option<String> = sqlx::query_scalar(
            r#"
            SELECT MAX(sale_number)
            FROM sales
            WHERE sale_number LIKE CONCAT(?, '%')
            "#,
        )
        .bind(prefix)
        .fetch_one(&self.pool)
        .await?;

        Ok(latest)
    }
}

#[async_trait]
impl SaleRepository for MySqlSaleRepository {
    async fn insert(&self, sale: &Sale) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_number, owner_id, pet_id,
                subtotal, total_discount, total_taxable, total_gst, grand_total,
                payment_method, payment_status, paid_amount, due_amount,
                payment_transaction_id, paid_at,
                status, invoice_id, notes, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.sale_number)
        .bind(&sale.owner_id)
        .bind(&sale.pet_id)
        .bind(sale.subtotal)
        .bind(sale.total_discount)
        .bind(sale.total_taxable)
        .bind(sale.total_gst)
        .bind(sale.grand_total)
        .bind(sale.payment.method.to_string())
        .bind(sale.payment.status.to_string())
        .bind(sale.payment.paid_amount)
        .bind(sale.payment.due_amount)
        .bind(&sale.payment.transaction_id)
        .bind(sale.payment.paid_at)
        .bind(sale.status.to_string())
        .bind(&sale.invoice_id)
        .bind(&sale.notes)
        .bind(sale.is_active)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::conflict(format!(
                        "Sale number '{}' already exists",
                        sale.sale_number
                    ));
                }
            }
            AppError::Database(e)
        })?;

        Self::insert_line_items(&mut tx, sale).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Sale>> {
        let row = sqlx::query(
            r#"
            SELECT id, sale_number, owner_id, pet_id,
                   subtotal, total_discount, total_taxable, total_gst, grand_total,
                   payment_method, payment_status, paid_amount, due_amount,
                   payment_transaction_id, paid_at,
                   status, invoice_id, notes, is_active, created_at, updated_at
            FROM sales
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.fetch_line_items(id).await?;
        Ok(Some(Self::row_to_sale(&row, items)?))
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Sale>> {
        let rows = sqlx::query(
            r#"
            SELECT id, sale_number, owner_id, pet_id,
                   subtotal, total_discount, total_taxable, total_gst, grand_total,
                   payment_method, payment_status, paid_amount, due_amount,
                   payment_transaction_id, paid_at,
                   status, invoice_id, notes, is_active, created_at, updated_at
            FROM sales
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit.clamp(1, 100))
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        // List view omits line items, matching the detail/list split
        rows.iter().map(|row| Self::row_to_sale(row, vec![])).collect()
    }

    async fn update_status(&self, id: &str, status: SaleStatus, is_active: bool) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE sales
            SET status = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.to_string())
        .bind(is_active)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Sale '{}' not found", id)));
        }
        Ok(())
    }

    async fn set_invoice_id(&self, sale_id: &str, invoice_id: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE sales
            SET invoice_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(invoice_id)
        .bind(Utc::now())
        .bind(sale_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Sale '{}' not found", sale_id)));
        }
        Ok(())
    }

    async fn update_payment(&self, sale_id: &str, payment: &SalePayment) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE sales
            SET payment_method = ?, payment_status = ?, paid_amount = ?,
                due_amount = ?, payment_transaction_id = ?, paid_at = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(payment.method.to_string())
        .bind(payment.status.to_string())
        .bind(payment.paid_amount)
        .bind(payment.due_amount)
        .bind(&payment.transaction_id)
        .bind(payment.paid_at)
        .bind(Utc::now())
        .bind(sale_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Sale '{}' not found", sale_id)));
        }
        Ok(())
    }
}
