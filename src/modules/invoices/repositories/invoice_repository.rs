use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, Row, Transaction};
use std::str::FromStr;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::invoices::models::{
    BusinessSnapshot, CustomerSnapshot, Invoice, InvoiceLineItem, InvoiceStatus,
};
use crate::modules::sequences::NumberSource;
use crate::modules::taxes::models::GstType;

/// Storage port for invoices.
///
/// `insert` enforces both uniqueness constraints behind the 1:1 contract:
/// the invoice number (drives the collision retry loop) and the sale id
/// (at most one invoice ever derives from a sale).
#[async_trait]
pub trait InvoiceRepository: NumberSource {
    async fn insert(&self, invoice: &Invoice) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Invoice>>;

    async fn find_by_sale_id(&self, sale_id: &str) -> Result<Option<Invoice>>;

    async fn update_status(&self, id: &str, status: InvoiceStatus, is_active: bool)
        -> Result<()>;

    async fn update_terms(
        &self,
        id: &str,
        due_date: Option<DateTime<Utc>>,
        terms: Option<String>,
    ) -> Result<()>;
}

/// MySQL-backed invoice repository
pub struct MySqlInvoiceRepository {
    pool: MySqlPool,
}

impl MySqlInvoiceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_invoice(row: &MySqlRow, items: Vec<InvoiceLineItem>) -> Result<Invoice> {
        let status: String = row.try_get("status")?;

        Ok(Invoice {
            id: row.try_get("id")?,
            invoice_number: row.try_get("invoice_number")?,
            sale_id: row.try_get("sale_id")?,
            sale_number: row.try_get("sale_number")?,
            customer: CustomerSnapshot {
                name: row.try_get("customer_name")?,
                email: row.try_get("customer_email")?,
                phone: row.try_get("customer_phone")?,
                address: row.try_get("customer_address")?,
                gst_number: row.try_get("customer_gst_number")?,
            },
            business: BusinessSnapshot {
                name: row.try_get("business_name")?,
                address: row.try_get("business_address")?,
                gst_number: row.try_get("business_gst_number")?,
                phone: row.try_get("business_phone")?,
                email: row.try_get("business_email")?,
            },
            items,
            subtotal: row.try_get("subtotal")?,
            total_discount: row.try_get("total_discount")?,
            total_taxable: row.try_get("total_taxable")?,
            total_cgst: row.try_get("total_cgst")?,
            total_sgst: row.try_get("total_sgst")?,
            total_igst: row.try_get("total_igst")?,
            total_cess: row.try_get("total_cess")?,
            grand_total: row.try_get("grand_total")?,
            round_off: row.try_get("round_off")?,
            final_amount: row.try_get("final_amount")?,
            issue_date: row.try_get("issue_date")?,
            due_date: row.try_get("due_date")?,
            terms: row.try_get("terms")?,
            status: InvoiceStatus::from_str(&status).map_err(AppError::internal)?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_line_item(row: &MySqlRow) -> Result<InvoiceLineItem> {
        let gst_type: String = row.try_get("gst_type")?;

        Ok(InvoiceLineItem {
            item_id: row.try_get("item_id")?,
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            hsn_sac_code: row.try_get("hsn_sac_code")?,
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get("unit_price")?,
            subtotal: row.try_get("subtotal")?,
            discount_amount: row.try_get("discount_amount")?,
            taxable_amount: row.try_get("taxable_amount")?,
            gst_rate: row.try_get("gst_rate")?,
            gst_type: GstType::from_str(&gst_type).map_err(AppError::internal)?,
            cgst_rate: row.try_get("cgst_rate")?,
            cgst_amount: row.try_get("cgst_amount")?,
            sgst_rate: row.try_get("sgst_rate")?,
            sgst_amount: row.try_get("sgst_amount")?,
            igst_rate: row.try_get("igst_rate")?,
            igst_amount: row.try_get("igst_amount")?,
            cess_rate: row.try_get("cess_rate")?,
            cess_amount: row.try_get("cess_amount")?,
            total: row.try_get("total")?,
        })
    }

    async fn fetch_line_items(&self, invoice_id: &str) -> Result<Vec<InvoiceLineItem>> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, sku, name, hsn_sac_code, quantity, unit_price,
                   subtotal, discount_amount, taxable_amount, gst_rate, gst_type,
                   cgst_rate, cgst_amount, sgst_rate, sgst_amount,
                   igst_rate, igst_amount, cess_rate, cess_amount, total
            FROM invoice_items
            WHERE invoice_id = ?
            ORDER BY position
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_line_item).collect()
    }

    async fn insert_line_items(
        tx: &mut Transaction<'_, MySql>,
        invoice: &Invoice,
    ) -> Result<()> {
        for (position, item) in invoice.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    id, invoice_id, position, item_id, sku, name, hsn_sac_code,
                    quantity, unit_price, subtotal, discount_amount,
                    taxable_amount, gst_rate, gst_type,
                    cgst_rate, cgst_amount, sgst_rate, sgst_amount,
                    igst_rate, igst_amount, cess_rate, cess_amount, total
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&invoice.id)
            .bind(position as i32)
            .bind(&item.item_id)
            .bind(&item.sku)
            .bind(&item.name)
            .bind(&item.hsn_sac_code)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.subtotal)
            .bind(item.discount_amount)
            .bind(item.taxable_amount)
            .bind(item.gst_rate)
            .bind(item.gst_type.to_string())
            .bind(item.cgst_rate)
            .bind(item.cgst_amount)
            .bind(item.sgst_rate)
            .bind(item.sgst_amount)
            .bind(item.igst_rate)
            .bind(item.igst_amount)
            .bind(item.cess_rate)
            .bind(item.cess_amount)
            .bind(item.total)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl NumberSource for MySqlInvoiceRepository {
    async fn latest_number(&self, prefix: &str) -> Result<Option<String>> {
        let latest: Option<String> = sqlx::query_scalar(
            r#"
            SELECT MAX(invoice_number)
            FROM invoices
            WHERE invoice_number LIKE CONCAT(?, '%')
            "#,
        )
        .bind(prefix)
        .fetch_one(&self.pool)
        .await?;

        Ok(latest)
    }
}

#[async_trait]
impl InvoiceRepository for MySqlInvoiceRepository {
    async fn insert(&self, invoice: &Invoice) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, sale_id, sale_number,
                customer_name, customer_email, customer_phone,
                customer_address, customer_gst_number,
                business_name, business_address, business_gst_number,
                business_phone, business_email,
                subtotal, total_discount, total_taxable,
                total_cgst, total_sgst, total_igst, total_cess,
                grand_total, round_off, final_amount,
                issue_date, due_date, terms, status, is_active,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.sale_id)
        .bind(&invoice.sale_number)
        .bind(&invoice.customer.name)
        .bind(&invoice.customer.email)
        .bind(&invoice.customer.phone)
        .bind(&invoice.customer.address)
        .bind(&invoice.customer.gst_number)
        .bind(&invoice.business.name)
        .bind(&invoice.business.address)
        .bind(&invoice.business.gst_number)
        .bind(&invoice.business.phone)
        .bind(&invoice.business.email)
        .bind(invoice.subtotal)
        .bind(invoice.total_discount)
        .bind(invoice.total_taxable)
        .bind(invoice.total_cgst)
        .bind(invoice.total_sgst)
        .bind(invoice.total_igst)
        .bind(invoice.total_cess)
        .bind(invoice.grand_total)
        .bind(invoice.round_off)
        .bind(invoice.final_amount)
        .bind(invoice.issue_date)
        .bind(invoice.due_date)
        .bind(&invoice.terms)
        .bind(invoice.status.to_string())
        .bind(invoice.is_active)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    // Two unique indexes guard this insert; report which
                    // contract was violated
                    if db_err.message().contains("uniq_invoice_sale") {
                        return AppError::conflict(format!(
                            "An invoice already exists for sale '{}'",
                            invoice.sale_id
                        ));
                    }
                    return AppError::conflict(format!(
                        "Invoice number '{}' already exists",
                        invoice.invoice_number
                    ));
                }
            }
            AppError::Database(e)
        })?;

        Self::insert_line_items(&mut tx, invoice).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Invoice>> {
        let row = sqlx::query(
            r#"
            SELECT id, invoice_number, sale_id, sale_number,
                   customer_name, customer_email, customer_phone,
                   customer_address, customer_gst_number,
                   business_name, business_address, business_gst_number,
                   business_phone, business_email,
                   subtotal, total_discount, total_taxable,
                   total_cgst, total_sgst, total_igst, total_cess,
                   grand_total, round_off, final_amount,
                   issue_date, due_date, terms, status, is_active,
                   created_at, updated_at
            FROM invoices
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
        Ok(Some(Self::row_to_invoice(&row, items)?))
    }

    async fn find_by_sale_id(&self, sale_id: &str) -> Result<Option<Invoice>> {
        let row = sqlx::query(
            r#"
            SELECT id, invoice_number, sale_id, sale_number,
                   customer_name, customer_email, customer_phone,
                   customer_address, customer_gst_number,
                   business_name, business_address, business_gst_number,
                   business_phone, business_email,
                   subtotal, total_discount, total_taxable,
                   total_cgst, total_sgst, total_igst, total_cess,
                   grand_total, round_off, final_amount,
                   issue_date, due_date, terms, status, is_active,
                   created_at, updated_at
            FROM invoices
            WHERE sale_id = ?
            "#,
        )
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let invoice_id: String = row.try_get("id")?;
        let items = self.fetch_line_items(&invoice_id).await?;
        Ok(Some(Self::row_to_invoice(&row, items)?))
    }

    async fn update_status(
        &self,
        id: &str,
        status: InvoiceStatus,
        is_active: bool,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
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
            return Err(AppError::not_found(format!("Invoice '{}' not found", id)));
        }
        Ok(())
    }

    async fn update_terms(
        &self,
        id: &str,
        due_date: Option<DateTime<Utc>>,
        terms: Option<String>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET due_date = COALESCE(?, due_date),
                terms = COALESCE(?, terms),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(due_date)
        .bind(terms)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Invoice '{}' not found", id)));
        }
        Ok(())
    }
}
