use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::core::{round_money, AppError, Result};
use crate::modules::invoices::models::{InvoiceResponse, InvoiceStatus};
use crate::modules::invoices::repositories::InvoiceRepository;
use crate::modules::payments::models::AddPaymentRequest;
use crate::modules::sales::models::{PaymentStatus, Sale, SaleStatus};
use crate::modules::sales::repositories::SaleRepository;

/// Payment ledger over sales and invoices.
///
/// The sale's embedded payment record is the single source of truth.
/// Payments taken against an invoice validate against the invoice's
/// rounded payable figure but land on the underlying sale; every invoice
/// read then projects from it, so the two views cannot drift.
pub struct PaymentService {
    sale_repo: Arc<dyn SaleRepository>,
    invoice_repo: Arc<dyn InvoiceRepository>,
}

impl PaymentService {
    pub fn new(sale_repo: Arc<dyn SaleRepository>, invoice_repo: Arc<dyn InvoiceRepository>) -> Self {
        Self {
            sale_repo,
            invoice_repo,
        }
    }

    /// Records a payment against a sale.
    pub async fn add_sale_payment(
        &self,
        sale_id: &str,
        request: AddPaymentRequest,
    ) -> Result<Sale> {
        let sale = self
            .sale_repo
            .find_by_id(sale_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Sale '{}' not found", sale_id)))?;

        if sale.status == SaleStatus::Cancelled {
            return Err(AppError::conflict(format!(
                "Sale '{}' is cancelled and cannot accept payments",
                sale.sale_number
            )));
        }
        Self::validate_amount(request.amount, sale.payment.due_amount)?;

        let mut payment = sale.payment.clone();
        payment.paid_amount = round_money(payment.paid_amount + request.amount);
        payment.due_amount = round_money(sale.grand_total - payment.paid_amount);
        payment.status = PaymentStatus::derive(payment.paid_amount, sale.grand_total);
        payment.method = request.method;
        payment.transaction_id = request.transaction_id;
        payment.paid_at = Some(Utc::now());

        self.sale_repo.update_payment(sale_id, &payment).await?;

        tracing::info!(
            sale_number = %sale.sale_number,
            amount = %request.amount,
            status = %payment.status,
            "Payment recorded against sale"
        );

        self.sale_repo
            .find_by_id(sale_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Sale '{}' not found", sale_id)))
    }

    /// Records a payment against an invoice.
    ///
    /// Validated against the invoice's due (rounded payable figure minus
    /// what is already paid), then applied to the linked sale. Once the
    /// invoice is settled in full, the sale absorbs the round-off so both
    /// views finish as paid.
    pub async fn add_invoice_payment(
        &self,
        invoice_id: &str,
        request: AddPaymentRequest,
    ) -> Result<InvoiceResponse> {
        let invoice = self
            .invoice_repo
            .find_by_id(invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice '{}' not found", invoice_id)))?;

        if invoice.status == InvoiceStatus::Cancelled {
            return Err(AppError::conflict(format!(
                "Invoice '{}' is cancelled and cannot accept payments",
                invoice.invoice_number
            )));
        }

        let sale = self
            .sale_repo
            .find_by_id(&invoice.sale_id)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!(
                    "Sale '{}' behind invoice '{}' is missing",
                    invoice.sale_id, invoice.invoice_number
                ))
            })?;
        if sale.status == SaleStatus::Cancelled {
            return Err(AppError::conflict(format!(
                "Sale '{}' behind invoice '{}' is cancelled",
                sale.sale_number, invoice.invoice_number
            )));
        }

        let view = invoice.payment_view(&sale);
        Self::validate_amount(request.amount, view.due_amount)?;

        let mut payment = sale.payment.clone();
        payment.paid_amount = round_money(payment.paid_amount + request.amount);
        payment.method = request.method;
        payment.transaction_id = request.transaction_id;
        payment.paid_at = Some(Utc::now());

        if payment.paid_amount >= invoice.final_amount {
            // Invoice settled in full; the remaining paise difference is
            // the invoice's round-off, not collectable debt
            payment.due_amount = Decimal::ZERO;
            payment.status = PaymentStatus::Paid;
        } else {
            payment.due_amount = round_money(sale.grand_total - payment.paid_amount);
            payment.status = PaymentStatus::derive(payment.paid_amount, sale.grand_total);
        }

        self.sale_repo.update_payment(&sale.id, &payment).await?;

        tracing::info!(
            invoice_number = %invoice.invoice_number,
            amount = %request.amount,
            status = %payment.status,
            "Payment recorded against invoice"
        );

        let sale = self
            .sale_repo
            .find_by_id(&invoice.sale_id)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!(
                    "Sale '{}' behind invoice '{}' is missing",
                    invoice.sale_id, invoice.invoice_number
                ))
            })?;
        let payment = invoice.payment_view(&sale);
        Ok(InvoiceResponse { invoice, payment })
    }

    fn validate_amount(amount: Decimal, due: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Payment amount must be positive, got: {}",
                amount
            )));
        }
        if amount > due {
            return Err(AppError::conflict(format!(
                "Payment {} exceeds due amount {}",
                amount, due
            )));
        }
        Ok(())
    }
}
