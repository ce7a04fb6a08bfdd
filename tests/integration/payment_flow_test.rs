// Payment ledger behavior: validation against due amounts, derived
// status transitions, and the single-source-of-truth projection between
// a sale and its invoice.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use pawledger::core::AppError;
use pawledger::modules::invoices::models::GenerateInvoiceRequest;
use pawledger::modules::payments::models::AddPaymentRequest;
use pawledger::modules::sales::models::{CreateSaleRequest, PaymentMethod, PaymentStatus};
use pawledger::modules::taxes::models::GstType;

#[path = "../support/mod.rs"]
mod support;

use support::{cart_line, engine, TestEngine};

/// One sale with grand total 212.40 (2 x 100, 10% discount, 18% GST)
async fn standard_sale(engine: &TestEngine) -> String {
    engine.add_owner("owner-1", "Asha Rao");
    let item = engine
        .add_item("FOOD-10KG", dec!(100), 10, dec!(18), GstType::CgstSgst)
        .await;

    engine
        .sales
        .create_sale(CreateSaleRequest {
            owner_id: "owner-1".to_string(),
            pet_id: None,
            items: vec![cart_line(&item.id, 2, dec!(10))],
            payment: None,
            notes: None,
        })
        .await
        .unwrap()
        .sale
        .id
}

fn cash(amount: Decimal) -> AddPaymentRequest {
    AddPaymentRequest {
        amount,
        method: PaymentMethod::Cash,
        transaction_id: None,
    }
}

#[tokio::test]
async fn test_sale_payments_progress_to_paid() {
    let engine = engine();
    let sale_id = standard_sale(&engine).await;

    let sale = engine.sales.get_sale(&sale_id).await.unwrap();
    assert_eq!(sale.payment.status, PaymentStatus::Pending);

    let sale = engine
        .payments
        .add_sale_payment(&sale_id, cash(dec!(100)))
        .await
        .unwrap();
    assert_eq!(sale.payment.status, PaymentStatus::Partial);
    assert_eq!(sale.payment.paid_amount, dec!(100));
    assert_eq!(sale.payment.due_amount, dec!(112.40));

    let sale = engine
        .payments
        .add_sale_payment(&sale_id, cash(dec!(112.40)))
        .await
        .unwrap();
    assert_eq!(sale.payment.status, PaymentStatus::Paid);
    assert_eq!(sale.payment.paid_amount, dec!(212.40));
    assert_eq!(sale.payment.due_amount, Decimal::ZERO);
    assert!(sale.payment.paid_at.is_some());
}

#[tokio::test]
async fn test_payment_validation() {
    let engine = engine();
    let sale_id = standard_sale(&engine).await;

    // Non-positive amounts
    let result = engine
        .payments
        .add_sale_payment(&sale_id, cash(Decimal::ZERO))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    // More than what is due
    let result = engine
        .payments
        .add_sale_payment(&sale_id, cash(dec!(500)))
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    // Unknown target
    let result = engine.payments.add_sale_payment("missing", cash(dec!(10))).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    // Nothing stuck to the record
    let sale = engine.sales.get_sale(&sale_id).await.unwrap();
    assert_eq!(sale.payment.paid_amount, Decimal::ZERO);
}

#[tokio::test]
async fn test_cancelled_sale_rejects_payments() {
    let engine = engine();
    let sale_id = standard_sale(&engine).await;
    engine.sales.cancel_sale(&sale_id).await.unwrap();

    let result = engine
        .payments
        .add_sale_payment(&sale_id, cash(dec!(50)))
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_invoice_partial_payment_scenario() {
    let engine = engine();
    let sale_id = standard_sale(&engine).await;
    let invoice = engine
        .invoices
        .generate_invoice(GenerateInvoiceRequest {
            sale_id: sale_id.clone(),
            due_date: None,
            terms: None,
            business: None,
        })
        .await
        .unwrap();

    // Invoice payable is the rounded 212; a payment of 100 leaves 112 due
    let response = engine
        .payments
        .add_invoice_payment(&invoice.invoice.id, cash(dec!(100)))
        .await
        .unwrap();

    assert_eq!(response.payment.status, PaymentStatus::Partial);
    assert_eq!(response.payment.paid_amount, dec!(100));
    assert_eq!(response.payment.due_amount, dec!(112));

    // The payment landed on the sale record (single source of truth)
    let sale = engine.sales.get_sale(&sale_id).await.unwrap();
    assert_eq!(sale.payment.paid_amount, dec!(100));
    assert_eq!(sale.payment.status, PaymentStatus::Partial);
}

#[tokio::test]
async fn test_invoice_settlement_absorbs_round_off() {
    let engine = engine();
    let sale_id = standard_sale(&engine).await;
    let invoice = engine
        .invoices
        .generate_invoice(GenerateInvoiceRequest {
            sale_id: sale_id.clone(),
            due_date: None,
            terms: None,
            business: None,
        })
        .await
        .unwrap();

    // Settling the rounded 212 settles both views; the 0.40 difference
    // is the invoice's round-off, not collectable debt
    let response = engine
        .payments
        .add_invoice_payment(&invoice.invoice.id, cash(dec!(212)))
        .await
        .unwrap();
    assert_eq!(response.payment.status, PaymentStatus::Paid);
    assert_eq!(response.payment.due_amount, Decimal::ZERO);

    let sale = engine.sales.get_sale(&sale_id).await.unwrap();
    assert_eq!(sale.payment.status, PaymentStatus::Paid);
    assert_eq!(sale.payment.due_amount, Decimal::ZERO);

    // Paying anything further is rejected on both targets
    let result = engine
        .payments
        .add_invoice_payment(&invoice.invoice.id, cash(dec!(1)))
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_invoice_projection_tracks_sale_payments() {
    let engine = engine();
    let sale_id = standard_sale(&engine).await;
    let invoice = engine
        .invoices
        .generate_invoice(GenerateInvoiceRequest {
            sale_id: sale_id.clone(),
            due_date: None,
            terms: None,
            business: None,
        })
        .await
        .unwrap();

    // Pay against the sale; the invoice view reflects it on next read
    engine
        .payments
        .add_sale_payment(&sale_id, cash(dec!(150)))
        .await
        .unwrap();

    let view = engine
        .invoices
        .get_invoice(&invoice.invoice.id)
        .await
        .unwrap();
    assert_eq!(view.payment.paid_amount, dec!(150));
    assert_eq!(view.payment.due_amount, dec!(62)); // 212 - 150
    assert_eq!(view.payment.status, PaymentStatus::Partial);
}

#[tokio::test]
async fn test_paid_amount_is_monotonic_and_status_never_regresses() {
    let engine = engine();
    let sale_id = standard_sale(&engine).await;

    let mut last_paid = Decimal::ZERO;
    let mut reached_partial = false;

    for amount in [dec!(50), dec!(50), dec!(50), dec!(62.40)] {
        let sale = engine
            .payments
            .add_sale_payment(&sale_id, cash(amount))
            .await
            .unwrap();

        assert!(sale.payment.paid_amount > last_paid);
        last_paid = sale.payment.paid_amount;

        match sale.payment.status {
            PaymentStatus::Pending => panic!("status regressed to pending after a payment"),
            PaymentStatus::Partial => reached_partial = true,
            PaymentStatus::Paid => assert!(reached_partial),
        }
    }

    let sale = engine.sales.get_sale(&sale_id).await.unwrap();
    assert_eq!(sale.payment.status, PaymentStatus::Paid);
    assert_eq!(sale.payment.paid_amount, dec!(212.40));
}
