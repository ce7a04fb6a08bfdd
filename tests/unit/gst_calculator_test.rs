// Property-based and scenario tests for per-line GST pricing.
//
// The calculator rounds every monetary figure at its point of
// computation, so the identities below must hold exactly at 2 decimal
// places for any input the engine accepts.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use pawledger::modules::taxes::models::{DiscountType, GstProfile, GstType};
use pawledger::modules::taxes::services::GstCalculator;

fn profile(rate: Decimal, gst_type: GstType) -> GstProfile {
    GstProfile {
        applicable: true,
        rate,
        gst_type,
        hsn_sac_code: Some("2309".to_string()),
        cess_rate: Decimal::ZERO,
    }
}

#[test]
fn test_standard_line_breakdown() {
    // Price 100, qty 2, 10% discount, 18% GST split CGST/SGST
    let calc = GstCalculator::new();
    let amounts = calc
        .price_line(
            2,
            dec!(100),
            dec!(10),
            DiscountType::Percentage,
            &profile(dec!(18), GstType::CgstSgst),
        )
        .unwrap();

    assert_eq!(amounts.subtotal, dec!(200.00));
    assert_eq!(amounts.discount_amount, dec!(20.00));
    assert_eq!(amounts.taxable_amount, dec!(180.00));
    assert_eq!(amounts.gst_amount, dec!(32.40));
    assert_eq!(amounts.total, dec!(212.40));

    let split = calc
        .split(amounts.taxable_amount, dec!(18), GstType::CgstSgst, Decimal::ZERO)
        .unwrap();
    assert_eq!(split.cgst_amount, dec!(16.20));
    assert_eq!(split.sgst_amount, dec!(16.20));
    assert_eq!(split.total_tax, amounts.gst_amount);
}

#[test]
fn test_unknown_discount_type_rejected_at_boundary() {
    let parsed: Result<DiscountType, _> = "flat".parse();
    assert!(parsed.is_err());
}

proptest! {
    /// total == taxable + gst, and taxable == subtotal - discount, at 2dp
    #[test]
    fn test_line_identities_hold(
        quantity in 1i32..1_000,
        unit_price_paise in 0u64..10_000_000u64,
        discount_percent in 0u8..=100u8,
        rate_percent in 0u8..=28u8,
    ) {
        let calc = GstCalculator::new();
        let unit_price = Decimal::from(unit_price_paise) / Decimal::from(100);
        let amounts = calc
            .price_line(
                quantity,
                unit_price,
                Decimal::from(discount_percent),
                DiscountType::Percentage,
                &profile(Decimal::from(rate_percent), GstType::CgstSgst),
            )
            .unwrap();

        prop_assert_eq!(amounts.subtotal, (Decimal::from(quantity) * unit_price).round_dp(2));
        prop_assert_eq!(
            amounts.taxable_amount,
            amounts.subtotal - amounts.discount_amount
        );
        prop_assert_eq!(amounts.total, amounts.taxable_amount + amounts.gst_amount);
        prop_assert!(amounts.gst_amount >= Decimal::ZERO);
        prop_assert!(amounts.taxable_amount >= Decimal::ZERO);
    }

    /// The invoice-time component split always sums back to its own total
    #[test]
    fn test_split_components_sum(
        taxable_paise in 0u64..100_000_000u64,
        rate_percent in 0u8..=28u8,
        cess_percent in 0u8..=12u8,
    ) {
        let calc = GstCalculator::new();
        let taxable = Decimal::from(taxable_paise) / Decimal::from(100);

        for gst_type in [GstType::CgstSgst, GstType::Igst] {
            let split = calc
                .split(
                    taxable,
                    Decimal::from(rate_percent),
                    gst_type,
                    Decimal::from(cess_percent),
                )
                .unwrap();

            prop_assert_eq!(
                split.total_tax,
                split.cgst_amount + split.sgst_amount + split.igst_amount + split.cess_amount
            );

            // Each half of an intra-state split carries half the rate
            if gst_type == GstType::CgstSgst {
                prop_assert_eq!(split.cgst_rate + split.sgst_rate, Decimal::from(rate_percent));
                prop_assert_eq!(split.cgst_amount, split.sgst_amount);
                prop_assert_eq!(split.igst_amount, Decimal::ZERO);
            } else {
                prop_assert_eq!(split.cgst_amount, Decimal::ZERO);
                prop_assert_eq!(split.sgst_amount, Decimal::ZERO);
            }
        }
    }

    /// Halving the rate and doubling via the split never drifts more than
    /// a paisa from the aggregate GST computed at sale time
    #[test]
    fn test_split_tracks_aggregate_within_rounding(
        taxable_paise in 0u64..100_000_000u64,
        rate_percent in 0u8..=28u8,
    ) {
        let calc = GstCalculator::new();
        let taxable = Decimal::from(taxable_paise) / Decimal::from(100);
        let rate = Decimal::from(rate_percent);

        let aggregate = (taxable * rate / Decimal::from(100)).round_dp(2);
        let split = calc
            .split(taxable, rate, GstType::CgstSgst, Decimal::ZERO)
            .unwrap();

        let drift = (split.total_tax - aggregate).abs();
        prop_assert!(drift <= dec!(0.01), "drift {} too large", drift);
    }

    /// Untaxed levy types always produce zero, whatever the rate on file
    #[test]
    fn test_untaxed_types_produce_zero(
        taxable_paise in 0u64..100_000_000u64,
        rate_percent in 0u8..=100u8,
    ) {
        let calc = GstCalculator::new();
        let taxable = Decimal::from(taxable_paise) / Decimal::from(100);

        for gst_type in [GstType::Exempt, GstType::NilRated, GstType::ZeroRated] {
            let split = calc
                .split(taxable, Decimal::from(rate_percent), gst_type, Decimal::ZERO)
                .unwrap();
            prop_assert_eq!(split.total_tax, Decimal::ZERO);
        }
    }
}
