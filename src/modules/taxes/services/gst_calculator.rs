use rust_decimal::Decimal;

use crate::core::{round_money, AppError, Result};
use crate::modules::taxes::models::{DiscountType, GstProfile, GstSplit, GstType, LineAmounts};

/// GstCalculator prices one line item: discount, taxable amount, GST and
/// cess, and the per-component CGST/SGST/IGST split used at invoice time.
///
/// Stateless; every monetary figure is rounded to 2 decimal places at the
/// point it is computed so stored line items reconcile exactly.
pub struct GstCalculator;

impl GstCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Price a line item.
    ///
    /// subtotal = quantity x unit_price
    /// taxable  = subtotal - discount (rejected if the discount overshoots)
    /// gst      = taxable x rate / 100 when applicable, plus cess
    /// total    = taxable + gst
    pub fn price_line(
        &self,
        quantity: i32,
        unit_price: Decimal,
        discount: Decimal,
        discount_type: DiscountType,
        profile: &GstProfile,
    ) -> Result<LineAmounts> {
        if quantity <= 0 {
            return Err(AppError::validation(format!(
                "Quantity must be positive, got: {}",
                quantity
            )));
        }
        if unit_price < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Unit price must be non-negative, got: {}",
                unit_price
            )));
        }
        if discount < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Discount must be non-negative, got: {}",
                discount
            )));
        }
        Self::validate_rate(profile.rate)?;
        Self::validate_rate(profile.cess_rate)?;

        let subtotal = round_money(Decimal::from(quantity) * unit_price);

        let discount_amount = match discount_type {
            DiscountType::Percentage => {
                if discount > Decimal::ONE_HUNDRED {
                    return Err(AppError::validation(format!(
                        "Percentage discount cannot exceed 100, got: {}",
                        discount
                    )));
                }
                round_money(subtotal * discount / Decimal::ONE_HUNDRED)
            }
            DiscountType::Fixed => round_money(discount),
        };

        if discount_amount > subtotal {
            return Err(AppError::validation(format!(
                "Discount {} exceeds line subtotal {}",
                discount_amount, subtotal
            )));
        }

        let taxable_amount = round_money(subtotal - discount_amount);

        let (gst_amount, cess_amount) = if profile.applicable && profile.gst_type.is_taxed() {
            let base_gst = round_money(taxable_amount * profile.rate / Decimal::ONE_HUNDRED);
            let cess = round_money(taxable_amount * profile.cess_rate / Decimal::ONE_HUNDRED);
            (round_money(base_gst + cess), cess)
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };

        let total = round_money(taxable_amount + gst_amount);

        Ok(LineAmounts {
            subtotal,
            discount_amount,
            taxable_amount,
            gst_amount,
            cess_amount,
            total,
        })
    }

    /// Expand a line's GST into explicit CGST/SGST/IGST/cess components.
    ///
    /// Recomputes each component from the taxable amount and the rate on
    /// file rather than apportioning a previously aggregated figure.
    pub fn split(
        &self,
        taxable_amount: Decimal,
        rate: Decimal,
        gst_type: GstType,
        cess_rate: Decimal,
    ) -> Result<GstSplit> {
        Self::validate_rate(rate)?;
        Self::validate_rate(cess_rate)?;

        let zero = GstSplit {
            cgst_rate: Decimal::ZERO,
            cgst_amount: Decimal::ZERO,
            sgst_rate: Decimal::ZERO,
            sgst_amount: Decimal::ZERO,
            igst_rate: Decimal::ZERO,
            igst_amount: Decimal::ZERO,
            cess_amount: Decimal::ZERO,
            total_tax: Decimal::ZERO,
        };

        let split = match gst_type {
            GstType::CgstSgst => {
                let half_rate = rate / Decimal::TWO;
                let half_amount =
                    round_money(taxable_amount * half_rate / Decimal::ONE_HUNDRED);
                let cess = round_money(taxable_amount * cess_rate / Decimal::ONE_HUNDRED);
                GstSplit {
                    cgst_rate: half_rate,
                    cgst_amount: half_amount,
                    sgst_rate: half_rate,
                    sgst_amount: half_amount,
                    cess_amount: cess,
                    total_tax: round_money(half_amount + half_amount + cess),
                    ..zero
                }
            }
            GstType::Igst => {
                let igst = round_money(taxable_amount * rate / Decimal::ONE_HUNDRED);
                let cess = round_money(taxable_amount * cess_rate / Decimal::ONE_HUNDRED);
                GstSplit {
                    igst_rate: rate,
                    igst_amount: igst,
                    cess_amount: cess,
                    total_tax: round_money(igst + cess),
                    ..zero
                }
            }
            GstType::Exempt | GstType::NilRated | GstType::ZeroRated => zero,
        };

        Ok(split)
    }

    /// GST and cess rates are percentages in [0, 100].
    fn validate_rate(rate: Decimal) -> Result<()> {
        if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
            return Err(AppError::validation(format!(
                "GST rate must be between 0 and 100, got: {}",
                rate
            )));
        }
        Ok(())
    }
}

impl Default for GstCalculator {
    fn default() -> Self {
        Self::new()
    }
}
