//! Cart Summary

use rusty_money::{Money, iso::Currency};

use crate::{
    cart::CartLine,
    pricing::{PricingError, SHOP_CURRENCY, total},
};

/// Totals shown at the bottom of the cart drawer.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSummary {
    /// Number of distinct lines
    pub line_count: usize,

    /// Number of units across all lines
    pub item_count: u64,

    /// Total before discounts
    pub subtotal: Money<'static, Currency>,

    /// Total to pay
    pub total: Money<'static, Currency>,

    /// Amount saved thanks to discounts
    pub savings: Money<'static, Currency>,
}

impl CartSummary {
    /// Summarise `lines`.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if a line total overflows.
    pub fn from_lines(lines: &[CartLine]) -> Result<Self, PricingError> {
        let subtotal = total(
            lines
                .iter()
                .map(CartLine::original_line_total)
                .collect::<Result<Vec<_>, _>>()?,
            SHOP_CURRENCY,
        )?;

        let to_pay = total(
            lines
                .iter()
                .map(CartLine::line_total)
                .collect::<Result<Vec<_>, _>>()?,
            SHOP_CURRENCY,
        )?;

        Ok(Self {
            line_count: lines.len(),
            item_count: lines.iter().map(|line| u64::from(line.quantity)).sum(),
            subtotal,
            total: to_pay,
            savings: subtotal.sub(to_pay)?,
        })
    }

    /// Whether any discount applies.
    pub fn has_savings(&self) -> bool {
        self.savings.to_minor_units() > 0
    }
}
