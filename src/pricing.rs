//! Pricing
//!
//! Prices travel as decimal amounts in major units (the JSON numbers the shop
//! front-end stores) and are turned into [`Money`] through minor units.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Currency every catalog price is expressed in.
pub const SHOP_CURRENCY: &Currency = rusty_money::iso::EUR;

/// Errors that can occur while pricing cart lines.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// A decimal amount does not fit in minor units.
    #[error("amount {0} cannot be represented in minor units")]
    AmountOutOfRange(Decimal),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Convert a major unit amount into minor units of `currency`.
///
/// # Errors
///
/// Returns [`PricingError::AmountOutOfRange`] if the scaled amount overflows.
pub fn to_minor_units(amount: Decimal, currency: &Currency) -> Result<i64, PricingError> {
    let scale = 10_i64
        .checked_pow(currency.exponent)
        .and_then(Decimal::from_i64)
        .ok_or(PricingError::AmountOutOfRange(amount))?;

    amount
        .checked_mul(scale)
        .ok_or(PricingError::AmountOutOfRange(amount))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::AmountOutOfRange(amount))
}

/// Convert a major unit amount into shop currency money.
///
/// # Errors
///
/// Returns [`PricingError::AmountOutOfRange`] if the amount overflows.
pub fn to_money(amount: Decimal) -> Result<Money<'static, Currency>, PricingError> {
    Ok(Money::from_minor(
        to_minor_units(amount, SHOP_CURRENCY)?,
        SHOP_CURRENCY,
    ))
}

/// Express a whole-number discount (e.g. `20` for 20% off) as a [`Percentage`].
pub fn percentage_from_points(points: Decimal) -> Percentage {
    Percentage::from(points / Decimal::ONE_HUNDRED)
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the calculation overflows.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::PercentConversion)?;

    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::PercentConversion)
}

/// Unit price after taking `discount_points` percent off `base`.
///
/// The discount is rounded to the nearest minor unit before it is subtracted,
/// so `discounted_price(49.90, 15)` is `42.41`, never a fraction of a cent.
///
/// # Errors
///
/// Returns a [`PricingError`] if either amount overflows minor units.
pub fn discounted_price(base: Decimal, discount_points: Decimal) -> Result<Decimal, PricingError> {
    if discount_points.is_zero() {
        return Ok(base);
    }

    let base_minor = to_minor_units(base, SHOP_CURRENCY)?;
    let discount_minor = percent_of_minor(&percentage_from_points(discount_points), base_minor)?;

    let discounted = base_minor
        .checked_sub(discount_minor)
        .ok_or(PricingError::PercentConversion)?;

    Ok(Decimal::new(discounted, SHOP_CURRENCY.exponent))
}

/// Sum a list of amounts that all share one currency.
///
/// # Errors
///
/// Returns [`PricingError::Money`] on a currency mismatch.
pub fn total<'a>(
    amounts: impl IntoIterator<Item = Money<'a, Currency>>,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, PricingError> {
    let total = amounts
        .into_iter()
        .try_fold(Money::from_minor(0, currency), |acc, amount| acc.add(amount))?;

    Ok(total)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn to_minor_units_rounds_half_away_from_zero() -> TestResult {
        assert_eq!(to_minor_units(Decimal::new(12345, 3), SHOP_CURRENCY)?, 1235);
        assert_eq!(to_minor_units(Decimal::new(499, 1), SHOP_CURRENCY)?, 4990);
        assert_eq!(to_minor_units(Decimal::ZERO, SHOP_CURRENCY)?, 0);

        Ok(())
    }

    #[test]
    fn to_minor_units_overflow_returns_error() {
        let result = to_minor_units(Decimal::MAX, SHOP_CURRENCY);

        assert_eq!(result, Err(PricingError::AmountOutOfRange(Decimal::MAX)));
    }

    #[test]
    fn percent_of_minor_calculates_correctly() -> TestResult {
        let percent = Percentage::from(0.25);

        assert_eq!(percent_of_minor(&percent, 200)?, 50);

        Ok(())
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let percent = Percentage::from(2.0);
        let result = percent_of_minor(&percent, i64::MAX);

        assert_eq!(result, Err(PricingError::PercentConversion));
    }

    #[test]
    fn discounted_price_rounds_discount_to_minor_units() -> TestResult {
        assert_eq!(
            discounted_price(Decimal::new(4990, 2), Decimal::from(15))?,
            Decimal::new(4241, 2)
        );
        assert_eq!(
            discounted_price(Decimal::from(30), Decimal::from(20))?,
            Decimal::new(2400, 2)
        );

        Ok(())
    }

    #[test]
    fn discounted_price_without_discount_is_base_price() -> TestResult {
        assert_eq!(
            discounted_price(Decimal::new(1999, 2), Decimal::ZERO)?,
            Decimal::new(1999, 2)
        );

        Ok(())
    }

    #[test]
    fn total_sums_amounts() -> TestResult {
        let amounts = [
            to_money(Decimal::new(150, 2))?,
            to_money(Decimal::new(225, 2))?,
        ];

        assert_eq!(
            total(amounts, SHOP_CURRENCY)?,
            Money::from_minor(375, SHOP_CURRENCY)
        );

        Ok(())
    }

    #[test]
    fn total_of_nothing_is_zero() -> TestResult {
        assert_eq!(
            total([], SHOP_CURRENCY)?,
            Money::from_minor(0, SHOP_CURRENCY)
        );

        Ok(())
    }
}
