//! Cart
//!
//! Shopping cart lines. A line is identified by the product id together with
//! the chosen size and variant: two lines for the same product in different
//! sizes are different lines, and every quantity change or removal addresses
//! the full key.

use std::fmt;

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::pricing::{PricingError, SHOP_CURRENCY, to_minor_units};

pub mod store;
pub mod summary;

pub use store::{CartStore, CartStoreError};
pub use summary::CartSummary;

/// Catalog product identifier, numeric or textual as found in the catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    /// Numeric id
    Number(u64),

    /// Text id
    Text(String),
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductId::Number(id) => write!(f, "{id}"),
            ProductId::Text(id) => f.write_str(id),
        }
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        ProductId::Number(id)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        // Keep ids typed in by hand comparable with numeric catalog ids.
        id.parse()
            .map_or_else(|_| ProductId::Text(id.to_string()), ProductId::Number)
    }
}

/// Composite identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    /// Product id
    pub id: ProductId,

    /// Chosen size, if the product has sizes
    pub size: Option<String>,

    /// Chosen variant, if the product has variants
    pub variant: Option<String>,
}

impl LineKey {
    /// Create a key.
    pub fn new(id: impl Into<ProductId>, size: Option<&str>, variant: Option<&str>) -> Self {
        Self {
            id: id.into(),
            size: size.map(str::to_string),
            variant: variant.map(str::to_string),
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} / {}",
            self.id,
            self.size.as_deref().unwrap_or("-"),
            self.variant.as_deref().unwrap_or("-")
        )
    }
}

fn default_quantity() -> u32 {
    1
}

/// One row of the shopping cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product id
    pub id: ProductId,

    /// Chosen size
    #[serde(default)]
    pub size: Option<String>,

    /// Chosen variant
    #[serde(default)]
    pub variant: Option<String>,

    /// Number of units, at least one once the line is in a cart
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Unit price, discount already applied
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    /// Unit price before the discount
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub old_price: Option<Decimal>,

    /// Discount in percent points (`20` for 20% off)
    #[serde(default, with = "rust_decimal::serde::float")]
    pub discount_percent: Decimal,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Image path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartLine {
    /// Create a full price line.
    pub fn new(key: LineKey, quantity: u32, price: Decimal) -> Self {
        Self {
            id: key.id,
            size: key.size,
            variant: key.variant,
            quantity,
            price,
            old_price: None,
            discount_percent: Decimal::ZERO,
            name: None,
            image: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Record the pre-discount price and discount.
    #[must_use]
    pub fn with_discount(mut self, old_price: Decimal, discount_percent: Decimal) -> Self {
        self.old_price = Some(old_price);
        self.discount_percent = discount_percent;
        self
    }

    /// Composite key of this line.
    pub fn key(&self) -> LineKey {
        LineKey {
            id: self.id.clone(),
            size: self.size.clone(),
            variant: self.variant.clone(),
        }
    }

    /// Whether this line is identified by `key`.
    pub fn matches(&self, key: &LineKey) -> bool {
        self.id == key.id && self.size == key.size && self.variant == key.variant
    }

    /// Discounted unit price.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the price does not fit in minor units.
    pub fn unit_price(&self) -> Result<Money<'static, Currency>, PricingError> {
        times_quantity(self.price, 1)
    }

    /// Discounted unit price multiplied by the quantity.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the total does not fit in minor units.
    pub fn line_total(&self) -> Result<Money<'static, Currency>, PricingError> {
        times_quantity(self.price, self.quantity)
    }

    /// Pre-discount unit price multiplied by the quantity. Lines without an
    /// old price are full price lines.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the total does not fit in minor units.
    pub fn original_line_total(&self) -> Result<Money<'static, Currency>, PricingError> {
        times_quantity(self.old_price.unwrap_or(self.price), self.quantity)
    }

    /// Amount saved on this line thanks to the discount.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the totals cannot be computed.
    pub fn line_savings(&self) -> Result<Money<'static, Currency>, PricingError> {
        Ok(self.original_line_total()?.sub(self.line_total()?)?)
    }
}

fn times_quantity(
    unit: Decimal,
    quantity: u32,
) -> Result<Money<'static, Currency>, PricingError> {
    let minor = to_minor_units(unit, SHOP_CURRENCY)?
        .checked_mul(i64::from(quantity))
        .ok_or(PricingError::AmountOutOfRange(unit))?;

    Ok(Money::from_minor(minor, SHOP_CURRENCY))
}

/// Ordered cart contents with the add/increment/decrement/remove rules
/// applied in memory. Persistence lives in [`CartStore`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cart holding `lines` as they are.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// Add a line, merging its quantity into an existing line with the same key.
    ///
    /// A quantity of zero counts as one.
    pub fn add(&mut self, mut item: CartLine) {
        let quantity = item.quantity.max(1);
        let key = item.key();

        if let Some(line) = self.lines.iter_mut().find(|line| line.matches(&key)) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            item.quantity = quantity;
            self.lines.push(item);
        }
    }

    /// Add one unit to the line with `key`. Returns `false` if there is no such line.
    pub fn increment(&mut self, key: &LineKey) -> bool {
        match self.lines.iter_mut().find(|line| line.matches(key)) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Take one unit off the line with `key`, never going below one.
    ///
    /// Returns `false` when nothing changed.
    pub fn decrement(&mut self, key: &LineKey) -> bool {
        match self.lines.iter_mut().find(|line| line.matches(key)) {
            Some(line) if line.quantity > 1 => {
                line.quantity -= 1;
                true
            }
            _ => false,
        }
    }

    /// Remove the line with `key`. Returns `false` if there is no such line.
    pub fn remove(&mut self, key: &LineKey) -> bool {
        let before = self.lines.len();

        self.lines.retain(|line| !line.matches(key));

        self.lines.len() != before
    }

    /// Find the line with `key`.
    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.matches(key))
    }

    /// Cart lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
