//! Products

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{CartLine, LineKey, ProductId},
    pricing::{PricingError, discounted_price},
};

/// Errors building a cart line from a product.
#[derive(Debug, Error, PartialEq)]
pub enum ProductError {
    /// The product is not sold in this size.
    #[error("product {0} has no size `{1}`")]
    UnknownSize(ProductId, String),

    /// The product is not sold in this variant.
    #[error("product {0} has no variant `{1}`")]
    UnknownVariant(ProductId, String),

    /// The product has sizes but none was chosen.
    #[error("product {0} needs a size")]
    MissingSize(ProductId),

    /// Price calculation failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Catalog product as stored in the catalog data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product id
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Full unit price
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    /// Discount in percent points
    #[serde(default, with = "rust_decimal::serde::float")]
    pub discount_percent: Decimal,

    /// Sizes on offer; empty when the product is one-size
    #[serde(default)]
    pub sizes: Vec<String>,

    /// Variants on offer; empty when the product has none
    #[serde(default)]
    pub variants: Vec<String>,

    /// Image path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Product {
    /// Unit price with the product discount applied.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the price overflows.
    pub fn discounted_price(&self) -> Result<Decimal, PricingError> {
        discounted_price(self.price, self.discount_percent)
    }

    /// Build the cart line for `quantity` units in `size` / `variant`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProductError`] if the size or variant is not on offer, or
    /// pricing fails.
    pub fn to_cart_line(
        &self,
        size: Option<&str>,
        variant: Option<&str>,
        quantity: u32,
    ) -> Result<CartLine, ProductError> {
        match size {
            Some(size) if !self.sizes.iter().any(|offered| offered == size) => {
                return Err(ProductError::UnknownSize(self.id.clone(), size.to_string()));
            }
            None if !self.sizes.is_empty() => {
                return Err(ProductError::MissingSize(self.id.clone()));
            }
            _ => {}
        }

        if let Some(variant) = variant
            && !self.variants.iter().any(|offered| offered == variant)
        {
            return Err(ProductError::UnknownVariant(
                self.id.clone(),
                variant.to_string(),
            ));
        }

        let key = LineKey {
            id: self.id.clone(),
            size: size.map(str::to_string),
            variant: variant.map(str::to_string),
        };

        let mut line = CartLine::new(key, quantity, self.discounted_price()?).with_name(&self.name);

        if self.discount_percent > Decimal::ZERO {
            line = line.with_discount(self.price, self.discount_percent);
        }

        line.image.clone_from(&self.image);

        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn hoodie() -> Product {
        Product {
            id: ProductId::Number(3),
            name: "Hoodie Battant".to_string(),
            price: Decimal::new(4990, 2),
            discount_percent: Decimal::from(15),
            sizes: vec!["S".to_string(), "M".to_string()],
            variants: vec!["noir".to_string()],
            image: Some("/img/hoodie.webp".to_string()),
        }
    }

    #[test]
    fn discounted_line_keeps_old_price() -> TestResult {
        let line = hoodie().to_cart_line(Some("M"), Some("noir"), 2)?;

        assert_eq!(line.price, Decimal::new(4241, 2));
        assert_eq!(line.old_price, Some(Decimal::new(4990, 2)));
        assert_eq!(line.discount_percent, Decimal::from(15));
        assert_eq!(line.quantity, 2);
        assert_eq!(line.name.as_deref(), Some("Hoodie Battant"));

        Ok(())
    }

    #[test]
    fn full_price_product_has_no_old_price() -> TestResult {
        let mut product = hoodie();
        product.discount_percent = Decimal::ZERO;

        let line = product.to_cart_line(Some("S"), None, 1)?;

        assert_eq!(line.price, Decimal::new(4990, 2));
        assert_eq!(line.old_price, None);

        Ok(())
    }

    #[test]
    fn unknown_size_or_variant_is_rejected() {
        let product = hoodie();

        assert_eq!(
            product.to_cart_line(Some("XXL"), None, 1),
            Err(ProductError::UnknownSize(
                ProductId::Number(3),
                "XXL".to_string()
            ))
        );
        assert_eq!(
            product.to_cart_line(Some("M"), Some("rose"), 1),
            Err(ProductError::UnknownVariant(
                ProductId::Number(3),
                "rose".to_string()
            ))
        );
        assert_eq!(
            product.to_cart_line(None, None, 1),
            Err(ProductError::MissingSize(ProductId::Number(3)))
        );
    }
}
