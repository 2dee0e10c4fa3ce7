use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dto::require_text;
use crate::enums::ProductCategory;
use crate::error::{AppError, AppResult};
use crate::models::Product;

/// Raw "add product" form values as entered by a seller.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub brand: String,
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
}

/// A draft that passed validation. New products always start with `sold = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: ProductCategory,
    pub brand: String,
    pub stock: u32,
    pub images: Vec<String>,
    pub specifications: BTreeMap<String, String>,
}

impl ProductDraft {
    pub fn validate(&self) -> AppResult<NewProduct> {
        Ok(NewProduct {
            name: require_text("name", &self.name)?,
            description: require_text("description", &self.description)?,
            price: positive_price(self.price)?,
            category: self.category.trim().parse()?,
            brand: self.brand.trim().to_string(),
            stock: stock_count(self.stock)?,
            images: clean_images(&self.images),
            specifications: self.specifications.clone(),
        })
    }
}

/// Partial update. Only these fields are editable; id, seller and sold count
/// have no slot here.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub stock: Option<i64>,
    pub specifications: Option<BTreeMap<String, String>>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub category: Option<ProductCategory>,
    pub brand: Option<String>,
    pub stock: Option<u32>,
    pub specifications: Option<BTreeMap<String, String>>,
    pub images: Option<Vec<String>>,
}

impl ProductPatch {
    pub fn validate(&self) -> AppResult<ProductChanges> {
        let changes = ProductChanges {
            name: self
                .name
                .as_deref()
                .map(|n| require_text("name", n))
                .transpose()?,
            description: self
                .description
                .as_deref()
                .map(|d| require_text("description", d))
                .transpose()?,
            price: self.price.map(positive_price).transpose()?,
            category: self
                .category
                .as_deref()
                .map(|c| c.trim().parse())
                .transpose()?,
            brand: self.brand.as_deref().map(|b| b.trim().to_string()),
            stock: self.stock.map(stock_count).transpose()?,
            specifications: self.specifications.clone(),
            images: self.images.as_deref().map(clean_images),
        };
        if changes.is_empty() {
            return Err(AppError::Validation("nothing to update".into()));
        }
        Ok(changes)
    }
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        *self == ProductChanges::default()
    }

    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(brand) = &self.brand {
            product.brand = brand.clone();
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(specifications) = &self.specifications {
            product.specifications = specifications.clone();
        }
        if let Some(images) = &self.images {
            product.images = images.clone();
        }
    }
}

fn positive_price(price: i64) -> AppResult<i64> {
    if price <= 0 {
        return Err(AppError::Validation("price must be greater than 0".into()));
    }
    Ok(price)
}

fn stock_count(stock: i64) -> AppResult<u32> {
    if stock < 0 {
        return Err(AppError::Validation("stock cannot be negative".into()));
    }
    i32::try_from(stock)
        .map(|s| s as u32)
        .map_err(|_| AppError::Validation("stock is too large".into()))
}

fn clean_images(images: &[String]) -> Vec<String> {
    images
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: " Tecno Spark 20 ".into(),
            description: "Budget phone".into(),
            price: 16_000,
            category: "Mobile Phones".into(),
            brand: "Tecno".into(),
            stock: 4,
            ..Default::default()
        }
    }

    #[test]
    fn valid_draft_is_trimmed_and_typed() {
        let product = draft().validate().unwrap();
        assert_eq!(product.name, "Tecno Spark 20");
        assert_eq!(product.category, ProductCategory::MobilePhones);
        assert_eq!(product.stock, 4);
    }

    #[test]
    fn draft_rejects_bad_fields() {
        let cases = [
            ProductDraft { price: 0, ..draft() },
            ProductDraft { stock: -1, ..draft() },
            ProductDraft { category: "Drones".into(), ..draft() },
            ProductDraft { name: "  ".into(), ..draft() },
            ProductDraft { description: String::new(), ..draft() },
        ];
        for case in cases {
            assert!(matches!(case.validate(), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(ProductPatch::default().validate().is_err());
        let patch = ProductPatch {
            stock: Some(0),
            ..Default::default()
        };
        assert_eq!(patch.validate().unwrap().stock, Some(0));
    }
}
