//! Product catalog management.

use serde::Deserialize;
use store::{
    Category, MarketplaceStore, MarketplaceStoreExt, NewProduct, Product, ProductId, ProductPatch,
    ProductQuery,
};

use crate::error::DomainError;
use crate::validation::{self, PRODUCT_NAME_MAX_CHARS};

/// Body of a create-product request. `price` is in minor units.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: i64,
    pub stock: i64,
}

/// Body of a product patch request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub price: Option<i64>,
    pub stock: Option<i64>,
}

impl CreateProduct {
    pub fn validate(self) -> Result<NewProduct, DomainError> {
        validation::bounded("name", &self.name, PRODUCT_NAME_MAX_CHARS)?;
        validation::non_empty("description", &self.description)?;

        Ok(NewProduct {
            name: self.name,
            description: self.description,
            category: self.category,
            price: validation::price(self.price)?,
            stock: validation::stock(self.stock)?,
        })
    }
}

impl PatchProduct {
    pub fn validate(self) -> Result<ProductPatch, DomainError> {
        if let Some(name) = &self.name {
            validation::bounded("name", name, PRODUCT_NAME_MAX_CHARS)?;
        }
        if let Some(description) = &self.description {
            validation::non_empty("description", description)?;
        }

        Ok(ProductPatch {
            name: self.name,
            description: self.description,
            category: self.category,
            price: self.price.map(validation::price).transpose()?,
            stock: self.stock.map(validation::stock).transpose()?,
        })
    }
}

/// Service for managing the product catalog.
pub struct ProductService<S: MarketplaceStore> {
    store: S,
}

impl<S: MarketplaceStore> ProductService<S> {
    /// Creates a new product service backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create_product(&self, request: CreateProduct) -> Result<Product, DomainError> {
        let product = self.store.create_product(request.validate()?).await?;
        tracing::info!(product_id = %product.id, category = %product.category, "product created");
        Ok(product)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, DomainError> {
        Ok(self.store.require_product(id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>, DomainError> {
        Ok(self.store.list_products(query).await?)
    }

    /// Updates catalog fields. Existing orders keep their snapshot prices.
    #[tracing::instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        id: ProductId,
        request: PatchProduct,
    ) -> Result<Product, DomainError> {
        Ok(self.store.update_product(id, request.validate()?).await?)
    }

    /// Deletes a product. Fails with `Conflict` while orders reference it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), DomainError> {
        self.store.delete_product(id).await?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str, price: i64, stock: i64) -> CreateProduct {
        CreateProduct {
            name: name.to_string(),
            description: "Running shoes".to_string(),
            category: Category::Sports,
            price,
            stock,
        }
    }

    #[test]
    fn create_product_validation() {
        let product = create("Runner", 8900, 12).validate().unwrap();
        assert_eq!(product.price.cents(), 8900);
        assert_eq!(product.stock, 12);

        assert!(create("", 1, 1).validate().is_err());
        assert!(create(&"n".repeat(61), 1, 1).validate().is_err());
        assert!(create("Runner", -1, 1).validate().is_err());
        assert!(create("Runner", 1, -1).validate().is_err());
    }

    #[test]
    fn patch_converts_present_fields() {
        let patch = PatchProduct {
            price: Some(500),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(patch.price.map(|p| p.cents()), Some(500));
        assert_eq!(patch.stock, None);

        let bad = PatchProduct {
            stock: Some(-3),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn category_parses_from_json() {
        let request: CreateProduct = serde_json::from_value(serde_json::json!({
            "name": "Sofa",
            "description": "Three seats",
            "category": "HOME_INTERIOR",
            "price": 49900,
            "stock": 2
        }))
        .unwrap();
        assert_eq!(request.category, Category::HomeInterior);
    }
}
