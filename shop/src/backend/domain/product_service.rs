use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::domain::commands::products::{CreateProductCommand, UpdateProductCommand};
use crate::backend::domain::commands::UpdateOutcome;
use crate::backend::domain::validation::{self, ValidationError};
use crate::backend::storage::DbConnection;
use shared::Product;

/// Service for managing the product catalog
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    /// Add a new, active product to the catalog
    pub async fn add_product(&self, command: CreateProductCommand) -> Result<Product> {
        info!("Adding product: title={}, price={}", command.title, command.price);

        let (title, description, price) =
            Self::normalize(&command.title, &command.description, command.price, command.quantity)?;

        let id = self
            .db
            .store_product(&title, &description, price, command.quantity)
            .await
            .context("Failed to store product")?;

        info!("Added product {} with ID: {}", title, id);

        Ok(Product {
            id,
            title,
            description,
            price,
            quantity: command.quantity,
            active: true,
        })
    }

    pub async fn get_product(&self, product_id: i64) -> Result<Option<Product>> {
        self.db.get_product(product_id).await
    }

    /// Products shown in the catalog listing (soft-deleted rows excluded)
    pub async fn list_active_products(&self) -> Result<Vec<Product>> {
        let products = self
            .db
            .list_active_products()
            .await
            .context("Failed to list products")?;
        info!("Found {} active products", products.len());
        Ok(products)
    }

    /// Every product, including deactivated ones
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.db.list_products().await.context("Failed to list products")
    }

    /// Overwrite title, description, price and quantity by ID.
    ///
    /// There is no existence check: an unknown ID updates nothing and still
    /// succeeds.
    pub async fn update_product(&self, command: UpdateProductCommand) -> Result<UpdateOutcome> {
        info!("Updating product: {}", command.product_id);

        let (title, description, price) =
            Self::normalize(&command.title, &command.description, command.price, command.quantity)?;

        let rows_affected = self
            .db
            .update_product(command.product_id, &title, &description, price, command.quantity)
            .await
            .context("Failed to update product")?;

        if rows_affected == 0 {
            warn!("Update matched no product with ID: {}", command.product_id);
        }

        Ok(UpdateOutcome { rows_affected })
    }

    /// Soft-delete a product. Unknown IDs are a silent no-op.
    pub async fn deactivate_product(&self, product_id: i64) -> Result<UpdateOutcome> {
        info!("Deactivating product: {}", product_id);

        let rows_affected = self
            .db
            .deactivate_product(product_id)
            .await
            .context("Failed to deactivate product")?;

        if rows_affected == 0 {
            warn!("Deactivation matched no product with ID: {}", product_id);
        }

        Ok(UpdateOutcome { rows_affected })
    }

    fn normalize(
        title: &str,
        description: &str,
        price: f64,
        quantity: i64,
    ) -> Result<(String, String, f64), ValidationError> {
        let title = validation::require_text("Title", title)?;
        let description = validation::require_text("Description", description)?;

        if !price.is_finite() {
            return Err(ValidationError::InvalidNumber("price"));
        }
        if price < 0.0 {
            return Err(ValidationError::Negative("Price"));
        }
        if quantity < 0 {
            return Err(ValidationError::Negative("Quantity"));
        }

        Ok((title, description, validation::round_to(price, 2)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test() -> ProductService {
        let db = Arc::new(DbConnection::init_test().await.expect("Failed to create test database"));
        ProductService::new(db)
    }

    fn widget() -> CreateProductCommand {
        CreateProductCommand {
            title: "Widget".to_string(),
            description: "A widget".to_string(),
            price: 9.999,
            quantity: 5,
        }
    }

    #[tokio::test]
    async fn test_add_product_rounds_price() {
        let service = setup_test().await;

        let product = service.add_product(widget()).await.expect("Failed to add product");

        assert_eq!(product.price, 10.0);
        assert!(product.active);

        let stored = service.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored, product);
    }

    #[tokio::test]
    async fn test_add_product_rejects_blank_title() {
        let service = setup_test().await;

        let mut command = widget();
        command.title = "   ".to_string();

        let err = service.add_product(command).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::EmptyField("Title"))
        );
        assert!(service.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deactivated_product_leaves_listing_but_not_catalog() {
        let service = setup_test().await;

        let product = service.add_product(widget()).await.unwrap();
        assert_eq!(service.list_active_products().await.unwrap().len(), 1);

        let outcome = service.deactivate_product(product.id).await.unwrap();
        assert!(outcome.matched());

        assert!(service.list_active_products().await.unwrap().is_empty());
        let all = service.list_products().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].active);
    }

    #[tokio::test]
    async fn test_update_product_overwrites_fields() {
        let service = setup_test().await;
        let product = service.add_product(widget()).await.unwrap();

        let outcome = service
            .update_product(UpdateProductCommand {
                product_id: product.id,
                title: "Gadget".to_string(),
                description: "A gadget".to_string(),
                price: 19.995,
                quantity: 0,
            })
            .await
            .unwrap();

        assert!(outcome.matched());
        let stored = service.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Gadget");
        assert_eq!(stored.price, 20.0);
        assert_eq!(stored.quantity, 0);
    }

    #[tokio::test]
    async fn test_update_missing_product_is_noop() {
        let service = setup_test().await;

        let outcome = service
            .update_product(UpdateProductCommand {
                product_id: 9999,
                title: "Ghost".to_string(),
                description: "Nothing".to_string(),
                price: 1.0,
                quantity: 1,
            })
            .await
            .expect("Updating a missing product must not error");

        assert!(!outcome.matched());
        assert!(service.list_products().await.unwrap().is_empty());
    }
}
