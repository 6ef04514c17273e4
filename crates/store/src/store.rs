use async_trait::async_trait;

use crate::{
    NewOrder, NewProduct, NewUser, Order, OrderId, OrderPatch, Product, ProductId, ProductPatch,
    ProductQuery, Result, SavedProductChange, StoreError, User, UserId, UserPatch, UserQuery,
};

/// Core trait for marketplace store implementations.
///
/// Most methods are single-record reads and writes. [`commit_order`] and
/// [`apply_saved_product`] are the conditional, multi-row writes and must be
/// atomic in every implementation.
///
/// All implementations must be thread-safe (Send + Sync).
///
/// [`commit_order`]: MarketplaceStore::commit_order
/// [`apply_saved_product`]: MarketplaceStore::apply_saved_product
#[async_trait]
pub trait MarketplaceStore: Send + Sync {
    /// Creates a user together with its preference record.
    ///
    /// Fails with `Conflict` if the email is already taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Retrieves a user by id.
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Lists users page by page.
    async fn list_users(&self, query: UserQuery) -> Result<Vec<User>>;

    /// Applies a partial update to a user and its preference.
    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User>;

    /// Deletes a user, cascading to its preference, saved edges and orders.
    async fn delete_user(&self, id: UserId) -> Result<()>;

    /// Creates a product.
    async fn create_product(&self, product: NewProduct) -> Result<Product>;

    /// Retrieves a product by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Retrieves every product whose id is in `ids`. Unknown ids are skipped.
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>>;

    /// Lists products page by page.
    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>>;

    /// Applies a partial update to a product.
    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product>;

    /// Deletes a product.
    ///
    /// Fails with `Conflict` if a line item still references it.
    async fn delete_product(&self, id: ProductId) -> Result<()>;

    /// Persists an order, its line items and the stock decrements it implies
    /// as one atomic unit.
    ///
    /// Each decrement re-asserts sufficiency at commit time; if any product's
    /// stock would go negative the whole commit is rolled back and
    /// `InsufficientStock` is returned. Fails with `NotFound` if the owning
    /// user does not exist.
    async fn commit_order(&self, order: NewOrder) -> Result<Order>;

    /// Retrieves an order with its line items.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists every order, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Lists a user's orders, newest first. Fails with `NotFound` for an
    /// unknown user.
    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Applies a partial update to an order's scalar fields.
    async fn update_order(&self, id: OrderId, patch: OrderPatch) -> Result<Order>;

    /// Deletes an order and its line items. Stock is not restored.
    async fn delete_order(&self, id: OrderId) -> Result<()>;

    /// Returns true if the product is in the user's saved set.
    ///
    /// Fails with `NotFound` if the user does not exist.
    async fn is_product_saved(&self, user_id: UserId, product_id: ProductId) -> Result<bool>;

    /// Applies a connect or disconnect to the saved-products relation as one
    /// conditional write and returns the user's saved set afterwards.
    ///
    /// Connecting an already-saved product and disconnecting an unsaved one
    /// are no-ops. Fails with `NotFound` for an unknown user, or for an
    /// unknown product on connect.
    async fn apply_saved_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
        change: SavedProductChange,
    ) -> Result<Vec<Product>>;

    /// Returns the user's saved set. Fails with `NotFound` for an unknown user.
    async fn saved_products(&self, user_id: UserId) -> Result<Vec<Product>>;
}

/// Extension trait providing convenience methods for stores.
#[async_trait]
pub trait MarketplaceStoreExt: MarketplaceStore {
    /// Retrieves a user, mapping absence to `NotFound`.
    async fn require_user(&self, id: UserId) -> Result<User> {
        self.get_user(id)
            .await?
            .ok_or_else(|| StoreError::not_found("User", id))
    }

    /// Retrieves a product, mapping absence to `NotFound`.
    async fn require_product(&self, id: ProductId) -> Result<Product> {
        self.get_product(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Product", id))
    }

    /// Retrieves an order, mapping absence to `NotFound`.
    async fn require_order(&self, id: OrderId) -> Result<Order> {
        self.get_order(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Order", id))
    }
}

// Blanket implementation for all MarketplaceStore implementations
impl<T: MarketplaceStore + ?Sized> MarketplaceStoreExt for T {}
