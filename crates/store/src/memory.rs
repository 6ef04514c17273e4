use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::{
    LineItem, LineItemId, NewOrder, NewProduct, NewUser, Order, OrderId, OrderPatch, Product,
    ProductId, ProductOrder, ProductPatch, ProductQuery, Result, SavedProductChange, StoreError,
    User, UserId, UserOrder, UserPatch, UserQuery, store::MarketplaceStore,
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    /// Saved products per user, in the order they were saved.
    saved: HashMap<UserId, Vec<ProductId>>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl MemoryState {
    /// Returns a timestamp strictly later than any previously issued one, so
    /// newest/oldest orderings are stable even within one clock tick.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn saved_for(&self, user_id: UserId) -> Vec<Product> {
        self.saved
            .get(&user_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.products.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// In-memory store implementation.
///
/// Every write takes the single state lock, so multi-row writes such as
/// [`MarketplaceStore::commit_order`] are applied atomically. Provides the same
/// interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the total number of line items across all orders.
    pub async fn line_item_count(&self) -> usize {
        self.state
            .read()
            .await
            .orders
            .values()
            .map(|o| o.items.len())
            .sum()
    }
}

fn page<T>(items: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl MarketplaceStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        if state.email_taken(&user.email, None) {
            return Err(StoreError::Conflict(format!(
                "email {} is already registered",
                user.email
            )));
        }

        let now = state.tick();
        let record = User {
            id: UserId::new(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            address: user.address,
            preference: user.preference,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self, query: UserQuery) -> Result<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<_> = state.users.values().cloned().collect();
        match query.order {
            UserOrder::Newest => users.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            UserOrder::Oldest => users.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        }
        Ok(page(users, query.offset, query.limit))
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User> {
        let mut state = self.state.write().await;
        if let Some(email) = &patch.email
            && state.email_taken(email, Some(id))
        {
            return Err(StoreError::Conflict(format!(
                "email {email} is already registered"
            )));
        }

        let now = state.tick();
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("User", id))?;
        patch.apply_to(user);
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Err(StoreError::not_found("User", id));
        }
        state.saved.remove(&id);
        state.orders.retain(|_, o| o.user_id != id);
        Ok(())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let mut state = self.state.write().await;
        let now = state.tick();
        let record = Product {
            id: ProductId::new(),
            name: product.name,
            description: product.description,
            category: product.category,
            price: product.price,
            stock: product.stock,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut seen = Vec::with_capacity(ids.len());
        for id in ids {
            if seen.iter().any(|p: &Product| p.id == *id) {
                continue;
            }
            if let Some(product) = state.products.get(id) {
                seen.push(product.clone());
            }
        }
        Ok(seen)
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<_> = state
            .products
            .values()
            .filter(|p| query.category.is_none_or(|c| p.category == c))
            .cloned()
            .collect();

        match query.order {
            ProductOrder::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ProductOrder::Oldest => products.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            ProductOrder::PriceLowest => products.sort_by(|a, b| {
                a.price
                    .cmp(&b.price)
                    .then(b.created_at.cmp(&a.created_at))
            }),
            ProductOrder::PriceHighest => products.sort_by(|a, b| {
                b.price
                    .cmp(&a.price)
                    .then(b.created_at.cmp(&a.created_at))
            }),
        }

        Ok(page(products, query.offset, query.limit))
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        let mut state = self.state.write().await;
        let now = state.tick();
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;
        patch.apply_to(product);
        product.updated_at = now;
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.products.contains_key(&id) {
            return Err(StoreError::not_found("Product", id));
        }
        let referenced = state
            .orders
            .values()
            .any(|o| o.items.iter().any(|i| i.product_id == id));
        if referenced {
            return Err(StoreError::Conflict(format!(
                "product {id} is referenced by existing orders"
            )));
        }

        state.products.remove(&id);
        for saved in state.saved.values_mut() {
            saved.retain(|p| *p != id);
        }
        Ok(())
    }

    async fn commit_order(&self, order: NewOrder) -> Result<Order> {
        order.validate()?;
        let decrements = order.stock_decrements()?;

        let mut state = self.state.write().await;

        if !state.users.contains_key(&order.user_id) {
            return Err(StoreError::not_found("User", order.user_id));
        }

        // Check every decrement before applying any of them.
        for decrement in &decrements {
            let available = state
                .products
                .get(&decrement.product_id)
                .map(|p| p.stock)
                .unwrap_or(0);
            if available < decrement.quantity {
                metrics::counter!("stock_decrement_rejections_total").increment(1);
                return Err(StoreError::InsufficientStock {
                    product_id: decrement.product_id,
                    requested: decrement.quantity,
                    available,
                });
            }
        }

        let now = state.tick();
        for decrement in &decrements {
            if let Some(product) = state.products.get_mut(&decrement.product_id) {
                product.stock -= decrement.quantity;
                product.updated_at = now;
            }
        }

        let record = Order {
            id: order.id,
            user_id: order.user_id,
            status: Default::default(),
            items: order
                .items
                .into_iter()
                .map(|item| LineItem {
                    id: LineItemId::new(),
                    order_id: order.id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
            created_at: now,
            updated_at: now,
        };
        state.orders.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        if !state.users.contains_key(&user_id) {
            return Err(StoreError::not_found("User", user_id));
        }
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_order(&self, id: OrderId, patch: OrderPatch) -> Result<Order> {
        let mut state = self.state.write().await;
        let now = state.tick();
        let order = state
            .orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Order", id))?;
        if let Some(status) = patch.status {
            order.status = status;
        }
        order.updated_at = now;
        Ok(order.clone())
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .orders
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("Order", id))
    }

    async fn is_product_saved(&self, user_id: UserId, product_id: ProductId) -> Result<bool> {
        let state = self.state.read().await;
        if !state.users.contains_key(&user_id) {
            return Err(StoreError::not_found("User", user_id));
        }
        Ok(state
            .saved
            .get(&user_id)
            .is_some_and(|ids| ids.contains(&product_id)))
    }

    async fn apply_saved_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
        change: SavedProductChange,
    ) -> Result<Vec<Product>> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(StoreError::not_found("User", user_id));
        }

        match change {
            SavedProductChange::Connect => {
                if !state.products.contains_key(&product_id) {
                    return Err(StoreError::not_found("Product", product_id));
                }
                let saved = state.saved.entry(user_id).or_default();
                if !saved.contains(&product_id) {
                    saved.push(product_id);
                }
            }
            SavedProductChange::Disconnect => {
                if let Some(saved) = state.saved.get_mut(&user_id) {
                    saved.retain(|p| *p != product_id);
                }
            }
        }

        Ok(state.saved_for(user_id))
    }

    async fn saved_products(&self, user_id: UserId) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        if !state.users.contains_key(&user_id) {
            return Err(StoreError::not_found("User", user_id));
        }
        Ok(state.saved_for(user_id))
    }
}
