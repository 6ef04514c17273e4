//! Order service coordinating assembly, stock checks and the atomic commit.

use std::time::Instant;

use serde::Deserialize;
use store::{MarketplaceStore, MarketplaceStoreExt, Order, OrderId, OrderPatch, OrderStatus, UserId};

use crate::error::DomainError;
use crate::inventory;

use super::{CreateOrder, PricedOrder, assemble};

/// Body of an order patch request. Only the status may change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatchOrder {
    pub status: Option<OrderStatus>,
}

/// Service for managing orders.
///
/// Creation runs the full workflow: parse, fetch products, assemble with price
/// snapshots, check stock, then hand the order to the store's atomic commit.
/// Reads attach a computed total.
pub struct OrderService<S: MarketplaceStore> {
    store: S,
}

impl<S: MarketplaceStore> OrderService<S> {
    /// Creates a new order service backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates an order, decrementing stock for every line in one atomic unit.
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn create_order(&self, request: CreateOrder) -> Result<Order, DomainError> {
        let result = self.try_create_order(&request).await;
        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    items = order.items.len(),
                    "order committed"
                );
            }
            Err(err) => {
                let reason = rejection_reason(err);
                metrics::counter!("orders_rejected_total", "reason" => reason).increment(1);
                tracing::warn!(reason, error = %err, "order rejected");
            }
        }
        result
    }

    async fn try_create_order(&self, request: &CreateOrder) -> Result<Order, DomainError> {
        let parsed = request.parse()?;
        let products = self.store.get_products(&parsed.product_ids()).await?;
        let assembled = assemble(&parsed, &products)?;

        if let Some(shortfall) = inventory::first_shortfall(&assembled.demands, &products) {
            return Err(DomainError::InsufficientStock {
                product_id: shortfall.product_id,
                requested: shortfall.requested,
                available: shortfall.available,
            });
        }

        let started = Instant::now();
        let committed = self.store.commit_order(assembled.order).await;
        metrics::histogram!("order_commit_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        Ok(committed?)
    }

    /// Loads an order with its computed total.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<PricedOrder, DomainError> {
        PricedOrder::try_from(self.store.require_order(id).await?)
    }

    /// Lists every order, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<PricedOrder>, DomainError> {
        let orders = self.store.list_orders().await?;
        orders.into_iter().map(PricedOrder::try_from).collect()
    }

    /// Lists the orders placed by one user.
    #[tracing::instrument(skip(self))]
    pub async fn list_user_orders(&self, user_id: UserId) -> Result<Vec<PricedOrder>, DomainError> {
        let orders = self.store.list_orders_for_user(user_id).await?;
        orders.into_iter().map(PricedOrder::try_from).collect()
    }

    /// Applies a status change. Line items are never touched.
    #[tracing::instrument(skip(self))]
    pub async fn update_order(
        &self,
        id: OrderId,
        patch: PatchOrder,
    ) -> Result<PricedOrder, DomainError> {
        let order = self
            .store
            .update_order(
                id,
                OrderPatch {
                    status: patch.status,
                },
            )
            .await?;
        PricedOrder::try_from(order)
    }

    /// Deletes an order and its line items. Stock is not restored.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, id: OrderId) -> Result<(), DomainError> {
        self.store.delete_order(id).await?;
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }
}

fn rejection_reason(err: &DomainError) -> &'static str {
    match err {
        DomainError::Validation(_) => "validation",
        DomainError::NotFound { .. } => "not_found",
        DomainError::InsufficientStock { .. } => "insufficient_stock",
        DomainError::Conflict(_) => "conflict",
        DomainError::Store(_) => "store",
    }
}
