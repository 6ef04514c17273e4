//! Saved-products relation toggler.
//!
//! Each (user, product) pair is a two-state machine that starts `Unsaved`.
//! A toggle reads the current state, decides the opposite write and hands it
//! to the store as a conditional change. If another request flips the pair in
//! between, the conditional write becomes a no-op instead of duplicating or
//! corrupting the edge.

use serde::Deserialize;
use store::{MarketplaceStore, Product, ProductId, SavedProductChange, UserId};

use crate::error::DomainError;
use crate::validation;

/// Membership of one product in one user's saved set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SavedState {
    #[default]
    Unsaved,
    Saved,
}

impl SavedState {
    pub fn from_membership(saved: bool) -> Self {
        if saved {
            SavedState::Saved
        } else {
            SavedState::Unsaved
        }
    }

    /// The write that moves the pair to the opposite state.
    pub fn toggle(self) -> SavedProductChange {
        match self {
            SavedState::Unsaved => SavedProductChange::Connect,
            SavedState::Saved => SavedProductChange::Disconnect,
        }
    }
}

/// Body of a toggle request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSavedProduct {
    pub product_id: String,
}

/// Service for toggling and listing a user's saved products.
pub struct SavedProductService<S: MarketplaceStore> {
    store: S,
}

impl<S: MarketplaceStore> SavedProductService<S> {
    /// Creates a new saved-products service backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Flips the product's membership in the user's saved set and returns the
    /// full set after the write.
    #[tracing::instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn toggle(
        &self,
        user_id: UserId,
        request: ToggleSavedProduct,
    ) -> Result<Vec<Product>, DomainError> {
        let product_id: ProductId = validation::parse_id("productId", &request.product_id)?;

        let current = self.store.is_product_saved(user_id, product_id).await?;
        let change = SavedState::from_membership(current).toggle();
        let saved = self
            .store
            .apply_saved_product(user_id, product_id, change)
            .await?;

        metrics::counter!("saved_product_toggles_total", "action" => change.as_str())
            .increment(1);
        tracing::info!(action = change.as_str(), saved = saved.len(), "saved products toggled");
        Ok(saved)
    }

    /// Returns the user's saved products.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Product>, DomainError> {
        Ok(self.store.saved_products(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_state() {
        assert_eq!(SavedState::default(), SavedState::Unsaved);
        assert_eq!(SavedState::Unsaved.toggle(), SavedProductChange::Connect);
        assert_eq!(SavedState::Saved.toggle(), SavedProductChange::Disconnect);
    }

    #[test]
    fn state_follows_membership() {
        assert_eq!(SavedState::from_membership(true), SavedState::Saved);
        assert_eq!(SavedState::from_membership(false), SavedState::Unsaved);
    }
}
