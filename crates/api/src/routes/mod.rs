//! HTTP handlers and the state they share.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod users;

use std::str::FromStr;

use domain::{OrderService, ProductService, SavedProductService, UserService};
use store::MarketplaceStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: MarketplaceStore> {
    pub orders: OrderService<S>,
    pub users: UserService<S>,
    pub products: ProductService<S>,
    pub saved: SavedProductService<S>,
}

impl<S: MarketplaceStore + Clone> AppState<S> {
    /// Builds every service on top of one store handle.
    pub fn new(store: S) -> Self {
        Self {
            orders: OrderService::new(store.clone()),
            users: UserService::new(store.clone()),
            products: ProductService::new(store.clone()),
            saved: SavedProductService::new(store),
        }
    }
}

/// Parses a path identifier, answering 400 when it is not a UUID.
pub(crate) fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e: T::Err| ApiError::BadRequest(e.to_string()))
}
