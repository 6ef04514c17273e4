//! Persistence layer for the marketplace backend.
//!
//! The [`MarketplaceStore`] trait is the boundary between the domain logic and
//! the relational store. Two implementations are provided:
//! - [`InMemoryStore`] for tests and database-less development
//! - [`PostgresStore`] backed by `sqlx`
//!
//! Both implement [`MarketplaceStore::commit_order`] as a single atomic unit:
//! the order, its line items, and every conditional stock decrement apply
//! together or not at all.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::{LineItemId, Money, OrderId, ProductId, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{
    Category, LineItem, NewLineItem, NewOrder, NewProduct, NewUser, Order, OrderPatch,
    OrderStatus, Preference, PreferencePatch, Product, ProductPatch, SavedProductChange,
    StockDecrement, User, UserPatch,
};
pub use postgres::PostgresStore;
pub use query::{ProductOrder, ProductQuery, UserOrder, UserQuery};
pub use store::{MarketplaceStore, MarketplaceStoreExt};
