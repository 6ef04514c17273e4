//! Domain layer for the marketplace backend.
//!
//! This crate holds the logic layered on top of the store:
//! - Inventory checker for stock sufficiency
//! - Order assembler with price snapshots
//! - Order total calculator
//! - Saved-products relation toggler
//! - Thin services for user and product management

pub mod error;
pub mod inventory;
pub mod order;
pub mod products;
pub mod saved;
pub mod users;
pub mod validation;

pub use error::DomainError;
pub use inventory::{Shortfall, StockDemand, first_shortfall, is_sufficient};
pub use order::{
    AssembledOrder, CreateOrder, OrderItemInput, OrderService, PatchOrder, PricedOrder, order_total,
};
pub use products::{CreateProduct, PatchProduct, ProductService};
pub use saved::{SavedProductService, SavedState, ToggleSavedProduct};
pub use users::{CreateUser, PatchPreference, PatchUser, PreferenceInput, UserService};
