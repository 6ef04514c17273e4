//! Shared types for the marketplace backend.

mod money;
mod types;

pub use money::Money;
pub use types::{IdParseError, LineItemId, OrderId, ProductId, UserId};
