//! Order creation workflow and order reads.

mod assembler;
mod service;
mod total;

pub use assembler::{AssembledOrder, CreateOrder, OrderItemInput, ParsedItem, ParsedOrder, assemble};
pub use service::{OrderService, PatchOrder};
pub use total::{PricedOrder, order_total};
