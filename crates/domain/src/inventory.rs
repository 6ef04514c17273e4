//! Stock sufficiency checks.
//!
//! These are pure functions over a snapshot of product records. The verdict
//! is advisory: the store re-asserts every decrement when the order commits.

use std::collections::BTreeMap;

use store::{Product, ProductId};

/// A requested quantity of one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDemand {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A demand the current stock cannot cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub product_id: ProductId,
    /// Summed across lines, so it can exceed `u32::MAX`.
    pub requested: u64,
    /// Zero when the product has no record.
    pub available: u32,
}

/// Sums demands per product, in product id order.
///
/// Totals are widened to `u64` so repeated lines near `u32::MAX` cannot wrap.
fn combined(demands: &[StockDemand]) -> BTreeMap<ProductId, u64> {
    let mut totals = BTreeMap::new();
    for demand in demands {
        let total = totals.entry(demand.product_id).or_insert(0u64);
        *total = total.saturating_add(u64::from(demand.quantity));
    }
    totals
}

/// Returns the first demand that current stock cannot satisfy.
///
/// Demands for the same product are summed first. A product missing from
/// `products` counts as having no stock.
pub fn first_shortfall(demands: &[StockDemand], products: &[Product]) -> Option<Shortfall> {
    combined(demands)
        .into_iter()
        .find_map(|(product_id, requested)| {
            let available = products
                .iter()
                .find(|p| p.id == product_id)
                .map(|p| p.stock)
                .unwrap_or(0);
            (u64::from(available) < requested).then_some(Shortfall {
                product_id,
                requested,
                available,
            })
        })
}

/// Returns true iff every demand is covered by current stock.
pub fn is_sufficient(demands: &[StockDemand], products: &[Product]) -> bool {
    first_shortfall(demands, products).is_none()
}
