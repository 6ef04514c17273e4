//! Turns a create-order request into an unpersisted order.
//!
//! Assembly happens in two steps so the store is only consulted once the
//! request shape is known to be valid:
//!
//! 1. [`CreateOrder::parse`] checks the shape and parses identifiers.
//! 2. [`assemble`] snapshots current prices from the fetched products.

use serde::Deserialize;
use store::{NewLineItem, NewOrder, OrderId, Product, ProductId, UserId};

use super::total::checked_total;
use crate::error::DomainError;
use crate::inventory::StockDemand;
use crate::validation;

/// Body of a create-order request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    pub user_id: String,
    pub order_items: Vec<OrderItemInput>,
}

/// One requested line of a create-order request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: String,
    pub quantity: i64,
}

/// A create-order request whose shape has been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOrder {
    pub user_id: UserId,
    pub items: Vec<ParsedItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CreateOrder {
    /// Validates the request shape and parses every identifier.
    pub fn parse(&self) -> Result<ParsedOrder, DomainError> {
        if self.order_items.is_empty() {
            return Err(DomainError::Validation(
                "orderItems: an order needs at least one item".to_string(),
            ));
        }

        let user_id = validation::parse_id("userId", &self.user_id)?;
        let items = self
            .order_items
            .iter()
            .map(|item| {
                Ok(ParsedItem {
                    product_id: validation::parse_id("productId", &item.product_id)?,
                    quantity: validation::quantity(item.quantity)?,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(ParsedOrder { user_id, items })
    }
}

impl ParsedOrder {
    /// Distinct product ids in request order.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if !ids.contains(&item.product_id) {
                ids.push(item.product_id);
            }
        }
        ids
    }
}

/// An order ready to be committed, with the stock it will consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledOrder {
    pub order: NewOrder,
    pub demands: Vec<StockDemand>,
}

/// Builds the unpersisted order, copying each product's current price onto
/// its line item.
///
/// Fails with `NotFound` if any referenced product is absent from `products`,
/// and with `Validation` if the order total would overflow.
pub fn assemble(parsed: &ParsedOrder, products: &[Product]) -> Result<AssembledOrder, DomainError> {
    let mut items = Vec::with_capacity(parsed.items.len());
    let mut demands = Vec::with_capacity(parsed.items.len());

    for item in &parsed.items {
        let product = products
            .iter()
            .find(|p| p.id == item.product_id)
            .ok_or_else(|| DomainError::NotFound {
                entity: "Product",
                id: item.product_id.to_string(),
            })?;

        items.push(NewLineItem {
            product_id: product.id,
            quantity: item.quantity,
            unit_price: product.price,
        });
        demands.push(StockDemand {
            product_id: product.id,
            quantity: item.quantity,
        });
    }

    if checked_total(items.iter().map(|item| (item.unit_price, item.quantity))).is_none() {
        return Err(DomainError::Validation(
            "orderItems: order total exceeds the largest supported amount".to_string(),
        ));
    }

    Ok(AssembledOrder {
        order: NewOrder {
            id: OrderId::new(),
            user_id: parsed.user_id,
            items,
        },
        demands,
    })
}
