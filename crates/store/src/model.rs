//! Persisted records and the write models used to create or patch them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{LineItemId, Money, OrderId, ProductId, StoreError, UserId};

/// Notification preferences owned by exactly one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    pub receive_email: bool,
}

/// A marketplace user together with their preference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    #[serde(rename = "userPreference")]
    pub preference: Preference,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a user and its preference in one write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub preference: Preference,
}

/// Partial update of a preference record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreferencePatch {
    pub receive_email: Option<bool>,
}

/// Partial update of a user; `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub preference: Option<PreferencePatch>,
}

impl UserPatch {
    /// Applies the patch to an existing user record in place.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(address) = &self.address {
            user.address = address.clone();
        }
        if let Some(receive_email) = self.preference.and_then(|p| p.receive_email) {
            user.preference.receive_email = receive_email;
        }
    }
}

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Fashion,
    Beauty,
    Sports,
    Electronics,
    HomeInterior,
    HouseholdSupplies,
    Kitchenware,
}

impl Category {
    /// Returns the stored representation of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fashion => "FASHION",
            Category::Beauty => "BEAUTY",
            Category::Sports => "SPORTS",
            Category::Electronics => "ELECTRONICS",
            Category::HomeInterior => "HOME_INTERIOR",
            Category::HouseholdSupplies => "HOUSEHOLD_SUPPLIES",
            Category::Kitchenware => "KITCHENWARE",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FASHION" => Ok(Category::Fashion),
            "BEAUTY" => Ok(Category::Beauty),
            "SPORTS" => Ok(Category::Sports),
            "ELECTRONICS" => Ok(Category::Electronics),
            "HOME_INTERIOR" => Ok(Category::HomeInterior),
            "HOUSEHOLD_SUPPLIES" => Ok(Category::HouseholdSupplies),
            "KITCHENWARE" => Ok(Category::Kitchenware),
            other => Err(StoreError::Corrupt(format!("unknown category {other:?}"))),
        }
    }
}

/// A product in the catalog.
///
/// `stock` is the only field that order creation mutates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: Money,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: Money,
    pub stock: u32,
}

/// Partial update of a product; `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub price: Option<Money>,
    pub stock: Option<u32>,
}

impl ProductPatch {
    /// Applies the patch to an existing product record in place.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
    }
}

/// Order status; the only scalar the generic order update may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Complete,
}

impl OrderStatus {
    /// Returns the stored representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Complete => "COMPLETE",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "COMPLETE" => Ok(OrderStatus::Complete),
            other => Err(StoreError::Corrupt(format!("unknown order status {other:?}"))),
        }
    }
}

/// One line of a persisted order.
///
/// `unit_price` is the product price captured when the order was created and
/// is never refreshed from the live product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

/// A persisted order with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    #[serde(rename = "orderItems")]
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of an order's scalar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
}

/// A line item that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

/// An assembled but unpersisted order, ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<NewLineItem>,
}

/// Stock reduction implied by an order for a single product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDecrement {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl NewOrder {
    /// Returns one decrement per distinct product, summing quantities of line
    /// items that reference the same product.
    ///
    /// Decrements are ordered by product id so concurrent commits lock rows in
    /// the same order. A per-product sum that does not fit in `u32` is
    /// rejected as invalid.
    pub fn stock_decrements(&self) -> Result<Vec<StockDecrement>, StoreError> {
        let mut totals: BTreeMap<ProductId, u32> = BTreeMap::new();
        for item in &self.items {
            let total = totals.entry(item.product_id).or_insert(0);
            *total = total.checked_add(item.quantity).ok_or_else(|| {
                StoreError::Invalid(format!(
                    "total quantity for product {} exceeds {}",
                    item.product_id,
                    u32::MAX
                ))
            })?;
        }
        Ok(totals
            .into_iter()
            .map(|(product_id, quantity)| StockDecrement {
                product_id,
                quantity,
            })
            .collect())
    }

    /// Checks the shape of the order before it reaches a transaction.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.items.is_empty() {
            return Err(StoreError::Invalid("order has no line items".to_string()));
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity == 0) {
            return Err(StoreError::Invalid(format!(
                "line item for product {} has zero quantity",
                item.product_id
            )));
        }
        if let Some(item) = self.items.iter().find(|i| i.unit_price.is_negative()) {
            return Err(StoreError::Invalid(format!(
                "line item for product {} has a negative unit price",
                item.product_id
            )));
        }
        Ok(())
    }
}

/// Write decided by the saved-products toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SavedProductChange {
    /// Add the edge if it is absent.
    Connect,
    /// Remove the edge if it is present.
    Disconnect,
}

impl SavedProductChange {
    /// Returns a stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            SavedProductChange::Connect => "connect",
            SavedProductChange::Disconnect => "disconnect",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: ProductId, quantity: u32) -> NewLineItem {
        NewLineItem {
            product_id,
            quantity,
            unit_price: Money::from_cents(100),
        }
    }

    #[test]
    fn stock_decrements_sum_duplicate_products() {
        let a = ProductId::new();
        let b = ProductId::new();
        let order = NewOrder {
            id: OrderId::new(),
            user_id: UserId::new(),
            items: vec![item(a, 2), item(b, 1), item(a, 3)],
        };

        let decrements = order.stock_decrements().unwrap();
        assert_eq!(decrements.len(), 2);
        let for_a = decrements.iter().find(|d| d.product_id == a).unwrap();
        assert_eq!(for_a.quantity, 5);
        let for_b = decrements.iter().find(|d| d.product_id == b).unwrap();
        assert_eq!(for_b.quantity, 1);
    }

    #[test]
    fn stock_decrements_reject_quantities_that_overflow() {
        let a = ProductId::new();
        let half = 1u32 << 31;
        let order = NewOrder {
            id: OrderId::new(),
            user_id: UserId::new(),
            items: vec![item(a, half), item(a, half)],
        };
        assert!(matches!(
            order.stock_decrements(),
            Err(StoreError::Invalid(_))
        ));
    }

    #[test]
    fn stock_decrements_are_sorted_by_product() {
        let order = NewOrder {
            id: OrderId::new(),
            user_id: UserId::new(),
            items: (0..8).map(|_| item(ProductId::new(), 1)).collect(),
        };
        let decrements = order.stock_decrements().unwrap();
        assert!(decrements.windows(2).all(|w| w[0].product_id < w[1].product_id));
    }

    #[test]
    fn validate_rejects_empty_and_zero_quantity() {
        let mut order = NewOrder {
            id: OrderId::new(),
            user_id: UserId::new(),
            items: vec![],
        };
        assert!(matches!(order.validate(), Err(StoreError::Invalid(_))));

        order.items.push(item(ProductId::new(), 0));
        assert!(matches!(order.validate(), Err(StoreError::Invalid(_))));

        order.items[0].quantity = 1;
        assert!(order.validate().is_ok());
    }

    #[test]
    fn user_patch_only_touches_given_fields() {
        let now = Utc::now();
        let mut user = User {
            id: UserId::new(),
            email: "a@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            address: "London".to_string(),
            preference: Preference {
                receive_email: false,
            },
            created_at: now,
            updated_at: now,
        };
        let patch = UserPatch {
            address: Some("Paris".to_string()),
            preference: Some(PreferencePatch {
                receive_email: Some(true),
            }),
            ..Default::default()
        };
        patch.apply_to(&mut user);

        assert_eq!(user.address, "Paris");
        assert_eq!(user.first_name, "Ada");
        assert!(user.preference.receive_email);
    }

    #[test]
    fn category_round_trips_through_storage_form() {
        for category in [Category::HomeInterior, Category::Kitchenware] {
            let parsed: Category = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert!("TOYS".parse::<Category>().is_err());
    }

    #[test]
    fn order_serializes_line_items_as_order_items() {
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            user_id: UserId::new(),
            status: OrderStatus::Pending,
            items: vec![],
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&order).unwrap();
        assert!(json.get("orderItems").is_some());
        assert_eq!(json["status"], "PENDING");
    }
}
