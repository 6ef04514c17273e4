use serde::Deserialize;

use crate::Category;

/// Default page size for list queries.
pub const DEFAULT_LIMIT: usize = 10;

/// Upper bound on the page size a caller may request.
pub const MAX_LIMIT: usize = 100;

/// Sort order for user listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserOrder {
    #[default]
    Newest,
    Oldest,
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductOrder {
    #[default]
    Newest,
    Oldest,
    PriceLowest,
    PriceHighest,
}

/// Builder for paginated user listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub offset: usize,
    pub limit: usize,
    pub order: UserOrder,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            order: UserOrder::default(),
        }
    }
}

impl UserQuery {
    /// Creates a query for the first page, newest first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips this many users.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Returns at most this many users, capped at [`MAX_LIMIT`].
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_LIMIT);
        self
    }

    /// Sets the sort order.
    pub fn order(mut self, order: UserOrder) -> Self {
        self.order = order;
        self
    }
}

/// Builder for paginated, optionally category-filtered product listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub offset: usize,
    pub limit: usize,
    pub order: ProductOrder,
    pub category: Option<Category>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            order: ProductOrder::default(),
            category: None,
        }
    }
}

impl ProductQuery {
    /// Creates a query for the first page, newest first, all categories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips this many products.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Returns at most this many products, capped at [`MAX_LIMIT`].
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_LIMIT);
        self
    }

    /// Sets the sort order.
    pub fn order(mut self, order: ProductOrder) -> Self {
        self.order = order;
        self
    }

    /// Restricts the listing to one category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }
}
