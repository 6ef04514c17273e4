use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    LineItem, LineItemId, Money, NewOrder, NewProduct, NewUser, Order, OrderId, OrderPatch,
    Preference, Product, ProductId, ProductOrder, ProductPatch, ProductQuery, Result,
    SavedProductChange, StoreError, User, UserId, UserOrder, UserPatch, UserQuery,
    store::MarketplaceStore,
};

const USER_SELECT: &str = r#"
    SELECT u.id, u.email, u.first_name, u.last_name, u.address, u.created_at, u.updated_at,
           p.receive_email
    FROM users u
    JOIN user_preferences p ON p.user_id = u.id
"#;

const PRODUCT_COLUMNS: &str =
    "p.id, p.name, p.description, p.category, p.price, p.stock, p.created_at, p.updated_at";

const ORDER_COLUMNS: &str = "id, user_id, status, created_at, updated_at";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

fn to_u32(value: i64, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} out of range: {value}")))
}

fn constraint_of(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint(),
        _ => None,
    }
}

fn row_to_user(row: &PgRow) -> Result<User> {
    Ok(User {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        address: row.try_get("address")?,
        preference: Preference {
            receive_email: row.try_get("receive_email")?,
        },
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_product(row: &PgRow) -> Result<Product> {
    let category: String = row.try_get("category")?;
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        category: category.parse()?,
        price: Money::from_cents(row.try_get("price")?),
        stock: to_u32(row.try_get("stock")?, "stock")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_line_item(row: &PgRow) -> Result<LineItem> {
    Ok(LineItem {
        id: LineItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        quantity: to_u32(row.try_get("quantity")?, "quantity")?,
        unit_price: Money::from_cents(row.try_get("unit_price")?),
    })
}

fn row_to_order(row: &PgRow, items: Vec<LineItem>) -> Result<Order> {
    let status: String = row.try_get("status")?;
    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        status: status.parse()?,
        items,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

async fn fetch_user(conn: &mut PgConnection, id: UserId) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{USER_SELECT} WHERE u.id = $1"))
        .bind(id.as_uuid())
        .fetch_optional(conn)
        .await?;
    row.as_ref().map(row_to_user).transpose()
}

async fn user_exists(conn: &mut PgConnection, id: UserId) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(id.as_uuid())
        .fetch_one(conn)
        .await?;
    Ok(exists)
}

/// Loads line items for the given orders, grouped by order and kept in the
/// order they were submitted.
async fn fetch_line_items(
    conn: &mut PgConnection,
    order_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<LineItem>>> {
    let rows = sqlx::query(
        r#"
        SELECT id, order_id, product_id, quantity, unit_price
        FROM order_items
        WHERE order_id = ANY($1)
        ORDER BY order_id, position ASC
        "#,
    )
    .bind(order_ids.to_vec())
    .fetch_all(conn)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<LineItem>> = HashMap::new();
    for row in &rows {
        let item = row_to_line_item(row)?;
        grouped
            .entry(item.order_id.as_uuid())
            .or_default()
            .push(item);
    }
    Ok(grouped)
}

async fn assemble_orders(conn: &mut PgConnection, rows: Vec<PgRow>) -> Result<Vec<Order>> {
    let ids = rows
        .iter()
        .map(|row| row.try_get::<Uuid, _>("id"))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let mut items = fetch_line_items(conn, &ids).await?;

    rows.iter()
        .zip(ids)
        .map(|(row, id)| row_to_order(row, items.remove(&id).unwrap_or_default()))
        .collect()
}

async fn fetch_order(conn: &mut PgConnection, id: OrderId) -> Result<Option<Order>> {
    let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;
    match row {
        Some(row) => Ok(assemble_orders(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

async fn fetch_saved(conn: &mut PgConnection, user_id: UserId) -> Result<Vec<Product>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM saved_products s
        JOIN products p ON p.id = s.product_id
        WHERE s.user_id = $1
        ORDER BY s.created_at ASC, p.id ASC
        "#
    ))
    .bind(user_id.as_uuid())
    .fetch_all(conn)
    .await?;
    rows.iter().map(row_to_product).collect()
}

#[async_trait]
impl MarketplaceStore for PostgresStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let id = UserId::new();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, first_name, last_name, address)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.address)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if constraint_of(&e) == Some("users_email_key") {
                return StoreError::Conflict(format!(
                    "email {} is already registered",
                    user.email
                ));
            }
            StoreError::Database(e)
        })?;

        sqlx::query("INSERT INTO user_preferences (user_id, receive_email) VALUES ($1, $2)")
            .bind(id.as_uuid())
            .bind(user.preference.receive_email)
            .execute(&mut *tx)
            .await?;

        let created = fetch_user(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::not_found("User", id))?;
        tx.commit().await?;
        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        fetch_user(&mut conn, id).await
    }

    async fn list_users(&self, query: UserQuery) -> Result<Vec<User>> {
        let order_by = match query.order {
            UserOrder::Newest => "u.created_at DESC",
            UserOrder::Oldest => "u.created_at ASC",
        };
        let rows = sqlx::query(&format!(
            "{USER_SELECT} ORDER BY {order_by}, u.id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(query.limit as i64)
        .bind(query.offset as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_user).collect()
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                address = COALESCE($5, address),
                updated_at = clock_timestamp()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch.email.as_deref())
        .bind(patch.first_name.as_deref())
        .bind(patch.last_name.as_deref())
        .bind(patch.address.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if constraint_of(&e) == Some("users_email_key") {
                return StoreError::Conflict("email is already registered".to_string());
            }
            StoreError::Database(e)
        })?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::not_found("User", id));
        }

        if let Some(preference) = patch.preference {
            sqlx::query(
                r#"
                UPDATE user_preferences SET
                    receive_email = COALESCE($2, receive_email),
                    updated_at = clock_timestamp()
                WHERE user_id = $1
                "#,
            )
            .bind(id.as_uuid())
            .bind(preference.receive_email)
            .execute(&mut *tx)
            .await?;
        }

        let user = fetch_user(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::not_found("User", id))?;
        tx.commit().await?;
        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::not_found("User", id));
        }
        Ok(())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products AS p (id, name, description, category, price, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(ProductId::new().as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category.as_str())
        .bind(product.price.cents())
        .bind(i64::from(product.stock))
        .fetch_one(&self.pool)
        .await?;
        row_to_product(&row)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let uuids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ANY($1)"
        ))
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_product).collect()
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let order_by = match query.order {
            ProductOrder::Newest => "p.created_at DESC",
            ProductOrder::Oldest => "p.created_at ASC",
            ProductOrder::PriceLowest => "p.price ASC, p.created_at DESC",
            ProductOrder::PriceHighest => "p.price DESC, p.created_at DESC",
        };
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            WHERE ($1::TEXT IS NULL OR p.category = $1)
            ORDER BY {order_by}, p.id ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(query.category.map(|c| c.as_str()))
        .bind(query.limit as i64)
        .bind(query.offset as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_product).collect()
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products AS p SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                price = COALESCE($5, price),
                stock = COALESCE($6, stock),
                updated_at = clock_timestamp()
            WHERE p.id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(patch.name.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.category.map(|c| c.as_str()))
        .bind(patch.price.map(|p| p.cents()))
        .bind(patch.stock.map(i64::from))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_product(&row),
            None => Err(StoreError::not_found("Product", id)),
        }
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if constraint_of(&e) == Some("order_items_product_id_fkey") {
                    return StoreError::Conflict(format!(
                        "product {id} is referenced by existing orders"
                    ));
                }
                StoreError::Database(e)
            })?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", id));
        }
        Ok(())
    }

    async fn commit_order(&self, order: NewOrder) -> Result<Order> {
        order.validate()?;
        let decrements = order.stock_decrements()?;

        // Dropping the transaction without commit rolls every statement back.
        let mut tx = self.pool.begin().await?;

        if !user_exists(&mut tx, order.user_id).await? {
            return Err(StoreError::not_found("User", order.user_id));
        }

        for decrement in &decrements {
            let quantity = i64::from(decrement.quantity);
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - $2, updated_at = clock_timestamp()
                WHERE id = $1 AND stock >= $2
                "#,
            )
            .bind(decrement.product_id.as_uuid())
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                        .bind(decrement.product_id.as_uuid())
                        .fetch_optional(&mut *tx)
                        .await?;
                metrics::counter!("stock_decrement_rejections_total").increment(1);
                tracing::debug!(
                    order_id = %order.id,
                    product_id = %decrement.product_id,
                    requested = decrement.quantity,
                    "conditional stock decrement rejected, rolling back"
                );
                return Err(StoreError::InsufficientStock {
                    product_id: decrement.product_id,
                    requested: decrement.quantity,
                    available: available.map(|s| to_u32(s, "stock")).transpose()?.unwrap_or(0),
                });
            }
        }

        sqlx::query("INSERT INTO orders (id, user_id, status) VALUES ($1, $2, $3)")
            .bind(order.id.as_uuid())
            .bind(order.user_id.as_uuid())
            .bind(crate::OrderStatus::default().as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if constraint_of(&e) == Some("orders_user_id_fkey") {
                    return StoreError::not_found("User", order.user_id);
                }
                StoreError::Database(e)
            })?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, quantity, unit_price, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(LineItemId::new().as_uuid())
            .bind(order.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(i64::from(item.quantity))
            .bind(item.unit_price.cents())
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        let persisted = fetch_order(&mut tx, order.id)
            .await?
            .ok_or_else(|| StoreError::not_found("Order", order.id))?;
        tx.commit().await?;
        Ok(persisted)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id ASC"
        ))
        .fetch_all(&mut *conn)
        .await?;
        assemble_orders(&mut conn, rows).await
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;
        if !user_exists(&mut conn, user_id).await? {
            return Err(StoreError::not_found("User", user_id));
        }
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id ASC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&mut *conn)
        .await?;
        assemble_orders(&mut conn, rows).await
    }

    async fn update_order(&self, id: OrderId, patch: OrderPatch) -> Result<Order> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            r#"
            UPDATE orders SET
                status = COALESCE($2, status),
                updated_at = clock_timestamp()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch.status.map(|s| s.as_str()))
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::not_found("Order", id));
        }

        let order = fetch_order(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::not_found("Order", id))?;
        tx.commit().await?;
        Ok(order)
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::not_found("Order", id));
        }
        Ok(())
    }

    async fn is_product_saved(&self, user_id: UserId, product_id: ProductId) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT
                EXISTS(SELECT 1 FROM users WHERE id = $1) AS user_exists,
                EXISTS(
                    SELECT 1 FROM saved_products WHERE user_id = $1 AND product_id = $2
                ) AS saved
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(product_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        if !row.try_get::<bool, _>("user_exists")? {
            return Err(StoreError::not_found("User", user_id));
        }
        Ok(row.try_get("saved")?)
    }

    async fn apply_saved_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
        change: SavedProductChange,
    ) -> Result<Vec<Product>> {
        let mut tx = self.pool.begin().await?;

        if !user_exists(&mut tx, user_id).await? {
            return Err(StoreError::not_found("User", user_id));
        }

        match change {
            SavedProductChange::Connect => {
                sqlx::query(
                    r#"
                    INSERT INTO saved_products (user_id, product_id)
                    VALUES ($1, $2)
                    ON CONFLICT (user_id, product_id) DO NOTHING
                    "#,
                )
                .bind(user_id.as_uuid())
                .bind(product_id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    let constraint = constraint_of(&e);
                    if constraint == Some("saved_products_product_id_fkey") {
                        return StoreError::not_found("Product", product_id);
                    }
                    if constraint == Some("saved_products_user_id_fkey") {
                        return StoreError::not_found("User", user_id);
                    }
                    StoreError::Database(e)
                })?;
            }
            SavedProductChange::Disconnect => {
                sqlx::query("DELETE FROM saved_products WHERE user_id = $1 AND product_id = $2")
                    .bind(user_id.as_uuid())
                    .bind(product_id.as_uuid())
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let saved = fetch_saved(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn saved_products(&self, user_id: UserId) -> Result<Vec<Product>> {
        let mut conn = self.pool.acquire().await?;
        if !user_exists(&mut conn, user_id).await? {
            return Err(StoreError::not_found("User", user_id));
        }
        fetch_saved(&mut conn, user_id).await
    }
}
