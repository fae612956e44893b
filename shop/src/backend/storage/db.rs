use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{migrate::MigrateDatabase, Row, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::info;

use shared::{Client, Order, Product, ORDER_DATE_FORMAT};

// The database URL for the production database
pub const DATABASE_URL: &str = "sqlite://shop.db";

/// DbConnection manages database operations
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection and make sure the schema exists
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url)
                .await
                .with_context(|| format!("Failed to create database at {}", url))?;
        }

        // One connection for the whole process; an in-memory database lives
        // only as long as its connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(url)
            .await
            .with_context(|| format!("Failed to connect to database at {}", url))?;

        sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

        Self::ensure_schema(&pool).await?;

        info!("Connected to database {}", url);
        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize a fresh in-memory database for tests
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        Self::new("sqlite::memory:").await
    }

    /// Create the three tables if they are missing. Safe to run on every start.
    async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                price REAL NOT NULL,
                quantity INTEGER NOT NULL,
                active BOOLEAN NOT NULL DEFAULT TRUE
            );
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create products table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS clients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                phone TEXT NOT NULL,
                address TEXT NOT NULL,
                email TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create clients table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                client_id INTEGER NOT NULL,
                product_id INTEGER NOT NULL,
                quantity INTEGER NOT NULL,
                price REAL NOT NULL,
                order_date TEXT NOT NULL,
                FOREIGN KEY (client_id) REFERENCES clients (id),
                FOREIGN KEY (product_id) REFERENCES products (id)
            );
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create orders table")?;

        Ok(())
    }

    // ---- products ----

    /// Store a new product and return its generated ID
    pub async fn store_product(
        &self,
        title: &str,
        description: &str,
        price: f64,
        quantity: i64,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO products (title, description, price, quantity, active)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(quantity)
        .bind(true)
        .execute(&*self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_product(&self, product_id: i64) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, price, quantity, active
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(product_id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(row.as_ref().map(product_from_row))
    }

    pub async fn product_exists(&self, product_id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM products WHERE id = ?) AS found")
            .bind(product_id)
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get::<i64, _>("found") != 0)
    }

    /// List every product, active or not, in ID order
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, price, quantity, active
            FROM products
            ORDER BY id
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.iter().map(product_from_row).collect())
    }

    pub async fn list_active_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, price, quantity, active
            FROM products
            WHERE active = 1
            ORDER BY id
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.iter().map(product_from_row).collect())
    }

    /// Overwrite the editable fields of a product. Returns the number of rows touched.
    pub async fn update_product(
        &self,
        product_id: i64,
        title: &str,
        description: &str,
        price: f64,
        quantity: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET title = ?, description = ?, price = ?, quantity = ?
            WHERE id = ?
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(quantity)
        .bind(product_id)
        .execute(&*self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn deactivate_product(&self, product_id: i64) -> Result<u64> {
        let result = sqlx::query("UPDATE products SET active = 0 WHERE id = ?")
            .bind(product_id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ---- clients ----

    pub async fn store_client(
        &self,
        first_name: &str,
        last_name: &str,
        phone: &str,
        address: &str,
        email: &str,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO clients (first_name, last_name, phone, address, email)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .bind(address)
        .bind(email)
        .execute(&*self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_client(&self, client_id: i64) -> Result<Option<Client>> {
        let row = sqlx::query(
            r#"
            SELECT id, first_name, last_name, phone, address, email
            FROM clients
            WHERE id = ?
            "#,
        )
        .bind(client_id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(row.as_ref().map(client_from_row))
    }

    pub async fn client_exists(&self, client_id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM clients WHERE id = ?) AS found")
            .bind(client_id)
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get::<i64, _>("found") != 0)
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>> {
        let rows = sqlx::query(
            r#"
            SELECT id, first_name, last_name, phone, address, email
            FROM clients
            ORDER BY id
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.iter().map(client_from_row).collect())
    }

    pub async fn update_client(
        &self,
        client_id: i64,
        first_name: &str,
        last_name: &str,
        phone: &str,
        address: &str,
        email: &str,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET first_name = ?, last_name = ?, phone = ?, address = ?, email = ?
            WHERE id = ?
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .bind(address)
        .bind(email)
        .bind(client_id)
        .execute(&*self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    // ---- orders ----

    /// Store an order and return its generated ID
    pub async fn store_order(
        &self,
        client_id: i64,
        product_id: i64,
        quantity: i64,
        price: f64,
        order_date: NaiveDateTime,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO orders (client_id, product_id, quantity, price, order_date)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(client_id)
        .bind(product_id)
        .bind(quantity)
        .bind(price)
        .bind(order_date.format(ORDER_DATE_FORMAT).to_string())
        .execute(&*self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_order(&self, order_id: i64) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, client_id, product_id, quantity, price, order_date
            FROM orders
            WHERE id = ?
            "#,
        )
        .bind(order_id)
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, client_id, product_id, quantity, price, order_date
            FROM orders
            ORDER BY id
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(order_from_row).collect()
    }

    #[cfg(test)]
    pub async fn count_orders(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM orders")
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get::<i64, _>("total"))
    }
}

fn product_from_row(row: &SqliteRow) -> Product {
    Product {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        price: row.get("price"),
        quantity: row.get("quantity"),
        active: row.get("active"),
    }
}

fn client_from_row(row: &SqliteRow) -> Client {
    Client {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        phone: row.get("phone"),
        address: row.get("address"),
        email: row.get("email"),
    }
}

fn order_from_row(row: &SqliteRow) -> Result<Order> {
    let raw_date: String = row.get("order_date");
    let order_date = NaiveDateTime::parse_from_str(&raw_date, ORDER_DATE_FORMAT)
        .with_context(|| format!("Invalid order date in database: {}", raw_date))?;

    Ok(Order {
        id: row.get("id"),
        client_id: row.get("client_id"),
        product_id: row.get("product_id"),
        quantity: row.get("quantity"),
        price: row.get("price"),
        order_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // Setup a new test database for each test
    async fn setup_test() -> DbConnection {
        DbConnection::init_test().await.expect("Failed to create test database")
    }

    fn sample_date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let db = setup_test().await;

        DbConnection::ensure_schema(&db.pool).await.expect("Second schema pass failed");
        DbConnection::ensure_schema(&db.pool).await.expect("Third schema pass failed");

        assert!(db.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_and_get_product() {
        let db = setup_test().await;

        let id = db.store_product("Widget", "A widget", 10.0, 5).await.expect("Failed to store product");
        let product = db.get_product(id).await.unwrap().expect("Product should exist");

        assert_eq!(product.title, "Widget");
        assert_eq!(product.description, "A widget");
        assert_eq!(product.price, 10.0);
        assert_eq!(product.quantity, 5);
        assert!(product.active);
        assert!(db.product_exists(id).await.unwrap());
        assert!(!db.product_exists(id + 100).await.unwrap());
    }

    #[tokio::test]
    async fn test_deactivated_product_hidden_from_active_list() {
        let db = setup_test().await;

        let kept = db.store_product("Kept", "Stays", 1.0, 1).await.unwrap();
        let retired = db.store_product("Retired", "Goes", 2.0, 1).await.unwrap();

        assert_eq!(db.deactivate_product(retired).await.unwrap(), 1);

        let active: Vec<i64> = db.list_active_products().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(active, vec![kept]);

        let all = db.list_products().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(!all.iter().find(|p| p.id == retired).unwrap().active);
    }

    #[tokio::test]
    async fn test_update_missing_rows_is_noop() {
        let db = setup_test().await;

        assert_eq!(db.update_product(9999, "x", "y", 1.0, 1).await.unwrap(), 0);
        assert_eq!(db.deactivate_product(9999).await.unwrap(), 0);
        assert_eq!(
            db.update_client(9999, "a", "b", "1", "c", "d@e.fg").await.unwrap(),
            0
        );
        assert!(db.list_products().await.unwrap().is_empty());
        assert!(db.list_clients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_and_list_clients() {
        let db = setup_test().await;

        let id = db
            .store_client("Jane", "Doe", "5551234", "1 Main St", "jane@example.com")
            .await
            .unwrap();

        assert!(db.client_exists(id).await.unwrap());
        assert!(!db.client_exists(id + 1).await.unwrap());

        db.update_client(id, "Janet", "Doe", "5550000", "2 Main St", "janet@example.com")
            .await
            .unwrap();

        let clients = db.list_clients().await.unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].first_name, "Janet");
        assert_eq!(clients[0].email, "janet@example.com");
    }

    #[tokio::test]
    async fn test_store_order_round_trips_date() {
        let db = setup_test().await;

        let client_id = db
            .store_client("Jane", "Doe", "5551234", "1 Main St", "jane@example.com")
            .await
            .unwrap();
        let product_id = db.store_product("Widget", "A widget", 10.0, 5).await.unwrap();

        let order_id = db
            .store_order(client_id, product_id, 2, 20.0, sample_date())
            .await
            .unwrap();

        let order = db.get_order(order_id).await.unwrap().expect("Order should exist");
        assert_eq!(order.order_date, sample_date());
        assert_eq!(order.price, 20.0);
        assert_eq!(db.count_orders().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_order_foreign_keys_enforced() {
        let db = setup_test().await;

        let result = db.store_order(1, 1, 1, 1.0, sample_date()).await;
        assert!(result.is_err(), "Order without client/product rows must be rejected");
        assert_eq!(db.count_orders().await.unwrap(), 0);
    }
}
