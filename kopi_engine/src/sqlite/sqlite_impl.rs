//! `SqliteDatabase` is a concrete implementation of a Kopi engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use sqlx::SqlitePool;

use super::db::{cart, catalog, db_url, new_pool, orders, wallet};
use crate::{
    db_types::{
        cart_total,
        CartItem,
        CartUpdate,
        NewOrder,
        NewProduct,
        NewUser,
        NewWalletTransaction,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        OrderWithItems,
        Product,
        Rupiah,
        Seller,
        ShippingPolicy,
        User,
        WalletTransaction,
    },
    order_objects::{OrderQueryFilter, TransactionQueryFilter},
    traits::{
        CartApiError,
        CartManagement,
        CatalogError,
        CatalogManagement,
        OrderFlowError,
        OrderManagement,
        WalletApiError,
        WalletLedger,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the `KOPI_DATABASE_URL` environment variable, or the default.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Migrations that have already been applied are skipped.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub async fn close(&mut self) {
        self.pool.close().await;
    }
}

impl CartManagement for SqliteDatabase {
    async fn fetch_cart(&self, user_id: i64) -> Result<Vec<CartItem>, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let items = cart::fetch_cart(user_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_cart_item(&self, user_id: i64, item_id: i64) -> Result<Option<CartItem>, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let item = cart::fetch_cart_item(user_id, item_id, &mut conn).await?;
        Ok(item)
    }

    async fn add_to_cart(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, CartApiError> {
        if quantity < 1 {
            return Err(CartApiError::InvalidQuantity(quantity));
        }
        let mut tx = self.pool.begin().await?;
        if catalog::fetch_product(product_id, &mut tx).await?.is_none() {
            return Err(CartApiError::ProductNotFound(product_id));
        }
        let item_id = cart::upsert_cart_item(user_id, product_id, quantity, &mut tx).await?;
        let item =
            cart::fetch_cart_item(user_id, item_id, &mut tx).await?.ok_or(CartApiError::ItemNotFound(item_id))?;
        tx.commit().await?;
        Ok(item)
    }

    async fn set_cart_item_quantity(
        &self,
        user_id: i64,
        item_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartApiError> {
        if quantity < 1 {
            return Err(CartApiError::InvalidQuantity(quantity));
        }
        let mut tx = self.pool.begin().await?;
        let item = match cart::set_quantity(user_id, item_id, quantity, &mut tx).await? {
            true => cart::fetch_cart_item(user_id, item_id, &mut tx).await?,
            false => None,
        };
        tx.commit().await?;
        Ok(item)
    }

    async fn adjust_cart_item_quantity(
        &self,
        user_id: i64,
        item_id: i64,
        delta: i64,
    ) -> Result<Option<CartUpdate>, CartApiError> {
        let mut tx = self.pool.begin().await?;
        let update = cart::adjust_quantity(user_id, item_id, delta, &mut tx).await?;
        tx.commit().await?;
        Ok(update)
    }

    async fn remove_cart_item(&self, user_id: i64, item_id: i64) -> Result<bool, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let removed = cart::delete_item(user_id, item_id, &mut conn).await?;
        Ok(removed)
    }

    async fn clear_cart(&self, user_id: i64) -> Result<u64, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let count = cart::clear_cart(user_id, &mut conn).await?;
        Ok(count)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn checkout(&self, order: NewOrder, shipping: ShippingPolicy) -> Result<OrderWithItems, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let items = cart::fetch_cart(order.user_id, &mut tx).await?;
        if items.is_empty() {
            debug!("📦️ User {} tried to check out an empty cart", order.user_id);
            return Err(OrderFlowError::EmptyCart);
        }
        let total_amount = cart_total(&items).ok_or(OrderFlowError::TotalTooLarge)?;
        let shipping_fee = shipping.fee_for(&items).ok_or(OrderFlowError::TotalTooLarge)?;
        if total_amount.checked_add(shipping_fee).is_none() {
            return Err(OrderFlowError::TotalTooLarge);
        }
        let next_id = || OrderId::random(Utc::now());
        let header = orders::insert_order_with_fresh_id(&order, total_amount, shipping_fee, next_id, &mut tx).await?;
        let order_id = header.order_id.clone();
        for item in &items {
            // Dropping `tx` on this early return rolls everything back, and the cart is left as it was
            orders::insert_order_item(header.id, item, &mut tx).await.map_err(|e| {
                warn!("📦️ Could not add product {} to order {order_id}. {e}", item.product_id);
                OrderFlowError::OrderCreationFailed(format!("Could not add product {} to the order", item.product_id))
            })?;
        }
        let cleared = cart::clear_cart(order.user_id, &mut tx).await?;
        let items = orders::fetch_order_items(header.id, &mut tx).await?;
        tx.commit().await?;
        info!(
            "📦️ Order {order_id} created for user {} with {} items ({cleared} cart rows cleared). Total {}, shipping {}",
            header.user_id,
            items.len(),
            header.total_amount,
            header.shipping_fee
        );
        Ok(OrderWithItems { order: header, items })
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<(Vec<Order>, i64), OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::search_orders(query, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_seller_for_user(&self, user_id: i64) -> Result<Option<Seller>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let seller = catalog::fetch_seller_for_user(user_id, &mut conn).await?;
        Ok(seller)
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        expected: OrderStatusType,
        new_status: OrderStatusType,
    ) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::update_order_status(order_id, expected, new_status, &mut conn).await?;
        Ok(order)
    }

    async fn delete_order(&self, order_id: &OrderId, expected: OrderStatusType) -> Result<bool, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = orders::delete_order(order_id, expected, &mut conn).await?;
        Ok(deleted)
    }
}

impl WalletLedger for SqliteDatabase {
    async fn record_transaction(
        &self,
        transaction: NewWalletTransaction,
    ) -> Result<Option<WalletTransaction>, WalletApiError> {
        let mut conn = self.pool.acquire().await?;
        let entry = wallet::insert_transaction(transaction, &mut conn).await?;
        Ok(entry)
    }

    async fn search_transactions(
        &self,
        query: TransactionQueryFilter,
    ) -> Result<(Vec<WalletTransaction>, i64), WalletApiError> {
        let mut conn = self.pool.acquire().await?;
        let result = wallet::search_transactions(query, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_transactions_for_order(&self, order_id: i64) -> Result<Vec<WalletTransaction>, WalletApiError> {
        let mut conn = self.pool.acquire().await?;
        let entries = wallet::fetch_transactions_for_order(order_id, &mut conn).await?;
        Ok(entries)
    }

    async fn balance_for_user(&self, user_id: i64) -> Result<Rupiah, WalletApiError> {
        let mut conn = self.pool.acquire().await?;
        let balance = wallet::balance_for_user(user_id, &mut conn).await?;
        Ok(balance)
    }

    async fn delete_transaction(&self, id: i64) -> Result<bool, WalletApiError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = wallet::delete_transaction(id, &mut conn).await?;
        Ok(deleted)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<User, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_user(user, &mut conn).await
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let user = catalog::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn insert_seller(&self, user_id: i64, store_name: &str) -> Result<Seller, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_seller(user_id, store_name, &mut conn).await
    }

    async fn insert_category(&self, name: &str) -> Result<i64, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_category(name, &mut conn).await
    }

    async fn insert_unit(&self, name: &str) -> Result<i64, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_unit(name, &mut conn).await
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_product(product, &mut conn).await
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = catalog::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn update_product_price(&self, product_id: i64, price: Rupiah) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = catalog::update_product_price(product_id, price, &mut conn).await?;
        Ok(product)
    }
}
