use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewProduct, NewUser, Product, Rupiah, Seller, User},
    traits::{CatalogError, CatalogManagement},
};

/// Administrative writes to the catalogue: accounts, stores, categories, units and products.
///
/// Checkout and the cart read the catalogue directly through their own backends. This API exists so that a fresh
/// deployment can be populated without touching the database by hand.
pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub async fn register_user(&self, user: NewUser) -> Result<User, CatalogError> {
        let name = required("name", &user.name)?;
        let email = required("email", &user.email)?;
        if !email.contains('@') {
            return Err(CatalogError::InvalidInput(format!("{email} is not an email address")));
        }
        let user = NewUser::new(name, email.to_lowercase(), user.role);
        let user = self.db.insert_user(user).await?;
        info!("🗂️ Registered user {} ({}) as {}", user.id, user.email, user.role);
        Ok(user)
    }

    pub async fn user(&self, user_id: i64) -> Result<User, CatalogError> {
        self.db.fetch_user(user_id).await?.ok_or(CatalogError::UserNotFound(user_id))
    }

    /// Opens a store for an existing user. A user has at most one store.
    pub async fn open_store(&self, user_id: i64, store_name: &str) -> Result<Seller, CatalogError> {
        let store_name = required("store name", store_name)?;
        let seller = self.db.insert_seller(user_id, store_name).await?;
        info!("🗂️ User {user_id} opened store {} ({store_name})", seller.id);
        Ok(seller)
    }

    pub async fn add_category(&self, name: &str) -> Result<i64, CatalogError> {
        let id = self.db.insert_category(required("category name", name)?).await?;
        debug!("🗂️ Added category {id} ({name})");
        Ok(id)
    }

    pub async fn add_unit(&self, name: &str) -> Result<i64, CatalogError> {
        let id = self.db.insert_unit(required("unit name", name)?).await?;
        debug!("🗂️ Added unit {id} ({name})");
        Ok(id)
    }

    pub async fn add_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let name = required("product name", &product.name)?.to_string();
        check_price(product.price)?;
        let product = self.db.insert_product(NewProduct { name, ..product }).await?;
        info!("🗂️ Seller {} listed product {} ({}) at {}", product.seller_id, product.id, product.name, product.price);
        Ok(product)
    }

    pub async fn product(&self, product_id: i64) -> Result<Product, CatalogError> {
        self.db.fetch_product(product_id).await?.ok_or(CatalogError::ProductNotFound(product_id))
    }

    /// Orders that were already placed keep the price they were checked out at.
    pub async fn set_price(&self, product_id: i64, price: Rupiah) -> Result<Product, CatalogError> {
        check_price(price)?;
        let product = self
            .db
            .update_product_price(product_id, price)
            .await?
            .ok_or(CatalogError::ProductNotFound(product_id))?;
        info!("🗂️ Product {product_id} now costs {price}");
        Ok(product)
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, CatalogError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CatalogError::InvalidInput(format!("The {field} may not be empty")));
    }
    Ok(value)
}

fn check_price(price: Rupiah) -> Result<(), CatalogError> {
    if price.value() < 0 {
        return Err(CatalogError::InvalidInput(format!("A price of {price} is not allowed")));
    }
    Ok(())
}
