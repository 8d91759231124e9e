use std::fmt::Display;

use kopi_engine::{
    db_types::{
        NewOrder,
        NewProduct,
        NewUser,
        NewWalletTransaction,
        Order,
        OrderId,
        Role,
        Rupiah,
        TransactionStatus,
        TransactionType,
    },
    order_objects::PageRequest,
};
use midtrans_tools::{ItemDetail, SnapToken};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The envelope for every successful response that carries data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

//----------------------------------------------   Cart  ----------------------------------------------------

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    #[serde(alias = "product_id")]
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    #[serde(alias = "item_id")]
    pub item_id: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuantityUpdate {
    pub quantity: i64,
}

//----------------------------------------------   Orders  ----------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(alias = "shipping_address")]
    pub shipping_address: String,
    #[serde(alias = "payment_method")]
    pub payment_method: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateOrderRequest {
    pub fn into_new_order(self, user_id: i64) -> NewOrder {
        let order = NewOrder::new(user_id, self.shipping_address, self.payment_method);
        match self.notes {
            Some(notes) if !notes.trim().is_empty() => order.with_notes(notes),
            _ => order,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Query parameters for the paginated order listings. `status` is kept as a string so that an unknown value can be
/// reported with a useful error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
}

impl OrderListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

//----------------------------------------------   Wallet  ----------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl TransactionListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// A manual ledger entry submitted by an administrator. `order_id` is the public order reference. The entry belongs to
/// `user_id` if given, else to the owner of the referenced order, else to the administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualTransactionRequest {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub amount: Rupiah,
    #[serde(rename = "type", default)]
    pub tx_type: Option<TransactionType>,
    #[serde(default)]
    pub status: Option<TransactionStatus>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ManualTransactionRequest {
    /// `order` is the stored order that `order_id` resolved to.
    pub fn into_transaction(self, default_user_id: i64, order: Option<&Order>) -> NewWalletTransaction {
        let user_id = self.user_id.or(order.map(|o| o.user_id)).unwrap_or(default_user_id);
        let mut tx = NewWalletTransaction::new(user_id, self.amount);
        if let Some(tx_type) = self.tx_type {
            tx = tx.with_type(tx_type);
        }
        if let Some(status) = self.status {
            tx = tx.with_status(status);
        }
        if let Some(description) = self.description {
            tx = tx.with_description(description);
        }
        if let Some(order) = order {
            tx = tx.with_order_id(order.id);
        }
        tx
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub user_id: i64,
    pub balance: Rupiah,
}

//----------------------------------------------   Catalog  ----------------------------------------------------

fn default_role() -> Role {
    Role::User
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

impl From<NewUserRequest> for NewUser {
    fn from(req: NewUserRequest) -> Self {
        NewUser::new(req.name, req.email, req.role)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStoreRequest {
    #[serde(alias = "user_id")]
    pub user_id: i64,
    #[serde(alias = "store_name")]
    pub store_name: String,
}

/// Categories and units only have a name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProductRequest {
    #[serde(alias = "seller_id")]
    pub seller_id: i64,
    pub name: String,
    pub price: Rupiah,
    #[serde(default, alias = "category_id")]
    pub category_id: Option<i64>,
    #[serde(default, alias = "unit_id")]
    pub unit_id: Option<i64>,
}

impl From<NewProductRequest> for NewProduct {
    fn from(req: NewProductRequest) -> Self {
        let product = NewProduct::new(req.seller_id, req.name, req.price);
        let product = match req.category_id {
            Some(id) => product.with_category(id),
            None => product,
        };
        match req.unit_id {
            Some(id) => product.with_unit(id),
            None => product,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub price: Rupiah,
}

//----------------------------------------------   Payments  ----------------------------------------------------

/// A request for a Snap token. When `order_id` names a stored order, the amount and line items are taken from the
/// order and `amount` and `items` are ignored. Otherwise `amount` is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTokenRequest {
    #[serde(default, alias = "order_id")]
    pub order_id: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub items: Option<Vec<ItemDetail>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTokenResponse {
    pub order_id: String,
    pub token: String,
    pub redirect_url: String,
}

impl PaymentTokenResponse {
    pub fn new<S: Into<String>>(order_id: S, token: SnapToken) -> Self {
        Self { order_id: order_id.into(), token: token.token, redirect_url: token.redirect_url }
    }
}
