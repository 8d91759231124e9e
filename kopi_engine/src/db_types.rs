use std::{collections::HashSet, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use kopi_common::Rupiah;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Type conversion error: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------        OrderId       ---------------------------------------------------------
/// The public reference for an order. This is what customers see, and what is sent to the payment provider as
/// `order_id`. The internal integer `id` never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Generates a fresh reference of the form `KOPI-YYYYMMDD-XXXXXXXX`.
    pub fn random(now: DateTime<Utc>) -> Self {
        let suffix: u32 = rand::thread_rng().gen();
        Self(format!("KOPI-{}-{suffix:08X}", now.format("%Y%m%d")))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for OrderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------          Role        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Seller,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Seller => write!(f, "seller"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

/// The identity on whose behalf an operation runs. The server builds one from the bearer token of every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub user_id: i64,
    pub role: Role,
}

impl Requester {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

//--------------------------------------    OrderStatusType   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// Created at checkout, awaiting payment.
    Pending,
    /// The payment provider has confirmed payment.
    Paid,
    /// The seller is preparing the order.
    Processing,
    Shipped,
    Delivered,
    /// Terminal. The buyer has received the order and the sale is final.
    Completed,
    /// Terminal. Cancelled by the buyer before payment, or by an admin.
    Cancelled,
    /// Terminal. The payment was denied, cancelled or expired.
    Failed,
}

/// Who is asking for a status change. Each actor sees a different slice of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusActor {
    /// The buyer who owns the order. May only cancel a pending order.
    Customer,
    /// A verified payment provider notification.
    Gateway,
    /// An administrator. Gets the standard transitions plus the terminal override.
    Admin,
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 8] = [
        Self::Pending,
        Self::Paid,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Completed,
        Self::Cancelled,
        Self::Failed,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Entering one of these states appends a payment entry to the wallet ledger.
    pub fn is_monetary(self) -> bool {
        matches!(self, Self::Paid | Self::Completed)
    }

    /// The standard order lifecycle:
    ///
    /// | from       | to                                    |
    /// |------------|---------------------------------------|
    /// | pending    | paid, processing, cancelled, failed   |
    /// | paid       | processing                            |
    /// | processing | shipped, delivered                    |
    /// | shipped    | delivered                             |
    /// | delivered  | completed                             |
    fn is_standard_transition(self, to: Self) -> bool {
        use OrderStatusType::*;
        matches!(
            (self, to),
            (Pending, Paid | Processing | Cancelled | Failed) |
                (Paid, Processing) |
                (Processing, Shipped | Delivered) |
                (Shipped, Delivered) |
                (Delivered, Completed)
        )
    }

    /// Admins may close out any order that is past `pending` and not yet terminal.
    fn is_admin_override(self, to: Self) -> bool {
        self != Self::Pending && !self.is_terminal() && to.is_terminal()
    }

    pub fn can_transition_to(self, to: Self, actor: StatusActor) -> bool {
        match actor {
            StatusActor::Customer => self == Self::Pending && to == Self::Cancelled,
            StatusActor::Gateway => self.is_standard_transition(to),
            StatusActor::Admin => self.is_standard_transition(to) || self.is_admin_override(to),
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.to_string() == s)
            .ok_or_else(|| ConversionError(format!("Invalid order status: {s}")))
    }
}

//--------------------------------------    Catalog types     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl NewUser {
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, email: S2, role: Role) -> Self {
        Self { name: name.into(), email: email.into(), role }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Seller {
    pub id: i64,
    pub user_id: i64,
    pub store_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub seller_id: i64,
    pub category_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub name: String,
    pub price: Rupiah,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub seller_id: i64,
    pub category_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub name: String,
    pub price: Rupiah,
}

impl NewProduct {
    pub fn new<S: Into<String>>(seller_id: i64, name: S, price: Rupiah) -> Self {
        Self { seller_id, category_id: None, unit_id: None, name: name.into(), price }
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_unit(mut self, unit_id: i64) -> Self {
        self.unit_id = Some(unit_id);
        self
    }
}

//--------------------------------------         Cart         ---------------------------------------------------------
/// A cart row joined with the product, category and unit data needed to display it and to price a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CartItem {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub product_name: String,
    pub price: Rupiah,
    pub seller_id: i64,
    pub category_name: Option<String>,
    pub unit_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    /// `price * quantity`, or `None` if the line total does not fit in a [`Rupiah`].
    pub fn line_total(&self) -> Option<Rupiah> {
        self.price.checked_mul(self.quantity)
    }
}

/// The sum of the line totals of a cart, or `None` if any line or the sum itself overflows.
pub fn cart_total(items: &[CartItem]) -> Option<Rupiah> {
    items.iter().try_fold(Rupiah::default(), |total, item| total.checked_add(item.line_total()?))
}

/// The result of a quantity change on a cart item. Quantities never reach zero; the item is removed instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "item", rename_all = "lowercase")]
pub enum CartUpdate {
    Updated(CartItem),
    Removed,
}

//--------------------------------------        Orders        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Order {
    #[serde(skip)]
    pub id: i64,
    pub order_id: OrderId,
    pub user_id: i64,
    /// Sum of `price * quantity` over the order items, fixed at checkout.
    pub total_amount: Rupiah,
    pub shipping_fee: Rupiah,
    pub shipping_address: String,
    pub payment_method: String,
    pub notes: Option<String>,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// What the customer is charged through the payment provider.
    pub fn amount_due(&self) -> Rupiah {
        self.total_amount + self.shipping_fee
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: i64,
    #[serde(skip)]
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    /// The product price at checkout. Never refreshed from the catalogue.
    pub price: Rupiah,
}

impl OrderItem {
    pub fn line_total(&self) -> Option<Rupiah> {
        self.price.checked_mul(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Checkout parameters. Everything else about the order is derived from the user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: i64,
    pub shipping_address: String,
    pub payment_method: String,
    pub notes: Option<String>,
}

impl NewOrder {
    pub fn new<S1: Into<String>, S2: Into<String>>(user_id: i64, shipping_address: S1, payment_method: S2) -> Self {
        Self { user_id, shipping_address: shipping_address.into(), payment_method: payment_method.into(), notes: None }
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// How shipping is charged at checkout. The fee is stored on the order next to, never inside, `total_amount`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShippingPolicy {
    #[default]
    Free,
    /// A flat fee for every distinct seller represented in the cart.
    FlatPerSeller(Rupiah),
}

impl ShippingPolicy {
    /// The shipping fee for a cart, or `None` if it does not fit in a [`Rupiah`].
    pub fn fee_for(&self, items: &[CartItem]) -> Option<Rupiah> {
        match self {
            Self::Free => Some(Rupiah::default()),
            Self::FlatPerSeller(fee) => {
                let sellers = items.iter().map(|i| i.seller_id).collect::<HashSet<_>>();
                #[allow(clippy::cast_possible_wrap)]
                let count = sellers.len() as i64;
                fee.checked_mul(count)
            },
        }
    }
}

//--------------------------------------     Wallet ledger    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Payment,
    Withdrawal,
    Adjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WalletTransaction {
    pub id: i64,
    pub user_id: i64,
    pub order_id: Option<i64>,
    pub amount: Rupiah,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub description: Option<String>,
    /// Idempotency key. Two entries can never share a reference.
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWalletTransaction {
    pub user_id: i64,
    pub order_id: Option<i64>,
    pub amount: Rupiah,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub description: Option<String>,
    pub reference: Option<String>,
}

impl NewWalletTransaction {
    /// A manual entry. Defaults to a pending payment, matching what the admin console submits.
    pub fn new(user_id: i64, amount: Rupiah) -> Self {
        Self {
            user_id,
            order_id: None,
            amount,
            tx_type: TransactionType::Payment,
            status: TransactionStatus::Pending,
            description: None,
            reference: None,
        }
    }

    /// The ledger entry written when `order` enters the monetary status `status`.
    pub fn for_order_status(order: &Order, status: OrderStatusType) -> Self {
        Self {
            user_id: order.user_id,
            order_id: Some(order.id),
            amount: order.total_amount,
            tx_type: TransactionType::Payment,
            status: TransactionStatus::Success,
            description: Some(format!("Payment for order #{} ({status})", order.order_id)),
            reference: Some(format!("order:{}:{status}", order.order_id)),
        }
    }

    pub fn with_type(mut self, tx_type: TransactionType) -> Self {
        self.tx_type = tx_type;
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_order_id(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }
}
