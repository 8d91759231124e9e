use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{OrderStatusType, OrderWithItems, WalletTransaction};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

//--------------------------------------      Pagination      ---------------------------------------------------------
/// A 1-based page request. Out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_SIZE }
    }
}

impl PageRequest {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }

    pub fn paginate(&self, total: i64) -> Pagination {
        let limit = self.limit();
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Pagination { page: self.page, limit: self.limit, total, total_pages }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

//--------------------------------------     Order queries    ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQueryFilter {
    /// Only orders placed by this user.
    pub user_id: Option<i64>,
    /// Only orders containing at least one product from this seller.
    pub seller_id: Option<i64>,
    pub status: Option<OrderStatusType>,
    pub page: PageRequest,
}

impl OrderQueryFilter {
    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_seller_id(mut self, seller_id: i64) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderQueryFilter(")?;
        if let Some(user_id) = self.user_id {
            write!(f, "user_id: {user_id}, ")?;
        }
        if let Some(seller_id) = self.seller_id {
            write!(f, "seller_id: {seller_id}, ")?;
        }
        if let Some(status) = self.status {
            write!(f, "status: {status}, ")?;
        }
        write!(f, "page: {}, limit: {})", self.page.page, self.page.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderListing {
    pub orders: Vec<OrderWithItems>,
    pub pagination: Pagination,
}

//--------------------------------------    Ledger queries    ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionQueryFilter {
    pub user_id: Option<i64>,
    /// Case-insensitive substring match on the description.
    pub search: Option<String>,
    pub page: PageRequest,
}

impl TransactionQueryFilter {
    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_search<S: Into<String>>(mut self, search: S) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionListing {
    pub transactions: Vec<WalletTransaction>,
    pub pagination: Pagination,
}
