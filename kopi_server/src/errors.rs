use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use kopi_engine::{CartApiError, CatalogError, OrderFlowError, WalletApiError};
use log::error;
use midtrans_tools::MidtransApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Cannot check out an empty cart")]
    EmptyCart,
    #[error("{0}")]
    IllegalTransition(String),
    #[error("{0}")]
    InvalidStatus(String),
    #[error("Invalid signature key")]
    InvalidSignature,
    #[error("The payment gateway could not complete the request. {0}")]
    GatewayError(String),
    #[error("The order could not be created. {0}")]
    OrderCreationFailed(String),
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
}

impl ServerError {
    /// The machine-readable error code that is returned to clients. These values are part of the API and must not
    /// change.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationError(_) => "NOT_AUTHENTICATED",
            Self::InsufficientPermissions(_) => "FORBIDDEN",
            Self::NoRecordFound(_) => "NOT_FOUND",
            Self::EmptyCart => "EMPTY_CART",
            Self::IllegalTransition(_) => "ILLEGAL_TRANSITION",
            Self::InvalidStatus(_) => "INVALID_STATUS",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::GatewayError(_) => "GATEWAY_ERROR",
            Self::OrderCreationFailed(_) => "ORDER_CREATION_FAILED",
            Self::InvalidRequest(_) => "BAD_REQUEST",
            Self::InitializeError(_) | Self::BackendError(_) | Self::IOError(_) | Self::ConfigurationError(_) => {
                "INTERNAL"
            },
        }
    }

    /// The message returned to clients. Internal failures are reported generically; the detail only goes to the log.
    fn public_message(&self) -> String {
        match self.code() {
            "INTERNAL" => "Internal server error".to_string(),
            "ORDER_CREATION_FAILED" => "The order could not be created".to_string(),
            _ => self.to_string(),
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::InvalidSignature => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::EmptyCart => StatusCode::BAD_REQUEST,
            Self::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::IllegalTransition(_) => StatusCode::CONFLICT,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::OrderCreationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(
            serde_json::json!({ "success": false, "code": self.code(), "message": self.public_message() })
                .to_string(),
        )
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Access token required")]
    MissingToken,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Token expired")]
    Expired,
    #[error("Could not sign access token. {0}")]
    SigningError(String),
}

impl From<CartApiError> for ServerError {
    fn from(e: CartApiError) -> Self {
        match e {
            CartApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            CartApiError::ProductNotFound(_) | CartApiError::ItemNotFound(_) | CartApiError::UserNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            CartApiError::InvalidQuantity(_) => Self::InvalidRequest(e.to_string()),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            OrderFlowError::EmptyCart => Self::EmptyCart,
            OrderFlowError::OrderCreationFailed(e) => Self::OrderCreationFailed(e),
            OrderFlowError::TotalTooLarge | OrderFlowError::AmountMismatch { .. } => {
                Self::InvalidRequest(e.to_string())
            },
            OrderFlowError::OrderNotFound(_) | OrderFlowError::SellerNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::IllegalTransition { .. } |
            OrderFlowError::OrderNotDeletable(_) |
            OrderFlowError::StatusConflict(_) => Self::IllegalTransition(e.to_string()),
            OrderFlowError::InvalidStatus(_) => Self::InvalidStatus(e.to_string()),
        }
    }
}

impl From<WalletApiError> for ServerError {
    fn from(e: WalletApiError) -> Self {
        match e {
            WalletApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            WalletApiError::TransactionNotFound(_) | WalletApiError::UnknownOwner(_) => {
                Self::NoRecordFound(e.to_string())
            },
            WalletApiError::DuplicateReference(_) => Self::InvalidRequest(e.to_string()),
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            CatalogError::UserNotFound(_) |
            CatalogError::ProductNotFound(_) |
            CatalogError::ProductReferenceNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogError::DuplicateEmail(_) |
            CatalogError::DuplicateStore(_) |
            CatalogError::DuplicateName(_) |
            CatalogError::InvalidInput(_) => Self::InvalidRequest(e.to_string()),
        }
    }
}

impl From<MidtransApiError> for ServerError {
    fn from(e: MidtransApiError) -> Self {
        match e {
            MidtransApiError::InvalidSignature => Self::InvalidSignature,
            MidtransApiError::InvalidRequest(s) => Self::InvalidRequest(s),
            MidtransApiError::Initialization(s) => Self::InitializeError(s),
            e => Self::GatewayError(e.to_string()),
        }
    }
}
