use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{config::MidtransConfig, MidtransApiError, SnapToken, SnapTransactionRequest, TransactionStatusResponse};

/// The behaviour the marketplace needs from a hosted-checkout provider. [`MidtransApi`] is the production
/// implementation; tests substitute their own.
#[allow(async_fn_in_trait)]
pub trait SnapGateway {
    /// Requests a Snap token for the given transaction. The token is short-lived and is handed straight to the
    /// frontend widget.
    async fn create_transaction(&self, request: SnapTransactionRequest) -> Result<SnapToken, MidtransApiError>;

    /// Fetches the current state of the transaction for `order_id` directly from the provider.
    async fn transaction_status(&self, order_id: &str) -> Result<TransactionStatusResponse, MidtransApiError>;
}

#[derive(Clone)]
pub struct MidtransApi {
    config: MidtransConfig,
    client: Arc<Client>,
}

impl MidtransApi {
    pub fn new(config: MidtransConfig) -> Result<Self, MidtransApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| MidtransApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &MidtransConfig {
        &self.config
    }

    pub fn snap_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.snap_base_url())
    }

    pub fn core_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.core_base_url())
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: String,
        body: Option<B>,
    ) -> Result<T, MidtransApiError> {
        trace!("💳️ Sending REST query: {url}");
        // Midtrans uses the server key as the basic-auth username with an empty password
        let mut req = self.client.request(method, url).basic_auth(self.config.server_key.reveal(), Some(""));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| MidtransApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| MidtransApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let text = response.text().await.map_err(|e| MidtransApiError::RestResponseError(e.to_string()))?;
            Err(MidtransApiError::QueryError { status, message: error_messages(&text) })
        }
    }
}

impl SnapGateway for MidtransApi {
    async fn create_transaction(&self, request: SnapTransactionRequest) -> Result<SnapToken, MidtransApiError> {
        if request.gross_amount() <= 0 {
            return Err(MidtransApiError::InvalidRequest(format!(
                "gross_amount must be positive, got {}",
                request.gross_amount()
            )));
        }
        let order_id = request.order_id().to_string();
        debug!("💳️ Requesting Snap token for {order_id}");
        let url = self.snap_url("/transactions");
        let token = self.rest_query::<SnapToken, _>(Method::POST, url, Some(request)).await?;
        info!("💳️ Snap token issued for {order_id}");
        Ok(token)
    }

    async fn transaction_status(&self, order_id: &str) -> Result<TransactionStatusResponse, MidtransApiError> {
        if order_id.is_empty() || !order_id.chars().all(|c| c.is_ascii_alphanumeric() || "-_.~".contains(c)) {
            return Err(MidtransApiError::InvalidRequest(format!("{order_id} is not a valid order reference")));
        }
        let url = self.core_url(&format!("/{order_id}/status"));
        let response = self.rest_query::<TransactionStatusResponse, ()>(Method::GET, url, None).await?;
        if response.is_error() {
            let status = response.status_code.parse::<u16>().unwrap_or(500);
            let message = response.status_message.unwrap_or_else(|| "Transaction lookup failed".into());
            return Err(MidtransApiError::QueryError { status, message });
        }
        debug!("💳️ Midtrans reports {order_id} as {}", response.transaction_status);
        Ok(response)
    }
}

/// Midtrans error bodies look like `{"error_messages": ["..."]}`. Fall back to the raw text for anything else.
fn error_messages(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v["error_messages"]
                .as_array()
                .map(|msgs| msgs.iter().filter_map(|m| m.as_str()).collect::<Vec<_>>().join("; "))
        })
        .unwrap_or_else(|| body.to_string())
}
