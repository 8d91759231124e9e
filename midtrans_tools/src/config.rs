use std::time::Duration;

use kopi_common::{env_flag, Secret};
use log::*;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const SANDBOX_SNAP_URL: &str = "https://app.sandbox.midtrans.com/snap/v1";
const PRODUCTION_SNAP_URL: &str = "https://app.midtrans.com/snap/v1";
const SANDBOX_CORE_URL: &str = "https://api.sandbox.midtrans.com/v2";
const PRODUCTION_CORE_URL: &str = "https://api.midtrans.com/v2";

#[derive(Debug, Clone)]
pub struct MidtransConfig {
    /// The merchant server key. Used for basic auth on API calls and as the shared secret in notification signatures.
    pub server_key: Secret<String>,
    /// The client key is public (the Snap widget needs it) but is kept here so that it can be handed to the frontend.
    pub client_key: String,
    pub is_production: bool,
    /// Upper bound on every outbound request to Midtrans.
    pub timeout: Duration,
}

impl Default for MidtransConfig {
    fn default() -> Self {
        Self {
            server_key: Secret::default(),
            client_key: String::default(),
            is_production: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl MidtransConfig {
    pub fn new_from_env_or_default() -> Self {
        let server_key = Secret::new(std::env::var("KOPI_MIDTRANS_SERVER_KEY").unwrap_or_else(|_| {
            warn!("🪛️ KOPI_MIDTRANS_SERVER_KEY not set. Token requests will fail and every notification is rejected.");
            String::default()
        }));
        let client_key = std::env::var("KOPI_MIDTRANS_CLIENT_KEY").unwrap_or_else(|_| {
            warn!("🪛️ KOPI_MIDTRANS_CLIENT_KEY not set");
            String::default()
        });
        let is_production = env_flag("KOPI_MIDTRANS_IS_PRODUCTION", false);
        if is_production {
            info!("🪛️ Using the Midtrans PRODUCTION environment");
        } else {
            info!("🪛️ Using the Midtrans sandbox environment");
        }
        let timeout = std::env::var("KOPI_MIDTRANS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid value for KOPI_MIDTRANS_TIMEOUT_SECS ({s}). {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Self { server_key, client_key, is_production, timeout }
    }

    pub fn snap_base_url(&self) -> &'static str {
        if self.is_production {
            PRODUCTION_SNAP_URL
        } else {
            SANDBOX_SNAP_URL
        }
    }

    /// The Core API, used to look up transaction status.
    pub fn core_base_url(&self) -> &'static str {
        if self.is_production {
            PRODUCTION_CORE_URL
        } else {
            SANDBOX_CORE_URL
        }
    }
}
