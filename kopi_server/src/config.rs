use std::{env, io::Write, net::IpAddr};

use kopi_common::{env_flag, Rupiah, Secret};
use kopi_engine::db_types::ShippingPolicy;
use log::*;
use midtrans_tools::MidtransConfig as MidtransApiConfig;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_KOPI_HOST: &str = "127.0.0.1";
const DEFAULT_KOPI_PORT: u16 = 8370;
const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// How shipping is charged at checkout.
    pub shipping: ShippingPolicy,
    /// Midtrans payment gateway configuration
    pub midtrans_config: MidtransConfig,
}

#[derive(Clone, Debug, Default)]
pub struct MidtransConfig {
    pub api: MidtransApiConfig,
    /// If supplied, calls to the payment notification endpoint will be checked against a whitelist of IP addresses.
    /// To explicitly disable the whitelist, set this to "false", "none", or "0".
    pub whitelist: Option<Vec<IpAddr>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_KOPI_HOST.to_string(),
            port: DEFAULT_KOPI_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            shipping: ShippingPolicy::default(),
            midtrans_config: MidtransConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("KOPI_HOST").ok().unwrap_or_else(|| DEFAULT_KOPI_HOST.into());
        let port = env::var("KOPI_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for KOPI_PORT. {e} Using the default, {DEFAULT_KOPI_PORT}, instead."
                    );
                    DEFAULT_KOPI_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_KOPI_PORT);
        let database_url = env::var("KOPI_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ KOPI_DATABASE_URL is not set. Please set it to the URL for the Kopi database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let use_x_forwarded_for = env_flag("KOPI_USE_X_FORWARDED_FOR", false);
        let use_forwarded = env_flag("KOPI_USE_FORWARDED", false);
        let shipping = configure_shipping();
        let midtrans_config = MidtransConfig::from_env_or_defaults();
        Self { host, port, database_url, auth, use_x_forwarded_for, use_forwarded, shipping, midtrans_config }
    }
}

fn configure_shipping() -> ShippingPolicy {
    match env::var("KOPI_SHIPPING_FEE_PER_SELLER") {
        Err(_) => {
            info!("🪛️ KOPI_SHIPPING_FEE_PER_SELLER is not set. Shipping is free.");
            ShippingPolicy::Free
        },
        Ok(s) => match s.parse::<i64>() {
            Ok(0) => ShippingPolicy::Free,
            Ok(fee) if fee > 0 => {
                let fee = Rupiah::from(fee);
                info!("🪛️ Charging {fee} shipping per seller");
                ShippingPolicy::FlatPerSeller(fee)
            },
            Ok(fee) => {
                warn!("🪛️ KOPI_SHIPPING_FEE_PER_SELLER cannot be negative ({fee}). Shipping is free.");
                ShippingPolicy::Free
            },
            Err(e) => {
                warn!("🪛️ Invalid configuration value for KOPI_SHIPPING_FEE_PER_SELLER ({s}). {e}. Shipping is free.");
                ShippingPolicy::Free
            },
        },
    }
}

impl MidtransConfig {
    pub fn from_env_or_defaults() -> Self {
        let api = MidtransApiConfig::new_from_env_or_default();
        let whitelist = env::var("KOPI_MIDTRANS_IP_WHITELIST").ok().and_then(|s| parse_whitelist(&s));
        match &whitelist {
            Some(whitelist) if whitelist.is_empty() => {
                warn!(
                    "🚨️ The Midtrans IP whitelist was configured, but is empty. The server will run, but won't \
                     accept any payment notifications."
                );
            },
            None => {
                info!("🪛️ No Midtrans IP whitelist is set. Only signature validation will be used.");
            },
            Some(v) => {
                let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
                info!("🪛️ Midtrans IP whitelist: {addrs}");
            },
        }
        Self { api, whitelist }
    }
}

/// Parses a comma-separated list of IP addresses. "none", "false" and "0" disable the whitelist. Invalid entries are
/// dropped with a warning.
pub fn parse_whitelist(s: &str) -> Option<Vec<IpAddr>> {
    if ["none", "false", "0"].contains(&s.trim().to_lowercase().as_str()) {
        info!(
            "🪛️ Midtrans IP whitelist is disabled. If this is not what you want, set KOPI_MIDTRANS_IP_WHITELIST to a \
             comma-separated list of IP addresses to enable it."
        );
        return None;
    }
    let ip_addrs = s
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            s.parse()
                .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in KOPI_MIDTRANS_IP_WHITELIST: {e}"))
                .ok()
        })
        .collect::<Vec<IpAddr>>();
    Some(ip_addrs)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The shared secret used to sign and verify HS256 access tokens.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this since every issued token becomes invalid on restart. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => match writeln!(f, "{secret}") {
                Ok(()) => warn!(
                    "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, you \
                     are doing it wrong! Set the KOPI_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                    p.to_str().unwrap_or("???")
                ),
                Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret.");
            },
        }
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("KOPI_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [KOPI_JWT_SECRET]")))?;
        if secret.trim().is_empty() {
            return Err(ServerError::ConfigurationError("KOPI_JWT_SECRET is empty".to_string()));
        }
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            warn!(
                "🪛️ KOPI_JWT_SECRET is shorter than {MIN_JWT_SECRET_LENGTH} characters. Consider using a longer secret."
            );
        }
        Ok(Self::new(secret))
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
