//! Bearer token authentication.
//!
//! Every authenticated endpoint expects an `Authorization: Bearer <token>` header carrying an HS256 JWT signed with
//! the shared `KOPI_JWT_SECRET`. The claims identify the user and their role. The role is trusted as issued; the
//! server does not look the user up again.
//!
//! [`JwtClaims`] implements [`FromRequest`], so any handler that takes a `JwtClaims` argument is authenticated. If the
//! ACL middleware has already decoded the token for the request, the decoded claims are reused.
use std::{
    future::{ready, Ready},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpMessage, HttpRequest};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use kopi_engine::db_types::{Requester, Role};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Expiry, in seconds since the Unix epoch.
    pub exp: u64,
}

impl JwtClaims {
    pub fn requester(&self) -> Requester {
        Requester::new(self.id, self.role)
    }
}

/// Extracts the raw token from the `Authorization` header, if it is a bearer token.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn decode_token(token: &str, config: &AuthConfig) -> Result<JwtClaims, AuthError> {
    let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
    let validation = Validation::new(Algorithm::HS256);
    decode::<JwtClaims>(token, &key, &validation).map(|data| data.claims).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            AuthError::PoorlyFormattedToken(e.to_string())
        },
        _ => AuthError::ValidationError(e.to_string()),
    })
}

/// Authenticates the request: reuses claims already decoded by the middleware, or decodes the bearer token.
pub fn authenticate(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    if let Some(claims) = req.extensions().get::<JwtClaims>() {
        return Ok(claims.clone());
    }
    let config = req.app_data::<web::Data<AuthConfig>>().ok_or_else(|| {
        error!("🔐️ No AuthConfig has been registered with the application. No request can be authenticated.");
        ServerError::InitializeError("AuthConfig is not configured".into())
    })?;
    let token = bearer_token(req).ok_or(AuthError::MissingToken)?;
    let claims = decode_token(token, config).map_err(|e| {
        debug!("🔐️ Rejected access token. {e}");
        e
    })?;
    trace!("🔐️ Authenticated user {} ({})", claims.id, claims.role);
    req.extensions_mut().insert(claims.clone());
    Ok(claims)
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

/// Signs access tokens. The marketplace's account service issues tokens in production; this is used by tooling and
/// tests that need a token the server will accept.
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()) }
    }

    pub fn issue_token(
        &self,
        id: i64,
        name: &str,
        email: &str,
        role: Role,
        duration: Option<Duration>,
    ) -> Result<String, AuthError> {
        let expiry = SystemTime::now()
            .checked_add(duration.unwrap_or(DEFAULT_TOKEN_LIFETIME))
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .ok_or_else(|| AuthError::SigningError("Token lifetime is out of range".into()))?;
        let claims = JwtClaims { id, name: name.to_string(), email: email.to_string(), role, exp: expiry.as_secs() };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key).map_err(|e| AuthError::SigningError(e.to_string()))
    }
}
