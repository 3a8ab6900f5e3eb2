//! HTTP transport backed by reqwest
//!
//! Logs in with `POST Login`, then sends the returned token in the
//! `Authtoken` header of every request. Commvault expects the login password
//! base64 encoded.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use parking_lot::RwLock;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use url::Url;

use super::{Method, Transport, TransportResponse};
use crate::error::{CommvaultError, Result};
use crate::types::options::SessionOptions;

/// Header carrying the session token
pub const AUTH_TOKEN_HEADER: &str = "Authtoken";

/// Status reported when login does not yield a token
const STATUS_UNAUTHORIZED: u16 = 401;

/// Transport issuing real HTTP requests
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

impl HttpTransport {
    /// Create an unauthenticated transport
    ///
    /// # Errors
    /// Returns `TransportFailure` if the HTTP client cannot be built
    pub fn new(options: &SessionOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .danger_accept_invalid_certs(!options.verify_ssl)
            .build()
            .map_err(|e| CommvaultError::transport(format!("Failed to build HTTP client: {e}")))?;

        if !options.verify_ssl {
            log::warn!("TLS certificate verification disabled for {}", options.base_url);
        }

        Ok(Self {
            client,
            base_url: options.base_url.clone(),
            token: RwLock::new(None),
        })
    }

    /// Create a transport and log in with the configured credentials
    ///
    /// # Errors
    /// Returns `InvalidConfig` if credentials are missing, or the login error
    pub async fn connect(options: &SessionOptions) -> Result<Self> {
        let username = options
            .username
            .as_deref()
            .ok_or_else(|| CommvaultError::invalid_config("username is required to log in"))?;
        let password = options
            .password
            .as_deref()
            .ok_or_else(|| CommvaultError::invalid_config("password is required to log in"))?;

        let transport = Self::new(options)?;
        transport.login(username, password).await?;
        Ok(transport)
    }

    /// Log in and keep the session token
    ///
    /// # Errors
    /// Returns `TransportFailure` if the request fails or the reply carries
    /// no token
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let body = json!({
            "username": username,
            "password": BASE64.encode(password),
        });
        let response = self.send(Method::Post, "Login", &[], Some(&body)).await?;
        let data = response.json()?;

        let token = data
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                let reason = data
                    .get("errList")
                    .map_or_else(|| "no token in reply".to_string(), Value::to_string);
                CommvaultError::transport_failure(
                    STATUS_UNAUTHORIZED,
                    format!("Login failed for user {username}: {reason}"),
                )
            })?;

        *self.token.write() = Some(token.to_string());
        log::info!("Logged in to {} as {username}", self.base_url);
        Ok(())
    }

    /// End the session; a no-op when not logged in
    ///
    /// # Errors
    /// Returns `TransportFailure` if the logout request fails
    pub async fn logout(&self) -> Result<()> {
        if !self.is_authenticated() {
            return Ok(());
        }
        self.send(Method::Post, "Logout", &[], None).await?;
        *self.token.write() = None;
        log::info!("Logged out of {}", self.base_url);
        Ok(())
    }

    /// Whether a session token is held
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    /// Base URL requests are resolved against
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<TransportResponse> {
        let url = self.base_url.join(path)?;
        log::debug!("{method} {url} {query:?}");

        let mut request = match method {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()),
        };
        if !query.is_empty() {
            request = request.query(query);
        }
        let token = self.token.read().clone();
        if let Some(token) = token {
            request = request.header(AUTH_TOKEN_HEADER, token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CommvaultError::transport(format!("{method} {url} failed: {e}")))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            CommvaultError::transport_failure(
                status.as_u16(),
                format!("Failed to read reply of {method} {url}: {e}"),
            )
        })?;

        if !status.is_success() {
            log::debug!("{method} {url} returned {status}");
            return Err(CommvaultError::transport_failure(
                status.as_u16(),
                format!("{status} for {method} {url}: {text}"),
            ));
        }

        Ok(TransportResponse {
            status: status.as_u16(),
            body: text,
        })
    }
}

impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<TransportResponse> {
        self.send(method, path, query, None).await
    }
}
