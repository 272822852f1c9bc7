//! HTTP client for the portfolio identity service
//!
//! This crate provides the client half of the identity contract: credential
//! exchange, bearer-token resolution, registration, and the public student
//! directory. The wire format matches the institution's existing REST
//! backend.

use portfolio_core::{ErrorContext, PortfolioError, PortfolioResult};
use std::collections::HashMap;

pub mod client;
pub mod models;

#[cfg(test)]
mod tests;

pub use client::IdentityClient;
pub use models::{
    CredentialRequest, PasswordResetRequest, ProfileUpdate, RegistrationRequest, TokenResponse,
};

/// Configuration for the identity client
#[derive(Debug, Clone)]
pub struct IdentityClientConfig {
    /// Base URL for the identity service
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Additional headers
    pub headers: HashMap<String, String>,
}

impl Default for IdentityClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 30,
            user_agent: "portfolio/0.1".to_string(),
            headers: HashMap::new(),
        }
    }
}

impl IdentityClientConfig {
    /// Create a configuration for a specific service URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Create a configuration from the client-wide service settings
    pub fn from_service(service: &portfolio_core::ServiceConfig) -> Self {
        Self {
            base_url: service.base_url.clone(),
            timeout_seconds: service.timeout_seconds,
            user_agent: service.user_agent.clone(),
            headers: HashMap::new(),
        }
    }

    /// Set additional header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }
}

/// Helper function to create HTTP client with common configuration
pub(crate) fn create_http_client(config: &IdentityClientConfig) -> PortfolioResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            PortfolioError::Network {
                message: format!("Invalid user agent: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?,
    );

    for (key, value) in &config.headers {
        let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            PortfolioError::Network {
                message: format!("Invalid header name '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?;

        let header_value =
            reqwest::header::HeaderValue::from_str(value).map_err(|e| PortfolioError::Network {
                message: format!("Invalid header value for '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            })?;

        headers.insert(header_name, header_value);
    }

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| PortfolioError::Network {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })?;

    Ok(client)
}

/// Helper function to translate HTTP error responses
pub(crate) async fn handle_response_error(
    response: reqwest::Response,
    operation: &str,
) -> PortfolioError {
    let status = response.status();
    let url = response.url().clone();
    let error_body = response.text().await.unwrap_or_default();

    match status.as_u16() {
        401 | 403 => PortfolioError::Authentication {
            message: format!(
                "HTTP {} for {}: {}",
                status.as_u16(),
                url,
                if error_body.is_empty() {
                    status.canonical_reason().unwrap_or("Unauthorized")
                } else {
                    &error_body
                }
            ),
            context: ErrorContext::new("identity_client")
                .with_operation(operation)
                .with_suggestion("The token may be expired or invalid; log in again"),
        },
        404 => PortfolioError::NotFound {
            resource: url.to_string(),
            context: ErrorContext::new("identity_client").with_operation(operation),
        },
        _ => PortfolioError::Network {
            message: format!(
                "HTTP {} error for {}: {}",
                status.as_u16(),
                url,
                if error_body.is_empty() {
                    status.canonical_reason().unwrap_or("Unknown error")
                } else {
                    &error_body
                }
            ),
            source: None,
            context: ErrorContext::new("identity_client")
                .with_operation(operation)
                .with_suggestion("Check network connectivity and service status"),
        },
    }
}
