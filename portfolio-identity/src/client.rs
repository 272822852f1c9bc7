//! Identity service client implementation

use async_trait::async_trait;
use log::{debug, info, warn};
use portfolio_core::{ErrorContext, IdentityProvider, PortfolioError, PortfolioResult, UserProfile};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{create_http_client, handle_response_error, IdentityClientConfig};
use crate::models::{
    CredentialRequest, PasswordResetRequest, ProfileUpdate, RegistrationRequest, TokenResponse,
};

/// Identity service API client
pub struct IdentityClient {
    client: reqwest::Client,
    config: IdentityClientConfig,
}

impl IdentityClient {
    /// Create a new identity client
    pub fn new(config: IdentityClientConfig) -> PortfolioResult<Self> {
        let client = create_http_client(&config)?;

        info!("Created identity client for {}", config.base_url);

        Ok(Self { client, config })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Create authorization headers for a bearer token
    fn bearer_headers(token: &str) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();

        if let Ok(auth_value) =
            reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token))
        {
            headers.insert(reqwest::header::AUTHORIZATION, auth_value);
        }

        headers
    }

    /// Make a GET request, optionally authenticated
    async fn get_request(
        &self,
        endpoint: &str,
        token: Option<&str>,
    ) -> PortfolioResult<reqwest::Response> {
        let url = self.endpoint_url(endpoint);

        debug!("Making identity service request to: {}", url);

        let mut request = self.client.get(&url);
        if let Some(token) = token {
            request = request.headers(Self::bearer_headers(token));
        }

        let response = request.send().await.map_err(|e| PortfolioError::Network {
            message: format!("Failed to reach identity service: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("identity_client").with_operation("get_request"),
        })?;

        if !response.status().is_success() {
            return Err(handle_response_error(response, "get_request").await);
        }

        Ok(response)
    }

    /// Make a JSON request with a body (POST or PUT), optionally authenticated
    async fn send_json<B: Serialize>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        body: &B,
        token: Option<&str>,
    ) -> PortfolioResult<reqwest::Response> {
        let url = self.endpoint_url(endpoint);

        debug!("Making identity service request to: {}", url);

        let mut request = self.client.request(method, &url).json(body);
        if let Some(token) = token {
            request = request.headers(Self::bearer_headers(token));
        }

        let response = request.send().await.map_err(|e| PortfolioError::Network {
            message: format!("Failed to reach identity service: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("identity_client").with_operation("send_json"),
        })?;

        if !response.status().is_success() {
            return Err(handle_response_error(response, "send_json").await);
        }

        Ok(response)
    }

    async fn parse_json<T: DeserializeOwned>(
        response: reqwest::Response,
        operation: &str,
    ) -> PortfolioResult<T> {
        response.json().await.map_err(|e| PortfolioError::Network {
            message: format!("Malformed identity service response: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("identity_client").with_operation(operation),
        })
    }

    /// Exchange email/password for a bearer token
    pub async fn login(&self, email: &str, password: &str) -> PortfolioResult<TokenResponse> {
        info!("Exchanging credentials for {}", email);

        let body = CredentialRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .send_json(reqwest::Method::POST, "api/auth/login", &body, None)
            .await?;

        Self::parse_json(response, "login").await
    }

    /// Resolve a bearer token into the profile it belongs to
    pub async fn current_user(&self, token: &str) -> PortfolioResult<UserProfile> {
        debug!("Resolving bearer token against /api/users/me");

        let response = self.get_request("api/users/me", Some(token)).await?;
        let profile: UserProfile = Self::parse_json(response, "current_user").await?;

        debug!("Resolved token to user {}", profile.display_string());
        Ok(profile)
    }

    /// Register a new student account
    pub async fn register(&self, request: &RegistrationRequest) -> PortfolioResult<UserProfile> {
        info!("Registering new account for {}", request.email);

        let response = self
            .send_json(reqwest::Method::POST, "api/auth/register", request, None)
            .await?;

        Self::parse_json(response, "register").await
    }

    /// Update the authenticated user's own profile
    pub async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> PortfolioResult<UserProfile> {
        let response = self
            .send_json(reqwest::Method::PUT, "api/users/me", update, Some(token))
            .await?;

        Self::parse_json(response, "update_profile").await
    }

    /// List registered students (public read, no token sent)
    pub async fn list_students(&self) -> PortfolioResult<Vec<UserProfile>> {
        let response = self.get_request("api/users/alunos", None).await?;
        let students: Vec<UserProfile> = Self::parse_json(response, "list_students").await?;

        debug!("Retrieved {} student profiles", students.len());
        Ok(students)
    }

    /// Request a password reset email; best-effort
    pub async fn request_password_reset(&self, email: &str) -> PortfolioResult<()> {
        let body = PasswordResetRequest {
            email: email.to_string(),
        };

        if let Err(e) = self
            .send_json(reqwest::Method::POST, "api/auth/forgot-password", &body, None)
            .await
        {
            warn!("Password reset request failed: {}", e);
            return Err(e);
        }

        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for IdentityClient {
    async fn exchange_credentials(&self, email: &str, password: &str) -> PortfolioResult<String> {
        let token = self.login(email, password).await?;
        Ok(token.access_token)
    }

    async fn resolve_token(&self, token: &str) -> PortfolioResult<UserProfile> {
        self.current_user(token).await
    }
}
