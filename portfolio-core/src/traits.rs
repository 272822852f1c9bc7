//! Core trait definitions

use crate::error::PortfolioResult;
use crate::types::UserProfile;
use async_trait::async_trait;

/// Identity provider trait - the contract the session layer depends on
///
/// Implemented by the HTTP identity client in production and by in-memory
/// providers in tests.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange email/password credentials for a bearer token
    async fn exchange_credentials(&self, email: &str, password: &str) -> PortfolioResult<String>;

    /// Resolve a bearer token into the profile it belongs to
    ///
    /// A non-success status, transport failure, or malformed payload all
    /// surface as an error; callers decide what that means for session state.
    async fn resolve_token(&self, token: &str) -> PortfolioResult<UserProfile>;
}

/// Durable storage for the persisted bearer token
///
/// A single opaque string under a well-known key. No other component may
/// bypass this trait to touch the credential.
pub trait TokenStore: Send + Sync {
    /// Load the persisted token, if any
    fn load(&self) -> PortfolioResult<Option<String>>;

    /// Persist the token, replacing any previous value
    fn store(&self, token: &str) -> PortfolioResult<()>;

    /// Remove the persisted token; removing an absent token is not an error
    fn clear(&self) -> PortfolioResult<()>;
}
