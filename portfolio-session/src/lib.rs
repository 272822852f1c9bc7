//! Portfolio Session - client-side session management
//!
//! This crate owns the single source of truth for "who is logged in":
//! the bearer token and the profile it resolves to, with a persisted
//! credential across restarts and reactive notification of every state
//! transition.
//!
//! ## Architecture
//!
//! - **Core** (portfolio-core): shared types, errors, and the
//!   `IdentityProvider` / `TokenStore` trait seams
//! - **Identity** (portfolio-identity): the HTTP collaborator
//! - **Session** (this crate): state machine, persistence, notification

pub mod manager;
pub mod state;
pub mod storage;

pub use manager::SessionManager;
pub use state::{SessionPhase, SessionState};
pub use storage::{FileTokenStore, MemoryTokenStore};

use portfolio_core::PortfolioError;

/// Session-level error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Core error: {0}")]
    Core(#[from] PortfolioError),

    #[error("Session operation superseded by a newer one")]
    Superseded,
}

pub type SessionResult<T> = Result<T, SessionError>;
