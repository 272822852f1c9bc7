//! Token storage backends
//!
//! Implementations of the `TokenStore` seam: an in-memory slot for tests
//! and short-lived processes, and a file-backed slot for persistence
//! across restarts.

use portfolio_core::{ErrorContext, PortfolioError, PortfolioResult, TokenStore};
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::debug;

/// In-memory token storage (for tests and ephemeral sessions)
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a token, as if persisted by a
    /// previous run
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> PortfolioResult<Option<String>> {
        Ok(self.slot.read().unwrap().clone())
    }

    fn store(&self, token: &str) -> PortfolioResult<()> {
        *self.slot.write().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> PortfolioResult<()> {
        *self.slot.write().unwrap() = None;
        Ok(())
    }
}

/// File-backed token storage
///
/// The token lives as a single line in one file; the file's presence is
/// what distinguishes "persisted token" from "no token".
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> PortfolioResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortfolioError::Storage {
                message: format!("Failed to read token file: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("token_store")
                    .with_operation("load")
                    .with_metadata("path", &self.path.display().to_string()),
            }),
        }
    }

    fn store(&self, token: &str) -> PortfolioResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PortfolioError::Storage {
                message: format!("Failed to create storage directory: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("token_store")
                    .with_operation("store")
                    .with_metadata("path", &self.path.display().to_string()),
            })?;
        }

        std::fs::write(&self.path, token).map_err(|e| PortfolioError::Storage {
            message: format!("Failed to write token file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("token_store")
                .with_operation("store")
                .with_metadata("path", &self.path.display().to_string()),
        })?;

        debug!("Persisted token to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> PortfolioResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed persisted token at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortfolioError::Storage {
                message: format!("Failed to remove token file: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("token_store")
                    .with_operation("clear")
                    .with_metadata("path", &self.path.display().to_string()),
            }),
        }
    }
}
