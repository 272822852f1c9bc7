//! Session state and derived authorization flags

use portfolio_core::UserProfile;

/// Lifecycle phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Before `initialize` has run
    Uninitialized,
    /// No valid credential; dependent views treat the user as logged out
    Anonymous,
    /// A resolution is in flight; neither anonymous nor authenticated
    /// semantics may be assumed
    Authenticating,
    /// Token validated and profile resolved
    Authenticated,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Uninitialized => write!(f, "uninitialized"),
            SessionPhase::Anonymous => write!(f, "anonymous"),
            SessionPhase::Authenticating => write!(f, "authenticating"),
            SessionPhase::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// Snapshot of the session: token, resolved profile, and phase.
///
/// Token and profile are only ever set together; the constructors are the
/// only way to build a state, so the pairing invariant holds everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    phase: SessionPhase,
    token: Option<String>,
    profile: Option<UserProfile>,
}

impl SessionState {
    /// State at application start, before `initialize`
    pub fn uninitialized() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            token: None,
            profile: None,
        }
    }

    /// Logged-out state
    pub fn anonymous() -> Self {
        Self {
            phase: SessionPhase::Anonymous,
            token: None,
            profile: None,
        }
    }

    /// Transient state while a resolution is in flight; the candidate token
    /// is not exposed until it has been validated
    pub fn authenticating() -> Self {
        Self {
            phase: SessionPhase::Authenticating,
            token: None,
            profile: None,
        }
    }

    /// Logged-in state; token and profile committed atomically
    pub fn authenticated(token: String, profile: UserProfile) -> Self {
        Self {
            phase: SessionPhase::Authenticated,
            token: Some(token),
            profile: Some(profile),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Computed, never stored: token and profile both present
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.profile.is_some()
    }

    /// Computed, never stored: authenticated with the administrator marker
    pub fn is_admin(&self) -> bool {
        self.is_authenticated()
            && self
                .profile
                .as_ref()
                .map(|p| p.is_admin())
                .unwrap_or(false)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::uninitialized()
    }
}
