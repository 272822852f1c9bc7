//! Core data type definitions

use serde::{Deserialize, Deserializer, Serialize};

/// Role marker distinguishing standard students from administrators.
///
/// The identity service issues Spring-style role strings on the wire
/// (`ROLE_ALUNO`, `ROLE_ADMIN`). Anything else deserializes to `Unknown`,
/// which carries no privileges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UserRole {
    #[serde(rename = "ROLE_ALUNO")]
    Student,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    #[serde(rename = "ROLE_UNKNOWN")]
    Unknown,
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Accounts created before role assignment carry a null role.
        let marker = Option::<String>::deserialize(deserializer)?;
        Ok(match marker.as_deref() {
            None | Some("ROLE_ALUNO") => UserRole::Student,
            Some("ROLE_ADMIN") => UserRole::Admin,
            Some(_) => UserRole::Unknown,
        })
    }
}

impl Default for UserRole {
    fn default() -> Self {
        // Registration responses omit the role field; new accounts are students.
        UserRole::Student
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Student => write!(f, "student"),
            UserRole::Admin => write!(f, "admin"),
            UserRole::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_ALUNO" | "student" => Ok(UserRole::Student),
            "ROLE_ADMIN" | "admin" => Ok(UserRole::Admin),
            _ => Err(format!("Unknown user role: {}", s)),
        }
    }
}

/// Resolved identity record associated with a valid token.
///
/// Field names follow the identity service's wire format, which predates
/// this client and uses Portuguese property names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    #[serde(rename = "nomeCompleto")]
    pub full_name: String,
    pub email: String,
    #[serde(rename = "fotoUrl", default)]
    pub photo_url: Option<String>,
    #[serde(rename = "curso", default)]
    pub course: Option<String>,
    #[serde(rename = "turno", default)]
    pub shift: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

impl UserProfile {
    /// Check whether this profile carries the administrator marker
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Get user display string for logs
    pub fn display_string(&self) -> String {
        format!("{} ({})", self.full_name, self.role)
    }
}
