use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

/// The currently authenticated user of a client session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Empty when the user left it out.
    #[serde(default)]
    pub organization: String,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(name: String, email: String, role: Role, organization: String) -> Self {
        Self { id: Uuid::new_v4(), name, email, role, organization, created_at: Utc::now() }
    }

    /// Placeholder identity synthesized by a role-card click.
    pub fn demo(role: Role) -> Self {
        Self::new(
            format!("Demo {}", role.badge()),
            format!("demo-{}@example.com", role.as_str()),
            role,
            "Demo Organization".to_string(),
        )
    }
}

/// Name shown in the header: the entered name, or the local part of the email.
pub fn display_name_for(name: &str, email: &str) -> String {
    let name = name.trim();
    if !name.is_empty() {
        return name.to_string();
    }
    let email = email.trim();
    match email.split_once('@') {
        Some((local, _)) => local.to_string(),
        None => email.to_string(),
    }
}
