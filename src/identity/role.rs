use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Permission level of an identity. The wire ids are what the browser posts
/// and what the JSON snapshot carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    /// Questionnaire filler.
    #[default]
    #[serde(rename = "user")]
    User,
    #[serde(rename = "editor")]
    Editor,
    #[serde(rename = "reviewer")]
    Reviewer,
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    /// Selection order on the role cards and in the sign-up dropdown.
    pub const ALL: [Role; 4] = [Role::User, Role::Editor, Role::Reviewer, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Editor => "editor",
            Role::Reviewer => "reviewer",
            Role::Admin => "admin",
        }
    }

    /// Capitalized wire id, used for the header badge and demo names.
    pub fn badge(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Editor => "Editor",
            Role::Reviewer => "Reviewer",
            Role::Admin => "Admin",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Role::User => "Questionnaire Filler",
            Role::Editor => "Question Editor",
            Role::Reviewer => "Content Reviewer",
            Role::Admin => "Administrator",
        }
    }

    /// Role-selection card text.
    pub fn description(&self) -> &'static str {
        match self {
            Role::User => "Fill out questionnaires and receive personalized action plans",
            Role::Editor => "Edit and modify questionnaire questions and structure",
            Role::Reviewer => "Review questions and suggest improvements",
            Role::Admin => "Manage all aspects of the questionnaire system",
        }
    }

    /// Hint under the sign-up role dropdown.
    pub fn form_description(&self) -> &'static str {
        match self {
            Role::User => "Fill out questionnaires and receive action plans",
            Role::Editor => "Edit and modify questionnaire questions",
            Role::Reviewer => "Review and suggest improvements to questions",
            Role::Admin => "Manage all aspects and integrate suggestions",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::user("unknown_role".to_string(), format!("unknown role '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_ids_case_insensitively() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!(" Editor ".parse::<Role>().unwrap(), Role::Editor);
        assert_eq!("REVIEWER".parse::<Role>().unwrap(), Role::Reviewer);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    }

    #[test]
    fn rejects_unknown_roles() {
        let err = "login".parse::<Role>().unwrap_err();
        assert_eq!(err.code_str(), "unknown_role");
        assert!("administrator".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn serde_uses_wire_ids() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        let r: Role = serde_json::from_str("\"reviewer\"").unwrap();
        assert_eq!(r, Role::Reviewer);
    }

    #[test]
    fn badge_capitalizes_wire_id() {
        for r in Role::ALL {
            let mut expected = r.as_str().to_string();
            expected[..1].make_ascii_uppercase();
            assert_eq!(r.badge(), expected);
        }
    }
}
