use serde::{Deserialize, Serialize};

use super::role::Role;

/// Top-level screen body selected by navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Questionnaire,
    Editor,
    Admin,
}

impl View {
    /// Header order.
    pub const ALL: [View; 3] = [View::Questionnaire, View::Editor, View::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Questionnaire => "questionnaire",
            View::Editor => "editor",
            View::Admin => "admin",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Questionnaire => "Questionnaire",
            View::Editor => "Editor",
            View::Admin => "Admin",
        }
    }

    pub fn parse(s: &str) -> Option<View> {
        let s = s.trim();
        View::ALL.into_iter().find(|v| v.as_str().eq_ignore_ascii_case(s))
    }

    /// Unrecognized selectors land on the questionnaire.
    pub fn parse_or_default(s: &str) -> View {
        View::parse(s).unwrap_or_default()
    }
}

/// Single authorization predicate shared by nav-link visibility and body selection.
pub fn can_access(role: Role, view: View) -> bool {
    match view {
        View::Questionnaire => true,
        View::Editor => matches!(role, Role::Editor | Role::Admin),
        View::Admin => role == Role::Admin,
    }
}

/// Views whose nav links are shown for `role`, in header order.
pub fn visible_views(role: Role) -> Vec<View> {
    View::ALL.into_iter().filter(|v| can_access(role, *v)).collect()
}

/// Body actually rendered for a selector; a selector the role may not see
/// falls back to the questionnaire.
pub fn resolve_view(role: Role, selector: View) -> View {
    if can_access(role, selector) { selector } else { View::Questionnaire }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_visibility_is_a_function_of_role() {
        assert_eq!(visible_views(Role::User), vec![View::Questionnaire]);
        assert_eq!(visible_views(Role::Reviewer), vec![View::Questionnaire]);
        assert_eq!(visible_views(Role::Editor), vec![View::Questionnaire, View::Editor]);
        assert_eq!(visible_views(Role::Admin), vec![View::Questionnaire, View::Editor, View::Admin]);
    }

    #[test]
    fn predicate_table() {
        for role in Role::ALL {
            assert!(can_access(role, View::Questionnaire));
            assert_eq!(can_access(role, View::Editor), role == Role::Editor || role == Role::Admin);
            assert_eq!(can_access(role, View::Admin), role == Role::Admin);
        }
    }

    #[test]
    fn body_selection_rechecks_authorization() {
        assert_eq!(resolve_view(Role::User, View::Admin), View::Questionnaire);
        assert_eq!(resolve_view(Role::Reviewer, View::Editor), View::Questionnaire);
        assert_eq!(resolve_view(Role::Editor, View::Admin), View::Questionnaire);
        assert_eq!(resolve_view(Role::Editor, View::Editor), View::Editor);
        assert_eq!(resolve_view(Role::Admin, View::Admin), View::Admin);
    }

    #[test]
    fn unknown_selector_defaults_to_questionnaire() {
        assert_eq!(View::parse_or_default("settings"), View::Questionnaire);
        assert_eq!(View::parse_or_default(""), View::Questionnaire);
        assert_eq!(View::parse_or_default("Editor"), View::Editor);
        assert_eq!(View::parse("nope"), None);
    }
}
