//! Server-rendered HTML for each [`Screen`].
//!
//! Markup is plain string building; every value that can carry user input goes
//! through [`escape`]. Forms post back with the session's CSRF token in a
//! hidden `csrf` field.

use std::fmt::Write as _;

use serde::Serialize;

use crate::identity::{FormMode, Role, View};
use crate::login::FormSnapshot;
use crate::router::{NavHeader, RoleCard, Screen, APP_TITLE};

/// Symbolic icon references used by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    User,
    LogOut,
    Settings,
    Edit,
    FileText,
    Eye,
    EyeOff,
    Lock,
}

impl Icon {
    pub fn glyph(&self) -> &'static str {
        match self {
            Icon::User => "\u{1F464}",
            Icon::LogOut => "\u{21AA}",
            Icon::Settings => "\u{2699}",
            Icon::Edit => "\u{270E}",
            Icon::FileText => "\u{1F4C4}",
            Icon::Eye => "\u{1F441}",
            Icon::EyeOff => "\u{25CC}",
            Icon::Lock => "\u{1F512}",
        }
    }

    fn span(&self) -> String {
        format!(r#"<span class="icon" aria-hidden="true">{}</span>"#, self.glyph())
    }
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn csrf_field(csrf: &str) -> String {
    format!(r#"<input type="hidden" name="csrf" value="{}">"#, escape(csrf))
}

/// Single-button form posting to `action`.
fn post_button(action: &str, csrf: &str, class: &str, label: &str) -> String {
    format!(
        r#"<form method="post" action="{action}" class="inline">{}<button type="submit" class="{class}">{label}</button></form>"#,
        csrf_field(csrf)
    )
}

pub fn page(screen: &Screen, csrf: &str) -> String {
    let body = match screen {
        Screen::RoleSelection { cards, login_form } => role_selection(cards, login_form.as_ref(), csrf),
        Screen::Workspace { header, body } => workspace(header, *body, csrf),
    };
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(APP_TITLE),
        body
    )
}

fn role_selection(cards: &[RoleCard], form: Option<&FormSnapshot>, csrf: &str) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<div class="role-selector"><h1>{}</h1><p>Choose your role to get started</p><div class="role-grid">"#,
        escape(APP_TITLE)
    );
    for card in cards {
        let _ = write!(
            out,
            r#"<form method="post" action="/role/{id}" class="role-card">{csrf}<button type="submit" data-role="{id}">{icon}<h3>{title}</h3><p>{desc}</p></button></form>"#,
            id = card.role.as_str(),
            csrf = csrf_field(csrf),
            icon = card.icon.span(),
            title = escape(card.title),
            desc = escape(card.description),
        );
    }
    out.push_str("</div>");
    let _ = write!(
        out,
        r#"<p class="sign-in-hint">Already have an account? {}</p></div>"#,
        post_button("/login/open", csrf, "link", "Sign in here")
    );
    if let Some(form) = form {
        out.push_str(&login_modal(form, csrf));
    }
    out
}

fn login_modal(form: &FormSnapshot, csrf: &str) -> String {
    let sign_up = form.mode == FormMode::SignUp;
    let (heading, sub) = if sign_up {
        ("Create Account", "Join our planning community")
    } else {
        ("Welcome Back", "Sign in to continue")
    };
    let mut out = String::new();
    let _ = write!(out, r#"<div class="modal" role="dialog"><h2>{heading}</h2><p>{sub}</p>"#);
    if let Some(err) = &form.last_error {
        let _ = write!(out, r#"<div class="error" role="alert">{}</div>"#, escape(err));
    }
    let _ = write!(out, r#"<form method="post" action="/login" id="login-form">{}"#, csrf_field(csrf));
    if sign_up {
        let _ = write!(
            out,
            r#"<label>Full Name {} <input type="text" name="name" value="{}" placeholder="Enter your full name"></label>"#,
            Icon::User.span(),
            escape(&form.draft.name)
        );
    }
    let _ = write!(
        out,
        r#"<label>Email Address {} <input type="email" name="email" value="{}" placeholder="Enter your email" required></label>"#,
        Icon::User.span(),
        escape(&form.draft.email)
    );
    let input_type = if form.show_password { "text" } else { "password" };
    let _ = write!(
        out,
        r#"<label>Password {} <input type="{input_type}" name="password" placeholder="Enter your password" required></label>"#,
        Icon::Lock.span()
    );
    if sign_up {
        out.push_str(r#"<label>Role <select name="role" required>"#);
        for role in Role::ALL {
            let selected = if role == form.draft.role { " selected" } else { "" };
            let _ = write!(out, r#"<option value="{}"{selected}>{}</option>"#, role.as_str(), escape(role.title()));
        }
        let _ = write!(out, r#"</select></label><p class="hint">{}</p>"#, escape(form.draft.role.form_description()));
        let _ = write!(
            out,
            r#"<label>Organization (Optional) <input type="text" name="organization" value="{}" placeholder="Your organization or department"></label>"#,
            escape(&form.draft.organization)
        );
    }
    let submit_label = match (form.pending, sign_up) {
        (true, _) => "Processing...",
        (false, true) => "Create Account",
        (false, false) => "Sign In",
    };
    let disabled = if form.pending { " disabled" } else { "" };
    let _ = write!(out, r#"<button type="submit"{disabled}>{submit_label}</button></form>"#);

    let eye = if form.show_password { Icon::EyeOff } else { Icon::Eye };
    out.push_str(&post_button("/login/password", csrf, "toggle-password", &eye.span()));
    if form.pending {
        out.push_str(&post_button("/login/cancel", csrf, "link", "Cancel"));
    }
    let switch = if sign_up { "Already have an account? Sign in" } else { "Don't have an account? Sign up" };
    out.push_str(&post_button("/login/mode", csrf, "link", switch));
    out.push_str(&post_button("/login/close", csrf, "close", "&#10005;"));
    out.push_str("</div>");
    out
}

fn workspace(header: &NavHeader, body: View, csrf: &str) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<header><h1>{}</h1><span class="badge">{}</span><nav>"#,
        escape(header.title),
        escape(header.badge)
    );
    for link in &header.links {
        let class = if link.active { "nav active" } else { "nav" };
        let label = format!("{}{}", link.icon.span(), escape(link.label));
        out.push_str(&post_button(&format!("/view/{}", link.view.as_str()), csrf, class, &label));
    }
    let _ = write!(
        out,
        r#"</nav><div class="user-menu">{}<span class="user-name">{}</span>{}</div></header>"#,
        Icon::User.span(),
        escape(&header.user_name),
        post_button("/logout", csrf, "logout", &format!("{}Logout", Icon::LogOut.span()))
    );
    let _ = write!(out, r#"<main data-view="{}">{}</main>"#, body.as_str(), view_body(body, csrf));
    out
}

fn view_body(view: View, csrf: &str) -> String {
    match view {
        View::Questionnaire => {
            r#"<section class="questionnaire"><h2>Questionnaire</h2><p>Answer the questions to receive a personalized Aedes action plan.</p></section>"#.to_string()
        }
        View::Editor => format!(
            r#"<section class="editor"><h2>Questionnaire Editor</h2><p>Edit and modify questionnaire questions and structure.</p>{}</section>"#,
            post_button("/view/questionnaire", csrf, "link", "Back to questionnaire")
        ),
        View::Admin => {
            r#"<section class="admin"><h2>Administrator Dashboard</h2><p>Manage all aspects of the questionnaire system.</p></section>"#.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::login::FormDraft;
    use crate::router::{role_cards, route};

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<b>"Tom" & 'Jerry'</b>"#), "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;");
    }

    #[test]
    fn role_selection_lists_cards_and_sign_in() {
        let screen = Screen::RoleSelection { cards: role_cards(), login_form: None };
        let html = page(&screen, "tok");
        assert!(html.contains("Choose your role to get started"));
        for role in Role::ALL {
            assert!(html.contains(&format!(r#"action="/role/{}""#, role.as_str())));
            assert!(html.contains(role.title()));
        }
        assert!(html.contains("Sign in here"));
        assert!(html.contains(r#"name="csrf" value="tok""#));
        assert!(!html.contains("Welcome Back"));
    }

    #[test]
    fn login_modal_modes() {
        let mut form = FormSnapshot { open: true, ..Default::default() };
        let html = login_modal(&form, "t");
        assert!(html.contains("Welcome Back"));
        assert!(html.contains(">Sign In<"));
        assert!(!html.contains(r#"name="organization""#));
        assert!(html.contains(r#"type="password""#));

        form.mode = FormMode::SignUp;
        form.show_password = true;
        form.draft = FormDraft { role: Role::Reviewer, ..Default::default() };
        let html = login_modal(&form, "t");
        assert!(html.contains("Create Account"));
        assert!(html.contains(r#"name="organization""#));
        assert!(html.contains(r#"<option value="reviewer" selected>"#));
        assert!(html.contains(Role::Reviewer.form_description()));
        assert!(html.contains(r#"<input type="text" name="password""#));

        form.pending = true;
        let html = login_modal(&form, "t");
        assert!(html.contains("Processing..."));
        assert!(html.contains(" disabled>"));
        assert!(html.contains(r#"action="/login/cancel""#));
    }

    #[test]
    fn error_banner_and_draft_are_escaped() {
        let form = FormSnapshot {
            open: true,
            last_error: Some("bad <input>".into()),
            draft: FormDraft { email: "x\"@y".into(), ..Default::default() },
            ..Default::default()
        };
        let html = login_modal(&form, "t");
        assert!(html.contains("bad &lt;input&gt;"));
        assert!(html.contains(r#"value="x&quot;@y""#));
    }

    #[test]
    fn workspace_shows_only_permitted_links() {
        let mut id = Identity::demo(Role::Editor);
        id.name = "<script>".into();
        let screen = route(Some(&id), View::Editor, &FormSnapshot::default());
        let html = page(&screen, "t");
        assert!(html.contains(r#"action="/view/questionnaire""#));
        assert!(html.contains(r#"action="/view/editor""#));
        assert!(!html.contains(r#"action="/view/admin""#));
        assert!(html.contains(r#"data-view="editor""#));
        assert!(html.contains("Back to questionnaire"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains(r#"<span class="badge">Editor</span>"#));
    }
}
