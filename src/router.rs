//! View routing: which screen a client session sees, which nav links it gets,
//! and the state transitions driven by role cards, nav links and logout.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::identity::{can_access, resolve_view, visible_views, ClientSession, Identity, Role, View};
use crate::login::FormSnapshot;
use crate::render::Icon;

pub const APP_TITLE: &str = "Urban Planner's Aedes Action Tool";
pub const HEADER_TITLE: &str = "Urban Planner's Tool";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleCard {
    pub role: Role,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: Icon,
}

impl RoleCard {
    fn for_role(role: Role) -> Self {
        let icon = match role {
            Role::User => Icon::FileText,
            Role::Editor => Icon::Edit,
            Role::Reviewer => Icon::Eye,
            Role::Admin => Icon::Settings,
        };
        Self { role, title: role.title(), description: role.description(), icon }
    }
}

pub fn role_cards() -> Vec<RoleCard> {
    Role::ALL.into_iter().map(RoleCard::for_role).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub view: View,
    pub label: &'static str,
    pub icon: Icon,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavHeader {
    pub title: &'static str,
    pub badge: &'static str,
    pub user_name: String,
    pub links: Vec<NavLink>,
}

impl NavHeader {
    pub fn for_identity(identity: &Identity, body: View) -> Self {
        let links = visible_views(identity.role)
            .into_iter()
            .map(|view| NavLink {
                view,
                label: view.label(),
                icon: match view {
                    View::Questionnaire => Icon::FileText,
                    View::Editor => Icon::Edit,
                    View::Admin => Icon::Settings,
                },
                active: view == body,
            })
            .collect();
        Self { title: HEADER_TITLE, badge: identity.role.badge(), user_name: identity.name.clone(), links }
    }

    pub fn link_views(&self) -> Vec<View> {
        self.links.iter().map(|l| l.view).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    RoleSelection {
        cards: Vec<RoleCard>,
        login_form: Option<FormSnapshot>,
    },
    Workspace {
        header: NavHeader,
        body: View,
    },
}

/// Picks the screen for an identity/selector pair. Pure.
pub fn route(identity: Option<&Identity>, selector: View, form: &FormSnapshot) -> Screen {
    match identity {
        None => Screen::RoleSelection {
            cards: role_cards(),
            login_form: form.open.then(|| form.clone()),
        },
        Some(identity) => {
            let body = resolve_view(identity.role, selector);
            Screen::Workspace { header: NavHeader::for_identity(identity, body), body }
        }
    }
}

/// Screen for the current state of a client session.
pub fn screen_for(session: &ClientSession) -> Screen {
    route(session.holder.current().as_ref(), session.view, &session.login_form.snapshot())
}

/// Refuses login actions while someone is signed in; they must log out first.
pub fn require_anonymous(session: &ClientSession) -> AppResult<()> {
    match session.holder.current() {
        Some(identity) => {
            warn!(target: "auth", role = %identity.role, "login action refused while authenticated");
            Err(AppError::conflict("already_authenticated", "log out before signing in again"))
        }
        None => Ok(()),
    }
}

/// Role-card click: log in a placeholder identity for `role`.
pub fn select_role(session: &mut ClientSession, role: Role) -> AppResult<Identity> {
    require_anonymous(session)?;
    let identity = Identity::demo(role);
    session.holder.login(identity.clone());
    session.login_form.close();
    info!(target: "auth", role = %role, "demo role selected");
    Ok(identity)
}

/// Nav-link click. Views the role may not open are refused and the selector is left alone.
pub fn navigate(session: &mut ClientSession, view: View) -> AppResult<View> {
    let Some(identity) = session.holder.current() else {
        return Err(AppError::auth("not_authenticated", "sign in to navigate"));
    };
    if !can_access(identity.role, view) {
        warn!(target: "auth", role = %identity.role, view = view.as_str(), "navigation refused");
        return Err(AppError::forbidden(
            "view_forbidden".to_string(),
            format!("the {} view is not available to the {} role", view.as_str(), identity.role),
        ));
    }
    session.view = view;
    Ok(view)
}

/// Clears the identity and returns the session to role selection.
pub fn logout(session: &mut ClientSession) -> Option<Identity> {
    let cleared = session.holder.logout();
    session.view = View::default();
    session.login_form.close();
    if let Some(identity) = &cleared {
        info!(target: "auth", role = %identity.role, id = %identity.id, "logout");
    }
    cleared
}
