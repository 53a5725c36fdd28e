use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AuthError;
use crate::security::AccountRegistry;

use super::principal::{display_name_for, Identity};
use super::role::Role;

/// Which half of the login form is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    #[default]
    SignIn,
    SignUp,
}

impl FormMode {
    pub fn toggled(self) -> Self {
        match self {
            FormMode::SignIn => FormMode::SignUp,
            FormMode::SignUp => FormMode::SignIn,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginRequest {
    pub mode: FormMode,
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    pub organization: String,
}

impl LoginRequest {
    pub fn sign_in(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { mode: FormMode::SignIn, email: email.into(), password: password.into(), ..Default::default() }
    }

    pub fn sign_up(
        email: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            mode: FormMode::SignUp,
            email: email.into(),
            password: password.into(),
            name: name.into(),
            role,
            organization: organization.into(),
        }
    }

    /// Presence checks only.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.email.trim().is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        if self.password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }
        Ok(())
    }

    /// Identity described by the form fields. Sign-in carries no name, role
    /// or organization of its own.
    pub fn to_identity(&self) -> Identity {
        let email = self.email.trim().to_string();
        match self.mode {
            FormMode::SignIn => Identity::new(display_name_for("", &email), email, Role::User, String::new()),
            FormMode::SignUp => Identity::new(
                display_name_for(&self.name, &email),
                email,
                self.role,
                self.organization.trim().to_string(),
            ),
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, req: &LoginRequest) -> Result<Identity, AuthError>;
}

/// Accepts any email/password pair after a fixed delay.
pub struct DemoAuthProvider {
    pub delay: Duration,
}

impl Default for DemoAuthProvider {
    fn default() -> Self { Self { delay: Duration::from_millis(1000) } }
}

impl DemoAuthProvider {
    pub fn new(delay: Duration) -> Self { Self { delay } }
}

#[async_trait]
impl AuthProvider for DemoAuthProvider {
    async fn authenticate(&self, req: &LoginRequest) -> Result<Identity, AuthError> {
        req.validate()?;
        tokio::time::sleep(self.delay).await;
        let identity = req.to_identity();
        info!(target: "auth", id = %identity.id, role = %identity.role, "demo login");
        Ok(identity)
    }
}

/// Sign-up registers an account; sign-in must match a registered password.
pub struct AccountAuthProvider {
    pub delay: Duration,
    pub registry: Arc<AccountRegistry>,
}

impl AccountAuthProvider {
    pub fn new(delay: Duration, registry: Arc<AccountRegistry>) -> Self { Self { delay, registry } }
}

#[async_trait]
impl AuthProvider for AccountAuthProvider {
    async fn authenticate(&self, req: &LoginRequest) -> Result<Identity, AuthError> {
        req.validate()?;
        tokio::time::sleep(self.delay).await;
        match req.mode {
            FormMode::SignUp => {
                let identity = req.to_identity();
                let registered = self
                    .registry
                    .register(identity.clone(), &req.password)
                    .map_err(|e| AuthError::Unavailable(e.to_string()))?;
                if !registered {
                    return Err(AuthError::AccountExists);
                }
                info!(target: "auth", id = %identity.id, role = %identity.role, "account registered");
                Ok(identity)
            }
            FormMode::SignIn => {
                let identity = self
                    .registry
                    .authenticate(&req.email, &req.password)
                    .ok_or(AuthError::InvalidCredentials)?;
                info!(target: "auth", id = %identity.id, "account login");
                Ok(identity)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: Duration = Duration::from_millis(1);

    #[tokio::test]
    async fn demo_sign_in_uses_email_local_part() {
        let p = DemoAuthProvider::new(FAST);
        let id = p.authenticate(&LoginRequest::sign_in("planner@city.gov", "x")).await.unwrap();
        assert_eq!(id.name, "planner");
        assert_eq!(id.email, "planner@city.gov");
        assert_eq!(id.role, Role::User);
        assert_eq!(id.organization, "");
    }

    #[tokio::test]
    async fn demo_sign_up_keeps_role_and_organization() {
        let p = DemoAuthProvider::new(FAST);
        let req = LoginRequest::sign_up("r@city.gov", "pw", "Rita", Role::Reviewer, "Vector Control Unit");
        let id = p.authenticate(&req).await.unwrap();
        assert_eq!(id.name, "Rita");
        assert_eq!(id.role, Role::Reviewer);
        assert_eq!(id.organization, "Vector Control Unit");

        let req = LoginRequest::sign_up("a@b.com", "pw", "", Role::Editor, "");
        let id = p.authenticate(&req).await.unwrap();
        assert_eq!(id.name, "a");
        assert_eq!(id.role, Role::Editor);
        assert_eq!(id.organization, "");
    }

    #[tokio::test]
    async fn presence_checks() {
        let p = DemoAuthProvider::new(FAST);
        let err = p.authenticate(&LoginRequest::sign_in("  ", "pw")).await.unwrap_err();
        assert_eq!(err, AuthError::MissingField("email"));
        let err = p.authenticate(&LoginRequest::sign_in("a@b.com", "")).await.unwrap_err();
        assert_eq!(err, AuthError::MissingField("password"));
    }

    #[tokio::test]
    async fn demo_waits_the_configured_delay() {
        let p = DemoAuthProvider::new(Duration::from_millis(30));
        let start = std::time::Instant::now();
        p.authenticate(&LoginRequest::sign_in("a@b.com", "pw")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn accounts_register_then_verify() {
        let p = AccountAuthProvider::new(FAST, Arc::new(AccountRegistry::new()));
        let signed_up = p
            .authenticate(&LoginRequest::sign_up("e@city.gov", "pw", "Eve", Role::Editor, "Planning"))
            .await
            .unwrap();

        let again = p
            .authenticate(&LoginRequest::sign_up("E@city.gov", "other", "Eve", Role::Admin, ""))
            .await
            .unwrap_err();
        assert_eq!(again, AuthError::AccountExists);

        let bad = p.authenticate(&LoginRequest::sign_in("e@city.gov", "nope")).await.unwrap_err();
        assert_eq!(bad, AuthError::InvalidCredentials);

        let ok = p.authenticate(&LoginRequest::sign_in("e@city.gov", "pw")).await.unwrap();
        assert_eq!(ok.id, signed_up.id);
        assert_eq!(ok.role, Role::Editor);
        assert_eq!(ok.organization, "Planning");
    }
}
