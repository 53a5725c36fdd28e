//! Login/signup form state and the cancellable submission.
//!
//! A submission marks the form pending, awaits the [`AuthProvider`] outside any
//! lock, and then either logs the identity into the session's holder and closes
//! the form, or records a user-visible error and leaves the form open. The
//! pending flag is cleared by a drop guard, so it is released even when the
//! handler future is dropped mid-flight.

use futures_util::future::{AbortHandle, Abortable, Aborted};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::AuthError;
use crate::identity::{AuthProvider, FormMode, Identity, LoginRequest, Role, SharedClientSession};

/// Non-secret field values echoed back when the form re-renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormDraft {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub organization: String,
}

impl From<&LoginRequest> for FormDraft {
    fn from(req: &LoginRequest) -> Self {
        Self {
            email: req.email.clone(),
            name: req.name.clone(),
            role: req.role,
            organization: req.organization.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub open: bool,
    pub mode: FormMode,
    pub show_password: bool,
    pub pending: bool,
    pub last_error: Option<String>,
    pub draft: FormDraft,
    abort: Option<AbortHandle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormSnapshot {
    pub open: bool,
    pub mode: FormMode,
    pub show_password: bool,
    pub pending: bool,
    pub last_error: Option<String>,
    pub draft: FormDraft,
}

impl LoginForm {
    pub fn open(&mut self) {
        self.open = true;
    }

    /// Hides the form and resets its fields. An in-flight submission keeps running.
    pub fn close(&mut self) {
        self.open = false;
        self.mode = FormMode::SignIn;
        self.show_password = false;
        self.last_error = None;
        self.draft = FormDraft::default();
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        self.last_error = None;
    }

    pub fn toggle_password_visibility(&mut self) {
        self.show_password = !self.show_password;
    }

    /// Aborts the in-flight submission, if any.
    pub fn cancel(&mut self) -> bool {
        match self.abort.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            open: self.open,
            mode: self.mode,
            show_password: self.show_password,
            pending: self.pending,
            last_error: self.last_error.clone(),
            draft: self.draft.clone(),
        }
    }
}

struct PendingGuard {
    session: SharedClientSession,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut s = self.session.lock();
        s.login_form.pending = false;
        s.login_form.abort = None;
    }
}

/// Submits the form. The request's mode is taken from the form state.
pub async fn submit(
    session: &SharedClientSession,
    provider: &dyn AuthProvider,
    mut req: LoginRequest,
) -> Result<Identity, AuthError> {
    let (handle, registration) = AbortHandle::new_pair();
    {
        let mut s = session.lock();
        let form = &mut s.login_form;
        if form.pending {
            return Err(AuthError::Pending);
        }
        req.mode = form.mode;
        form.draft = FormDraft::from(&req);
        form.last_error = None;
        form.pending = true;
        form.abort = Some(handle);
    }
    let _pending = PendingGuard { session: session.clone() };

    let outcome = match Abortable::new(provider.authenticate(&req), registration).await {
        Ok(result) => result,
        Err(Aborted) => Err(AuthError::Cancelled),
    };

    {
        let mut s = session.lock();
        match &outcome {
            Ok(identity) => {
                s.holder.login(identity.clone());
                s.login_form.close();
                info!(target: "auth", id = %identity.id, role = %identity.role, "login succeeded");
            }
            Err(e) => {
                s.login_form.last_error = Some(e.user_message());
                warn!(target: "auth", code = e.code(), "authentication failed: {e}");
            }
        }
    }
    outcome
}

/// Aborts the session's in-flight submission.
pub fn cancel(session: &SharedClientSession) -> bool {
    session.lock().login_form.cancel()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::identity::{DemoAuthProvider, SessionManager};

    struct Failing;

    #[async_trait]
    impl AuthProvider for Failing {
        async fn authenticate(&self, _req: &LoginRequest) -> Result<Identity, AuthError> {
            Err(AuthError::Unavailable("connection refused".into()))
        }
    }

    fn open_form(session: &SharedClientSession) {
        session.lock().login_form.open();
    }

    #[tokio::test]
    async fn success_logs_in_and_closes_form() {
        let sm = SessionManager::default();
        let session = sm.open().unwrap();
        open_form(&session);
        session.lock().login_form.toggle_mode();

        let provider = DemoAuthProvider::new(Duration::from_millis(5));
        let req = LoginRequest::sign_up("a@b.com", "pw", "", Role::Editor, "");
        let id = submit(&session, &provider, req).await.unwrap();
        assert_eq!(id.name, "a");
        assert_eq!(id.role, Role::Editor);

        let s = session.lock();
        assert_eq!(s.holder.current().map(|i| i.role), Some(Role::Editor));
        assert!(!s.login_form.open);
        assert!(!s.login_form.pending);
        assert_eq!(s.login_form.mode, FormMode::SignIn);
    }

    #[tokio::test]
    async fn sign_in_mode_ignores_signup_fields() {
        let sm = SessionManager::default();
        let session = sm.open().unwrap();
        open_form(&session);
        let provider = DemoAuthProvider::new(Duration::from_millis(1));
        let req = LoginRequest {
            email: "jane@city.gov".into(),
            password: "pw".into(),
            name: "Ignored".into(),
            role: Role::Admin,
            ..Default::default()
        };
        let id = submit(&session, &provider, req).await.unwrap();
        assert_eq!(id.name, "jane");
        assert_eq!(id.role, Role::User);
    }

    #[tokio::test]
    async fn failure_keeps_form_open_and_clears_pending() {
        let sm = SessionManager::default();
        let session = sm.open().unwrap();
        open_form(&session);
        let err = submit(&session, &Failing, LoginRequest::sign_in("a@b.com", "pw")).await.unwrap_err();
        assert!(matches!(err, AuthError::Unavailable(_)));

        let s = session.lock();
        assert!(s.login_form.open);
        assert!(!s.login_form.pending);
        assert!(s.login_form.last_error.is_some());
        assert_eq!(s.login_form.draft.email, "a@b.com");
        assert!(s.holder.current().is_none());
    }

    #[tokio::test]
    async fn missing_password_surfaces_banner() {
        let sm = SessionManager::default();
        let session = sm.open().unwrap();
        open_form(&session);
        let provider = DemoAuthProvider::new(Duration::from_millis(1));
        let err = submit(&session, &provider, LoginRequest::sign_in("a@b.com", "")).await.unwrap_err();
        assert_eq!(err, AuthError::MissingField("password"));
        assert_eq!(session.lock().login_form.last_error.as_deref(), Some("Please enter your password."));
    }

    #[tokio::test]
    async fn second_submit_while_pending_is_rejected_and_cancel_aborts() {
        let sm = SessionManager::default();
        let session = sm.open().unwrap();
        open_form(&session);
        let provider = Arc::new(DemoAuthProvider::new(Duration::from_secs(30)));

        let first = {
            let session = session.clone();
            let provider = provider.clone();
            tokio::spawn(async move { submit(&session, provider.as_ref(), LoginRequest::sign_in("a@b.com", "pw")).await })
        };
        // wait until the first submission has marked the form pending
        for _ in 0..200 {
            if session.lock().login_form.pending {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(session.lock().login_form.pending);

        let second = submit(&session, provider.as_ref(), LoginRequest::sign_in("b@b.com", "pw")).await;
        assert_eq!(second.unwrap_err(), AuthError::Pending);

        assert!(cancel(&session));
        let outcome = first.await.unwrap();
        assert_eq!(outcome.unwrap_err(), AuthError::Cancelled);

        let s = session.lock();
        assert!(!s.login_form.pending);
        assert!(s.login_form.open);
        assert!(s.holder.current().is_none());
    }

    #[tokio::test]
    async fn expired_session_aborts_pending_submission() {
        let sm = SessionManager::new(Duration::from_millis(50));
        let session = sm.open().unwrap();
        let token = session.lock().token.clone();
        open_form(&session);
        let provider = Arc::new(DemoAuthProvider::new(Duration::from_secs(30)));

        let first = {
            let session = session.clone();
            let provider = provider.clone();
            tokio::spawn(async move { submit(&session, provider.as_ref(), LoginRequest::sign_in("a@b.com", "pw")).await })
        };
        for _ in 0..200 {
            if session.lock().login_form.pending {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(session.lock().login_form.pending);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(sm.get(&token).is_none());
        assert!(sm.is_empty());

        let outcome = first.await.unwrap();
        assert_eq!(outcome.unwrap_err(), AuthError::Cancelled);
        assert!(session.lock().holder.current().is_none());
    }

    #[test]
    fn toggles() {
        let mut form = LoginForm::default();
        assert_eq!(form.mode, FormMode::SignIn);
        form.toggle_mode();
        assert_eq!(form.mode, FormMode::SignUp);
        form.toggle_password_visibility();
        assert!(form.show_password);
        form.open();
        form.close();
        assert!(!form.open);
        assert!(!form.show_password);
        assert_eq!(form.mode, FormMode::SignIn);
        assert!(!form.cancel());
    }
}
