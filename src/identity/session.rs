use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use base64::Engine;
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::debug;

use crate::login::LoginForm;
use crate::tprintln;

use super::authorizer::View;
use super::principal::Identity;

pub type SessionToken = String;

/// Zero-or-one current identity with snapshot reads and change notification.
///
/// Cloning shares the same slot; every clone observes the same login/logout.
#[derive(Debug, Clone)]
pub struct SessionHolder {
    tx: Arc<watch::Sender<Option<Identity>>>,
}

impl Default for SessionHolder {
    fn default() -> Self { Self::new() }
}

impl SessionHolder {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Replaces any current identity.
    pub fn login(&self, identity: Identity) {
        tprintln!("holder.login id={} role={}", identity.id, identity.role);
        self.tx.send_replace(Some(identity));
    }

    /// Clears the identity, returning what was there.
    pub fn logout(&self) -> Option<Identity> {
        self.tx.send_replace(None)
    }

    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }
}

/// Server-side state bound to one browser cookie.
#[derive(Debug)]
pub struct ClientSession {
    pub token: SessionToken,
    pub csrf: String,
    pub holder: SessionHolder,
    pub view: View,
    pub login_form: LoginForm,
    pub issued_at: Instant,
    pub expires_at: Instant,
}

pub type SharedClientSession = Arc<Mutex<ClientSession>>;

fn gen_id() -> Result<String> {
    // 256-bit random token base64url without padding
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| anyhow!("session token entropy: {e}"))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

/// Token -> client session map. Cheap to clone; clones share the map.
#[derive(Clone)]
pub struct SessionManager {
    pub ttl: Duration,
    sessions: Arc<RwLock<HashMap<SessionToken, SharedClientSession>>>,
}

impl Default for SessionManager {
    fn default() -> Self { Self::new(Duration::from_secs(60 * 60)) }
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, sessions: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub fn open(&self) -> Result<SharedClientSession> {
        let now = Instant::now();
        let token = gen_id()?;
        let sess = ClientSession {
            token: token.clone(),
            csrf: gen_id()?,
            holder: SessionHolder::new(),
            view: View::default(),
            login_form: LoginForm::default(),
            issued_at: now,
            expires_at: now + self.ttl,
        };
        let shared = Arc::new(Mutex::new(sess));
        self.sessions.write().insert(token.clone(), shared.clone());
        tprintln!("session.open ttl_secs={}", self.ttl.as_secs());
        Ok(shared)
    }

    /// Live session for `token`; expired entries are dropped on access.
    pub fn get(&self, token: &str) -> Option<SharedClientSession> {
        let now = Instant::now();
        let found = self.sessions.read().get(token).cloned()?;
        let expired = found.lock().expires_at <= now;
        if expired {
            self.close(token);
            return None;
        }
        Some(found)
    }

    /// Slides the expiry forward.
    pub fn touch(&self, token: &str) -> bool {
        match self.sessions.read().get(token) {
            Some(s) => {
                s.lock().expires_at = Instant::now() + self.ttl;
                true
            }
            None => false,
        }
    }

    pub fn close(&self, token: &str) -> bool {
        let removed = self.sessions.write().remove(token);
        if let Some(s) = &removed {
            // an abandoned in-flight submission must not log anyone in later
            s.lock().login_form.cancel();
        }
        removed.is_some()
    }

    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<SessionToken> = self
            .sessions
            .read()
            .iter()
            .filter(|(_, s)| s.lock().expires_at <= now)
            .map(|(k, _)| k.clone())
            .collect();
        let count = expired.iter().filter(|t| self.close(t)).count();
        if count > 0 {
            debug!(removed = count, "session_sweep");
        }
        count
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
