//! Identity, per-browser session state, and the role gate.
//! Keep the public surface thin and split implementation across sub-modules.

mod role;
mod principal;
mod session;
mod provider;
mod authorizer;

pub use role::Role;
pub use principal::{Identity, display_name_for};
pub use session::{ClientSession, SessionHolder, SessionManager, SessionToken, SharedClientSession};
pub use provider::{AccountAuthProvider, AuthProvider, DemoAuthProvider, FormMode, LoginRequest};
pub use authorizer::{View, can_access, resolve_view, visible_views};
