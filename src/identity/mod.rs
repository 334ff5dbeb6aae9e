//! Central identity and session management: the auth-provider boundary, the
//! reactive session cell and the role resolver that binds the two together.
//! Keep the public surface thin and split implementation across sub-modules.

mod authorizer;
mod principal;
mod provider;
mod resolver;
mod session;

pub use authorizer::{check_command_allowed, CommandKind, Role};
pub use principal::Identity;
pub use provider::{AuthListener, AuthProvider, LocalAuthProvider};
pub use resolver::{RoleResolver, DEFAULT_ROLE};
pub use session::{SessionCell, SessionSnapshot, SessionWatcher};
