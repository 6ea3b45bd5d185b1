pub use authenticator::Authenticator;
pub use account::{Account, DEFAULT_SHELL};
pub use authenticated_user::AuthenticatedUser;
pub use conversation::TerminalConversation;
pub use provider::{AuthProvider, PamProvider};

mod authenticator;
mod account;
mod authenticated_user;
mod conversation;
mod provider;
