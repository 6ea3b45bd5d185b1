pub use environment::build_environment;
pub use session::{Session, SessionState};
pub use session_command::SessionCommand;
pub use supervisor::Supervisor;
pub use user_command::command_as_user;
pub use xorg_service::{AuthorityFile, DisplayServer, ReadinessCheck, XorgService};

pub mod environment;
mod display_script;
mod session;
mod session_command;
mod supervisor;
mod user_command;
mod xorg_service;
