pub use application::Application;
pub use control::ControlServer;
pub use logging::{log_file_path, setup_logging};
pub use tty::switch_tty;

mod application;
mod control;
mod logging;
mod tty;
