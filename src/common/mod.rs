pub use error::{EmpttyError, Result};
pub use settings::{Settings, LoggingSettings, LoggingMode, PathSettings, ControlSettings};
pub use system::System;
pub use process_handle::ProcessHandle;
pub use session_container::{SessionContainer, SessionInfo};

pub mod color;
mod error;
mod settings;
mod system;
mod process_handle;
mod session_container;
