use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::accounting::Accounting;
use crate::authentication::{PamProvider, TerminalConversation};
use crate::common::{EmpttyError, Result, SessionContainer, Settings, System};
use crate::desktop::DesktopSelector;
use crate::sesman::Session;
use super::control::ControlServer;
use super::tty::switch_tty;

/// Represents the main application: it runs one login session on the configured TTY and,
/// when enabled, the control endpoint alongside it.
pub struct Application {
    sessions: SessionContainer,
}

impl Application {
    /// Creates a new instance of the `Application`.
    pub fn new() -> Self {
        Self {
            sessions: SessionContainer::new(),
        }
    }

    /// Runs the application until the login session ends.
    ///
    /// # Arguments
    /// * `settings` - The application settings.
    ///
    /// # Returns
    /// * `Result<()>` - The outcome of the login session.
    pub fn run(&self, settings: &Settings) -> Result<()> {
        info!("Starting emptty on {}", settings.tty_name());

        if switch_tty(settings) {
            info!("Switched to {}", settings.tty_name());
        }

        let running = Arc::new(AtomicBool::new(true));
        let control_thread = if settings.control.enabled {
            Some(self.create_control_thread(settings, running.clone()))
        } else {
            None
        };

        let session_thread = self.create_session_thread(settings.clone());
        let result = session_thread.join()
            .unwrap_or_else(|_| Err(EmpttyError::SystemError("Session thread panicked".to_string())));

        running.store(false, Ordering::SeqCst);
        if let Some(control_thread) = control_thread {
            if control_thread.join().is_err() {
                error!("Control thread panicked");
            }
        }

        info!("emptty terminated");
        result
    }

    /// Creates the thread running the login session.
    fn create_session_thread(&self, settings: Settings) -> thread::JoinHandle<Result<()>> {
        let sessions = self.sessions.clone();
        thread::spawn(move || {
            let conversation = TerminalConversation::new(settings.autologin, settings.default_user(), &System::get_hostname())
                .with_colors(&settings.fg_color, &settings.bg_color);
            let accounting = Accounting::system(&settings.paths);

            let mut session = Session::new(settings, PamProvider::new(conversation), accounting, sessions, DesktopSelector::terminal());
            session.run()
        })
    }

    /// Creates the thread serving the control endpoint until `running` is cleared.
    fn create_control_thread(&self, settings: &Settings, running: Arc<AtomicBool>) -> thread::JoinHandle<()> {
        let control = ControlServer::new(zmq::Context::new(), &settings.control.address, self.sessions.clone());
        thread::spawn(move || {
            if let Err(error) = control.run(running) {
                error!("Control endpoint error: {}", error);
            }
        })
    }
}
