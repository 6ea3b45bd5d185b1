use std::env;
use std::fmt;

use uuid::Uuid;

use crate::accounting::Accounting;
use crate::authentication::{AuthProvider, AuthenticatedUser, Authenticator};
use crate::common::{EmpttyError, ProcessHandle, Result, SessionContainer, SessionInfo, Settings};
use crate::desktop::{DesktopResolver, DesktopSelector, Protocol, ResolvedDesktop};
use crate::fs::{chown, mkdir};
use super::display_script::run_display_script;
use super::environment::{build_environment, ENV_DISPLAY, ENV_XAUTHORITY, ENV_XDG_RUNTIME_DIR, ENV_XDG_SESSION_TYPE};
use super::{AuthorityFile, SessionCommand, Supervisor, XorgService};

const AUTHORITY_FILE_NAME: &str = ".emptty-xauth";

/// The steps of a login session. A session moves forward only and ends in either
/// `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Created,
    Authenticate,
    SelectDesktop,
    BuildEnvironment,
    StartDisplay,
    Supervise,
    Teardown,
    Completed,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The `Session` struct drives a single login on the configured TTY: authentication,
/// desktop resolution, environment, display start, supervision and teardown.
pub struct Session<P: AuthProvider> {
    id: String,
    settings: Settings,
    authenticator: Authenticator<P>,
    accounting: Accounting,
    sessions: SessionContainer,
    selector: DesktopSelector,
    xorg: XorgService,
    supervisor: Option<Supervisor>,
    state: SessionState,
}

impl<P: AuthProvider> Session<P> {
    /// Creates a new `Session`.
    ///
    /// # Arguments
    /// * `settings` - The application settings.
    /// * `provider` - The authentication provider, owned by the session until it ends.
    /// * `accounting` - Where logins and failed logins are recorded.
    /// * `sessions` - The registry the session is listed in while it is supervised.
    /// * `selector` - The desktop chooser used when the user has no saved desktop.
    pub fn new(settings: Settings, provider: P, accounting: Accounting, sessions: SessionContainer, selector: DesktopSelector) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            xorg: XorgService::new(&settings),
            settings,
            authenticator: Authenticator::new(provider),
            accounting,
            sessions,
            selector,
            supervisor: None,
            state: SessionState::Created,
        }
    }

    /// Replaces the service starting Xorg for X11 desktops.
    pub fn with_xorg_service(mut self, xorg: XorgService) -> Self {
        self.xorg = xorg;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the session to its end. Teardown always happens once, whatever the outcome.
    ///
    /// # Returns
    /// `Ok` when the session command ran and finished, or the error that stopped the session.
    pub fn run(&mut self) -> Result<()> {
        if self.state != SessionState::Created {
            return Err(EmpttyError::SystemError(format!("Session {} has already run", self.id)));
        }

        let result = self.execute();
        if let Err(error) = &result {
            error!("Session {} failed in state {}: {}", self.id, self.state, error);
        }

        self.teardown();
        self.supervisor = None;
        self.set_state(if result.is_ok() { SessionState::Completed } else { SessionState::Failed });
        result
    }

    fn set_state(&mut self, state: SessionState) {
        debug!("Session {}: {} -> {}", self.id, self.state, state);
        self.state = state;
    }

    fn execute(&mut self) -> Result<()> {
        self.set_state(SessionState::Authenticate);
        let mut user = self.authenticator.authenticate(&self.settings, &self.accounting)?;

        self.set_state(SessionState::SelectDesktop);
        let resolver = DesktopResolver::new(&self.settings.paths);
        let (desktop, lang) = resolver.resolve_desktop(user.home(), &self.settings, &mut self.selector)?;
        info!("Starting {} for {}", desktop, user.username());

        let mut settings = self.settings.clone();
        if let Some(lang) = lang {
            settings.lang = lang;
        }
        build_environment(&mut user, &settings, &desktop);

        self.set_state(SessionState::BuildEnvironment);
        self.supervisor = match Supervisor::supervise_on_interrupt(Vec::new()) {
            Ok(supervisor) => Some(supervisor),
            Err(error) => {
                warn!("Failed to install signal handlers: {}", error);
                None
            }
        };

        let runtime_dir = self.prepare_runtime_dir(&user)?;
        if let Err(error) = env::set_current_dir(user.home()) {
            warn!("Failed to change directory to {}: {}", user.home(), error);
        }
        run_display_script(&settings.display_start_script);

        self.set_state(SessionState::StartDisplay);
        self.check_interrupted()?;
        match desktop.protocol() {
            Protocol::X11 => self.start_x11(&mut user, &desktop, &settings, &runtime_dir),
            Protocol::Wayland => self.start_wayland(&mut user, &desktop, &settings),
        }
    }

    fn prepare_runtime_dir(&self, user: &AuthenticatedUser) -> Result<String> {
        let runtime_dir = user.getenv(ENV_XDG_RUNTIME_DIR)
            .map(str::to_string)
            .unwrap_or_else(|| self.settings.paths.runtime_dir_for_uid(user.uid()));

        let created = mkdir(&runtime_dir, 0o700)
            .map_err(|error| EmpttyError::EnvironmentError(format!("Failed to create runtime directory {}: {}", runtime_dir, error)))?;
        if created {
            debug!("Created runtime directory {}", runtime_dir);
        }

        chown(&runtime_dir, user.uid(), user.gid())
            .map_err(|error| EmpttyError::EnvironmentError(format!("Failed to change owner of {}: {}", runtime_dir, error)))?;

        Ok(runtime_dir)
    }

    fn start_x11(&mut self, user: &mut AuthenticatedUser, desktop: &ResolvedDesktop, settings: &Settings, runtime_dir: &str) -> Result<()> {
        user.setenv(ENV_XDG_SESSION_TYPE, Protocol::X11.session_type());

        let xorg = &self.xorg;
        let display_id = xorg.get_free_display()?;
        let display = format!(":{}", display_id);

        let authority = AuthorityFile::create(&format!("{}/{}", runtime_dir, AUTHORITY_FILE_NAME))?;
        user.setenv(ENV_DISPLAY, &display);
        user.setenv(ENV_XAUTHORITY, authority.path());

        xorg.create_token(user, display_id, &authority)?;
        let server = xorg.spawn_x_server(user, display_id, &authority)?;
        self.watch(vec![server.process().clone()])?;
        self.xorg.wait_for_x_server(&server, &authority)?;
        self.check_interrupted()?;

        let entry = self.accounting.open(user.username(), server.pid(), &settings.tty_id(), &display);

        let command = SessionCommand::build(user, desktop, settings).spawn(user)?;
        self.watch(vec![command.clone(), server.process().clone()])?;
        self.supervise(user, desktop, &display, &command);

        server.stop();
        authority.remove();
        entry.close();
        Ok(())
    }

    fn start_wayland(&mut self, user: &mut AuthenticatedUser, desktop: &ResolvedDesktop, settings: &Settings) -> Result<()> {
        user.setenv(ENV_XDG_SESSION_TYPE, Protocol::Wayland.session_type());

        let command = SessionCommand::build(user, desktop, settings).spawn(user)?;
        let entry = self.accounting.open(user.username(), command.pid(), &settings.tty_id(), "");
        self.watch(vec![command.clone()])?;

        self.supervise(user, desktop, "", &command);

        entry.close();
        Ok(())
    }

    /// Sets the processes stopped, in order, when a termination signal is received.
    fn watch(&self, processes: Vec<ProcessHandle>) -> Result<()> {
        match &self.supervisor {
            Some(supervisor) => supervisor.supervise(processes),
            None => Ok(()),
        }
    }

    fn check_interrupted(&self) -> Result<()> {
        match &self.supervisor {
            Some(supervisor) if supervisor.is_interrupted() => {
                Err(EmpttyError::SystemError(format!("Session {} was interrupted", self.id)))
            }
            _ => Ok(()),
        }
    }

    /// Waits for the session command while signals are forwarded to the session processes.
    /// The exit status of the command does not affect the outcome of the session.
    fn supervise(&mut self, user: &AuthenticatedUser, desktop: &ResolvedDesktop, display: &str, command: &ProcessHandle) {
        self.set_state(SessionState::Supervise);
        self.sessions.add_session(SessionInfo {
            id: self.id.clone(),
            username: user.username().to_string(),
            tty: self.settings.tty_name(),
            display: display.to_string(),
            protocol: desktop.protocol().to_string(),
            desktop: desktop.session_name().unwrap_or_default().to_string(),
        });

        match command.wait() {
            Ok(status) => info!("Session command [pid={}] finished with {}", command.pid(), status),
            Err(error) => warn!("Failed to wait for session command [pid={}]: {}", command.pid(), error),
        }

        self.sessions.remove_session(&self.id);
    }

    fn teardown(&mut self) {
        self.set_state(SessionState::Teardown);
        self.authenticator.close_session();
        run_display_script(&self.settings.display_stop_script);
    }
}
