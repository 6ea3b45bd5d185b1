use std::env;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use x11rb::connect;

use crate::authentication::AuthenticatedUser;
use crate::common::{EmpttyError, PathSettings, ProcessHandle, Result, Settings, System};
use crate::fs::{file_exists, remove_file};
use super::command_as_user;
use super::environment::{ENV_DISPLAY, ENV_XAUTHORITY};

const MAX_DISPLAYS: u32 = 32;
const CONNECTION_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Checks whether an X server accepts clients: `(display, authority file path)`.
pub type ReadinessCheck = fn(&str, &str) -> bool;

/// The `AuthorityFile` struct owns the X authority file of a session. The file is removed
/// when the guard is dropped.
pub struct AuthorityFile {
    path: String,
    removed: bool,
}

impl AuthorityFile {
    /// Takes ownership of an authority file path, removing any stale file left at it.
    pub fn create(path: &str) -> Result<AuthorityFile> {
        remove_file(path)?;
        Ok(AuthorityFile {
            path: path.to_string(),
            removed: false,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Removes the authority file now rather than on drop.
    pub fn remove(mut self) {
        self.remove_once();
    }

    fn remove_once(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;

        match remove_file(&self.path) {
            Ok(_) => debug!("Removed authority file {}", self.path),
            Err(error) => warn!("Failed to remove authority file {}: {}", self.path, error),
        }
    }
}

impl Drop for AuthorityFile {
    fn drop(&mut self) {
        self.remove_once();
    }
}

/// The `DisplayServer` struct owns a running Xorg process. The server is interrupted and
/// reaped when the guard is dropped.
pub struct DisplayServer {
    display_id: u32,
    process: ProcessHandle,
    stopped: bool,
}

impl DisplayServer {
    fn new(display_id: u32, process: ProcessHandle) -> Self {
        Self {
            display_id,
            process,
            stopped: false,
        }
    }

    pub fn display(&self) -> String {
        format!(":{}", self.display_id)
    }

    pub fn process(&self) -> &ProcessHandle {
        &self.process
    }

    pub fn pid(&self) -> u32 {
        self.process.pid()
    }

    /// Stops the server and waits for it to exit.
    pub fn stop(mut self) {
        self.stop_once();
    }

    fn stop_once(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        debug!("Stopping Xorg on display {}", self.display());
        self.process.interrupt_and_wait();
    }
}

impl Drop for DisplayServer {
    fn drop(&mut self) {
        self.stop_once();
    }
}

/// The `XorgService` struct provides the steps of starting an Xorg server for a user:
/// picking a free display, creating the authorization token and launching the server.
pub struct XorgService {
    paths: PathSettings,
    tty: u32,
    xorg_args: String,
    start_timeout: Duration,
    readiness_check: ReadinessCheck,
}

impl XorgService {
    /// Creates a new `XorgService` instance.
    ///
    /// # Arguments
    /// * `settings` - The settings holding the executable paths, tty and Xorg options.
    pub fn new(settings: &Settings) -> Self {
        Self {
            paths: settings.paths.clone(),
            tty: settings.tty,
            xorg_args: settings.xorg_args.clone(),
            start_timeout: Duration::from_secs(settings.xorg_start_timeout),
            readiness_check: Self::is_xorg_ready,
        }
    }

    /// Replaces the check confirming that a started server accepts clients. The default
    /// connects an X11 client with the session's authority file.
    pub fn with_readiness_check(mut self, readiness_check: ReadinessCheck) -> Self {
        self.readiness_check = readiness_check;
        self
    }

    /// Finds the lowest display number without an X lock file.
    ///
    /// # Returns
    /// A `Result` containing the display number or a `DisplayStartError` when all are taken.
    pub fn get_free_display(&self) -> Result<u32> {
        (0..MAX_DISPLAYS)
            .find(|id| !file_exists(&format!("{}/.X{}-lock", self.paths.x_lock_dir, id)))
            .ok_or_else(|| EmpttyError::DisplayStartError(format!("No free display found below :{}", MAX_DISPLAYS)))
    }

    /// Generates an authorization cookie as the user, using mcookie when available and
    /// 16 random bytes otherwise. The cookie is a 32-character hex string.
    pub fn create_cookie(&self, user: &AuthenticatedUser) -> String {
        match System::output(&mut command_as_user(&self.paths.mcookie, user)) {
            Ok(cookie) if !cookie.is_empty() => cookie,
            Ok(_) => Self::random_cookie(),
            Err(error) => {
                debug!("mcookie unavailable ({}), generating cookie", error);
                Self::random_cookie()
            }
        }
    }

    fn random_cookie() -> String {
        let bytes: [u8; 16] = rand::random();
        hex::encode(bytes)
    }

    /// Adds an authorization token for a display to the authority file, as the user.
    ///
    /// # Arguments
    /// * `user` - The user owning the session.
    /// * `display_id` - The display number.
    /// * `authority` - The authority file receiving the token.
    pub fn create_token(&self, user: &AuthenticatedUser, display_id: u32, authority: &AuthorityFile) -> Result<()> {
        debug!("Creating xauth token for display :{} and user {}", display_id, user.username());
        let cookie = self.create_cookie(user);
        let mut command = command_as_user(&self.paths.xauth, user);
        command
            .arg("-f")
            .arg(authority.path())
            .arg("add")
            .arg(format!(":{}", display_id))
            .arg(".")
            .arg(cookie);

        System::output(&mut command)
            .map(|_| ())
            .map_err(|error| EmpttyError::DisplayStartError(format!("Failed to create xauth token: {}", error)))
    }

    /// Spawns the Xorg server on the configured virtual terminal.
    ///
    /// # Arguments
    /// * `user` - The user owning the session, providing the environment.
    /// * `display_id` - The display number.
    /// * `authority` - The authority file the server checks clients against.
    ///
    /// # Returns
    /// A `Result` containing the running `DisplayServer` or a `DisplayStartError`.
    pub fn spawn_x_server(&self, user: &AuthenticatedUser, display_id: u32, authority: &AuthorityFile) -> Result<DisplayServer> {
        debug!("Launching x server on display :{}", display_id);
        let display = format!(":{}", display_id);
        let vt = format!("vt{}", self.tty);

        let mut command = Command::new(&self.paths.xorg);
        command
            .args([vt.as_str(), display.as_str(), "-auth", authority.path()])
            .args(self.xorg_args.split_whitespace())
            .env_clear()
            .envs(user.environment())
            .stdin(Stdio::null());

        debug!("Spawning command: {}", format!("{:?}", command).replace('\"', ""));
        let process = ProcessHandle::new(&mut command).map_err(|error| {
            EmpttyError::DisplayStartError(format!("Failed to spawn Xorg server: {}", error))
        })?;

        Ok(DisplayServer::new(display_id, process))
    }

    /// Waits until the server accepts an authorized X11 client connection.
    ///
    /// # Arguments
    /// * `server` - The started display server.
    /// * `authority` - The authority file holding the client token.
    pub fn wait_for_x_server(&self, server: &DisplayServer, authority: &AuthorityFile) -> Result<()> {
        let started = Instant::now();
        loop {
            if server.process().is_running() != Some(true) {
                return Err(EmpttyError::DisplayStartError(format!("Xorg on display {} is not running", server.display())));
            }

            if (self.readiness_check)(&server.display(), authority.path()) {
                info!("Xorg ready on display {} [pid={}]", server.display(), server.pid());
                return Ok(());
            }

            if started.elapsed() >= self.start_timeout {
                return Err(EmpttyError::DisplayStartError(format!(
                    "Xorg on display {} did not accept connections within {}s",
                    server.display(),
                    self.start_timeout.as_secs()
                )));
            }

            thread::sleep(CONNECTION_RETRY_INTERVAL);
        }
    }

    fn is_xorg_ready(display: &str, authority_path: &str) -> bool {
        let old_display = env::var(ENV_DISPLAY).ok();
        let old_xauth = env::var(ENV_XAUTHORITY).ok();

        env::set_var(ENV_DISPLAY, display);
        env::set_var(ENV_XAUTHORITY, authority_path);

        let result = connect(None).is_ok();

        match old_display {
            Some(value) => env::set_var(ENV_DISPLAY, value),
            None => env::remove_var(ENV_DISPLAY),
        }
        match old_xauth {
            Some(value) => env::set_var(ENV_XAUTHORITY, value),
            None => env::remove_var(ENV_XAUTHORITY),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authentication::Account;
    use std::fs;

    fn service(lock_dir: &str) -> XorgService {
        let mut settings = Settings::default();
        settings.paths.x_lock_dir = lock_dir.to_string();
        settings.paths.mcookie = "/nonexistent/mcookie".to_string();
        settings.paths.xorg = "/nonexistent/Xorg".to_string();
        XorgService::new(&settings)
    }

    fn user() -> AuthenticatedUser {
        let uid = System::get_current_user_uid();
        AuthenticatedUser::new(Account::new("alice", "/tmp", "/bin/sh", uid, uid, vec![]), vec![])
    }

    #[test]
    fn free_display_skips_locked_displays() {
        let dir = tempfile::tempdir().unwrap();
        let lock_dir = dir.path().to_str().unwrap();
        let service = service(lock_dir);

        assert_eq!(service.get_free_display().unwrap(), 0);

        fs::write(dir.path().join(".X0-lock"), "").unwrap();
        fs::write(dir.path().join(".X1-lock"), "").unwrap();
        fs::write(dir.path().join(".X3-lock"), "").unwrap();
        assert_eq!(service.get_free_display().unwrap(), 2);
    }

    #[test]
    fn no_free_display_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        for id in 0..MAX_DISPLAYS {
            fs::write(dir.path().join(format!(".X{}-lock", id)), "").unwrap();
        }

        let result = service(dir.path().to_str().unwrap()).get_free_display();
        assert!(matches!(result, Err(EmpttyError::DisplayStartError(_))));
    }

    #[test]
    fn cookie_falls_back_to_random_bytes() {
        let cookie = service("/tmp").create_cookie(&user());

        assert_eq!(cookie.len(), 32);
        assert!(cookie.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn authority_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".emptty-xauth");
        let path = path.to_str().unwrap();
        fs::write(path, "stale").unwrap();

        let authority = AuthorityFile::create(path).unwrap();
        assert!(!file_exists(path));

        fs::write(path, "token").unwrap();
        drop(authority);
        assert!(!file_exists(path));
    }

    #[test]
    fn missing_xorg_fails_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let authority = AuthorityFile::create(dir.path().join("xauth").to_str().unwrap()).unwrap();

        let result = service("/tmp").spawn_x_server(&user(), 0, &authority);
        assert!(matches!(result, Err(EmpttyError::DisplayStartError(_))));
    }

    #[test]
    fn readiness_is_confirmed_while_the_server_runs() {
        let dir = tempfile::tempdir().unwrap();
        let xorg = dir.path().join("Xorg");
        fs::write(&xorg, "#!/bin/sh\nexec sleep 30\n").unwrap();
        crate::fs::chmod(xorg.to_str().unwrap(), 0o755).unwrap();

        let mut settings = Settings::default();
        settings.paths.xorg = xorg.to_str().unwrap().to_string();
        settings.xorg_start_timeout = 1;
        let authority = AuthorityFile::create(dir.path().join("xauth").to_str().unwrap()).unwrap();

        let ready = XorgService::new(&settings).with_readiness_check(|display, _| display == ":5");
        let server = ready.spawn_x_server(&user(), 5, &authority).unwrap();
        ready.wait_for_x_server(&server, &authority).unwrap();

        let never_ready = XorgService::new(&settings).with_readiness_check(|_, _| false);
        let result = never_ready.wait_for_x_server(&server, &authority);
        assert!(matches!(result, Err(EmpttyError::DisplayStartError(_))));

        let process = server.process().clone();
        server.stop();
        assert_eq!(process.is_running(), Some(false));
    }
}
