use std::env;

use crate::authentication::AuthenticatedUser;
use crate::common::{EmpttyError, ProcessHandle, Result, Settings};
use crate::desktop::{Protocol, ResolvedDesktop};
use crate::fs::file_exists;
use super::command_as_user;
use super::environment::ENV_SESSION_BUS_ADDRESS;

const XINITRC: &str = ".xinitrc";
const DBUS_LAUNCH: &str = "dbus-launch";

/// The `SessionCommand` struct is the command line starting the desktop, run through the
/// user's login shell: `<shell> --login -c "<invocation>"`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCommand {
    shell: String,
    invocation: String,
}

impl SessionCommand {
    /// Builds the session command of a desktop.
    ///
    /// # Arguments
    /// * `user` - The user running the session, providing the shell and home directory.
    /// * `desktop` - The resolved desktop.
    /// * `settings` - The settings holding the xinitrc, dbus-launch and session wrapper options.
    pub fn build(user: &AuthenticatedUser, desktop: &ResolvedDesktop, settings: &Settings) -> Self {
        let invocation = match desktop {
            ResolvedDesktop::Menu { menu, child } => format!("{} {}", menu.path(), child.exec()),
            ResolvedDesktop::Leaf(descriptor) => {
                // A descriptor without exec is a script run directly, never prefixed
                let (mut invocation, mut allow_prefix) = if descriptor.exec().is_empty() {
                    (descriptor.path().to_string(), false)
                } else {
                    (descriptor.exec().to_string(), true)
                };

                let xinitrc = format!("{}/{}", user.home(), XINITRC);
                if descriptor.protocol() == Protocol::X11
                    && settings.xinitrc_launch
                    && allow_prefix
                    && !invocation.contains(XINITRC)
                    && file_exists(&xinitrc) {
                    invocation = format!("{} {}", xinitrc, invocation);
                    allow_prefix = false;
                }

                let has_bus = env::var(ENV_SESSION_BUS_ADDRESS).map(|address| !address.is_empty()).unwrap_or(false);
                if settings.dbus_launch && allow_prefix && !has_bus && !invocation.contains(DBUS_LAUNCH) {
                    invocation = format!("{} {}", DBUS_LAUNCH, invocation);
                }

                if !settings.session_wrapper.is_empty() {
                    invocation = format!("{} {}", settings.session_wrapper, invocation);
                }

                invocation
            }
        };

        Self {
            shell: user.account().shell().to_string(),
            invocation: invocation.split_whitespace().collect::<Vec<&str>>().join(" "),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    pub fn invocation(&self) -> &str {
        &self.invocation
    }

    pub fn args(&self) -> [&str; 3] {
        ["--login", "-c", &self.invocation]
    }

    /// Starts the session command as the user.
    pub fn spawn(&self, user: &AuthenticatedUser) -> Result<ProcessHandle> {
        let mut command = command_as_user(&self.shell, user);
        command.args(self.args());

        debug!("Spawning command: {}", format!("{:?}", command).replace('\"', ""));
        ProcessHandle::new(&mut command).map_err(|error| {
            EmpttyError::SessionCommandError(format!("Failed to start \"{}\": {}", self.invocation, error))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authentication::Account;
    use crate::desktop::DesktopDescriptor;
    use std::fs;

    fn user(home: &str) -> AuthenticatedUser {
        AuthenticatedUser::new(Account::new("alice", home, "/bin/bash", 1000, 1000, vec![]), vec![])
    }

    fn leaf(protocol: Protocol, exec: &str) -> ResolvedDesktop {
        ResolvedDesktop::Leaf(DesktopDescriptor::new(protocol, "desktop", exec, "/usr/share/xsessions/desktop.desktop", false))
    }

    #[test]
    fn exec_runs_through_the_login_shell() {
        let command = SessionCommand::build(&user("/home/alice"), &leaf(Protocol::X11, "startxfce4"), &Settings::default());

        assert_eq!(command.shell(), "/bin/bash");
        assert_eq!(command.args(), ["--login", "-c", "startxfce4"]);
    }

    #[test]
    fn menu_runs_the_child_through_the_menu_script() {
        let desktop = ResolvedDesktop::Menu {
            menu: DesktopDescriptor::new(Protocol::X11, "", "", "/home/alice/.config/emptty", true),
            child: DesktopDescriptor::new(Protocol::Wayland, "sway", "sway", "", false),
        };
        let settings = Settings { session_wrapper: "wrapper".to_string(), ..Settings::default() };

        let command = SessionCommand::build(&user("/home/alice"), &desktop, &settings);

        assert_eq!(command.invocation(), "/home/alice/.config/emptty sway");
    }

    #[test]
    fn xinitrc_prefixes_x11_sessions_only_when_present() {
        let home = tempfile::tempdir().unwrap();
        let home_path = home.path().to_str().unwrap();
        let settings = Settings { xinitrc_launch: true, ..Settings::default() };

        let command = SessionCommand::build(&user(home_path), &leaf(Protocol::X11, "i3"), &settings);
        assert_eq!(command.invocation(), "i3");

        fs::write(home.path().join(".xinitrc"), "exec \"$@\"\n").unwrap();
        let command = SessionCommand::build(&user(home_path), &leaf(Protocol::X11, "i3"), &settings);
        assert_eq!(command.invocation(), format!("{}/.xinitrc i3", home_path));

        let command = SessionCommand::build(&user(home_path), &leaf(Protocol::Wayland, "sway"), &settings);
        assert_eq!(command.invocation(), "sway");
    }

    #[test]
    fn session_wrapper_prefixes_the_invocation() {
        let settings = Settings { session_wrapper: "/usr/bin/wrap  --quiet".to_string(), ..Settings::default() };
        let command = SessionCommand::build(&user("/home/alice"), &leaf(Protocol::Wayland, "sway  -d"), &settings);

        assert_eq!(command.invocation(), "/usr/bin/wrap --quiet sway -d");
    }

    #[test]
    fn descriptor_without_exec_runs_its_path() {
        let desktop = ResolvedDesktop::Leaf(DesktopDescriptor::new(Protocol::Wayland, "", "", "/home/alice/.emptty", false));
        let settings = Settings { dbus_launch: true, ..Settings::default() };

        let command = SessionCommand::build(&user("/home/alice"), &desktop, &settings);

        assert_eq!(command.invocation(), "/home/alice/.emptty");
    }
}
