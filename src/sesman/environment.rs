use std::env;

use crate::authentication::AuthenticatedUser;
use crate::common::Settings;
use crate::desktop::ResolvedDesktop;

pub const ENV_XDG_CONFIG_HOME: &str = "XDG_CONFIG_HOME";
pub const ENV_XDG_RUNTIME_DIR: &str = "XDG_RUNTIME_DIR";
pub const ENV_XDG_SESSION_TYPE: &str = "XDG_SESSION_TYPE";
pub const ENV_XDG_SESSION_CLASS: &str = "XDG_SESSION_CLASS";
pub const ENV_XDG_SEAT: &str = "XDG_SEAT";
pub const ENV_XDG_SESSION_DESKTOP: &str = "XDG_SESSION_DESKTOP";
pub const ENV_HOME: &str = "HOME";
pub const ENV_PWD: &str = "PWD";
pub const ENV_USER: &str = "USER";
pub const ENV_LOGNAME: &str = "LOGNAME";
pub const ENV_XAUTHORITY: &str = "XAUTHORITY";
pub const ENV_DISPLAY: &str = "DISPLAY";
pub const ENV_SHELL: &str = "SHELL";
pub const ENV_LANG: &str = "LANG";
pub const ENV_PATH: &str = "PATH";
pub const ENV_DESKTOP_SESSION: &str = "DESKTOP_SESSION";
pub const ENV_SESSION_BUS_ADDRESS: &str = "DBUS_SESSION_BUS_ADDRESS";

const SEAT: &str = "seat0";
const SESSION_CLASS: &str = "user";

/// Defines the session environment of an authenticated user. The PAM environment is
/// applied first, then the derived variables, so building twice gives the same result.
///
/// # Arguments
/// * `user` - The user whose environment is set.
/// * `settings` - The settings holding the locale and the runtime directory root.
/// * `desktop` - The final resolved desktop.
pub fn build_environment(user: &mut AuthenticatedUser, settings: &Settings, desktop: &ResolvedDesktop) {
    let provider_environment = user.provider_environment().clone();
    for (key, value) in provider_environment.iter() {
        user.setenv(key, value);
    }

    let home = user.home().to_string();
    let username = user.username().to_string();
    let shell = user.account().shell().to_string();

    user.setenv(ENV_HOME, &home);
    user.setenv(ENV_PWD, &home);
    user.setenv(ENV_USER, &username);
    user.setenv(ENV_LOGNAME, &username);
    user.setenv(ENV_XDG_CONFIG_HOME, &format!("{}/.config", home));
    user.setenv(ENV_XDG_RUNTIME_DIR, &settings.paths.runtime_dir_for_uid(user.uid()));
    user.setenv(ENV_XDG_SEAT, SEAT);
    user.setenv(ENV_XDG_SESSION_CLASS, SESSION_CLASS);
    user.setenv(ENV_SHELL, &shell);
    user.setenv(ENV_LANG, &settings.lang);
    user.setenv(ENV_PATH, &env::var(ENV_PATH).unwrap_or_default());

    if let Some(name) = desktop.session_name() {
        user.setenv(ENV_DESKTOP_SESSION, name);
        user.setenv(ENV_XDG_SESSION_DESKTOP, name);
    }

    match env::var(ENV_SESSION_BUS_ADDRESS) {
        Ok(address) if !address.is_empty() => user.setenv(ENV_SESSION_BUS_ADDRESS, &address),
        _ => {}
    }

    debug!("Defined environment for {}", username);
}
