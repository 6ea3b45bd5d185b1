use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use nix::unistd::Uid;

pub static DEFAULT_CONFIG_PATH: &str = "/etc/emptty/config.yml";
pub static CONFIG_DIRECTORY_NAME: &str = "emptty.d";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingMode {
    /// A new log file per start, the previous one is kept with a `.old` suffix
    Default,
    /// All runs append to the same log file
    Appending,
    /// No log file is written
    Disabled,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub mode: LoggingMode,
    pub directory: String,
    pub format: Option<String>,
    pub console: Option<bool>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            mode: LoggingMode::Default,
            directory: "/var/log/emptty".to_string(),
            format: None,
            console: Some(false),
        }
    }
}

/// Locations of the helper binaries and system files used when launching a session.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PathSettings {
    pub xorg: String,
    pub xauth: String,
    pub mcookie: String,
    pub x_lock_dir: String,
    pub runtime_dir: String,
    pub xsessions: String,
    pub wayland_sessions: String,
    pub wtmp: String,
    pub btmp: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            xorg: "/usr/bin/Xorg".to_string(),
            xauth: "/usr/bin/xauth".to_string(),
            mcookie: "/usr/bin/mcookie".to_string(),
            x_lock_dir: "/tmp".to_string(),
            runtime_dir: "/run/user".to_string(),
            xsessions: "/usr/share/xsessions".to_string(),
            wayland_sessions: "/usr/share/wayland-sessions".to_string(),
            wtmp: "/var/log/wtmp".to_string(),
            btmp: "/var/log/btmp".to_string(),
        }
    }
}

impl PathSettings {
    /// Returns the XDG runtime directory of the given user.
    pub fn runtime_dir_for_uid(&self, uid: u32) -> String {
        format!("{}/{}", self.runtime_dir, uid)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControlSettings {
    pub enabled: bool,
    pub address: String,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "ipc:///run/emptty-control.ipc".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    pub tty: u32,
    pub switch_tty: bool,
    pub pam_service: String,
    pub default_user: String,
    pub autologin: bool,
    pub autologin_session: String,
    pub lang: String,
    pub dbus_launch: bool,
    pub xinitrc_launch: bool,
    pub vertical_selection: bool,
    pub xorg_args: String,
    /// Seconds to wait for Xorg to accept a client connection
    pub xorg_start_timeout: u64,
    pub fg_color: String,
    pub bg_color: String,
    pub display_start_script: String,
    pub display_stop_script: String,
    pub session_wrapper: String,
    pub daemon_mode: bool,
    pub logging: LoggingSettings,
    pub paths: PathSettings,
    pub control: ControlSettings,
}

impl Default for Settings {
    fn default() -> Self {
        let lang = std::env::var("LANG")
            .ok()
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| "en_US.UTF-8".to_string());

        Self {
            tty: 1,
            switch_tty: true,
            pam_service: "emptty".to_string(),
            default_user: String::new(),
            autologin: false,
            autologin_session: String::new(),
            lang,
            dbus_launch: false,
            xinitrc_launch: false,
            vertical_selection: false,
            xorg_args: String::new(),
            xorg_start_timeout: 10,
            fg_color: String::new(),
            bg_color: String::new(),
            display_start_script: String::new(),
            display_stop_script: String::new(),
            session_wrapper: String::new(),
            daemon_mode: false,
            logging: LoggingSettings::default(),
            paths: PathSettings::default(),
            control: ControlSettings::default(),
        }
    }
}

impl Settings {
    /// Loads the settings from the main configuration file, the `emptty.d` drop-in
    /// directory next to it and `EMPTTY_` environment variables, in that order.
    ///
    /// # Arguments
    /// * `config_path` - Path to the main configuration file, empty for the default one.
    pub fn new(config_path: &str) -> Result<Self, config::ConfigError> {
        let config_path = if config_path.is_empty() { DEFAULT_CONFIG_PATH } else { config_path };

        let mut builder = config::Config::builder()
            .add_source(config::File::new(config_path, config::FileFormat::Yaml).required(false));

        let config_dir = Path::new(config_path)
            .parent()
            .map(|parent| parent.join(CONFIG_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIRECTORY_NAME));

        for drop_in in Self::drop_in_files(&config_dir) {
            builder = builder.add_source(config::File::from(drop_in).format(config::FileFormat::Yaml));
        }

        builder
            .add_source(config::Environment::with_prefix("EMPTTY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Lists the drop-in files of a configuration directory (`NN_name.yml`) sorted by name.
    pub fn drop_in_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .filter(|path| path.file_name()
                    .and_then(|name| name.to_str())
                    .map(Self::is_drop_in_name)
                    .unwrap_or(false))
                .collect(),
            Err(_) => Vec::new(),
        };
        files.sort();
        files
    }

    fn is_drop_in_name(name: &str) -> bool {
        let bytes = name.as_bytes();
        bytes.len() > 3
            && bytes[0].is_ascii_digit()
            && bytes[1].is_ascii_digit()
            && bytes[2] == b'_'
            && !name.contains(char::is_whitespace)
            && (name.ends_with(".yml") || name.ends_with(".yaml"))
    }

    /// Returns the configured TTY number as used in accounting records and PAM_TTY.
    pub fn tty_id(&self) -> String {
        self.tty.to_string()
    }

    /// Returns the name of the terminal device, e.g. `tty1`.
    pub fn tty_name(&self) -> String {
        format!("tty{}", self.tty)
    }

    pub fn default_user(&self) -> Option<&str> {
        if self.default_user.is_empty() {
            None
        } else {
            Some(&self.default_user)
        }
    }

    pub fn verify(&self) -> bool {
        if !Uid::effective().is_root() {
            error!("emptty has to be run as root");
            return false;
        }

        if self.tty == 0 {
            error!("TTY number must be greater than 0");
            return false;
        }

        if self.autologin && self.default_user.is_empty() {
            error!("Autologin requires a default user");
            return false;
        }

        true
    }
}
