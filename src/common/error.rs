use std::error::Error;
use std::num::ParseIntError;
use std::result;
use std::string::FromUtf8Error;
use std::fmt;

pub type Result<T> = result::Result<T, EmpttyError>;

#[derive(Debug)]
pub enum EmpttyError {
    AuthenticationError(String),
    ResolutionError(String),
    EnvironmentError(String),
    DisplayStartError(String),
    SessionCommandError(String),
    AccountingError(String),
    SystemError(String),
    TransportError(String),
    IoError(std::io::Error),
    ConfigError(config::ConfigError),
}

impl Error for EmpttyError {}

impl fmt::Display for EmpttyError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EmpttyError::AuthenticationError(message) => write!(formatter, "AuthenticationError: {}", message),
            EmpttyError::ResolutionError(message) => write!(formatter, "ResolutionError: {}", message),
            EmpttyError::EnvironmentError(message) => write!(formatter, "EnvironmentError: {}", message),
            EmpttyError::DisplayStartError(message) => write!(formatter, "DisplayStartError: {}", message),
            EmpttyError::SessionCommandError(message) => write!(formatter, "SessionCommandError: {}", message),
            EmpttyError::AccountingError(message) => write!(formatter, "AccountingError: {}", message),
            EmpttyError::SystemError(message) => write!(formatter, "SystemError: {}", message),
            EmpttyError::TransportError(message) => write!(formatter, "TransportError: {}", message),
            EmpttyError::IoError(err) => write!(formatter, "IoError: {}", err),
            EmpttyError::ConfigError(err) => write!(formatter, "ConfigError: {}", err),
        }
    }
}

impl From<std::io::Error> for EmpttyError {
    fn from(err: std::io::Error) -> Self {
        EmpttyError::IoError(err)
    }
}

impl From<config::ConfigError> for EmpttyError {
    fn from(err: config::ConfigError) -> Self {
        EmpttyError::ConfigError(err)
    }
}

impl From<pam_client::Error> for EmpttyError {
    fn from(err: pam_client::Error) -> Self {
        EmpttyError::AuthenticationError(err.to_string())
    }
}

impl From<nix::Error> for EmpttyError {
    fn from(err: nix::Error) -> Self {
        EmpttyError::SystemError(err.to_string())
    }
}

impl From<zmq::Error> for EmpttyError {
    fn from(err: zmq::Error) -> Self {
        EmpttyError::TransportError(err.to_string())
    }
}

impl From<base64::DecodeError> for EmpttyError {
    fn from(err: base64::DecodeError) -> Self {
        EmpttyError::TransportError(err.to_string())
    }
}

impl From<std::str::Utf8Error> for EmpttyError {
    fn from(err: std::str::Utf8Error) -> Self {
        EmpttyError::SystemError(err.to_string())
    }
}

impl From<FromUtf8Error> for EmpttyError {
    fn from(err: FromUtf8Error) -> Self {
        EmpttyError::SystemError(err.to_string())
    }
}

impl From<serde_json::Error> for EmpttyError {
    fn from(err: serde_json::Error) -> Self {
        EmpttyError::SystemError(err.to_string())
    }
}

impl From<ParseIntError> for EmpttyError {
    fn from(err: ParseIntError) -> Self {
        EmpttyError::SystemError(err.to_string())
    }
}
