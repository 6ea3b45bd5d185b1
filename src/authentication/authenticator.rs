use std::process;

use nix::unistd::User;

use crate::accounting::Accounting;
use crate::common::{EmpttyError, Result, Settings};
use super::{Account, AuthProvider, AuthenticatedUser};

/// The `Authenticator` struct authenticates the user logging in on the TTY and owns the
/// provider session for the lifetime of the login session.
pub struct Authenticator<P: AuthProvider> {
    provider: P,
    session_open: bool,
}

impl<P: AuthProvider> Authenticator<P> {
    /// Creates a new `Authenticator` instance.
    ///
    /// # Arguments
    /// * `provider` - The authentication provider to converse with.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            session_open: false,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn is_session_open(&self) -> bool {
        self.session_open
    }

    /// Authenticates the user and opens the provider session.
    /// A rejected login or an invalid account is recorded in btmp before the error is returned.
    ///
    /// # Arguments
    /// * `settings` - The settings holding the service name, default user and tty.
    /// * `accounting` - Where failed attempts are recorded.
    ///
    /// # Returns
    /// A `Result` containing the `AuthenticatedUser` or an `EmpttyError::AuthenticationError`.
    pub fn authenticate(&mut self, settings: &Settings, accounting: &Accounting) -> Result<AuthenticatedUser> {
        self.provider.start(&settings.pam_service, settings.default_user())
            .map_err(Self::authentication_error)?;

        if let Err(error) = self.verify_credentials() {
            let username = self.provider.username()
                .filter(|username| !username.is_empty())
                .or_else(|| settings.default_user().map(str::to_string));
            accounting.record_failed_login(username.as_deref(), process::id(), &settings.tty_id());
            return Err(Self::authentication_error(error));
        }

        self.open_session(settings).map_err(Self::authentication_error)
    }

    fn authentication_error(error: EmpttyError) -> EmpttyError {
        match error {
            EmpttyError::AuthenticationError(message) => EmpttyError::AuthenticationError(message),
            other => EmpttyError::AuthenticationError(other.to_string()),
        }
    }

    fn verify_credentials(&mut self) -> Result<()> {
        self.provider.authenticate()?;
        debug!("Authenticated user {:?}", self.provider.username());

        if let Err(error) = self.provider.validate_account() {
            warn!("Account is not valid ({}), attempting to renew credentials", error);
            if let Err(renew_error) = self.provider.renew_credentials() {
                return Err(EmpttyError::AuthenticationError(format!("Account is not valid: {}. Credential renewal failed: {}", error, renew_error)));
            }
        }
        Ok(())
    }

    fn open_session(&mut self, settings: &Settings) -> Result<AuthenticatedUser> {
        self.provider.set_tty(&settings.tty_name())?;

        let environment = self.provider.open_session()?;
        self.session_open = true;

        let username = self.provider.username()
            .ok_or_else(|| EmpttyError::AuthenticationError("PAM did not provide a username".to_string()))?;

        let account = match User::from_name(&username) {
            Ok(Some(user)) => Account::from_user(user)
                .ok_or_else(|| EmpttyError::AuthenticationError(format!("User \"{}\" is invalid. check they have a home directory?", username)))?,
            Ok(None) => return Err(EmpttyError::AuthenticationError(format!("Could not find user \"{}\"", username))),
            Err(error) => return Err(EmpttyError::AuthenticationError(format!("Could not look up user \"{}\": {}", username, error))),
        };

        info!("Authenticated {}", account);
        Ok(AuthenticatedUser::new(account, environment))
    }

    /// Closes the provider session. Calling it when no session is open does nothing.
    pub fn close_session(&mut self) {
        if !self.session_open {
            return;
        }
        self.session_open = false;

        if let Err(error) = self.provider.close_session() {
            warn!("Failed to close authentication session: {}", error);
        }
    }
}
