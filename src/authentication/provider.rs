use std::ffi::OsStr;

use pam_client::{Context, Flag, SessionToken};

use crate::common::{EmpttyError, Result};
use super::TerminalConversation;

/// The `AuthProvider` trait is the boundary to the pluggable authentication system.
/// Calls follow the PAM transaction order: start, authenticate, validate the account,
/// set the tty, open and finally close the session.
pub trait AuthProvider {
    /// Starts a transaction for a service, with an optional default username hint.
    fn start(&mut self, service: &str, default_user: Option<&str>) -> Result<()>;

    fn authenticate(&mut self) -> Result<()>;

    /// Checks that the authenticated account is valid (not expired, allowed to log in).
    fn validate_account(&mut self) -> Result<()>;

    /// Renews the credentials of the account, e.g. an expired password.
    fn renew_credentials(&mut self) -> Result<()>;

    fn set_tty(&mut self, tty: &str) -> Result<()>;

    /// Returns the username known to the provider, if any.
    fn username(&self) -> Option<String>;

    /// Opens the provider session and returns the environment it exports.
    fn open_session(&mut self) -> Result<Vec<(String, String)>>;

    fn close_session(&mut self) -> Result<()>;
}

/// The `PamProvider` drives a PAM transaction with a terminal conversation.
pub struct PamProvider {
    conversation: Option<TerminalConversation>,
    context: Option<Context<TerminalConversation>>,
    session: Option<SessionToken>,
}

impl PamProvider {
    pub fn new(conversation: TerminalConversation) -> Self {
        Self {
            conversation: Some(conversation),
            context: None,
            session: None,
        }
    }

    fn context(&mut self) -> Result<&mut Context<TerminalConversation>> {
        self.context.as_mut()
            .ok_or_else(|| EmpttyError::AuthenticationError("PAM transaction has not been started".to_string()))
    }
}

impl AuthProvider for PamProvider {
    fn start(&mut self, service: &str, default_user: Option<&str>) -> Result<()> {
        let conversation = self.conversation.take()
            .ok_or_else(|| EmpttyError::AuthenticationError("PAM transaction has already been started".to_string()))?;

        debug!("Starting PAM transaction for service {}", service);
        self.context = Some(Context::new(service, default_user, conversation)?);
        Ok(())
    }

    fn authenticate(&mut self) -> Result<()> {
        self.context()?.authenticate(Flag::SILENT)?;
        Ok(())
    }

    fn validate_account(&mut self) -> Result<()> {
        self.context()?.acct_mgmt(Flag::SILENT)?;
        Ok(())
    }

    fn renew_credentials(&mut self) -> Result<()> {
        self.context()?.chauthtok(Flag::CHANGE_EXPIRED_AUTHTOK)?;
        Ok(())
    }

    fn set_tty(&mut self, tty: &str) -> Result<()> {
        self.context()?.set_tty(Some(tty))?;
        Ok(())
    }

    fn username(&self) -> Option<String> {
        self.context.as_ref()?.user().ok()
    }

    fn open_session(&mut self) -> Result<Vec<(String, String)>> {
        let (environment, token) = {
            let session = self.context()?.open_session(Flag::SILENT)?;
            let environment: Vec<(String, String)> = session.envlist()
                .iter_tuples()
                .map(|(key, value)| (
                    OsStr::new(&key).to_string_lossy().into_owned(),
                    OsStr::new(&value).to_string_lossy().into_owned(),
                ))
                .collect();
            (environment, session.leak())
        };

        self.session = Some(token);
        Ok(environment)
    }

    fn close_session(&mut self) -> Result<()> {
        if let Some(token) = self.session.take() {
            // the session closes itself when dropped
            let session = self.context()?.unleak_session(token);
            drop(session);
            debug!("Closed PAM session");
        }
        Ok(())
    }
}
