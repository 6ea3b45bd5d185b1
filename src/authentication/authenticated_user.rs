use std::collections::BTreeMap;

use super::Account;

/// The `AuthenticatedUser` struct represents a user that has been authenticated for a session.
/// It contains the OS account, the environment exported by PAM and the session environment
/// derived from both.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    account: Account,
    provider_environment: BTreeMap<String, String>,
    environment: BTreeMap<String, String>,
}

impl AuthenticatedUser {
    /// Creates a new `AuthenticatedUser` instance.
    ///
    /// # Arguments
    /// * `account` - The account that has been authenticated.
    /// * `provider_environment` - The environment variables exported by the authentication provider.
    pub fn new(account: Account, provider_environment: Vec<(String, String)>) -> Self {
        let provider_environment: BTreeMap<String, String> = provider_environment.into_iter().collect();
        Self {
            account,
            environment: provider_environment.clone(),
            provider_environment,
        }
    }

    /// Returns the account associated with the user.
    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn username(&self) -> &str {
        self.account.username()
    }

    pub fn home(&self) -> &str {
        self.account.home()
    }

    pub fn uid(&self) -> u32 {
        self.account.uid()
    }

    pub fn gid(&self) -> u32 {
        self.account.gid()
    }

    /// Returns the environment variables exported by the authentication provider.
    pub fn provider_environment(&self) -> &BTreeMap<String, String> {
        &self.provider_environment
    }

    /// Returns the session environment.
    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    pub fn getenv(&self, key: &str) -> Option<&str> {
        self.environment.get(key).map(String::as_str)
    }

    /// Sets a session environment variable, replacing any previous value.
    pub fn setenv(&mut self, key: &str, value: &str) {
        self.environment.insert(key.to_string(), value.to_string());
    }
}
