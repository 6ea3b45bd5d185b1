use std::sync::{Arc, Mutex};

use serde::Serialize;

/// Summary of a running session, as reported by the control endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionInfo {
    pub id: String,
    pub username: String,
    pub tty: String,
    pub display: String,
    pub protocol: String,
    pub desktop: String,
}

/// The `SessionContainer` keeps track of the sessions currently supervised by the application.
/// It is shared between the session threads and the control endpoint.
#[derive(Clone, Default)]
pub struct SessionContainer {
    sessions: Arc<Mutex<Vec<SessionInfo>>>,
}

impl SessionContainer {

    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn add_session(&self, session: SessionInfo) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.retain(|existing| existing.id != session.id);
            sessions.push(session);
        }
    }

    pub fn remove_session(&self, id: &str) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.retain(|session| session.id != id);
        }
    }

    pub fn get_session_by_username(&self, username: &str) -> Option<SessionInfo> {
        self.sessions.lock().ok()?
            .iter()
            .find(|session| session.username == username)
            .cloned()
    }

    pub fn get_all(&self) -> Vec<SessionInfo> {
        self.sessions.lock()
            .map(|sessions| sessions.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: &str, username: &str) -> SessionInfo {
        SessionInfo {
            id: id.to_string(),
            username: username.to_string(),
            tty: "1".to_string(),
            display: ":0".to_string(),
            protocol: "x11".to_string(),
            desktop: "xfce".to_string(),
        }
    }

    #[test]
    fn sessions_are_added_and_removed_by_id() {
        let container = SessionContainer::new();
        container.add_session(info("a", "alice"));
        container.add_session(info("b", "bob"));
        container.add_session(info("a", "alice"));
        assert_eq!(container.get_all().len(), 2);

        container.remove_session("a");
        assert!(container.get_session_by_username("alice").is_none());
        assert_eq!(container.get_session_by_username("bob"), Some(info("b", "bob")));
    }
}
