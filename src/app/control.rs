use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::engine::{general_purpose::STANDARD, Engine};

use crate::common::{EmpttyError, Result, SessionContainer};

const POLL_TIMEOUT_MS: i64 = 500;

/// The `ControlServer` answers requests on the control endpoint: listing the active sessions
/// and acknowledging user switch requests.
pub struct ControlServer {
    context: zmq::Context,
    address: String,
    sessions: SessionContainer,
}

impl ControlServer {
    pub fn new(context: zmq::Context, address: &str, sessions: SessionContainer) -> Self {
        Self {
            context,
            address: address.to_string(),
            sessions,
        }
    }

    /// Serves requests until `running` is cleared.
    pub fn run(&self, running: Arc<AtomicBool>) -> Result<()> {
        let socket = self.create_rep_socket()?;

        while running.load(Ordering::SeqCst) {
            let mut items = [socket.as_poll_item(zmq::POLLIN)];
            if zmq::poll(&mut items, POLL_TIMEOUT_MS)? == 0 || !items[0].is_readable() {
                continue;
            }

            let mut msg = zmq::Message::new();
            if let Err(error) = socket.recv(&mut msg, 0) {
                error!("Failed to receive control request: {}", error);
                continue;
            }

            let response = match msg.as_str() {
                Some(request) => self.handle_request(request),
                None => "1,request is not valid UTF-8".to_string(),
            };

            if let Err(error) = socket.send(response.as_str(), 0) {
                error!("Failed to send control response: {}", error);
            }
        }

        info!("Stopped control endpoint");
        Ok(())
    }

    /// Handles a single control request.
    ///
    /// # Returns
    /// `0,<payload>` on success, `1,<error>` otherwise.
    pub fn handle_request(&self, request: &str) -> String {
        let result = match request.split_once(',') {
            Some(("switch_user", encoded)) => self.switch_user(encoded),
            None if request == "list" => self.list(),
            _ => Err(EmpttyError::TransportError(format!("Unknown request \"{}\"", request))),
        };

        match result {
            Ok(payload) => format!("0,{}", payload),
            Err(error) => format!("1,{}", error),
        }
    }

    fn switch_user(&self, encoded: &str) -> Result<String> {
        let username = String::from_utf8(STANDARD.decode(encoded.trim())?)?;
        match self.sessions.get_session_by_username(&username) {
            Some(session) => info!("Received request to switch to user {} with active session {}", username, session.id),
            None => info!("Received request to switch to user {} without an active session", username),
        }
        Ok("ok".to_string())
    }

    fn list(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.sessions.get_all())?)
    }

    fn create_rep_socket(&self) -> Result<zmq::Socket> {
        let socket = self.context.socket(zmq::REP)?;
        socket.set_linger(0)?;
        socket.bind(&self.address)?;
        info!("Control endpoint bound to {}", self.address);
        Ok(socket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SessionInfo;

    fn server() -> ControlServer {
        let sessions = SessionContainer::new();
        sessions.add_session(SessionInfo {
            id: "abc".to_string(),
            username: "alice".to_string(),
            tty: "tty1".to_string(),
            display: ":0".to_string(),
            protocol: "X11".to_string(),
            desktop: "xfce".to_string(),
        });
        ControlServer::new(zmq::Context::new(), "inproc://control-test", sessions)
    }

    #[test]
    fn list_returns_the_active_sessions() {
        let response = server().handle_request("list");

        let (code, payload) = response.split_once(',').unwrap();
        assert_eq!(code, "0");
        let sessions: serde_json::Value = serde_json::from_str(payload).unwrap();
        assert_eq!(sessions[0]["username"], "alice");
        assert_eq!(sessions[0]["display"], ":0");
    }

    #[test]
    fn switch_user_decodes_the_username() {
        assert_eq!(server().handle_request(&format!("switch_user,{}", STANDARD.encode("bob"))), "0,ok");
        assert_eq!(server().handle_request(&format!("switch_user,{}", STANDARD.encode("alice"))), "0,ok");
        assert!(server().handle_request("switch_user,!!!").starts_with("1,"));
    }

    #[test]
    fn unknown_requests_are_errors() {
        assert!(server().handle_request("reboot").starts_with("1,"));
        assert!(server().handle_request("").starts_with("1,"));
    }

    #[test]
    fn server_answers_over_zmq() {
        let context = zmq::Context::new();
        let control = ControlServer::new(context.clone(), "inproc://control-roundtrip", SessionContainer::new());
        let running = Arc::new(AtomicBool::new(true));

        let thread_running = running.clone();
        let thread = std::thread::spawn(move || control.run(thread_running));

        let client = context.socket(zmq::REQ).unwrap();
        client.connect("inproc://control-roundtrip").unwrap();
        client.send("list", 0).unwrap();
        assert_eq!(client.recv_string(0).unwrap().unwrap(), "0,[]");

        running.store(false, Ordering::SeqCst);
        thread.join().unwrap().unwrap();
    }
}
