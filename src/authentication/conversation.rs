use std::ffi::{CStr, CString};
use std::io::{self, BufRead, Write};

use pam_client::{ConversationHandler, ErrorCode};

use crate::common::color;

/// The `TerminalConversation` answers PAM prompts on the controlling terminal.
/// Under autologin every prompt is answered with an empty, pre-accepted response
/// so the whole PAM handshake still runs without any terminal input.
pub struct TerminalConversation {
    autologin: bool,
    default_user: Option<String>,
    hostname: String,
    fg_color: String,
    bg_color: String,
}

impl TerminalConversation {
    pub fn new(autologin: bool, default_user: Option<&str>, hostname: &str) -> Self {
        Self {
            autologin,
            default_user: default_user.map(str::to_string),
            hostname: hostname.to_string(),
            fg_color: String::new(),
            bg_color: String::new(),
        }
    }

    /// Sets the colours of the login prompts.
    pub fn with_colors(mut self, fg_color: &str, bg_color: &str) -> Self {
        self.fg_color = fg_color.to_string();
        self.bg_color = bg_color.to_string();
        self
    }

    fn print(&self, text: &str) {
        let mut stdout = io::stdout();
        let _ = write!(stdout, "{}", color::paint(text, &self.fg_color, &self.bg_color));
        let _ = stdout.flush();
    }

    fn login_prompt(&self) -> String {
        format!("{} login: ", self.hostname)
    }

    fn read_line(&self) -> Result<String, ErrorCode> {
        let mut input = String::new();
        io::stdin().lock().read_line(&mut input).map_err(|error| {
            error!("Failed to read login: {}", error);
            ErrorCode::CONV_ERR
        })?;

        Ok(input.trim_end_matches(&['\r', '\n'][..]).to_string())
    }

    fn to_response(value: String) -> Result<CString, ErrorCode> {
        CString::new(value).map_err(|_| ErrorCode::CONV_ERR)
    }
}

impl ConversationHandler for TerminalConversation {
    fn prompt_echo_on(&mut self, prompt: &CStr) -> Result<CString, ErrorCode> {
        debug!("PAM prompt with echo: {}", prompt.to_string_lossy());
        if self.autologin {
            return Ok(CString::default());
        }

        self.print(&self.login_prompt());
        let login = self.read_line()?;
        Self::to_response(login)
    }

    fn prompt_echo_off(&mut self, prompt: &CStr) -> Result<CString, ErrorCode> {
        debug!("PAM prompt without echo: {}", prompt.to_string_lossy());
        if self.autologin {
            return Ok(CString::default());
        }

        if let Some(default_user) = &self.default_user {
            self.print(&format!("{}{}\n", self.login_prompt(), default_user));
        }

        let prompt = color::paint("Password: ", &self.fg_color, &self.bg_color);
        let password = rpassword::prompt_password(prompt).map_err(|error| {
            error!("Failed to read password: {}", error);
            ErrorCode::CONV_ERR
        })?;
        Self::to_response(password)
    }

    fn text_info(&mut self, msg: &CStr) {
        debug!("PAM info: {}", msg.to_string_lossy());
        self.print(&format!("{}\n", msg.to_string_lossy()));
    }

    fn error_msg(&mut self, msg: &CStr) {
        error!("PAM: {}", msg.to_string_lossy());
    }

    fn radio_prompt(&mut self, prompt: &CStr) -> Result<bool, ErrorCode> {
        error!("Unsupported PAM radio prompt: {}", prompt.to_string_lossy());
        Err(ErrorCode::CONV_ERR)
    }
}
