use ratatui::crossterm::event::{KeyCode, KeyEvent};
use tracing::{info, warn};

use crate::domain::Credentials;
use crate::inputter::Inputter;

pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Pending,
    Welcome(String),
    Rejected(String),
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    credentials: Credentials,
    username: Inputter,
    password: Inputter,
    focus: LoginField,
    outcome: LoginOutcome,
}

impl LoginForm {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            username: Inputter::default(),
            password: Inputter::default(),
            focus: LoginField::Username,
            outcome: LoginOutcome::Pending,
        }
    }

    pub fn submit(&mut self) -> &LoginOutcome {
        let (user, pass) = (self.username.value(), self.password.value());
        self.outcome = if user.is_empty() || pass.is_empty() {
            LoginOutcome::Rejected("Please enter both username and password".to_string())
        } else if user == self.credentials.username && pass == self.credentials.password {
            info!("Login accepted for {user}");
            LoginOutcome::Welcome(user.to_string())
        } else {
            warn!("Login rejected for {user}");
            LoginOutcome::Rejected(INVALID_CREDENTIALS.to_string())
        };
        &self.outcome
    }

    /// Returns true when the key ended input focus (Esc).
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.focus = match self.focus {
                    LoginField::Username => LoginField::Password,
                    LoginField::Password => LoginField::Username,
                };
            }
            KeyCode::Enter => {
                self.submit();
            }
            KeyCode::Esc => return true,
            _ => {
                let input = match self.focus {
                    LoginField::Username => &mut self.username,
                    LoginField::Password => &mut self.password,
                };
                if input.read(key).changed && matches!(self.outcome, LoginOutcome::Rejected(_)) {
                    self.outcome = LoginOutcome::Pending;
                }
            }
        }
        false
    }

    pub fn logout(&mut self) {
        self.username.clear();
        self.password.clear();
        self.focus = LoginField::Username;
        self.outcome = LoginOutcome::Pending;
    }

    pub fn username(&self) -> &str {
        self.username.value()
    }

    pub fn masked_password(&self) -> String {
        "*".repeat(self.password.value().chars().count())
    }

    pub fn focus(&self) -> LoginField {
        self.focus
    }

    pub fn cursor(&self) -> usize {
        match self.focus {
            LoginField::Username => self.username.cursor(),
            LoginField::Password => self.password.cursor(),
        }
    }

    pub fn outcome(&self) -> &LoginOutcome {
        &self.outcome
    }
}
