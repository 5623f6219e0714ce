//! Password gate in front of the chat.

use crate::error::GateError;
use log::{info, warn};
use std::fmt;

/// Whether the user has passed the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    LoggedOut,
    LoggedIn,
}

/// Compares typed input against the stored access password.
#[derive(Clone)]
pub struct AccessGate {
    password: String,
    state: AuthState,
}

impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate")
            .field("password", &"<redacted>")
            .field("state", &self.state)
            .finish()
    }
}

impl AccessGate {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            state: AuthState::LoggedOut,
        }
    }

    /// Exact comparison. An empty stored password never matches.
    pub fn check(&self, input: &str) -> bool {
        !self.password.is_empty() && input == self.password
    }

    pub fn login(&mut self, input: &str) -> Result<(), GateError> {
        if !self.check(input) {
            warn!("login rejected");
            return Err(GateError::IncorrectPassword);
        }
        info!("login accepted");
        self.state = AuthState::LoggedIn;
        Ok(())
    }

    pub fn logout(&mut self) {
        if self.state == AuthState::LoggedIn {
            info!("logged out");
        }
        self.state = AuthState::LoggedOut;
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_logged_in(&self) -> bool {
        self.state == AuthState::LoggedIn
    }
}
