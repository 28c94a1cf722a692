//! Session state and the authentication phase machine.

use std::fmt;

use super::error::TmdbError;

/// Authentication phase of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    /// No request token has been issued.
    #[default]
    NoToken,
    /// A request token is held but not yet validated.
    TokenIssued,
    /// The request token was validated with username and password.
    LoggedIn,
    /// A session id is held; account-scoped endpoints are usable.
    SessionActive,
}

impl fmt::Display for AuthPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoToken => "no request token has been issued",
            Self::TokenIssued => "a request token is pending validation",
            Self::LoggedIn => "the request token is validated",
            Self::SessionActive => "a session is active",
        };
        f.write_str(text)
    }
}

/// A state-changing authentication step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStep {
    /// `authentication/token/new`.
    RequestToken,
    /// `authentication/token/validate_with_login`.
    ValidateWithLogin,
    /// `authentication/session/new`.
    CreateSession,
    /// Hand-off of the request token to the TMDB website.
    WebAuthorization,
}

impl fmt::Display for AuthStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::RequestToken => "request_token",
            Self::ValidateWithLogin => "validate_with_login",
            Self::CreateSession => "create_session",
            Self::WebAuthorization => "web_authorization",
        };
        f.write_str(text)
    }
}

impl AuthPhase {
    /// Whether `step` may run from this phase.
    ///
    /// A new token may be requested at any point before a session exists,
    /// which restarts an abandoned login. A session may be created either
    /// from a validated token or from a token approved on the website.
    #[must_use]
    pub const fn allows(self, step: AuthStep) -> bool {
        match step {
            AuthStep::RequestToken => !matches!(self, Self::SessionActive),
            AuthStep::ValidateWithLogin | AuthStep::WebAuthorization => {
                matches!(self, Self::TokenIssued)
            }
            AuthStep::CreateSession => matches!(self, Self::TokenIssued | Self::LoggedIn),
        }
    }
}

/// Token and session identifiers for one authenticated client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub struct SessionState {
    /// TMDB account id (0 until looked up).
    pub account_id: u64,
    /// Current request token (empty when none issued).
    pub request_token: String,
    /// Current session id (empty when not logged in).
    pub session_id: String,
    /// Current authentication phase.
    pub phase: AuthPhase,
}

impl SessionState {
    /// Fails with `OutOfOrder` unless the current phase allows `step`.
    ///
    /// # Errors
    ///
    /// Returns `TmdbError::OutOfOrder` when the transition is not allowed.
    pub fn ensure(&self, step: AuthStep) -> Result<(), TmdbError> {
        if self.phase.allows(step) {
            Ok(())
        } else {
            Err(TmdbError::OutOfOrder {
                step,
                phase: self.phase,
            })
        }
    }

    /// Records a freshly issued request token.
    pub(crate) fn token_issued(&mut self, request_token: String) {
        self.request_token = request_token;
        self.phase = AuthPhase::TokenIssued;
    }

    /// Records the token returned by `validate_with_login`, replacing the issued one.
    pub(crate) fn logged_in(&mut self, request_token: String) {
        self.request_token = request_token;
        self.phase = AuthPhase::LoggedIn;
    }

    /// Records the new session id.
    pub(crate) fn session_created(&mut self, session_id: String) {
        self.session_id = session_id;
        self.phase = AuthPhase::SessionActive;
    }

    /// Drops every credential and returns to `NoToken`.
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether a session id is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.session_id.is_empty()
    }
}
