use bdg_config::ResolvedSecrets;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Expired,
}

/// Access/refresh token pair with an explicit lifecycle.
///
/// Once expired, a session stays expired; build a new one after logging in.
#[derive(Clone)]
pub struct Session {
    access_token: Option<String>,
    refresh_token: Option<String>,
    state: SessionState,
    expiry_reported: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<REDACTED>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<REDACTED>"))
            .field("state", &self.state)
            .finish()
    }
}

impl Session {
    pub fn new(access_token: Option<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token,
            refresh_token,
            state: SessionState::Active,
            expiry_reported: false,
        }
    }

    pub fn from_secrets(secrets: &ResolvedSecrets) -> Self {
        Self::new(secrets.access_token.clone(), secrets.refresh_token.clone())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn replace_access(&mut self, token: String) {
        self.access_token = Some(token);
    }

    /// Mark the session expired and drop its tokens. Returns `true` only the
    /// first time, so callers report the expiry once per session.
    pub fn expire(&mut self) -> bool {
        self.access_token = None;
        self.refresh_token = None;
        self.state = SessionState::Expired;
        !std::mem::replace(&mut self.expiry_reported, true)
    }

    /// Explicit logout: same end state as expiry, without a report.
    pub fn logout(&mut self) {
        self.expire();
    }
}
