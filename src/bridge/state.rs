/// Connection state of one exec session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Created but not mounted
    #[default]
    Idle,
    /// Transport is being opened
    Connecting,
    /// Transport is open; `degraded` once an error has been reported
    Connected { degraded: bool },
    /// Transport closed or session torn down
    Closed,
}

impl SessionState {
    /// Short label for logs and status output
    pub fn display_name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Connected { degraded: false } => "connected",
            SessionState::Connected { degraded: true } => "degraded",
            SessionState::Closed => "closed",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, SessionState::Closed)
    }

    /// State after the transport reports an error.
    ///
    /// Errors never close the session on their own; a transport close event
    /// does that.
    pub fn after_error(self) -> Self {
        match self {
            SessionState::Idle | SessionState::Closed => self,
            SessionState::Connecting | SessionState::Connected { .. } => {
                SessionState::Connected { degraded: true }
            }
        }
    }
}
