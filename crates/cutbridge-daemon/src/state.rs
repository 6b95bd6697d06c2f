//! Bridge session state machine.

/// State of the bridge's session with its peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Created, event loop not yet running.
    #[default]
    Starting,
    /// Syncing in both directions.
    Running,
    /// The transport failed or the peer went away; no further sync.
    TornDown,
    /// Shut down on request.
    Stopped,
}

impl SessionState {
    /// Whether the session has ended, for whatever reason.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::TornDown | Self::Stopped)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starting => write!(f, "Starting"),
            Self::Running => write!(f, "Running"),
            Self::TornDown => write!(f, "TornDown"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}
