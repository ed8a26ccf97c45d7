//! Node state definitions.

/// Node operational state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Node is starting up.
    Starting,
    /// Node is running and accepting requests.
    Running,
    /// Node is shutting down, not accepting new requests.
    ShuttingDown,
    /// Node is stopped.
    Stopped,
}

impl NodeState {
    /// Check if the node is accepting new requests.
    pub fn accepts_requests(&self) -> bool {
        matches!(self, NodeState::Running)
    }

    /// Check if the node is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeState::Stopped)
    }
}
