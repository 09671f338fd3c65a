use thiserror::Error;

/// Errors raised by ghosting session control
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GhostingError {
    /// A host-side operation or message reached a connection that does not
    /// ghost to its peer
    #[error("Connection does not ghost from this side, cannot {operation}")]
    NotGhostingFrom { operation: &'static str },

    /// A receiver-side message reached a connection that does not accept ghosts
    #[error("Connection does not accept ghosts, cannot {operation}")]
    NotGhostingTo { operation: &'static str },
}
