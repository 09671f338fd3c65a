use thiserror::Error;

use ghostwire_serde::SerdeErr;

/// Errors raised while negotiating the class count at connect
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    /// The accepting peer announced more classes than this side knows
    #[error("Peer accepted {accepted} classes but only {local} are registered locally")]
    ClassCountMismatch { accepted: u32, local: u32 },

    #[error(transparent)]
    Serde(#[from] SerdeErr),
}
