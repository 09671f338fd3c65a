use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Protocol is locked and cannot be modified
    #[error("Protocol is already locked and cannot be modified. Protocol.lock() has been called and no further changes are allowed")]
    AlreadyLocked,

    /// The class count no longer fits the 16-bit handshake field
    #[error("Cannot register class {name}: at most {max} classes are supported")]
    TooManyClasses { name: String, max: u32 },
}
