use thiserror::Error;

/// Result type for chain editing operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Reasons an editing action did not apply.
///
/// None of these are fatal: the chain, history and selection are left
/// exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// Position does not address a pedal in the chain.
    #[error("position {position} is out of range for a chain of {len} pedals")]
    IndexOutOfRange { position: usize, len: usize },

    /// Parameter key is not part of the target's fixed key set.
    #[error("unknown parameter '{key}'")]
    UnknownParameterKey { key: String },

    #[error("amplifier has no channel '{name}'")]
    UnknownChannel { name: String },

    #[error("amplifier has no variant '{name}'")]
    UnknownVariant { name: String },

    /// Catalog lookup failed.
    #[error("no catalog entry with id '{id}'")]
    UnknownTemplate { id: String },

    #[error("no gesture in progress")]
    NoGesture,
}
