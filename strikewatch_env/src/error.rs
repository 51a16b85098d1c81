//! Error types for the StrikeWatch environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Send or receive failed (channel closed, peer gone, etc.)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Target rank is not part of the group or has been cut off
    #[error("Rank unreachable: {0}")]
    NodeUnreachable(String),

    /// Context operation failed
    #[error("Context error: {0}")]
    ContextError(String),

    /// Operation timed out
    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl EnvError {
    /// Creates a network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::NetworkError(msg.into())
    }

    /// Creates an unreachable error.
    pub fn unreachable(rank: impl std::fmt::Display) -> Self {
        Self::NodeUnreachable(rank.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rank;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            EnvError::network("Channel closed").to_string(),
            "Network error: Channel closed"
        );
        assert_eq!(
            EnvError::unreachable(Rank(3)).to_string(),
            "Rank unreachable: rank#3"
        );
        assert_eq!(EnvError::Timeout(250).to_string(), "Timeout after 250ms");
    }
}
