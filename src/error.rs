use thiserror::Error;

/// Everything that can go wrong while building a query or talking to the meter.
///
/// Network-level failures (`Timeout`, `Transport`) are expected operating
/// conditions and are retried by [`crate::MeterClient::fetch`]. A structurally
/// bad response (`MalformedFrame`) is not transient and is never retried.
/// `Encoding` can only happen at client construction time.
#[derive(Debug, Error)]
pub enum Error {
    /// An identity string passed to the client contained a non-ASCII character.
    /// The wire protocol is ASCII-only, so the query frame cannot be built.
    #[error("identity string is not ascii: {0:?}")]
    Encoding(String),

    /// No datagram arrived within the per-attempt receive window.
    #[error("Timeout - no response from device")]
    Timeout,

    /// Any other socket-level failure, e.g. host unreachable.
    #[error("Unexpected error: {0}")]
    Transport(#[from] std::io::Error),

    /// A datagram arrived but does not conform to the framing contract.
    #[error("Invalid response format: {0}")]
    MalformedFrame(&'static str),
}

impl Error {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Timeouts and transport failures are transient. A malformed frame means
    /// the device speaks a different protocol, which retrying will not fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout | Error::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Timeout.is_retryable());
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "no route");
        assert!(Error::Transport(io).is_retryable());
        assert!(!Error::MalformedFrame("ETX not found").is_retryable());
        assert!(!Error::Encoding("Gerät".into()).is_retryable());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(Error::Timeout.to_string(), "Timeout - no response from device");
        assert_eq!(
            Error::MalformedFrame("ETX not found").to_string(),
            "Invalid response format: ETX not found"
        );
    }
}
