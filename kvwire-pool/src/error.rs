//! Pool and router error types.

use thiserror::Error;

/// Pool errors.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("connection pool is closed")]
    Closed,

    #[error("connection pool is already closed")]
    AlreadyClosed,

    #[error("connection pool timeout")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] kvwire_protocol::DecodeError),

    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),

    #[error("{}", join_messages(.0))]
    Multiple(Vec<PoolError>),
}

impl PoolError {
    /// Wraps an arbitrary pool implementation error.
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        PoolError::Other(err.into())
    }

    /// Combines per-pool results into one.
    ///
    /// No errors yields `Ok`, a single error is returned as is, several are
    /// kept side by side in `Multiple`.
    pub fn join(errors: impl IntoIterator<Item = PoolError>) -> Result<(), PoolError> {
        let mut errors: Vec<PoolError> = errors.into_iter().collect();
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(PoolError::Multiple(errors)),
        }
    }

    /// Returns whether this error means the pool or router was shut down.
    pub fn is_closed(&self) -> bool {
        match self {
            PoolError::Closed | PoolError::AlreadyClosed => true,
            PoolError::Multiple(errors) => errors.iter().all(PoolError::is_closed),
            _ => false,
        }
    }

    /// Iterates the individual causes, flattening `Multiple`.
    pub fn causes(&self) -> Vec<&PoolError> {
        match self {
            PoolError::Multiple(errors) => errors.iter().flat_map(PoolError::causes).collect(),
            other => vec![other],
        }
    }
}

fn join_messages(errors: &[PoolError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_empty() {
        assert!(PoolError::join(Vec::new()).is_ok());
    }

    #[test]
    fn test_join_single_is_unwrapped() {
        let err = PoolError::join(vec![PoolError::Timeout]).unwrap_err();
        assert!(matches!(err, PoolError::Timeout));
    }

    #[test]
    fn test_join_preserves_every_cause() {
        let err = PoolError::join(vec![
            PoolError::Closed,
            PoolError::other("dial tcp: refused"),
            PoolError::Multiple(vec![PoolError::Timeout, PoolError::AlreadyClosed]),
        ])
        .unwrap_err();

        let causes = err.causes();
        assert_eq!(causes.len(), 4);
        assert_eq!(
            err.to_string(),
            "connection pool is closed\n\
             dial tcp: refused\n\
             connection pool timeout\n\
             connection pool is already closed"
        );
    }

    #[test]
    fn test_is_closed() {
        assert!(PoolError::Closed.is_closed());
        assert!(PoolError::AlreadyClosed.is_closed());
        assert!(PoolError::Multiple(vec![PoolError::Closed, PoolError::Closed]).is_closed());
        assert!(!PoolError::Multiple(vec![PoolError::Closed, PoolError::Timeout]).is_closed());
        assert!(!PoolError::Timeout.is_closed());
    }

    #[test]
    fn test_from_conversions() {
        let err: PoolError = std::io::Error::from(std::io::ErrorKind::ConnectionReset).into();
        assert!(matches!(err, PoolError::Io(_)));

        let err: PoolError =
            kvwire_protocol::DecodeError::from(kvwire_protocol::ServerError::new("ERR x")).into();
        assert!(err.to_string().contains("ERR x"));
    }
}
