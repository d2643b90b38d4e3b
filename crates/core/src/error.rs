//! Error types for the beacon core crate.

use thiserror::Error;

/// Top-level error type for beacon operations.
///
/// Delivery failures are deliberately absent: the transport is
/// fire-and-forget and reports them through its outcome, not as errors.
#[derive(Debug, Error)]
pub enum BeaconError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file error: {0}")]
    State(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A convenience Result alias that defaults to [`BeaconError`].
pub type Result<T> = std::result::Result<T, BeaconError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = BeaconError::Config("missing product family".into());
        assert_eq!(
            err.to_string(),
            "configuration error: missing product family"
        );
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = BeaconError::from(io_err);
        assert!(matches!(err, BeaconError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn state_error_display() {
        let err = BeaconError::State("no instance id".into());
        assert_eq!(err.to_string(), "state file error: no instance id");
    }

    #[test]
    fn serialization_error_display() {
        let err = BeaconError::Serialization("invalid JSON".into());
        assert_eq!(err.to_string(), "serialization error: invalid JSON");
    }

    #[test]
    fn result_alias_works() {
        let ok: Result<i32> = Ok(42);
        assert!(ok.is_ok());

        let err: Result<i32> = Err(BeaconError::Config("bad".into()));
        assert!(err.is_err());
    }
}
