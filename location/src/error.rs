use thiserror::Error;

/// Result alias for location queries.
pub type LocationResult<T> = Result<T, LocationError>;

/// Reasons a location query can fail.
///
/// Every variant is terminal. Callers that want another attempt issue a new
/// query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// Location permission was denied by the user.
    #[error("location permission denied")]
    PermissionDenied,
    /// Location permission is restricted on this device.
    #[error("location permission restricted")]
    PermissionRestricted,
    /// Sensing started but no position arrived before the deadline.
    #[error("location request timed out")]
    Timeout,
    /// The provider returned nothing usable, or reported a status this crate
    /// does not recognize.
    #[error("unknown location error")]
    Unknown,
    /// The location provider reported a failure.
    #[error("location provider failed: {0}")]
    Provider(String),
}

/// Errors raised while loading query configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The timeout is negative, NaN or infinite.
    #[error("invalid timeout: {0} seconds")]
    InvalidTimeout(f64),
    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}
