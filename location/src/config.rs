//! Query options and their serialized form.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Desired precision, passed through to the backend untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    /// Highest precision, intended for navigation.
    BestForNavigation,
    /// Best precision the device can offer.
    #[default]
    Best,
    /// Within about ten meters.
    NearestTenMeters,
    /// Within about a hundred meters.
    HundredMeters,
    /// Within about a kilometer.
    Kilometer,
    /// Within about three kilometers.
    ThreeKilometers,
    /// Deliberately coarse position.
    Reduced,
}

/// Options for a single location query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Precision hint for the backend.
    pub accuracy: Accuracy,
    /// How long sensing may run before the query fails with
    /// [`LocationError::Timeout`](crate::LocationError::Timeout).
    ///
    /// The clock starts when sensing starts, not while the permission prompt
    /// is showing.
    pub timeout: Duration,
}

impl QueryOptions {
    /// Create options with the given accuracy and timeout.
    #[must_use]
    pub const fn new(accuracy: Accuracy, timeout: Duration) -> Self {
        Self { accuracy, timeout }
    }

    /// Replace the accuracy hint.
    #[must_use]
    pub const fn with_accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Replace the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::new(Accuracy::default(), DEFAULT_TIMEOUT)
    }
}

/// Serialized query options, as found in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Precision hint.
    pub accuracy: Accuracy,
    /// Timeout in seconds. Must be finite and non-negative.
    pub timeout_secs: f64,
}

impl QueryConfig {
    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        let options = QueryOptions::default();
        Self {
            accuracy: options.accuracy,
            timeout_secs: options.timeout.as_secs_f64(),
        }
    }
}

impl TryFrom<QueryConfig> for QueryOptions {
    type Error = ConfigError;

    fn try_from(config: QueryConfig) -> Result<Self, Self::Error> {
        let timeout = Duration::try_from_secs_f64(config.timeout_secs)
            .map_err(|_| ConfigError::InvalidTimeout(config.timeout_secs))?;
        Ok(Self::new(config.accuracy, timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_best_accuracy_and_ten_seconds() {
        let options = QueryOptions::default();
        assert_eq!(options.accuracy, Accuracy::Best);
        assert_eq!(options.timeout, Duration::from_secs(10));
    }

    #[test]
    fn config_fills_missing_fields() {
        let config = QueryConfig::from_json(r#"{ "accuracy": "kilometer" }"#).unwrap();
        let options = QueryOptions::try_from(config).unwrap();
        assert_eq!(options.accuracy, Accuracy::Kilometer);
        assert_eq!(options.timeout, Duration::from_secs(10));
    }

    #[test]
    fn fractional_timeouts_are_kept() {
        let config = QueryConfig::from_json(r#"{ "timeout_secs": 2.5 }"#).unwrap();
        let options = QueryOptions::try_from(config).unwrap();
        assert_eq!(options.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn zero_timeout_is_valid() {
        let config = QueryConfig {
            accuracy: Accuracy::Reduced,
            timeout_secs: 0.0,
        };
        assert_eq!(QueryOptions::try_from(config).unwrap().timeout, Duration::ZERO);
    }

    #[test]
    fn rejects_negative_and_non_finite_timeouts() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let config = QueryConfig {
                accuracy: Accuracy::Best,
                timeout_secs: bad,
            };
            assert!(matches!(
                QueryOptions::try_from(config),
                Err(ConfigError::InvalidTimeout(_))
            ));
        }
    }

    #[test]
    fn rejects_unknown_accuracy() {
        assert!(matches!(
            QueryConfig::from_json(r#"{ "accuracy": "pinpoint" }"#),
            Err(ConfigError::Json(_))
        ));
    }
}
