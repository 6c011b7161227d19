//! One-shot location queries.
//!
//! Location providers are continuous and callback driven. [`Locator`] turns
//! them into a single answer per query: the first position reported after
//! sensing starts, or one [`LocationError`]. A query that is already
//! authorized arms its timeout when sensing starts; a query waiting on the
//! permission prompt has no timeout until the user answers.
//!
//! Platform code plugs in through [`LocationBackend`] and
//! [`LocationSession`], reporting back through [`LocationDelegate`].

#![warn(missing_docs)]

mod backend;
mod config;
mod error;
mod locator;
mod registry;
mod request;
mod timer;

/// Scripted backend for driving a [`Locator`] without a real provider.
#[cfg(feature = "testing")]
pub mod testing;

pub use backend::{LocationBackend, LocationDelegate, LocationEvent, LocationSession};
pub use config::{Accuracy, QueryConfig, QueryOptions};
pub use error::{ConfigError, LocationError, LocationResult};
pub use locator::{Locator, LocatorBuilder};
pub use pinpoint_permission::AuthorizationStatus;
pub use registry::{Applied, Registry};
pub use request::{
    Admission, Completion, Effect, Request, RequestId, RequestState, Transition, Trigger,
};
#[cfg(any(test, feature = "testing"))]
pub use timer::ManualScheduler;
pub use timer::{Scheduler, Task, ThreadPoolScheduler};

use serde::{Deserialize, Serialize};

/// A geographic location with coordinates and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
    /// Altitude in meters above sea level, if available.
    pub altitude: Option<f64>,
    /// Horizontal accuracy in meters, if available.
    pub horizontal_accuracy: Option<f64>,
    /// Vertical accuracy in meters, if available.
    pub vertical_accuracy: Option<f64>,
    /// Timestamp as Unix epoch milliseconds.
    pub timestamp: u64,
}

impl Location {
    /// A location with only coordinates set, stamped with the current time.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            horizontal_accuracy: None,
            vertical_accuracy: None,
            timestamp: timestamp_now(),
        }
    }
}

fn timestamp_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
