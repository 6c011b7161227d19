//! The location provider interface.
//!
//! A [`LocationBackend`] hands out one [`LocationSession`] per query. The
//! session reports everything that happens to it through the
//! [`LocationDelegate`] it was opened with, on whatever thread the platform
//! uses for notifications.

use std::sync::Arc;

use pinpoint_permission::AuthorizationStatus;

use crate::{Accuracy, Location};

/// Notification delivered by a session.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    /// One or more positions were reported. The batch may be empty.
    PositionUpdate {
        /// Reported positions, oldest first.
        locations: Vec<Location>,
    },
    /// Sensing failed.
    Failure {
        /// Provider-specific description of the failure.
        reason: String,
    },
    /// The authorization status changed.
    AuthorizationChanged {
        /// The new status.
        status: AuthorizationStatus,
    },
}

/// Receiver for session notifications.
pub trait LocationDelegate: Send + Sync {
    /// Called for every notification a session produces.
    fn on_event(&self, event: LocationEvent);
}

/// Source of location sessions.
pub trait LocationBackend: Send + Sync {
    /// Open a session whose notifications go to `delegate`.
    fn open_session(&self, delegate: Arc<dyn LocationDelegate>) -> Box<dyn LocationSession>;
}

/// A single sensing session, owned by one query.
pub trait LocationSession: Send + Sync {
    /// Current authorization status. Must not block.
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Show the permission prompt. The answer arrives later as
    /// [`LocationEvent::AuthorizationChanged`].
    fn request_permission(&self);

    /// Begin producing positions at the given accuracy.
    fn start_updates(&self, accuracy: Accuracy);

    /// Stop producing positions. Safe to call more than once.
    fn stop_updates(&self);
}
