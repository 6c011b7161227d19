//! A backend that does only what it is told.
//!
//! [`ScriptedBackend`] records every call the locator makes and lets the
//! caller emit notifications on any session, from any thread, in any order.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pinpoint_permission::AuthorizationStatus;

use crate::{Accuracy, Location, LocationBackend, LocationDelegate, LocationEvent, LocationSession};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A call the locator made on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCall {
    /// `request_permission`.
    RequestPermission,
    /// `start_updates` with the given accuracy.
    StartUpdates(Accuracy),
    /// `stop_updates`.
    StopUpdates,
}

/// Backend whose sessions report whatever status the backend holds and emit
/// events only on demand.
pub struct ScriptedBackend {
    status: Arc<Mutex<AuthorizationStatus>>,
    sessions: Mutex<Vec<Arc<ScriptedSession>>>,
    on_start: Mutex<Option<LocationEvent>>,
}

impl ScriptedBackend {
    /// Create a backend reporting `status` to new sessions.
    #[must_use]
    pub fn new(status: AuthorizationStatus) -> Self {
        Self {
            status: Arc::new(Mutex::new(status)),
            sessions: Mutex::new(Vec::new()),
            on_start: Mutex::new(None),
        }
    }

    /// Change the status sessions report from now on. No event is emitted.
    pub fn set_status(&self, status: AuthorizationStatus) {
        *lock(&self.status) = status;
    }

    /// Arm the next opened session with
    /// [`ScriptedSession::emit_on_next_start`].
    pub fn emit_on_next_start(&self, event: LocationEvent) {
        *lock(&self.on_start) = Some(event);
    }

    /// Every session opened so far, oldest first.
    #[must_use]
    pub fn sessions(&self) -> Vec<Arc<ScriptedSession>> {
        lock(&self.sessions).clone()
    }

    /// The most recently opened session.
    #[must_use]
    pub fn last_session(&self) -> Option<Arc<ScriptedSession>> {
        lock(&self.sessions).last().cloned()
    }
}

impl LocationBackend for ScriptedBackend {
    fn open_session(&self, delegate: Arc<dyn LocationDelegate>) -> Box<dyn LocationSession> {
        let session = Arc::new(ScriptedSession {
            delegate,
            status: Arc::clone(&self.status),
            calls: Mutex::new(Vec::new()),
            sensing: Mutex::new(false),
            on_start: Mutex::new(lock(&self.on_start).take()),
        });
        lock(&self.sessions).push(Arc::clone(&session));
        Box::new(SessionHandle(session))
    }
}

impl fmt::Debug for ScriptedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedBackend")
            .field("status", &*lock(&self.status))
            .field("sessions", &lock(&self.sessions).len())
            .finish()
    }
}

/// One session handed out by [`ScriptedBackend`].
pub struct ScriptedSession {
    delegate: Arc<dyn LocationDelegate>,
    status: Arc<Mutex<AuthorizationStatus>>,
    calls: Mutex<Vec<SessionCall>>,
    sensing: Mutex<bool>,
    on_start: Mutex<Option<LocationEvent>>,
}

impl ScriptedSession {
    /// Deliver `event` to the session's delegate on the calling thread.
    pub fn emit(&self, event: LocationEvent) {
        self.delegate.on_event(event);
    }

    /// Report a batch of positions.
    pub fn report(&self, locations: Vec<Location>) {
        self.emit(LocationEvent::PositionUpdate { locations });
    }

    /// Report a sensing failure.
    pub fn fail(&self, reason: impl Into<String>) {
        self.emit(LocationEvent::Failure {
            reason: reason.into(),
        });
    }

    /// Change the shared status and notify the delegate, as a user answering
    /// the prompt would.
    pub fn answer(&self, status: AuthorizationStatus) {
        *lock(&self.status) = status;
        self.emit(LocationEvent::AuthorizationChanged { status });
    }

    /// Deliver `event` from inside the next `start_updates` call, before the
    /// start is recorded. Providers are free to notify before the start call
    /// returns.
    pub fn emit_on_next_start(&self, event: LocationEvent) {
        *lock(&self.on_start) = Some(event);
    }

    /// Calls made on this session, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<SessionCall> {
        lock(&self.calls).clone()
    }

    /// How many times `call` was made.
    #[must_use]
    pub fn count(&self, call: SessionCall) -> usize {
        lock(&self.calls).iter().filter(|c| **c == call).count()
    }

    /// Number of `stop_updates` calls.
    #[must_use]
    pub fn stops(&self) -> usize {
        self.count(SessionCall::StopUpdates)
    }

    /// Whether updates were started and not stopped since.
    #[must_use]
    pub fn is_sensing(&self) -> bool {
        *lock(&self.sensing)
    }

    fn record(&self, call: SessionCall) {
        lock(&self.calls).push(call);
    }
}

impl fmt::Debug for ScriptedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedSession")
            .field("calls", &self.calls())
            .field("sensing", &self.is_sensing())
            .finish_non_exhaustive()
    }
}

struct SessionHandle(Arc<ScriptedSession>);

impl LocationSession for SessionHandle {
    fn authorization_status(&self) -> AuthorizationStatus {
        *lock(&self.0.status)
    }

    fn request_permission(&self) {
        self.0.record(SessionCall::RequestPermission);
    }

    fn start_updates(&self, accuracy: Accuracy) {
        let pending = lock(&self.0.on_start).take();
        if let Some(event) = pending {
            self.0.emit(event);
        }
        self.0.record(SessionCall::StartUpdates(accuracy));
        *lock(&self.0.sensing) = true;
    }

    fn stop_updates(&self) {
        self.0.record(SessionCall::StopUpdates);
        *lock(&self.0.sensing) = false;
    }
}
