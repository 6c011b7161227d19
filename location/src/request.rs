//! A pending query and the transitions that drive it.
//!
//! The transition functions here are pure: given the current state and a
//! trigger they return the next state (or the outcome) and the side effects
//! the caller must perform. Nothing in this module touches a backend.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use pinpoint_permission::AuthorizationStatus;

use crate::{
    Location, LocationError, LocationEvent, LocationResult, LocationSession, QueryOptions,
};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a query. Two queries with identical options still get
/// distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    /// Allocate a fresh id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a pending query is in its lifecycle.
///
/// There is no resolved state: a resolved query has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    /// Waiting for the user to answer the permission prompt. No timeout runs.
    AwaitingAuthorization,
    /// The backend is sensing and the timeout is armed.
    Sensing,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Show the permission prompt.
    RequestPermission,
    /// Start sensing at the query's accuracy.
    StartSensing,
    /// Stop sensing.
    StopSensing,
    /// Arm the query's timeout.
    ArmTimeout,
}

const BEGIN_SENSING: &[Effect] = &[Effect::StartSensing, Effect::ArmTimeout];
const END_SENSING: &[Effect] = &[Effect::StopSensing];

/// Something that can move a pending query forward.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// A notification from the query's session.
    Event(LocationEvent),
    /// The armed timeout fired.
    TimeoutElapsed,
}

impl From<LocationEvent> for Trigger {
    fn from(event: LocationEvent) -> Self {
        Self::Event(event)
    }
}

/// Result of feeding a trigger to a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Nothing changes.
    Stay,
    /// The query moves to `next`; perform `effects` in order.
    Advance {
        /// The new state.
        next: RequestState,
        /// Effects to perform, in order.
        effects: &'static [Effect],
    },
    /// The query is finished; perform `effects`, then deliver `outcome`.
    Resolve {
        /// The single outcome of the query.
        outcome: LocationResult<Location>,
        /// Effects to perform before delivering the outcome.
        effects: &'static [Effect],
    },
}

/// How a freshly created query starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The query is registered in `state`; perform `effects` in order.
    Pending {
        /// The state the query starts in.
        state: RequestState,
        /// Effects to perform, in order.
        effects: &'static [Effect],
    },
    /// The query fails without ever being registered.
    Refused(LocationError),
}

impl Admission {
    /// Decide how a query starts given the status read at creation time.
    #[must_use]
    pub const fn on_creation(status: AuthorizationStatus) -> Self {
        match status {
            AuthorizationStatus::Authorized => Self::Pending {
                state: RequestState::Sensing,
                effects: BEGIN_SENSING,
            },
            AuthorizationStatus::Undetermined => Self::Pending {
                state: RequestState::AwaitingAuthorization,
                effects: &[Effect::RequestPermission],
            },
            other => Self::Refused(authorization_failure(other)),
        }
    }
}

impl From<Admission> for Transition {
    fn from(admission: Admission) -> Self {
        match admission {
            Admission::Pending { state, effects } => Self::Advance {
                next: state,
                effects,
            },
            Admission::Refused(error) => Self::Resolve {
                outcome: Err(error),
                effects: &[],
            },
        }
    }
}

impl Transition {
    /// Decide what a pending query in `state` does when `trigger` arrives.
    #[must_use]
    pub fn on_trigger(state: RequestState, trigger: &Trigger) -> Self {
        match state {
            RequestState::AwaitingAuthorization => awaiting_authorization(trigger),
            RequestState::Sensing => sensing(trigger),
        }
    }

    /// Returns `true` if this transition finishes the query.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolve { .. })
    }
}

fn awaiting_authorization(trigger: &Trigger) -> Transition {
    let Trigger::Event(LocationEvent::AuthorizationChanged { status }) = trigger else {
        return Transition::Stay;
    };

    match status {
        AuthorizationStatus::Undetermined => Transition::Stay,
        status => Admission::on_creation(*status).into(),
    }
}

fn sensing(trigger: &Trigger) -> Transition {
    let outcome = match trigger {
        Trigger::Event(LocationEvent::PositionUpdate { locations }) => {
            locations.first().cloned().ok_or(LocationError::Unknown)
        }
        Trigger::Event(LocationEvent::Failure { reason }) => {
            Err(LocationError::Provider(reason.clone()))
        }
        Trigger::Event(LocationEvent::AuthorizationChanged {
            status: status @ (AuthorizationStatus::Denied | AuthorizationStatus::Restricted),
        }) => Err(authorization_failure(*status)),
        Trigger::Event(LocationEvent::AuthorizationChanged { .. }) => return Transition::Stay,
        Trigger::TimeoutElapsed => Err(LocationError::Timeout),
    };

    Transition::Resolve {
        outcome,
        effects: END_SENSING,
    }
}

const fn authorization_failure(status: AuthorizationStatus) -> LocationError {
    match status {
        AuthorizationStatus::Denied => LocationError::PermissionDenied,
        AuthorizationStatus::Restricted => LocationError::PermissionRestricted,
        _ => LocationError::Unknown,
    }
}

/// Single-use sink for a query's outcome.
pub type Completion = Box<dyn FnOnce(LocationResult<Location>) + Send>;

/// One pending query.
///
/// A request is consumed by [`Request::resolve`], so its completion cannot
/// run twice.
pub struct Request {
    id: RequestId,
    options: QueryOptions,
    state: RequestState,
    session: Arc<dyn LocationSession>,
    completion: Completion,
}

impl Request {
    /// Create a request in `state`.
    #[must_use]
    pub fn new(
        id: RequestId,
        options: QueryOptions,
        state: RequestState,
        session: Arc<dyn LocationSession>,
        completion: Completion,
    ) -> Self {
        Self {
            id,
            options,
            state,
            session,
            completion,
        }
    }

    /// The request's identity.
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    /// The options the request was created with.
    #[must_use]
    pub const fn options(&self) -> QueryOptions {
        self.options
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> RequestState {
        self.state
    }

    pub(crate) const fn set_state(&mut self, state: RequestState) {
        self.state = state;
    }

    /// The session serving this request.
    #[must_use]
    pub fn session(&self) -> &Arc<dyn LocationSession> {
        &self.session
    }

    /// Deliver the outcome, consuming the request.
    pub fn resolve(self, outcome: LocationResult<Location>) {
        (self.completion)(outcome);
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
