//! The set of unresolved queries.
//!
//! Every terminal transition removes its request through [`Registry::claim`]
//! while holding the same lock, so when several triggers race for one
//! request exactly one of them gets it back.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    Effect, Location, LocationResult, LocationSession, QueryOptions, Request, RequestId,
    RequestState, Transition, Trigger,
};

/// What [`Registry::apply`] did to a pending request.
///
/// The lock is already released when this is returned; effects are for the
/// caller to perform.
pub enum Applied {
    /// The request moved to a new state and is still pending.
    Advanced {
        /// The new state.
        next: RequestState,
        /// Effects to perform, in order.
        effects: &'static [Effect],
        /// Options of the request.
        options: QueryOptions,
        /// Session serving the request.
        session: Arc<dyn LocationSession>,
    },
    /// The request was claimed. The caller now owns it and must resolve it.
    Resolved {
        /// The claimed request.
        request: Request,
        /// The outcome to deliver.
        outcome: LocationResult<Location>,
        /// Effects to perform before delivering the outcome.
        effects: &'static [Effect],
    },
}

impl fmt::Debug for Applied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advanced { next, effects, .. } => f
                .debug_struct("Advanced")
                .field("next", next)
                .field("effects", effects)
                .finish_non_exhaustive(),
            Self::Resolved {
                request,
                outcome,
                effects,
            } => f
                .debug_struct("Resolved")
                .field("request", request)
                .field("outcome", outcome)
                .field("effects", effects)
                .finish(),
        }
    }
}

/// Unresolved queries keyed by id.
#[derive(Debug, Default)]
pub struct Registry {
    pending: Mutex<HashMap<RequestId, Request>>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Completions never run under the lock, so a poisoned map is still consistent.
    fn pending(&self) -> MutexGuard<'_, HashMap<RequestId, Request>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a pending request.
    pub fn insert(&self, request: Request) {
        let previous = self.pending().insert(request.id(), request);
        debug_assert!(previous.is_none(), "request inserted twice");
    }

    /// Remove and return the request if it is still pending.
    ///
    /// Of any number of concurrent claims for the same id, exactly one
    /// returns `Some`.
    pub fn claim(&self, id: RequestId) -> Option<Request> {
        self.pending().remove(&id)
    }

    /// Run the transition for `trigger` against the stored state of `id`.
    ///
    /// Returns `None` if the request is no longer pending or the trigger
    /// does not affect it. Terminal transitions claim the request in the same
    /// critical section that evaluated them.
    pub fn apply(&self, id: RequestId, trigger: &Trigger) -> Option<Applied> {
        let mut pending = self.pending();
        let request = pending.get_mut(&id)?;

        match Transition::on_trigger(request.state(), trigger) {
            Transition::Stay => None,
            Transition::Advance { next, effects } => {
                request.set_state(next);
                Some(Applied::Advanced {
                    next,
                    effects,
                    options: request.options(),
                    session: Arc::clone(request.session()),
                })
            }
            Transition::Resolve { outcome, effects } => {
                let request = pending.remove(&id)?;
                Some(Applied::Resolved {
                    request,
                    outcome,
                    effects,
                })
            }
        }
    }

    /// Returns `true` if `id` is still pending.
    #[must_use]
    pub fn contains(&self, id: RequestId) -> bool {
        self.pending().contains_key(&id)
    }

    /// Number of pending requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending().len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending().is_empty()
    }
}
