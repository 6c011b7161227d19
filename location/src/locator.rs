//! The one-shot location coordinator.

use std::fmt;
use std::sync::Arc;

use futures::channel::oneshot;
use log::{debug, trace, warn};

use crate::{
    Admission, Applied, Effect, Location, LocationBackend, LocationDelegate, LocationError,
    LocationEvent, LocationResult, LocationSession, QueryOptions, Registry, Request, RequestId,
    Scheduler, ThreadPoolScheduler, Trigger,
};

/// State shared between the locator, its per-request relays and armed
/// timeouts.
struct Shared {
    registry: Registry,
    scheduler: Arc<dyn Scheduler>,
}

impl Shared {
    fn dispatch(self: &Arc<Self>, id: RequestId, trigger: &Trigger) {
        match self.registry.apply(id, trigger) {
            None => trace!("location request {id}: ignoring {trigger:?}"),
            Some(Applied::Advanced {
                next,
                effects,
                options,
                session,
            }) => {
                debug!("location request {id}: now {next:?}");
                self.perform(id, options, &session, effects);
            }
            Some(Applied::Resolved {
                request,
                outcome,
                effects,
            }) => self.finish(request, outcome, effects),
        }
    }

    fn finish(
        self: &Arc<Self>,
        request: Request,
        outcome: LocationResult<Location>,
        effects: &[Effect],
    ) {
        let id = request.id();
        self.perform(id, request.options(), request.session(), effects);
        log_outcome(id, &outcome);
        request.resolve(outcome);
    }

    fn perform(
        self: &Arc<Self>,
        id: RequestId,
        options: QueryOptions,
        session: &Arc<dyn LocationSession>,
        effects: &[Effect],
    ) {
        for effect in effects {
            match effect {
                Effect::RequestPermission => {
                    debug!("location request {id}: requesting permission");
                    session.request_permission();
                }
                Effect::StartSensing => {
                    debug!("location request {id}: sensing at {:?}", options.accuracy);
                    session.start_updates(options.accuracy);
                    // A notification delivered from inside `start_updates` may
                    // already have resolved the query and stopped a session
                    // that was not started yet.
                    if !self.registry.contains(id) {
                        debug!("location request {id}: resolved while starting, stopping again");
                        session.stop_updates();
                        return;
                    }
                }
                Effect::StopSensing => session.stop_updates(),
                Effect::ArmTimeout => {
                    let shared = Arc::clone(self);
                    self.scheduler.schedule(
                        options.timeout,
                        Box::new(move || shared.dispatch(id, &Trigger::TimeoutElapsed)),
                    );
                }
            }
        }
    }
}

fn log_outcome(id: RequestId, outcome: &LocationResult<Location>) {
    match outcome {
        Ok(location) => debug!(
            "location request {id}: resolved at {}, {}",
            location.latitude, location.longitude
        ),
        Err(err) => debug!("location request {id}: failed: {err}"),
    }
}

/// Forwards one session's notifications to the request it serves.
struct RequestRelay {
    id: RequestId,
    shared: Arc<Shared>,
}

impl LocationDelegate for RequestRelay {
    fn on_event(&self, event: LocationEvent) {
        self.shared.dispatch(self.id, &Trigger::Event(event));
    }
}

impl fmt::Debug for RequestRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestRelay").field("id", &self.id).finish()
    }
}

/// Answers "where is the device right now?", once per query.
///
/// Each query resolves exactly once: with the first position reported after
/// sensing starts, or with a [`LocationError`]. Queries never keep sensing
/// after they resolve.
///
/// Pending queries keep the locator's internals alive, so dropping the
/// locator does not cut them short.
pub struct Locator {
    backend: Arc<dyn LocationBackend>,
    shared: Arc<Shared>,
    defaults: QueryOptions,
}

impl Locator {
    /// Create a locator with the default scheduler and options.
    ///
    /// # Errors
    ///
    /// Returns an error if the timer thread cannot be spawned.
    pub fn new(backend: Arc<dyn LocationBackend>) -> std::io::Result<Self> {
        Self::builder(backend).build()
    }

    /// Start configuring a locator.
    #[must_use]
    pub fn builder(backend: Arc<dyn LocationBackend>) -> LocatorBuilder {
        LocatorBuilder {
            backend,
            scheduler: None,
            defaults: QueryOptions::default(),
        }
    }

    /// Options used by [`Locator::query_with_defaults`] and
    /// [`Locator::locate_with_defaults`].
    #[must_use]
    pub const fn defaults(&self) -> QueryOptions {
        self.defaults
    }

    /// Number of queries that have not resolved yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.registry.len()
    }

    /// Returns `true` if the query `id` has not resolved yet.
    #[must_use]
    pub fn is_pending(&self, id: RequestId) -> bool {
        self.shared.registry.contains(id)
    }

    /// Query the current location, delivering the outcome to `completion`.
    ///
    /// Returns immediately. `completion` runs exactly once: on this thread
    /// before returning if authorization is already refused, otherwise
    /// later on whichever thread resolves the query.
    pub fn query<F>(&self, options: QueryOptions, completion: F) -> RequestId
    where
        F: FnOnce(LocationResult<Location>) + Send + 'static,
    {
        let id = RequestId::next();
        let relay = Arc::new(RequestRelay {
            id,
            shared: Arc::clone(&self.shared),
        });
        let session: Arc<dyn LocationSession> = Arc::from(self.backend.open_session(relay));
        let status = session.authorization_status();
        debug!(
            "location request {id}: created with {:?}, timeout {:?}, authorization {status}",
            options.accuracy, options.timeout
        );

        match Admission::on_creation(status) {
            Admission::Pending { state, effects } => {
                debug!("location request {id}: now {state:?}");
                let request = Request::new(
                    id,
                    options,
                    state,
                    Arc::clone(&session),
                    Box::new(completion),
                );
                self.shared.registry.insert(request);
                self.shared.perform(id, options, &session, effects);
            }
            Admission::Refused(error) => {
                let outcome = Err(error);
                log_outcome(id, &outcome);
                completion(outcome);
            }
        }

        id
    }

    /// [`Locator::query`] with the locator's default options.
    pub fn query_with_defaults<F>(&self, completion: F) -> RequestId
    where
        F: FnOnce(LocationResult<Location>) + Send + 'static,
    {
        self.query(self.defaults, completion)
    }

    /// Query the current location and wait for the outcome.
    ///
    /// # Errors
    ///
    /// Returns the [`LocationError`] the query resolved with.
    pub async fn locate(&self, options: QueryOptions) -> LocationResult<Location> {
        let (sender, receiver) = oneshot::channel();
        let id = self.query(options, move |outcome| {
            if sender.send(outcome).is_err() {
                warn!("location result dropped: nobody is waiting");
            }
        });
        trace!("location request {id}: awaiting outcome");
        receiver.await.unwrap_or(Err(LocationError::Unknown))
    }

    /// [`Locator::locate`] with the locator's default options.
    ///
    /// # Errors
    ///
    /// Returns the [`LocationError`] the query resolved with.
    pub async fn locate_with_defaults(&self) -> LocationResult<Location> {
        self.locate(self.defaults).await
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locator")
            .field("pending", &self.pending())
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Locator`].
pub struct LocatorBuilder {
    backend: Arc<dyn LocationBackend>,
    scheduler: Option<Arc<dyn Scheduler>>,
    defaults: QueryOptions,
}

impl LocatorBuilder {
    /// Use `scheduler` for timeouts instead of a [`ThreadPoolScheduler`].
    #[must_use]
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Options for the `*_with_defaults` entry points.
    #[must_use]
    pub fn defaults(mut self, defaults: QueryOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Build the locator.
    ///
    /// # Errors
    ///
    /// Returns an error if no scheduler was given and the default timer
    /// thread cannot be spawned.
    pub fn build(self) -> std::io::Result<Locator> {
        let scheduler = match self.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(ThreadPoolScheduler::new()?),
        };

        Ok(Locator {
            backend: self.backend,
            shared: Arc::new(Shared {
                registry: Registry::new(),
                scheduler,
            }),
            defaults: self.defaults,
        })
    }
}

impl fmt::Debug for LocatorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocatorBuilder")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}
