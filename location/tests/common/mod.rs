#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use pinpoint_location::testing::ScriptedBackend;
use pinpoint_location::{
    AuthorizationStatus, Location, LocationResult, Locator, ManualScheduler,
};

pub type Outcomes = Arc<Mutex<Vec<LocationResult<Location>>>>;

pub fn recorder() -> (Outcomes, impl FnOnce(LocationResult<Location>) + Send + 'static) {
    let outcomes: Outcomes = Arc::default();
    let sink = Arc::clone(&outcomes);
    (outcomes, move |outcome| sink.lock().unwrap().push(outcome))
}

pub fn outcomes(outcomes: &Outcomes) -> Vec<LocationResult<Location>> {
    outcomes.lock().unwrap().clone()
}

pub fn fix(latitude: f64, longitude: f64) -> Location {
    Location {
        latitude,
        longitude,
        altitude: Some(12.0),
        horizontal_accuracy: Some(5.0),
        vertical_accuracy: None,
        timestamp: 1_700_000_000_000,
    }
}

pub struct Harness {
    pub backend: Arc<ScriptedBackend>,
    pub scheduler: Arc<ManualScheduler>,
    pub locator: Locator,
}

impl Harness {
    pub fn new(status: AuthorizationStatus) -> Self {
        let backend = Arc::new(ScriptedBackend::new(status));
        let scheduler = Arc::new(ManualScheduler::new());
        let locator = Locator::builder(backend.clone())
            .scheduler(scheduler.clone())
            .build()
            .unwrap();
        Self {
            backend,
            scheduler,
            locator,
        }
    }
}
