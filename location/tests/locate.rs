mod common;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::fix;
use pinpoint_location::testing::ScriptedBackend;
use pinpoint_location::{Accuracy, AuthorizationStatus, LocationError, Locator, QueryOptions};

fn locator(status: AuthorizationStatus) -> (Arc<ScriptedBackend>, Locator) {
    let backend = Arc::new(ScriptedBackend::new(status));
    let locator = Locator::new(backend.clone()).unwrap();
    (backend, locator)
}

fn wait_for_session(backend: &ScriptedBackend) -> Arc<pinpoint_location::testing::ScriptedSession> {
    loop {
        if let Some(session) = backend.last_session() {
            return session;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

#[tokio::test]
async fn locate_resolves_with_first_position() {
    let (backend, locator) = locator(AuthorizationStatus::Authorized);

    let emitter = {
        let backend = Arc::clone(&backend);
        thread::spawn(move || {
            let session = wait_for_session(&backend);
            thread::sleep(Duration::from_millis(20));
            session.report(vec![fix(35.68, 139.69)]);
        })
    };

    let outcome = locator
        .locate(QueryOptions::new(Accuracy::Best, Duration::from_secs(5)))
        .await;
    emitter.join().unwrap();

    assert_eq!(outcome, Ok(fix(35.68, 139.69)));
    assert_eq!(locator.pending(), 0);
}

#[tokio::test]
async fn locate_times_out_on_silence() {
    let (backend, locator) = locator(AuthorizationStatus::Authorized);
    let started = Instant::now();

    let outcome = locator
        .locate(QueryOptions::new(Accuracy::Best, Duration::from_millis(50)))
        .await;

    assert_eq!(outcome, Err(LocationError::Timeout));
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert_eq!(backend.last_session().unwrap().stops(), 1);
}

#[tokio::test]
async fn locate_reports_refusal_immediately() {
    let (_backend, locator) = locator(AuthorizationStatus::Restricted);

    let outcome = locator.locate_with_defaults().await;
    assert_eq!(outcome, Err(LocationError::PermissionRestricted));
}

#[tokio::test]
async fn timeout_starts_when_permission_is_granted() {
    let (backend, locator) = locator(AuthorizationStatus::Undetermined);

    let answerer = {
        let backend = Arc::clone(&backend);
        thread::spawn(move || {
            let session = wait_for_session(&backend);
            // Longer than the timeout: the prompt itself is never timed.
            thread::sleep(Duration::from_millis(150));
            session.answer(AuthorizationStatus::Authorized);
            thread::sleep(Duration::from_millis(20));
            session.report(vec![fix(-33.86, 151.2)]);
        })
    };

    let outcome = locator
        .locate(QueryOptions::new(Accuracy::Best, Duration::from_millis(100)))
        .await;
    answerer.join().unwrap();

    assert_eq!(outcome, Ok(fix(-33.86, 151.2)));
}

#[tokio::test]
async fn denial_after_prompt_is_delivered() {
    let (backend, locator) = locator(AuthorizationStatus::Undetermined);

    let answerer = {
        let backend = Arc::clone(&backend);
        thread::spawn(move || {
            let session = wait_for_session(&backend);
            thread::sleep(Duration::from_millis(20));
            session.answer(AuthorizationStatus::Denied);
        })
    };

    let outcome = locator
        .locate(QueryOptions::new(Accuracy::Best, Duration::from_secs(5)))
        .await;
    answerer.join().unwrap();

    assert_eq!(outcome, Err(LocationError::PermissionDenied));
    assert!(!backend.last_session().unwrap().is_sensing());
}
