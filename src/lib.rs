//! # Pinpoint
//!
//! Answers "where is the device right now?" exactly once per request.
//!
//! A continuous, callback-driven location stream is turned into a single,
//! timeout-bounded result: either a [`location::Location`] or one
//! [`location::LocationError`].
//!
//! ## Features
//!
//! - `permission`: Authorization status types shared with location backends.
//! - `location`: The one-shot [`location::Locator`] and its backend traits.
//!
//! Use the `full` feature to enable everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! pinpoint = { version = "0.1", features = ["location"] }
//! ```
//!
//! ```rust,ignore
//! use pinpoint::location::{Locator, QueryOptions};
//!
//! async fn print_coords(locator: &Locator) {
//!     if let Ok(pos) = locator.locate(QueryOptions::default()).await {
//!         println!("Latitude: {}, Longitude: {}", pos.latitude, pos.longitude);
//!     }
//! }
//! ```

#[cfg(feature = "location")]
pub use pinpoint_location as location;

#[cfg(feature = "permission")]
pub use pinpoint_permission as permission;
