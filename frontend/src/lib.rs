//! Interactivity for the booking landing page: splash sequence, mobile menu,
//! scroll progress, smooth anchors, sticky header, reveal-on-scroll and the
//! back-to-top button.
//!
//! [`PageController`] holds all of the behavior and talks to the page through
//! the [`Dom`] trait, so it runs the same against the browser ([`web`]) and
//! against the in-memory page in `testing` (behind the `testing` feature).

pub mod config;
pub mod controller;
pub mod dom;
pub mod error;
pub mod rules;
pub mod schedule;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod throttle;
pub mod web;

pub use config::PageConfig;
pub use controller::{EventOutcome, HostRequest, IntersectionEntry, PageController};
pub use dom::{Dom, PageElements};
pub use error::{PageError, Result};
