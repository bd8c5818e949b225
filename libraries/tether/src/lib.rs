//! This is a toolkit for keeping a client's view of a REST resource store
//! live. It was created for Marquee, so it doesn't include much that was
//! not needed for that project.
//!
//! The store is a plain CRUD collection server; it pushes nothing. Keeping
//! client state fresh therefore means polling, and polling done naively
//! flickers on transient failures, leaks timers on restart, and lets stale
//! in-flight responses overwrite fresh state. This crate packages the
//! patterns that avoid those traps:
//!
//! 1. [`ResourceClient`] issues typed requests against named collections
//!    and maps HTTP outcomes into the [`Error`] taxonomy at the boundary;
//!    nothing downstream handles raw responses.
//! 2. [`ReconcilingPoller`] runs the fetch-compare-publish cycle: results
//!    are sorted deterministically, diffed against the last published
//!    snapshot by identity and mutable fields, and republished only on a
//!    real change. `start()` supersedes any prior run; `stop()` wins
//!    against a fetch that is already in flight.
//! 3. [`SessionWatchdog`] is the single-entity specialization that forces
//!    logout when an account is suspended mid-session.
//!
//! Sounds simple, but the lifecycle corners (duplicate timers, publishes
//! racing a stop, empty-flicker on a bad tick) are exactly where the
//! hand-rolled versions went wrong.

pub mod client;
pub mod config;
pub mod error;
pub mod listeners;
pub mod poller;
pub mod watchdog;

pub use client::{Query, ResourceClient, SortOrder};
pub use config::StoreConfig;
pub use error::Error;
pub use listeners::{ListenerKey, Listeners};
pub use poller::{Health, Reconcile, ReconcilingPoller};
pub use watchdog::{SessionWatchdog, Suspension};
