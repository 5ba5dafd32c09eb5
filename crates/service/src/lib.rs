//! RSVP admission service: configuration, logging, wiring and background jobs
//! around the `domain` admission core.

pub mod bootstrap;
pub mod config;
pub mod jobs;
pub mod logging;
pub mod metrics;
