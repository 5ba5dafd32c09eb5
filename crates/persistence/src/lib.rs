//! Persistence layer for the RSVP admission core.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - PostgreSQL implementations of the domain store traits

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;

pub use db::{create_pool, run_migrations, DatabaseConfig};
pub use repositories::{EventRepository, RsvpRepository};
