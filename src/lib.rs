//! Availability and conflict-detection engine for training events
//! coordinated across municipalities.
//!
//! Given a candidate booking (trainers, a time window, optionally a
//! location) the engine reports collisions with explicit unavailability
//! blocks, existing approved events, travel transitions, and daily workload
//! ceilings, and renders whole-month availability grids from three bulk
//! queries. It never decides approvals; reports are advisory and the
//! calling workflow must revalidate at commit time.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
