//! Shared fixtures for tests: lifecycle events, in-memory stores, a recording
//! connector, and live database helpers.

pub mod databases;
pub mod events;
pub mod recording;
pub mod stores;
