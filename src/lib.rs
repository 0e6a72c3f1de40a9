//! sonar-gate library crate
//!
//! Exposes the pipeline stages so integration tests can exercise them
//! without going through CLI startup.

pub mod config;
pub mod credentials;
pub mod hook;
pub mod pipeline;
pub mod report;
pub mod scanner;
pub mod sonar;
pub mod suggest;
pub mod triage;
