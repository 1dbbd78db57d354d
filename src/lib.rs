//! potsettle: poker session settlement
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod directory;
pub mod ledger;
pub mod engine;
pub mod bot;
