//! Linehaul dispatch server.
//!
//! Resolves manifest route names to planner profiles, infers where
//! continuing freight is headed, estimates distance and arrival, and runs
//! trips through their lifecycle on a shared dispatch board behind a JSON
//! API.

pub mod config;
pub mod continuity;
pub mod directory;
pub mod dispatch;
pub mod domain;
pub mod eta;
pub mod geo;
pub mod gps;
pub mod load_factor;
pub mod resolve;
pub mod web;
