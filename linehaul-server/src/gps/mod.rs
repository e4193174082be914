//! Live ETAs from the fleet GPS provider.

mod cache;
mod client;
mod error;

pub use cache::{CachedGpsClient, GpsCacheConfig};
pub use client::{GpsClient, GpsConfig, GpsEta};
pub use error::GpsError;
