//! Application state for the web layer.

use std::sync::Arc;

use crate::dispatch::DispatchBoard;
use crate::gps::CachedGpsClient;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Trips, manifests and the reference directory
    pub board: Arc<DispatchBoard>,

    /// Live ETA provider, when configured
    pub gps: Option<Arc<CachedGpsClient>>,
}

impl AppState {
    pub fn new(board: Arc<DispatchBoard>, gps: Option<CachedGpsClient>) -> Self {
        Self {
            board,
            gps: gps.map(Arc::new),
        }
    }
}
