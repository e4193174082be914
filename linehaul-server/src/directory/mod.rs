//! Reference data: terminals, route profiles, route records, equipment, drivers.
//!
//! The resolution engine only ever reads an immutable [`Directory`]
//! snapshot. [`SharedDirectory`] holds the current snapshot behind a lock
//! so it can be reloaded from disk without disturbing readers that already
//! hold the previous one.

mod error;
mod import;
mod snapshot;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::domain::{
    Dolly, Driver, DriverId, Manifest, ProfileId, RouteProfile, RouteRecord, Terminal, TerminalCode,
    Trailer, Truck, UnitNumber,
};

pub use error::DirectoryError;
pub use import::{RouteImport, RouteRow, import_route_rows};
pub use snapshot::Snapshot;

/// An immutable view of the reference data.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    terminals: HashMap<TerminalCode, Terminal>,
    /// Kept sorted by id so waterfall rules see a stable order.
    profiles: Vec<RouteProfile>,
    routes: Vec<RouteRecord>,
    trucks: HashMap<UnitNumber, Truck>,
    trailers: HashMap<UnitNumber, Trailer>,
    dollies: HashMap<UnitNumber, Dolly>,
    drivers: HashMap<DriverId, Driver>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_terminal(&mut self, terminal: Terminal) {
        self.terminals.insert(terminal.code, terminal);
    }

    /// Insert or replace a profile, keeping id order.
    pub fn add_profile(&mut self, profile: RouteProfile) {
        match self.profiles.binary_search_by_key(&profile.id, |p| p.id) {
            Ok(idx) => self.profiles[idx] = profile,
            Err(idx) => self.profiles.insert(idx, profile),
        }
    }

    pub fn add_route(&mut self, route: RouteRecord) {
        self.routes.push(route);
    }

    /// Replace the whole route table.
    pub fn replace_routes(&mut self, routes: Vec<RouteRecord>) {
        self.routes = routes;
    }

    pub fn add_truck(&mut self, truck: Truck) {
        self.trucks.insert(truck.unit_number.clone(), truck);
    }

    pub fn add_trailer(&mut self, trailer: Trailer) {
        self.trailers.insert(trailer.unit_number.clone(), trailer);
    }

    pub fn add_dolly(&mut self, dolly: Dolly) {
        self.dollies.insert(dolly.unit_number.clone(), dolly);
    }

    pub fn add_driver(&mut self, driver: Driver) {
        self.drivers.insert(driver.id, driver);
    }

    pub fn terminal(&self, code: &TerminalCode) -> Option<&Terminal> {
        self.terminals.get(code)
    }

    pub fn terminal_count(&self) -> usize {
        self.terminals.len()
    }

    /// All profiles in id order.
    pub fn profiles(&self) -> &[RouteProfile] {
        &self.profiles
    }

    /// Profiles departing from `origin`.
    pub fn profiles_from<'a>(
        &'a self,
        origin: &'a TerminalCode,
    ) -> impl Iterator<Item = &'a RouteProfile> + 'a {
        self.profiles.iter().filter(move |p| &p.origin == origin)
    }

    pub fn profile(&self, id: ProfileId) -> Option<&RouteProfile> {
        self.profiles
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .map(|idx| &self.profiles[idx])
    }

    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    /// Route records whose name matches exactly.
    pub fn routes_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RouteRecord> + 'a {
        self.routes.iter().filter(move |r| r.name == name)
    }

    pub fn truck(&self, unit: &UnitNumber) -> Option<&Truck> {
        self.trucks.get(unit)
    }

    pub fn trailer(&self, unit: &UnitNumber) -> Option<&Trailer> {
        self.trailers.get(unit)
    }

    pub fn trailers(&self) -> impl Iterator<Item = &Trailer> {
        self.trailers.values()
    }

    pub fn dolly(&self, unit: &UnitNumber) -> Option<&Dolly> {
        self.dollies.get(unit)
    }

    pub fn driver(&self, id: DriverId) -> Option<&Driver> {
        self.drivers.get(&id)
    }
}

/// Thread-safe, reloadable directory.
///
/// Readers take a cheap `Arc` snapshot and never hold the lock while they
/// compute.
#[derive(Clone)]
pub struct SharedDirectory {
    inner: Arc<RwLock<Arc<Directory>>>,
    source: Option<PathBuf>,
}

impl SharedDirectory {
    /// Wrap an in-memory directory with no backing file.
    pub fn new(directory: Directory) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(directory))),
            source: None,
        }
    }

    /// Wrap a directory that was loaded from `path`, so it can be refreshed.
    pub fn with_source(directory: Directory, path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(directory))),
            source: Some(path.into()),
        }
    }

    /// The current snapshot.
    pub async fn snapshot(&self) -> Arc<Directory> {
        self.inner.read().await.clone()
    }

    /// Reload reference data from the backing file.
    ///
    /// On success, replaces the current snapshot and returns the number of
    /// profiles loaded. On failure, the existing snapshot is preserved.
    pub async fn refresh(&self) -> Result<usize, DirectoryError> {
        self.reload().await?;
        Ok(self.snapshot().await.profiles().len())
    }

    /// Reload from the backing file and hand back the manifests it lists.
    ///
    /// Returns `None` when there is no backing file.
    pub async fn reload(&self) -> Result<Option<Vec<Manifest>>, DirectoryError> {
        let Some(path) = self.source.as_deref() else {
            return Ok(None);
        };
        let snapshot = Snapshot::load(path)?;
        let count = snapshot.directory.profiles().len();

        let mut guard = self.inner.write().await;
        *guard = Arc::new(snapshot.directory);
        info!(profiles = count, "reference data refreshed");

        Ok(Some(snapshot.manifests))
    }

    /// Swap in a new route table, as a route import does.
    pub async fn replace_routes(&self, routes: Vec<RouteRecord>) -> usize {
        let mut guard = self.inner.write().await;
        let mut next = Directory::clone(&guard);
        let count = routes.len();
        next.replace_routes(routes);
        *guard = Arc::new(next);
        count
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
