// Execution Context
//
// State shared by every expression evaluated during one statement
// execution: the optimizer settings, the current row of each table filter,
// and the registry that tracks scoped resources such as subquery probes.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{error, trace};
use parking_lot::Mutex;

use crate::common::settings::Settings;
use crate::common::types::{FilterId, ResourceId};
use crate::query::executor::probe::Probe;
use crate::query::executor::result::{DataValue, QueryError, QueryResult, Row};

/// Execution-scoped registry of open resources.
///
/// Many predicates of one statement register their probes here. The
/// registry does not own the probes; it records which ones are open so the
/// statement can check that everything was released.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    open: Mutex<HashMap<ResourceId, String>>,
    next_id: AtomicU64,
    registered: AtomicU64,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `probe` and return a guard that releases it when dropped
    pub fn register_probe<'a>(&'a self, probe: Box<dyn Probe>, label: &str) -> ScopedProbe<'a> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.registered.fetch_add(1, Ordering::SeqCst);
        self.open.lock().insert(id, label.to_string());
        trace!("Registered resource {} ({})", id, label);
        ScopedProbe {
            probe,
            id,
            registry: self,
        }
    }

    fn release(&self, id: ResourceId) {
        if self.open.lock().remove(&id).is_some() {
            trace!("Released resource {}", id);
        }
    }

    /// Number of resources registered and not yet released
    pub fn open_count(&self) -> usize {
        self.open.lock().len()
    }

    /// Labels of the resources still open
    pub fn open_resources(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.open.lock().values().cloned().collect();
        labels.sort();
        labels
    }

    /// Number of resources ever registered
    pub fn total_registered(&self) -> u64 {
        self.registered.load(Ordering::SeqCst)
    }
}

/// A probe owned by one evaluation. Closing and deregistration happen on
/// drop, so every exit path (including `?` and unwinding) releases it.
pub struct ScopedProbe<'a> {
    probe: Box<dyn Probe>,
    id: ResourceId,
    registry: &'a ResourceRegistry,
}

impl ScopedProbe<'_> {
    pub fn id(&self) -> ResourceId {
        self.id
    }
}

impl Deref for ScopedProbe<'_> {
    type Target = dyn Probe;

    fn deref(&self) -> &Self::Target {
        self.probe.as_ref()
    }
}

impl DerefMut for ScopedProbe<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.probe.as_mut()
    }
}

impl Drop for ScopedProbe<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.probe.close() {
            error!("Failed to close subquery result {}: {}", self.id, e);
        }
        self.registry.release(self.id);
    }
}

/// Context for evaluating expressions during one statement execution
#[derive(Debug)]
pub struct ExecutionContext {
    settings: Settings,
    registry: Arc<ResourceRegistry>,
    current_rows: HashMap<FilterId, Row>,
}

impl ExecutionContext {
    pub fn new(settings: Settings) -> Self {
        Self::with_registry(settings, Arc::new(ResourceRegistry::new()))
    }

    /// Create a context that shares an existing registry
    pub fn with_registry(settings: Settings, registry: Arc<ResourceRegistry>) -> Self {
        ExecutionContext {
            settings,
            registry,
            current_rows: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Position `filter` on `row`
    pub fn set_current_row(&mut self, filter: FilterId, row: Row) {
        self.current_rows.insert(filter, row);
    }

    pub fn clear_current_row(&mut self, filter: FilterId) {
        self.current_rows.remove(&filter);
    }

    /// Value of column `index` in the current row of `filter`
    pub fn current_value(&self, filter: FilterId, index: usize) -> QueryResult<DataValue> {
        let row = self.current_rows.get(&filter).ok_or_else(|| {
            QueryError::ExecutionError(format!("Table filter {} is not positioned on a row", filter))
        })?;
        row.get(index).cloned().ok_or_else(|| {
            QueryError::ColumnNotFound(format!("column #{} of table filter {}", index, filter))
        })
    }
}
