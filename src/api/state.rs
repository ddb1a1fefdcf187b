//! API server state

use std::sync::Arc;

use crate::storage::PlantStore;

/// API server state
///
/// The store is built once at startup and shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlantStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn PlantStore>) -> Self {
        Self { store }
    }
}
