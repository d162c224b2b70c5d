use std::sync::Arc;

use crate::clock::Clock;
use crate::services::PlannerService;
use crate::store::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn planner(&self) -> PlannerService {
        PlannerService::new(self.store.clone(), self.clock.clone())
    }
}
