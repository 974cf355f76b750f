use geodemand_pipeline::{BatchOrchestrator, PipelineStores};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<BatchOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: BatchOrchestrator) -> Self {
        Self { orchestrator: Arc::new(orchestrator) }
    }

    pub fn stores(&self) -> &PipelineStores {
        self.orchestrator.stores()
    }
}
