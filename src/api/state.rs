use crate::orchestrator::TestRunOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: TestRunOrchestrator,
}
