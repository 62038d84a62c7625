use vps_control::Orchestrator;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub config: AppConfig,
}
