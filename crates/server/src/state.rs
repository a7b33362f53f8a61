use std::path::PathBuf;
use std::sync::Arc;

use orchestrator::TaskOrchestrator;

use crate::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TaskOrchestrator>,
    pub app_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(orchestrator: TaskOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            app_dir: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> orchestrator::Result<Self> {
        let orchestrator = TaskOrchestrator::from_config(settings.agent.clone())?;
        let state = Self::new(orchestrator);
        Ok(match &settings.app_dir {
            Some(dir) => state.with_app_dir(dir.clone()),
            None => state,
        })
    }

    pub fn with_app_dir(mut self, app_dir: PathBuf) -> Self {
        self.app_dir = Some(app_dir);
        self
    }
}
