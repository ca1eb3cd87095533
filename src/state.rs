use std::sync::Arc;

use crate::core::config::{AppPaths, ConfigService};
use crate::history::SessionRegistry;
use crate::pipeline::PipelineFactory;

#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub registry: Arc<SessionRegistry>,
    pub factory: Arc<PipelineFactory>,
}

impl AppState {
    pub fn initialize() -> anyhow::Result<Arc<Self>> {
        let paths = Arc::new(AppPaths::new());
        let config = ConfigService::new(paths.clone());
        let registry = Arc::new(SessionRegistry::new());
        let factory = Arc::new(PipelineFactory::new(Arc::clone(&registry), paths.clone()));

        Ok(Arc::new(AppState {
            paths,
            config,
            registry,
            factory,
        }))
    }
}
