use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::analysis::ReportPipeline;
use crate::core::config::{AppPaths, ConfigService};
use crate::directive::{DirectiveIndex, SqliteDirectiveStore};
use crate::llm::LlmService;

#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub llm: LlmService,
    pub directive: DirectiveIndex,
    pub pipeline: ReportPipeline,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wire up the service from pre-built paths. The caller constructs
    /// `AppPaths` first so logging can be initialized before anything
    /// here emits events.
    pub async fn initialize(paths: Arc<AppPaths>) -> anyhow::Result<Arc<Self>> {
        let config = ConfigService::new(paths.clone());
        let llm = LlmService::from_config(config.clone())?;
        let store = SqliteDirectiveStore::new(&paths).await?;
        let directive = DirectiveIndex::new(Arc::new(store), llm.clone(), config.clone());
        let pipeline = ReportPipeline::new(
            llm.clone(),
            directive.clone(),
            config.clone(),
            paths.clone(),
        );
        let started_at = Utc::now();

        Ok(Arc::new(AppState {
            paths,
            config,
            llm,
            directive,
            pipeline,
            started_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn initialize_wires_state_from_given_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Arc::new(AppPaths::for_test(tmp.path()));

        let state = AppState::initialize(paths.clone()).await.unwrap();

        assert_eq!(state.paths.user_data_dir, paths.user_data_dir);
        assert!(paths.db_path.exists());
        assert_eq!(state.directive.passage_count().await.unwrap(), 0);
    }
}
