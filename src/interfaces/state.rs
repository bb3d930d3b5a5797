use std::sync::Arc;

use crate::application::CompareExportUseCase;
use crate::domain::error::Result;
use crate::infrastructure::activity_log::ActivityLog;
use crate::infrastructure::config::AppConfig;

/// Everything a front end needs to drive comparisons
pub struct AppState {
    pub config: AppConfig,
    pub activity_log: Arc<ActivityLog>,
    pub compare_use_case: Arc<CompareExportUseCase>,
}

impl AppState {
    /// State backed by the configured log file
    pub fn new(config: AppConfig) -> Result<Self> {
        let activity_log = Arc::new(ActivityLog::with_file(&config.log_file)?);
        Ok(Self::with_log(config, activity_log))
    }

    pub fn with_log(config: AppConfig, activity_log: Arc<ActivityLog>) -> Self {
        let compare_use_case = Arc::new(CompareExportUseCase::new(
            config.compare.clone(),
            activity_log.clone(),
        ));
        Self {
            config,
            activity_log,
            compare_use_case,
        }
    }
}
