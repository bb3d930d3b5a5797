pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

mod app;

pub use app::run;
pub use application::CompareExportUseCase;
pub use domain::device::{CompareOutcome, MatchResult};
pub use domain::error::{AppError, CompareError};
pub use infrastructure::activity_log::ActivityLog;
pub use infrastructure::config::{AppConfig, ConfigService};
