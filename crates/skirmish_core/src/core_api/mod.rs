mod engine;
mod error;
mod types;

pub use engine::Engine;
pub use error::{CoreError, CoreErrorCode};
pub use types::{
    CategoryCounts, FileIssue, FileReport, FileStats, RestoreOutcome, RunOptions, RunReport,
    SoftMiss, ValidationWarning,
};
