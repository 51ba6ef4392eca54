pub mod config;
pub mod error;
pub mod evaluate;
pub mod model;
pub mod ratios;
pub mod record;
pub mod scoring;
pub mod types;
pub mod zones;

#[cfg(feature = "batch")]
pub mod batch;

#[cfg(feature = "portfolio")]
pub mod portfolio;

pub use config::EngineConfig;
pub use error::{ErrorCategory, RiskError};
pub use evaluate::{EvaluationOptions, RiskEngine, ScoredRecord};
pub use model::{FittedModel, RiskModel};
pub use record::{FinancialRecord, RatioVector};
pub use types::*;
pub use zones::RiskZone;

/// Standard result type for all risk-scoring operations
pub type RiskResult<T> = Result<T, RiskError>;
