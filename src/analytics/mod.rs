// =============================================================================
// Market Analytics
// =============================================================================
//
// `engine` derives the cached views; `models` defines their wire shapes.
// =============================================================================

pub mod engine;
pub mod models;

pub use engine::{AnalyticsEngine, AnalyticsError};
pub use models::CachedView;
