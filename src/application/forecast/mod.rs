pub mod enrichment;
pub mod orchestrator;
pub mod service;

pub use enrichment::SalesEnrichment;
pub use orchestrator::ForecastOrchestrator;
pub use service::{ForecastOutcome, ForecastService, ServiceError};
