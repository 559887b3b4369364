pub mod aggregation;
pub mod intent;
pub mod overrides;
pub mod profile;
pub mod projector;
pub mod record;
pub mod result;
pub mod rounding;
pub mod snapshot;

pub use intent::{ForecastIntent, ForecastType, ParsedIntent, Timeframe};
pub use overrides::{AssumptionOverrides, LargeOverrides, SmbOverrides};
pub use profile::{Assumptions, EnterpriseProfile, SmbProfile};
pub use record::{ForecastDetails, ForecastRecord, ForecastStatus, RunMetadata, StoredResult};
pub use result::{CombinedMonth, ForecastResult, ForecastSummary, MonthlyData, PresentationFigures};
pub use rounding::RoundingPolicy;
pub use snapshot::{MonthSnapshot, Segment};
