pub mod core;
pub mod export;
pub mod llm;
pub mod observability;
pub mod persistence;
pub mod repositories;

pub use export::CsvWorkbookExporter;
pub use llm::{KeywordIntentParser, OpenAiIntentParser};
pub use observability::Metrics;
pub use persistence::{Database, SqliteForecastRepository};
pub use repositories::InMemoryForecastRepository;
