// Forecast orchestration and the end-to-end service
pub mod forecast;

// Knowledge context and default assumptions
pub mod knowledge;
