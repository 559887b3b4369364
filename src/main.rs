use anyhow::Context;
use clap::{Parser, Subcommand};
use finsynth::application::forecast::{ForecastOrchestrator, ForecastService, ServiceError};
use finsynth::application::knowledge::{KnowledgeBase, StaticAssumptionsProvider};
use finsynth::config::{Config, ParserMode};
use finsynth::domain::errors::ForecastError;
use finsynth::domain::forecast::{AssumptionOverrides, ForecastIntent, RoundingPolicy, Timeframe};
use finsynth::domain::ports::{AssumptionsProvider, IntentParser};
use finsynth::infrastructure::{
    CsvWorkbookExporter, Database, KeywordIntentParser, Metrics, OpenAiIntentParser,
    SqliteForecastRepository,
};
use serde::Serialize;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about = "Revenue forecasts from plain-language questions", long_about = None)]
struct Cli {
    /// Print the prometheus registry after the command
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, compute, persist and export a forecast
    Query {
        /// The question, e.g. "SMB revenue for the next 6 months"
        text: String,

        /// Skip the spreadsheet export
        #[arg(long)]
        no_export: bool,
    },
    /// Run a projection directly, without parsing or persistence
    Compute {
        /// forecast_total_revenue, forecast_large_revenue, forecast_smb_revenue or explain_assumptions
        #[arg(short, long)]
        intent: String,

        /// Horizon in months (1-36)
        #[arg(short, long, default_value_t = Timeframe::DEFAULT as i64)]
        months: i64,

        /// Assumption overrides as JSON, e.g. '{"smb": {"marketing_spend": 300000}}'
        #[arg(long)]
        overrides: Option<String>,

        /// unrounded, cents, floor or ceil (defaults to ROUNDING_POLICY)
        #[arg(long)]
        rounding: Option<String>,
    },
    /// Print the effective default assumptions
    Assumptions,
    /// Show a stored forecast with its result
    Show { id: i64 },
    /// List stored forecasts, most recent first
    List {
        #[arg(long, default_value = "20")]
        limit: usize,

        #[arg(long, default_value = "0")]
        offset: usize,
    },
    /// Render the spreadsheet for a stored forecast again
    Export { id: i64 },
    /// Delete exported reports older than the retention period
    Cleanup {
        /// Retention in days (defaults to REPORT_RETENTION_DAYS)
        #[arg(long)]
        days: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine readable
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_client_error(&e) => {
            eprintln!("client error: {}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn is_client_error(e: &anyhow::Error) -> bool {
    if let Some(service) = e.downcast_ref::<ServiceError>() {
        return service.is_client_error();
    }
    e.downcast_ref::<ForecastError>()
        .is_some_and(ForecastError::is_client_error)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let metrics = if config.observability.enabled || cli.metrics {
        Some(Metrics::new()?)
    } else {
        None
    };

    let provider: Arc<dyn AssumptionsProvider> = Arc::new(StaticAssumptionsProvider::new(
        config.forecast.assumptions.clone(),
    ));

    match cli.command {
        Commands::Query { text, no_export } => {
            let service = build_service(&config, provider, metrics.clone()).await?;
            let mut outcome = service.submit_with_export(&text, !no_export).await?;
            if let Some(task) = outcome.export_task.take()
                && let Err(e) = task.await
            {
                warn!("Export task did not finish: {}", e);
            }
            print_json(&outcome)?;
        }
        Commands::Compute {
            intent,
            months,
            overrides,
            rounding,
        } => {
            let rounding = match rounding {
                Some(raw) => RoundingPolicy::from_str(&raw)?,
                None => config.forecast.rounding,
            };
            let overrides: AssumptionOverrides = match overrides {
                Some(raw) => serde_json::from_str(&raw).map_err(|e| ForecastError::InvalidQuery {
                    reason: format!("invalid overrides: {}", e),
                })?,
                None => AssumptionOverrides::default(),
            };

            let orchestrator = ForecastOrchestrator::new(provider, rounding)
                .with_enrichment(config.sales_enrichment());
            let intent = ForecastIntent::from_str(&intent)?;
            let timeframe = Timeframe::new(months)?;
            let started = Instant::now();
            let result = orchestrator.compute(intent, timeframe, &overrides)?;
            if let Some(metrics) = &metrics {
                metrics.observe_projection(intent.as_str(), started.elapsed().as_secs_f64());
            }
            print_json(&result)?;
        }
        Commands::Assumptions => {
            print_json(&provider.defaults())?;
        }
        Commands::Show { id } => {
            let service = build_service(&config, provider, metrics.clone()).await?;
            print_json(&service.get(id).await?)?;
        }
        Commands::List { limit, offset } => {
            let service = build_service(&config, provider, metrics.clone()).await?;
            print_json(&service.list(limit, offset).await?)?;
        }
        Commands::Export { id } => {
            let service = build_service(&config, provider, metrics.clone()).await?;
            print_json(&service.export(id).await?)?;
        }
        Commands::Cleanup { days } => {
            let days = days.unwrap_or(config.storage.report_retention_days);
            let exporter = CsvWorkbookExporter::new(config.storage.reports_dir.clone());
            let removed = exporter
                .cleanup_older_than(chrono::Duration::days(i64::from(days)))
                .await?;
            print_json(&serde_json::json!({
                "reports_dir": config.storage.reports_dir,
                "retention_days": days,
                "removed": removed,
            }))?;
        }
    }

    if cli.metrics {
        match &metrics {
            Some(metrics) => print!("{}", metrics.render()),
            None => warn!("Metrics are disabled"),
        }
    }
    Ok(())
}

async fn build_service(
    config: &Config,
    provider: Arc<dyn AssumptionsProvider>,
    metrics: Option<Metrics>,
) -> anyhow::Result<ForecastService> {
    let database = Database::new(&config.storage.database_url).await?;
    let repository = Arc::new(SqliteForecastRepository::new(database.pool.clone()));

    let parser: Arc<dyn IntentParser> = match config.parser.mode {
        ParserMode::OpenAi => {
            let api_key = config
                .parser
                .openai_api_key
                .clone()
                .context("OPENAI_API_KEY is required when PARSER_MODE=openai")?;
            Arc::new(OpenAiIntentParser::new(
                api_key,
                config.parser.openai_model.clone(),
                config.parser.openai_base_url.clone(),
                Duration::from_secs(config.parser.timeout_secs),
            ))
        }
        ParserMode::Keyword => Arc::new(KeywordIntentParser::new(
            config.forecast.assumptions.clone(),
            config.forecast.default_timeframe,
        )),
    };
    info!("Using {} intent parser", parser.name());

    let knowledge = Arc::new(KnowledgeBase::from_assumptions(&provider.defaults()));
    let orchestrator = Arc::new(
        ForecastOrchestrator::new(provider, config.forecast.rounding)
            .with_enrichment(config.sales_enrichment()),
    );

    let mut service = ForecastService::new(parser, repository, orchestrator, knowledge);
    if config.storage.export_enabled {
        service = service.with_exporter(Arc::new(CsvWorkbookExporter::new(
            config.storage.reports_dir.clone(),
        )));
    }
    if let Some(metrics) = metrics {
        service = service.with_metrics(metrics);
    }
    Ok(service)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}
