use clap::{Parser, Subcommand};
use climate_service::api::{self, AppState};
use climate_service::config::{self, ServiceConfig};
use climate_service::db::{self, Dataset};
use climate_service::logging::{self, LogSource};
use climate_service::verify::{self, DatasetReport, VerificationStatus};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "climate_service", version, about = "Read-only climate observation query service")]
struct Cli {
    /// TOML configuration file. Defaults are used if it does not exist.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Check the dataset file and print a JSON report
    Verify,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&cli.config).await,
        Command::Verify => verify_only(&cli.config),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            logging::error(LogSource::System, None, &e.to_string());
            eprintln!("climate_service: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load(config_path: &std::path::Path) -> Result<ServiceConfig, Box<dyn Error>> {
    let config = config::load_config(config_path)?;
    logging::init_logger(
        config.log_level()?,
        config.logging.file.as_deref(),
        config.logging.timestamps,
    )?;
    Ok(config)
}

fn log_report(report: &DatasetReport) {
    let summary = format!(
        "dataset: {} station(s), {} measurement(s), {} to {}",
        report.station_count,
        report.measurement_count,
        report.first_date.as_deref().unwrap_or("-"),
        report.last_date.as_deref().unwrap_or("-"),
    );
    match report.status {
        VerificationStatus::Success => logging::info(LogSource::Database, None, &summary),
        VerificationStatus::PartialSuccess | VerificationStatus::Failed => {
            logging::warn(LogSource::Database, None, &summary);
            for issue in &report.issues {
                logging::warn(LogSource::Database, None, issue);
            }
        }
    }
}

async fn serve(config_path: &std::path::Path) -> Result<ExitCode, Box<dyn Error>> {
    let config = load(config_path)?;
    let dataset: Dataset = db::connect_and_verify(&config.database_path)?;

    match dataset.with_session(verify::verify_dataset) {
        Ok(report) => log_report(&report),
        Err(e) => logging::log_query_failure("startup verification", &e),
    }

    let app = api::router(AppState::new(dataset, &config));
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    logging::info(
        LogSource::System,
        None,
        &format!("listening on http://{}", listener.local_addr()?),
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    logging::info(LogSource::System, None, "shut down");
    Ok(ExitCode::SUCCESS)
}

fn verify_only(config_path: &std::path::Path) -> Result<ExitCode, Box<dyn Error>> {
    let config = load(config_path)?;
    let dataset = db::connect_and_verify(&config.database_path)?;
    let report = dataset.with_session(verify::verify_dataset)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    log_report(&report);

    Ok(match report.status {
        VerificationStatus::Failed => ExitCode::FAILURE,
        VerificationStatus::Success | VerificationStatus::PartialSuccess => ExitCode::SUCCESS,
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logging::warn(
            LogSource::System,
            None,
            &format!("could not listen for shutdown signal: {}", e),
        );
        std::future::pending::<()>().await;
    }
}
