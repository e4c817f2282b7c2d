use anyhow::Context;
use clap::Parser;
use snyk_github_app_migrator::apps;
use snyk_github_app_migrator::config::{Args, RunConfig};
use snyk_github_app_migrator::report::{Report, EXIT_CONFIG_ERROR, EXIT_SUCCESS};
use snyk_github_app_migrator::snyk::SnykClient;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(EXIT_CONFIG_ERROR)
            } else {
                ExitCode::from(EXIT_SUCCESS)
            };
        }
    };
    init_logging(args.verbose);

    match migrate(args).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            log::error!("{:#}", err);
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("snyk_github_app_migrator", level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

async fn migrate(args: Args) -> anyhow::Result<u8> {
    let config = RunConfig::from_env(args)?;
    log::debug!("Resolved configuration: {:?}", config);
    let client = SnykClient::new(&config).context("failed to build HTTP client")?;

    let mut report = Report::new();
    let outcome = apps::run(&client, &config, &mut report).await;
    report
        .write_summary(&mut std::io::stdout().lock())
        .context("failed to write report")?;
    outcome?;
    Ok(report.exit_code())
}
