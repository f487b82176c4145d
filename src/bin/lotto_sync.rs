use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use lotto_sync::app::{App, ImportResult, StatusResult, SyncResult};
use lotto_sync::config::ConfigLoader;
use lotto_sync::crawl::{CrawlConfig, StopReason};
use lotto_sync::dhlottery::DhLotteryClient;
use lotto_sync::error::LottoError;
use lotto_sync::output::{JsonOutput, OutputMode};
use lotto_sync::store::DataFile;

#[derive(Parser)]
#[command(name = "lotto-sync")]
#[command(about = "Incremental Lotto 6/45 draw archiver")]
#[command(version, author)]
struct Cli {
    /// Print results as JSON instead of a text summary
    #[arg(long, global = true)]
    json: bool,

    /// Config file path (default: lotto-sync.json, if present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Data file to read and update, overriding the config
    #[arg(long, global = true)]
    data_file: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch new rounds and merge them into the data file (the default)
    Sync,
    /// Rebuild the data file from locally saved HTML draw exports
    Import(ImportArgs),
    /// Show what the data file currently holds
    Status,
}

#[derive(Args)]
struct ImportArgs {
    /// Export files to parse
    #[arg(required = true)]
    files: Vec<Utf8PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(lotto) = report.downcast_ref::<LottoError>() {
            return ExitCode::from(map_exit_code(lotto));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &LottoError) -> u8 {
    match error {
        LottoError::ConfigRead(_)
        | LottoError::ConfigParse(_)
        | LottoError::ImportRead(_)
        | LottoError::ImportEmpty => 2,
        LottoError::Http(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let mut config = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;
    if let Some(data_file) = cli.data_file {
        config.data_file = data_file;
    }

    let client =
        DhLotteryClient::with_base_url(&config.base_url, config.timeout).into_diagnostic()?;
    let crawl_config = CrawlConfig {
        max_consecutive_failures: config.max_consecutive_failures,
        failure_delay: config.failure_delay,
    };
    let app = App::new(
        DataFile::new(config.data_file.clone()),
        client,
        crawl_config,
    );

    match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => {
            let result = app.sync().into_diagnostic()?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_sync(&result).into_diagnostic()?,
                OutputMode::Text => print_sync_summary(&result),
            }
        }
        Commands::Import(args) => {
            let result = app.import(&args.files).into_diagnostic()?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_import(&result).into_diagnostic()?,
                OutputMode::Text => print_import_summary(&result),
            }
        }
        Commands::Status => {
            let result = app.status();
            match output_mode {
                OutputMode::Json => JsonOutput::print_status(&result).into_diagnostic()?,
                OutputMode::Text => print_status_summary(&result),
            }
        }
    }

    Ok(())
}

fn print_sync_summary(result: &SyncResult) {
    if result.fetched == 0 {
        println!(
            "No new draws; {} holds rounds 1..={} as before.",
            result.data_file,
            result.total_rounds
        );
    } else {
        println!(
            "Fetched {} new draws; {} now holds rounds 1..={}.",
            result.fetched, result.data_file, result.total_rounds
        );
    }
    if result.stop == StopReason::FailureBudgetExhausted {
        println!("Stopped early after repeated fetch failures; run again later to catch up.");
    }
}

fn print_import_summary(result: &ImportResult) {
    println!(
        "Imported {} draw rows (latest round {}) into {}.",
        result.rounds, result.latest_round, result.data_file
    );
}

fn print_status_summary(result: &StatusResult) {
    if result.rounds == 0 {
        println!("{} holds no rounds yet; a sync starts from round 1.", result.data_file);
        return;
    }
    match &result.latest_date {
        Some(date) => println!(
            "{} holds {} rounds; latest round {} drawn on {}.",
            result.data_file,
            result.rounds,
            result.rounds,
            date
        ),
        None => println!(
            "{} holds {} rounds; latest round {} has no recorded date.",
            result.data_file, result.rounds, result.rounds
        ),
    }
}
