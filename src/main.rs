use std::path::PathBuf;

use clap::Parser;
use merchant_mid_report::{Config, ReportError, Result, SourceMode, pipeline};
use tracing_subscriber::EnvFilter;

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging()?;
    let config = Config::new(
        cli.upload_folder,
        cli.results_folder,
        cli.output_dir,
        cli.source_mode,
    )?;
    for path in pipeline::generate_report(&config)? {
        println!("{}", path.display());
    }
    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ReportError::Logging(error.to_string()))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Summarise transaction exports into a per-merchant/MID workbook."
)]
struct Cli {
    /// Folder holding the transaction exports.
    #[arg(long, env = "UPLOAD_FOLDER")]
    upload_folder: PathBuf,

    /// Results folder. Checked at startup; the report is written to --output-dir.
    #[arg(long, env = "RESULTS_FOLDER")]
    results_folder: Option<PathBuf>,

    /// Folder the report workbook is written to.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Which loaded files feed the report.
    #[arg(long, value_enum, default_value_t = SourceMode::LastFile)]
    source_mode: SourceMode,
}
