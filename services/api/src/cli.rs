use crate::report::{run_analysis, AnalyzeArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use fmv_core::error::AppError;
use fmv_core::fmv::percentile::PercentileStrategy;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "FMV Review",
    about = "Serve or run provider compensation fair-market-value analyses",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Analyze one provider from CSV files and print the risk report
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Persist FMV state as JSON files in this directory
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Percentile strategy: interpolated (default) or rank
    #[arg(long, value_parser = crate::infra::parse_strategy)]
    pub(crate) strategy: Option<PercentileStrategy>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Analyze(args) => run_analysis(args),
    }
}
