use clap::{Parser, Subcommand};

mod commands;

use commands::{AlignArgs, EvaluateArgs, ValidateArgs};

#[derive(Parser)]
#[command(name = "impact")]
#[command(about = "Event/price correlation and data-quality validation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Align events, score data quality and run the statistical analysis
    Evaluate(EvaluateArgs),
    /// Print only the data-quality report
    Validate(ValidateArgs),
    /// Print only the aligned impact records
    Align(AlignArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Evaluate(args) => commands::run_evaluate(args),
        Commands::Validate(args) => commands::run_validate(args),
        Commands::Align(args) => commands::run_align(args),
    }
}
