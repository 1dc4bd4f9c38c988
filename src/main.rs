use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ledger_merge::process;
use ledger_merge::{Result, ToolError};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let json = cli.json();

    if let Err(error) = init_tracing() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }

    if let Err(error) = run(cli) {
        if json {
            match serde_json::to_string(&error.report()) {
                Ok(report) => println!("{report}"),
                Err(_) => eprintln!("error: {error}"),
            }
        } else {
            eprintln!("error [{}]: {error}", error.kind());
        }
        std::process::exit(1);
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ToolError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Merge(args) => execute_merge(args),
    }
}

fn execute_merge(args: MergeArgs) -> Result<()> {
    let outcome = process::process_workbook(&args.input, &args.output_dir)?;

    if args.json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        println!("{}: {}", outcome.message, outcome.path.display());
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Merge the Custom Report and Item Details sheets of a workbook."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn json(&self) -> bool {
        match &self.command {
            Command::Merge(args) => args.json,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Align both sheets on date and reference and write the merged report.
    Merge(MergeArgs),
}

#[derive(clap::Args)]
struct MergeArgs {
    /// Workbook containing the "Custom Report" and "Item Details" sheets.
    #[arg(long)]
    input: PathBuf,

    /// Directory receiving the processed workbook.
    #[arg(long, default_value = "processed")]
    output_dir: PathBuf,

    /// Print the outcome as JSON.
    #[arg(long)]
    json: bool,
}
