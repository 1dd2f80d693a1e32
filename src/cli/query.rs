use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use exif_tagger::config::DEFAULT_CONFIG_PATH;
use exif_tagger::{logging, pipeline, report};

#[derive(Parser, Debug)]
#[command(
    name = "exif-tagger-query",
    version,
    about = "Show Make, Model and Lens Model for every matching image in a directory tree"
)]
struct Cli {
    /// Directory to scan recursively
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,

    /// Path to the INI config file (only target_extensions is used)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_console_logger(cli.verbose);

    let rows = match pipeline::run_query(&cli.directory, &cli.config) {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if rows.is_empty() {
        println!("No matching files found in {}", cli.directory.display());
        return ExitCode::SUCCESS;
    }

    for line in report::summary_table(&rows) {
        println!("{line}");
    }
    ExitCode::SUCCESS
}
