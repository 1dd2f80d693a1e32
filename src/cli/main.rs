use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use exif_tagger::config::DEFAULT_CONFIG_PATH;
use exif_tagger::{logging, pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "exif-tagger-cli",
    version,
    about = "Write the EXIF tags from a config file to every matching image in a directory tree"
)]
struct Cli {
    /// Directory to process recursively
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,

    /// Path to the INI config file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init_file_logger(Path::new(logging::LOG_FILE), cli.verbose);

    if !cli.directory.is_dir() {
        log::error!("Directory not found: {}", cli.directory.display());
        eprintln!("Error: directory not found: {}", cli.directory.display());
        return ExitCode::FAILURE;
    }

    let result = pipeline::run_batch(&cli.directory, &cli.config, &mut |line| println!("{line}"));

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
