use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;

use exif_tagger::{backup, logging};

#[derive(Parser, Debug)]
#[command(
    name = "exif-tagger-cleanup",
    version,
    about = "Delete every .bak file under a directory tree. There is no undo."
)]
struct Cli {
    /// Directory to clean recursively
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_console_logger(cli.verbose);

    if !cli.directory.is_dir() {
        bail!("Directory not found: {}", cli.directory.display());
    }

    backup::cleanup_backups(&cli.directory)?;
    Ok(())
}
