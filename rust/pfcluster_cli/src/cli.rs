use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Path to the components JSON file (will over-write the config file)
    #[arg(short = 'i', long)]
    pub components_file: Option<PathBuf>,

    /// Path to the per-scan mass corrections JSON file
    #[arg(long)]
    pub corrections_file: Option<PathBuf>,

    /// Path to the modification catalog JSON file
    #[arg(long)]
    pub catalog_file: Option<PathBuf>,

    /// Path to the theoretical proteoforms JSON file
    #[arg(short, long)]
    pub theoreticals_file: Option<PathBuf>,

    /// Path to the output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of worker threads (will over-write the config file)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,
}
