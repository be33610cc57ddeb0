mod cli;
mod config;
mod errors;
mod processing;

use clap::Parser;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::Config;

#[cfg(target_os = "windows")]
use mimalloc::MiMalloc;

#[cfg(target_os = "windows")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> std::result::Result<(), errors::CliError> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        ) // This uses RUST_LOG environment variable
        .init();

    let args = Cli::parse();

    let conf = match std::fs::File::open(args.config.clone()) {
        Ok(x) => x,
        Err(e) => {
            return Err(errors::CliError::Io {
                source: e.to_string(),
                path: Some(args.config.to_string_lossy().to_string()),
            });
        }
    };
    let config: Config = match serde_json::from_reader(conf) {
        Ok(x) => x,
        Err(e) => {
            return Err(errors::CliError::ParseError {
                msg: e.to_string(),
                path: None,
            });
        }
    };
    let config = config.with_cli_args(args)?;
    info!("Parsed configuration: {:#?}", config);

    let (Some(input), Some(output)) = (config.input, config.output) else {
        return Err(errors::CliError::Config {
            source: "Input and output must both be set".to_string(),
        });
    };

    if let Err(e) = std::fs::create_dir_all(&output.directory) {
        return Err(errors::CliError::Io {
            source: e.to_string(),
            path: Some(output.directory.to_string_lossy().to_string()),
        });
    }

    let store = processing::load_store(&input)?;
    processing::process(store, config.analysis, &input, &output)
}
