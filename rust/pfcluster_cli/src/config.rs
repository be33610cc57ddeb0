use pfcluster::EngineConfig;
use serde::{
    Deserialize,
    Serialize,
};
use std::path::PathBuf;

use crate::cli::Cli;
use crate::errors::CliError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub input: Option<InputConfig>,
    #[serde(default)]
    pub analysis: EngineConfig,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InputConfig {
    /// Deconvoluted components, a JSON list.
    pub components: PathBuf,
    #[serde(default)]
    pub corrections: Option<PathBuf>,
    /// Identity resolution only runs when both of these are given.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub theoreticals: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

impl Config {
    /// Applies command line overrides and checks that inputs and outputs are set.
    pub fn with_cli_args(mut self, args: Cli) -> Result<Self, CliError> {
        if let Some(components) = args.components_file {
            match self.input {
                Some(ref mut input) => input.components = components,
                None => {
                    self.input = Some(InputConfig {
                        components,
                        corrections: None,
                        catalog: None,
                        theoreticals: None,
                    })
                }
            }
        }
        let Some(input) = self.input.as_mut() else {
            return Err(CliError::Config {
                source: "No input provided, please provide one in either the config file or with the --components-file flag".to_string(),
            });
        };
        if args.corrections_file.is_some() {
            input.corrections = args.corrections_file;
        }
        if args.catalog_file.is_some() {
            input.catalog = args.catalog_file;
        }
        if args.theoreticals_file.is_some() {
            input.theoreticals = args.theoreticals_file;
        }

        if let Some(directory) = args.output_dir {
            self.output = Some(OutputConfig { directory });
        }
        if self.output.is_none() {
            return Err(CliError::Config {
                source: "No output directory provided, please provide one in either the config file or with the --output-dir flag".to_string(),
            });
        }
        if args.threads.is_some() {
            self.analysis.concurrency = args.threads;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_overrides_config() {
        let config: Config = serde_json::from_str(
            r#"{"input": {"components": "a.json"}, "analysis": {"mass_tolerance_ppm": 10.0}}"#,
        )
        .unwrap();
        let args = Cli::parse_from(["pfcluster", "-c", "conf.json", "-o", "out", "-j", "3"]);
        let config = config.with_cli_args(args).unwrap();
        assert_eq!(config.analysis.mass_tolerance_ppm, 10.0);
        assert_eq!(config.analysis.missed_monoisotopics, 3);
        assert_eq!(config.analysis.concurrency, Some(3));
        assert_eq!(config.output.unwrap().directory, PathBuf::from("out"));
    }

    #[test]
    fn test_missing_output_is_an_error() {
        let config: Config = serde_json::from_str(r#"{"input": {"components": "a.json"}}"#).unwrap();
        let args = Cli::parse_from(["pfcluster", "-c", "conf.json"]);
        assert!(matches!(
            config.with_cli_args(args),
            Err(CliError::Config { .. })
        ));
    }
}
