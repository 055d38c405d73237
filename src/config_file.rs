use crate::cli::Args;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// JSON settings file accepted by --config. All fields are optional;
/// explicit command-line flags take precedence over file values.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub input_paths: Option<Vec<String>>,
    pub output_path: Option<String>,
    pub size: Option<u32>,
    pub extensions: Option<String>,
    pub jobs: Option<usize>,
    pub verbose: Option<bool>,
    pub json_progress: Option<bool>,
    pub report: Option<bool>,
}

impl Args {
    /// Load configuration from a JSON file and merge with command-line
    /// arguments. Command-line arguments take precedence.
    pub fn load_and_merge_config(&mut self) -> Result<()> {
        if let Some(config_path) = self.config_file.clone() {
            let contents = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config: ConfigFile = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            self.merge_from_config(config);

            if self.verbose {
                eprintln!("Loaded configuration from: {:?}", config_path);
            }
        }
        Ok(())
    }

    fn merge_from_config(&mut self, config: ConfigFile) {
        // Check whether arguments were explicitly provided on the command line
        let args_from_cli = std::env::args().collect::<Vec<_>>();
        let given = |flags: &[&str]| args_from_cli.iter().any(|a| flags.contains(&a.as_str()));

        if self.input_paths.is_empty() && !given(&["-i", "--input"]) {
            if let Some(inputs) = config.input_paths {
                self.input_paths = inputs.into_iter().map(PathBuf::from).collect();
            }
        }

        if self.output_dir.is_none() && !given(&["-o", "--output"]) {
            if let Some(output) = config.output_path {
                self.output_dir = Some(PathBuf::from(output));
            }
        }

        if self.size.is_none() && !given(&["-s", "--size"]) {
            self.size = config.size;
        }

        if !given(&["--extensions"]) {
            if let Some(extensions) = config.extensions {
                self.extensions_str = extensions;
            }
        }

        if self.jobs == 0 && !given(&["-j", "--jobs"]) {
            if let Some(jobs) = config.jobs {
                self.jobs = jobs;
            }
        }

        // Boolean flags only apply while still at their false default
        if !self.verbose {
            self.verbose = config.verbose.unwrap_or(false);
        }
        if !self.json_progress {
            self.json_progress = config.json_progress.unwrap_or(false);
        }
        if !self.report {
            self.report = config.report.unwrap_or(false);
        }
    }
}
