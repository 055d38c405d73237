use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "edgefit",
    about = "Batch image resizer that fits each image's longest edge to a target size",
    long_about = "
edgefit - Batch longest-edge image resizer

Resizes every image found under the input paths so that its longest edge
equals the requested pixel size, preserving aspect ratio. Outputs mirror the
input directory structure under the output root; images whose longest edge
already matches are copied byte-for-byte instead of re-encoded.

Example Usage:
  # Fit everything under ~/Photos to 2048px on the longest edge
  edgefit -i ~/Photos -s 2048

  # Several inputs, explicit output root and 8 workers
  edgefit -i ~/Photos -i ~/Downloads/scan.jpg -o ~/exports -s 1600 -j 8

  # Restrict extensions and show a results table afterwards
  edgefit -i ~/Photos -s 1200 --extensions jpg,png --report

  # Machine-readable progress for wrapping UIs
  edgefit -i ~/Photos -s 2048 --json-progress

  # Load defaults from a JSON config file (CLI flags win)
  edgefit --config ~/.config/edgefit.json -i ~/Photos"
)]
pub struct Args {
    /// Input directories or single image files (can be specified multiple times)
    #[arg(
        short = 'i',
        long = "input",
        required_unless_present = "config_file",
        value_name = "DIR|FILE"
    )]
    pub input_paths: Vec<PathBuf>,

    /// Output root directory (default: a "Resized" folder next to the first input)
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Target longest-edge size in pixels
    #[arg(
        short = 's',
        long = "size",
        required_unless_present = "config_file",
        value_name = "PIXELS"
    )]
    pub size: Option<u32>,

    /// Comma-separated list of image extensions to process
    #[arg(
        long = "extensions",
        default_value = "jpg,jpeg,png,webp,bmp,tiff,tif,jfif,gif"
    )]
    pub extensions_str: String,

    /// Number of parallel workers (0 = auto-detect CPU cores)
    #[arg(short = 'j', long = "jobs", default_value = "0", value_name = "N")]
    pub jobs: usize,

    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Emit progress and results as JSON lines on stdout
    #[arg(long = "json-progress")]
    pub json_progress: bool,

    /// Display a formatted per-file results table after the run
    #[arg(long = "report")]
    pub report: bool,

    /// Load settings from a JSON config file (explicit CLI flags take precedence)
    #[arg(long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,
}

impl Args {
    /// Parse the extensions string into a lower-cased vector
    pub fn parse_extensions(&self) -> Vec<String> {
        self.extensions_str
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Output root, defaulting to a sibling "Resized" folder under the first
    /// input's parent
    pub fn resolved_output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }

        let parent = self
            .input_paths
            .first()
            .and_then(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        parent.join("Resized")
    }
}


// Default implementation for tests
#[cfg(test)]
impl Default for Args {
    fn default() -> Self {
        Self {
            input_paths: vec![],
            output_dir: None,
            size: Some(1000),
            extensions_str: "jpg,jpeg,png,webp,bmp,tiff,tif,jfif,gif".to_string(),
            jobs: 0,
            verbose: false,
            json_progress: false,
            report: false,
            config_file: None,
        }
    }
}
