// Library exports for reuse by wrapping applications
pub mod cli;
pub mod config_file;
pub mod json_output;
pub mod pipeline;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use json_output::JsonMessage;
pub use pipeline::{
    BatchCoordinator, BatchEvent, BatchState, BatchStream, BatchSummary, CancelToken, ImageTask,
    ResizeAction, ResizeConfig, ResizeEngine, ResizePlan, TaskAction, TaskResult,
};
