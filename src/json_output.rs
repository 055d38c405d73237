//! JSON output for wrapping UIs
//!
//! When the --json-progress flag is enabled, all progress and status
//! information is emitted as JSON lines to stdout, suppressing all other
//! output.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::pipeline::{TaskAction, TaskResult};

/// Last progress emission timestamp (milliseconds since epoch)
/// Used for throttling progress updates to ~25 FPS (40ms between updates)
static LAST_PROGRESS_MS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonMessage {
    /// Progress update
    Progress {
        current: usize,
        total: usize,
        message: String,
    },
    /// File resized or copied
    FileCompleted {
        input_path: String,
        output_path: String,
        action: String,
        width: u32,
        height: u32,
        processing_time_ms: u128,
    },
    /// File could not be decoded
    FileSkipped { input_path: String, reason: String },
    /// File processing failed
    FileFailed { input_path: String, error: String },
    /// Run summary
    Summary {
        total_files: usize,
        resized: usize,
        copied: usize,
        skipped: usize,
        failed: usize,
        duration_secs: f64,
        cancelled: bool,
    },
}

impl JsonMessage {
    /// Emit JSON message to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    /// Create and emit progress message (throttled to ~25 FPS)
    ///
    /// The final progress (current == total) is always emitted so consumers
    /// see 100% completion.
    pub fn progress(current: usize, total: usize, message: impl Into<String>) {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let last_ms = LAST_PROGRESS_MS.load(Ordering::Relaxed);

        if now_ms - last_ms >= 40 || current == total {
            LAST_PROGRESS_MS.store(now_ms, Ordering::Relaxed);
            Self::Progress {
                current,
                total,
                message: message.into(),
            }
            .emit();
        }
    }

    /// Emit the message matching a task outcome
    pub fn task_result(result: &TaskResult) {
        match result.action {
            TaskAction::Skipped => Self::FileSkipped {
                input_path: display(&result.source_path),
                reason: result
                    .error_detail
                    .clone()
                    .unwrap_or_else(|| "unreadable".to_string()),
            }
            .emit(),
            TaskAction::Errored => Self::FileFailed {
                input_path: display(&result.source_path),
                error: result
                    .error_detail
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            }
            .emit(),
            _ => {
                let (width, height) = result.final_dims.unwrap_or((0, 0));
                Self::FileCompleted {
                    input_path: display(&result.source_path),
                    output_path: display(&result.destination_path),
                    action: result.action.label().to_string(),
                    width,
                    height,
                    processing_time_ms: result.elapsed.as_millis(),
                }
                .emit()
            }
        }
    }

    /// Create and emit summary message
    pub fn summary(
        total_files: usize,
        resized: usize,
        copied: usize,
        skipped: usize,
        failed: usize,
        duration_secs: f64,
        cancelled: bool,
    ) {
        Self::Summary {
            total_files,
            resized,
            copied,
            skipped,
            failed,
            duration_secs,
            cancelled,
        }
        .emit();
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
