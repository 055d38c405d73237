pub mod batch;
pub mod orientation;
pub mod output;
pub mod plan;
pub mod resize;
pub mod scan;
pub mod worker;

use std::path::PathBuf;

use anyhow::Result;

pub use batch::{BatchCoordinator, BatchEvent, BatchState, BatchStream, BatchSummary, CancelToken};
pub use plan::{ResizeAction, ResizePlan};
pub use scan::{ScanOutcome, ScanWarning, ScannedFile};
pub use worker::{ImageTask, TaskAction, TaskResult};

/// Immutable run configuration, fixed at call time.
#[derive(Debug, Clone)]
pub struct ResizeConfig {
    /// Longest-edge target in pixels
    pub target_edge: u32,
    pub output_root: PathBuf,
    /// Lower-cased extensions without the leading dot
    pub extensions: Vec<String>,
    /// 0 = auto-detect CPU cores
    pub worker_count: usize,
}

/// Facade tying discovery, task construction and the batch run together.
pub struct ResizeEngine {
    config: ResizeConfig,
    coordinator: BatchCoordinator,
}

impl ResizeEngine {
    pub fn new(config: ResizeConfig) -> Self {
        let coordinator = BatchCoordinator::new(config.worker_count);
        Self {
            config,
            coordinator,
        }
    }

    /// Discover all image files among the input paths.
    pub fn discover(&self, inputs: &[PathBuf]) -> ScanOutcome {
        scan::discover_images(inputs, &self.config.extensions)
    }

    /// Turn scanned files into immutable tasks bound to the output root.
    pub fn plan_tasks(&self, files: &[ScannedFile]) -> Vec<ImageTask> {
        files
            .iter()
            .map(|file| ImageTask {
                source_path: file.path.clone(),
                scan_root: file.scan_root.clone(),
                output_root: self.config.output_root.clone(),
                target_edge: self.config.target_edge,
            })
            .collect()
    }

    /// Dispatch the tasks and return the completion-order event stream.
    pub fn start(&self, tasks: Vec<ImageTask>) -> Result<BatchStream> {
        self.coordinator.run(tasks)
    }

    /// Token for cancelling a run started from this engine.
    pub fn cancel_token(&self) -> CancelToken {
        self.coordinator.cancel_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_engine_end_to_end_mirrors_tree() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("photos");
        fs::create_dir_all(src.join("trip")).unwrap();
        let buf: image::RgbImage = ImageBuffer::from_fn(80, 40, |x, y| Rgb([x as u8, y as u8, 0]));
        buf.save(src.join("trip/wide.png")).unwrap();
        buf.save(src.join("top.png")).unwrap();

        let out_root = dir.path().join("Resized");
        let engine = ResizeEngine::new(ResizeConfig {
            target_edge: 40,
            output_root: out_root.clone(),
            extensions: vec!["png".to_string()],
            worker_count: 2,
        });

        let scanned = engine.discover(&[src.clone()]);
        assert_eq!(scanned.files.len(), 2);

        let tasks = engine.plan_tasks(&scanned.files);
        let mut resized = 0;
        for event in engine.start(tasks).unwrap() {
            if let BatchEvent::Result { result, .. } = event {
                assert!(result.action.is_success());
                resized += 1;
            }
        }
        assert_eq!(resized, 2);
        assert!(out_root.join("trip/wide.png").exists());
        assert!(out_root.join("top.png").exists());
    }

    #[test]
    fn test_rerun_into_cleared_output_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("photos");
        fs::create_dir_all(&src).unwrap();
        let buf: image::RgbImage = ImageBuffer::from_fn(90, 45, |x, y| Rgb([x as u8, y as u8, 3]));
        buf.save(src.join("a.png")).unwrap();

        let out_root = dir.path().join("Resized");
        let run_once = || {
            let engine = ResizeEngine::new(ResizeConfig {
                target_edge: 30,
                output_root: out_root.clone(),
                extensions: vec!["png".to_string()],
                worker_count: 1,
            });
            let scanned = engine.discover(&[src.clone()]);
            let tasks = engine.plan_tasks(&scanned.files);
            for _ in engine.start(tasks).unwrap() {}
            fs::read(out_root.join("a.png")).unwrap()
        };

        let first = run_once();
        fs::remove_dir_all(&out_root).unwrap();
        let second = run_once();
        assert_eq!(first, second);
    }
}
