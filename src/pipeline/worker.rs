use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

use super::orientation;
use super::output;
use super::plan::{self, ResizeAction};

/// Fixed encode quality for lossy outputs.
const JPEG_QUALITY: u8 = 90;

/// One unit of work: a single source image bound for the mirrored output
/// tree. Immutable once created, consumed exactly once by a worker.
#[derive(Debug, Clone)]
pub struct ImageTask {
    pub source_path: PathBuf,
    /// Root the source's relative path is preserved against
    pub scan_root: PathBuf,
    pub output_root: PathBuf,
    pub target_edge: u32,
}

/// What actually happened to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskAction {
    Upscaled,
    Downscaled,
    /// Longest edge already matched; destination is byte-identical to source
    Copied,
    /// Source could not be decoded as an image
    Skipped,
    /// I/O or codec failure; details in `error_detail`
    Errored,
}

impl TaskAction {
    pub fn label(&self) -> &'static str {
        match self {
            TaskAction::Upscaled => "upscaled",
            TaskAction::Downscaled => "downscaled",
            TaskAction::Copied => "copied",
            TaskAction::Skipped => "skipped",
            TaskAction::Errored => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TaskAction::Upscaled | TaskAction::Downscaled | TaskAction::Copied
        )
    }
}

/// Structured outcome of one task. Produced once, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub action: TaskAction,
    pub original_dims: Option<(u32, u32)>,
    pub final_dims: Option<(u32, u32)>,
    pub error_detail: Option<String>,
    pub elapsed: Duration,
}

/// Process one task to completion. Never panics and never propagates an
/// error past this boundary: every failure is folded into a `TaskResult`
/// so sibling tasks are unaffected.
pub fn process(task: &ImageTask) -> TaskResult {
    let started = Instant::now();
    let destination = output::resolve(&task.source_path, &task.scan_root, &task.output_root);

    let mut result = transform(task, &destination).unwrap_or_else(|err| TaskResult {
        source_path: task.source_path.clone(),
        destination_path: destination.clone(),
        action: TaskAction::Errored,
        original_dims: None,
        final_dims: None,
        error_detail: Some(format!("{:#}", err)),
        elapsed: Duration::ZERO,
    });

    result.elapsed = started.elapsed();
    result
}

fn transform(task: &ImageTask, destination: &Path) -> Result<TaskResult> {
    output::ensure_parent_dirs(destination)?;

    let decoded = match image::open(&task.source_path) {
        Ok(img) => img,
        Err(_) => {
            return Ok(TaskResult {
                source_path: task.source_path.clone(),
                destination_path: destination.to_path_buf(),
                action: TaskAction::Skipped,
                original_dims: None,
                final_dims: None,
                error_detail: Some("invalid or corrupt image".to_string()),
                elapsed: Duration::ZERO,
            });
        }
    };

    // Correct the pixel buffer before measuring: a 90-degree EXIF rotation
    // swaps which side is the longest edge
    let exif_orientation = orientation::read_orientation(&task.source_path);
    let oriented = orientation::apply_orientation(decoded, exif_orientation);
    let original_dims = (oriented.width(), oriented.height());

    let plan = plan::compute(original_dims.0, original_dims.1, task.target_edge);

    if plan.action == ResizeAction::Identity {
        // Verbatim copy, not a re-encode: no generational quality loss and
        // byte-identical reruns
        output::copy_atomic(&task.source_path, destination)?;
        return Ok(TaskResult {
            source_path: task.source_path.clone(),
            destination_path: destination.to_path_buf(),
            action: TaskAction::Copied,
            original_dims: Some(original_dims),
            final_dims: Some(original_dims),
            error_detail: None,
            elapsed: Duration::ZERO,
        });
    }

    let format = destination_format(&task.source_path)?;
    let prepared = flatten_for_format(oriented, format);
    let resized = super::resize::resample(&prepared, plan.target_width, plan.target_height)?;

    output::write_atomic(destination, |writer| {
        match format {
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
                resized
                    .write_with_encoder(encoder)
                    .context("Failed to encode JPEG output")?;
            }
            _ => {
                resized
                    .write_to(writer, format)
                    .with_context(|| format!("Failed to encode {:?} output", format))?;
            }
        }
        Ok(())
    })?;

    let action = match plan.action {
        ResizeAction::Upscale => TaskAction::Upscaled,
        ResizeAction::Downscale => TaskAction::Downscaled,
        ResizeAction::Identity => unreachable!("identity handled above"),
    };

    Ok(TaskResult {
        source_path: task.source_path.clone(),
        destination_path: destination.to_path_buf(),
        action,
        original_dims: Some(original_dims),
        final_dims: Some((plan.target_width, plan.target_height)),
        error_detail: None,
        elapsed: Duration::ZERO,
    })
}

/// Outputs keep the source's format; this tool resizes, it does not
/// transcode.
fn destination_format(source: &Path) -> Result<ImageFormat> {
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" | "jfif" => Ok(ImageFormat::Jpeg),
        "png" => Ok(ImageFormat::Png),
        "webp" => Ok(ImageFormat::WebP),
        "bmp" => Ok(ImageFormat::Bmp),
        "tiff" | "tif" => Ok(ImageFormat::Tiff),
        "gif" => Ok(ImageFormat::Gif),
        other => Err(anyhow!("Unsupported output format: .{}", other)),
    }
}

/// Flatten transparency whenever the destination encoder cannot represent
/// it. JPEG is the only opaque-only format in the supported set; palette
/// sources are already expanded by the decoder.
fn flatten_for_format(img: DynamicImage, format: ImageFormat) -> DynamicImage {
    if format == ImageFormat::Jpeg && img.color().has_alpha() {
        DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        img
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};
    use std::fs;
    use tempfile::TempDir;

    fn save_gradient(path: &Path, width: u32, height: u32) {
        let buf: image::RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        buf.save(path).unwrap();
    }

    fn task(source: &Path, out_root: &Path, target_edge: u32) -> ImageTask {
        ImageTask {
            source_path: source.to_path_buf(),
            scan_root: source.parent().unwrap().to_path_buf(),
            output_root: out_root.to_path_buf(),
            target_edge,
        }
    }

    #[test]
    fn test_downscale_produces_target_dimensions() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("img.png");
        let out_root = dir.path().join("out");
        save_gradient(&source, 200, 100);

        let result = process(&task(&source, &out_root, 100));

        assert_eq!(result.action, TaskAction::Downscaled);
        assert_eq!(result.original_dims, Some((200, 100)));
        assert_eq!(result.final_dims, Some((100, 50)));

        let written = image::open(&result.destination_path).unwrap();
        assert_eq!((written.width(), written.height()), (100, 50));
    }

    #[test]
    fn test_upscale_small_image() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("img.png");
        let out_root = dir.path().join("out");
        save_gradient(&source, 30, 40);

        let result = process(&task(&source, &out_root, 100));

        assert_eq!(result.action, TaskAction::Upscaled);
        assert_eq!(result.final_dims, Some((75, 100)));
    }

    #[test]
    fn test_identity_copies_bytes_verbatim() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("img.png");
        let out_root = dir.path().join("out");
        save_gradient(&source, 50, 100);

        let result = process(&task(&source, &out_root, 100));

        assert_eq!(result.action, TaskAction::Copied);
        assert_eq!(
            fs::read(&source).unwrap(),
            fs::read(&result.destination_path).unwrap()
        );
    }

    #[test]
    fn test_corrupt_source_is_skipped_with_detail() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("broken.jpg");
        let out_root = dir.path().join("out");
        fs::write(&source, b"not an image at all").unwrap();

        let result = process(&task(&source, &out_root, 100));

        assert_eq!(result.action, TaskAction::Skipped);
        assert_eq!(
            result.error_detail.as_deref(),
            Some("invalid or corrupt image")
        );
        assert!(!result.destination_path.exists());
    }

    #[test]
    fn test_destination_mirrors_relative_structure() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("albums/2024/img.png");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        save_gradient(&source, 200, 100);
        let out_root = dir.path().join("out");

        let t = ImageTask {
            source_path: source.clone(),
            scan_root: dir.path().to_path_buf(),
            output_root: out_root.clone(),
            target_edge: 100,
        };
        let result = process(&t);

        assert_eq!(
            result.destination_path,
            out_root.join("albums/2024/img.png")
        );
        assert!(result.destination_path.exists());
    }

    #[test]
    fn test_alpha_flattens_for_jpeg_destination() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("img.jpg");
        let out_root = dir.path().join("out");
        // JPEG source cannot carry alpha; exercise the flatten path directly
        let rgba = DynamicImage::ImageRgba8(ImageBuffer::from_fn(10, 10, |_, _| {
            Rgba([10u8, 20, 30, 128])
        }));
        let flattened = flatten_for_format(rgba, ImageFormat::Jpeg);
        assert!(!flattened.color().has_alpha());

        // And the full pipeline writes a decodable JPEG
        save_gradient(&source, 64, 32);
        let result = process(&task(&source, &out_root, 32));
        assert_eq!(result.action, TaskAction::Downscaled);
        assert!(image::open(&result.destination_path).is_ok());
    }

    #[test]
    fn test_png_destination_keeps_alpha() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("img.png");
        let out_root = dir.path().join("out");
        let buf = ImageBuffer::from_fn(60, 30, |x, _| Rgba([200u8, 100, 50, (x * 4) as u8]));
        DynamicImage::ImageRgba8(buf).save(&source).unwrap();

        let result = process(&task(&source, &out_root, 30));

        let written = image::open(&result.destination_path).unwrap();
        assert!(written.color().has_alpha());
    }

    #[test]
    fn test_destination_format_mapping() {
        assert_eq!(
            destination_format(Path::new("a.JPG")).unwrap(),
            ImageFormat::Jpeg
        );
        assert_eq!(
            destination_format(Path::new("a.jfif")).unwrap(),
            ImageFormat::Jpeg
        );
        assert_eq!(
            destination_format(Path::new("a.tif")).unwrap(),
            ImageFormat::Tiff
        );
        assert!(destination_format(Path::new("a.xyz")).is_err());
    }
}
