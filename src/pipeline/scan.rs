use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::utils::has_valid_extension;

/// A discovered source image together with the root the mirrored output
/// structure is preserved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub scan_root: PathBuf,
}

/// Non-fatal problem encountered while scanning inputs. The batch proceeds
/// without the affected path.
#[derive(Debug, Clone)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub files: Vec<ScannedFile>,
    pub warnings: Vec<ScanWarning>,
}

/// Discover all image files among the given input paths.
///
/// File arguments are included when their extension matches; directory
/// arguments are walked recursively without following symlinks. The result
/// set is deduplicated on the canonical path (the same file reachable via two
/// inputs counts once) and sorted for a stable dispatch order.
pub fn discover_images(inputs: &[PathBuf], extensions: &[String]) -> ScanOutcome {
    // Canonical path -> scan root; the first input to reach a file wins.
    let mut found: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
    let mut warnings = Vec::new();

    for input in inputs {
        if !input.exists() {
            warnings.push(ScanWarning {
                path: input.clone(),
                message: "input path does not exist".to_string(),
            });
            continue;
        }

        if input.is_file() {
            if has_valid_extension(input, extensions) {
                record_file(input, file_scan_root(input), &mut found, &mut warnings);
            } else {
                warnings.push(ScanWarning {
                    path: input.clone(),
                    message: "unrecognized image extension".to_string(),
                });
            }
            continue;
        }

        let scan_root = match input.canonicalize() {
            Ok(root) => root,
            Err(err) => {
                warnings.push(ScanWarning {
                    path: input.clone(),
                    message: format!("cannot resolve directory: {}", err),
                });
                continue;
            }
        };

        for entry in WalkDir::new(input).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| input.clone());
                    warnings.push(ScanWarning {
                        path,
                        message: format!("cannot read directory entry: {}", err),
                    });
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_type().is_file() && has_valid_extension(path, extensions) {
                record_file(path, scan_root.clone(), &mut found, &mut warnings);
            }
        }
    }

    let files = found
        .into_iter()
        .map(|(path, scan_root)| ScannedFile { path, scan_root })
        .collect();

    ScanOutcome { files, warnings }
}

/// A file passed directly on the command line mirrors flat into the output
/// root: its scan root is its parent directory.
fn file_scan_root(file: &Path) -> PathBuf {
    let parent = file.parent().filter(|p| !p.as_os_str().is_empty());
    let parent = parent.unwrap_or_else(|| Path::new("."));
    parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf())
}

fn record_file(
    path: &Path,
    scan_root: PathBuf,
    found: &mut BTreeMap<PathBuf, PathBuf>,
    warnings: &mut Vec<ScanWarning>,
) {
    match path.canonicalize() {
        Ok(canonical) => {
            found.entry(canonical).or_insert(scan_root);
        }
        Err(err) => warnings.push(ScanWarning {
            path: path.to_path_buf(),
            message: format!("cannot resolve file: {}", err),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn extensions() -> Vec<String> {
        vec!["jpg".to_string(), "png".to_string()]
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_discovers_nested_files_with_matching_extensions() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.jpg"));
        touch(&dir.path().join("sub/deep/b.PNG"));
        touch(&dir.path().join("sub/notes.txt"));

        let outcome = discover_images(&[dir.path().to_path_buf()], &extensions());

        assert_eq!(outcome.files.len(), 2);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_extension_filter_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("upper.JPG"));

        let outcome = discover_images(&[dir.path().to_path_buf()], &extensions());
        assert_eq!(outcome.files.len(), 1);
    }

    #[test]
    fn test_same_file_via_two_inputs_counts_once() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.jpg");
        touch(&file);

        let outcome = discover_images(&[dir.path().to_path_buf(), file], &extensions());
        assert_eq!(outcome.files.len(), 1);
    }

    #[test]
    fn test_missing_input_is_a_warning_not_fatal() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.jpg"));
        let missing = dir.path().join("nope");

        let outcome = discover_images(&[missing.clone(), dir.path().to_path_buf()], &extensions());

        assert_eq!(outcome.files.len(), 1);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].path, missing);
    }

    #[test]
    fn test_direct_file_scan_root_is_its_parent() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.jpg");
        touch(&file);

        let outcome = discover_images(&[file], &extensions());

        assert_eq!(outcome.files.len(), 1);
        assert_eq!(
            outcome.files[0].scan_root,
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_directory_scan_root_is_the_directory_itself() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("sub/a.jpg"));

        let outcome = discover_images(&[dir.path().to_path_buf()], &extensions());

        assert_eq!(
            outcome.files[0].scan_root,
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_output_is_sorted_and_deterministic() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("c.jpg"));
        touch(&dir.path().join("a.jpg"));
        touch(&dir.path().join("b.jpg"));

        let first = discover_images(&[dir.path().to_path_buf()], &extensions());
        let second = discover_images(&[dir.path().to_path_buf()], &extensions());

        let names: Vec<_> = first
            .files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
        assert_eq!(first.files, second.files);
    }
}
