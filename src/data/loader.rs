// ============================================================
// Layer 4 — Image Folder Loader
// ============================================================
// Walks the on-disk layout:
//
//   dataset/
//     train/<class name>/<image files>
//     valid/<class name>/<image files>
//     test/<class name>/<image files>
//     predict/<image files>
//
// Every listing is sorted so sample order and label indices
// are the same on every machine.
//
// Reference: Rust Book §12 (I/O), std::fs::read_dir docs

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::error::DatasetError;

/// File extensions treated as images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "gif", "webp"];

/// True if `path` has one of the supported image extensions
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

fn read_entries(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    if !dir.is_dir() {
        return Err(DatasetError::MissingDirectory(dir.to_path_buf()));
    }
    let io_err = |source| DatasetError::Io { path: dir.to_path_buf(), source };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        paths.push(entry.map_err(io_err)?.path());
    }
    paths.sort();
    Ok(paths)
}

/// Names of the immediate subdirectories of `dir`, sorted.
/// Each subdirectory is one class.
pub fn scan_class_dirs(dir: &Path) -> Result<Vec<String>, DatasetError> {
    let names: Vec<String> = read_entries(dir)?
        .into_iter()
        .filter(|p| p.is_dir())
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .collect();

    if names.is_empty() {
        return Err(DatasetError::NoClasses(dir.to_path_buf()));
    }
    Ok(names)
}

/// Image files directly inside `dir`, sorted by path.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    Ok(read_entries(dir)?
        .into_iter()
        .filter(|p| p.is_file() && is_image_file(p))
        .collect())
}

/// Expand a mix of files and directories into image paths.
/// Files are kept as given (in order); each directory is
/// replaced by its sorted image files.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, DatasetError> {
    let mut out = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let found = list_images(input)?;
            tracing::debug!("{} images in '{}'", found.len(), input.display());
            out.extend(found);
        } else {
            out.push(input.clone());
        }
    }
    Ok(out)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension_filter() {
        assert!(is_image_file(Path::new("a/1.png")));
        assert!(is_image_file(Path::new("a/1.JPG")));
        assert!(!is_image_file(Path::new("a/notes.txt")));
        assert!(!is_image_file(Path::new("a/no_extension")));
    }

    #[test]
    fn test_scan_class_dirs_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["queen of hearts", "ace of spades", "joker"] {
            fs::create_dir(tmp.path().join(name)).unwrap();
        }
        fs::write(tmp.path().join("README.txt"), "not a class").unwrap();

        let classes = scan_class_dirs(tmp.path()).unwrap();
        assert_eq!(classes, ["ace of spades", "joker", "queen of hearts"]);
    }

    #[test]
    fn test_missing_and_empty_roots() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            scan_class_dirs(&tmp.path().join("nope")),
            Err(DatasetError::MissingDirectory(_))
        ));
        assert!(matches!(scan_class_dirs(tmp.path()), Err(DatasetError::NoClasses(_))));
    }

    #[test]
    fn test_collect_inputs_keeps_order() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("predict");
        fs::create_dir(&dir).unwrap();
        for name in ["b.png", "a.png", "skip.txt"] {
            fs::write(dir.join(name), b"x").unwrap();
        }
        let single = tmp.path().join("z.jpg");

        let got = collect_inputs(&[single.clone(), dir.clone()]).unwrap();
        assert_eq!(got, vec![single, dir.join("a.png"), dir.join("b.png")]);
    }
}
