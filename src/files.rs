use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ViewerError;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif"];

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Directory index
// ---------------------------------------------------------------------------

/// The browsing list for one directory: sorted image paths plus the index
/// the viewer should open first.
#[derive(Debug)]
pub struct DirectoryIndex {
    pub paths: Vec<PathBuf>,
    pub start: usize,
}

/// List the images sitting next to `requested`, sorted lexicographically by
/// full path, and resolve the starting index from the requested file name.
pub fn scan(requested: &Path) -> Result<DirectoryIndex, ViewerError> {
    let absolute = if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(requested))
            .unwrap_or_else(|_| requested.to_path_buf())
    };

    let dir = absolute
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut paths = Vec::new();
    if let Ok(entries) = fs::read_dir(&dir) {
        for entry in entries.filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && is_image_file(&p) {
                paths.push(p);
            }
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(ViewerError::EmptyDirectory(dir));
    }

    // First path containing the requested name as a substring. A short name
    // can also match inside a longer one, so this is best-effort and falls
    // back to the first image.
    let file_name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let start = paths
        .iter()
        .position(|p| p.to_string_lossy().contains(&file_name))
        .unwrap_or(0);

    log::info!("Found {} images in {}", paths.len(), dir.display());
    Ok(DirectoryIndex { paths, start })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn scans_sorted_and_resolves_start() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["c.png", "a.jpg", "b.gif", "notes.txt", "clip.mp4"] {
            touch(tmp.path(), name);
        }

        let index = scan(&tmp.path().join("b.gif")).unwrap();
        let names: Vec<_> = index
            .paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["a.jpg", "b.gif", "c.png"]);
        assert_eq!(index.start, 1);
    }

    #[test]
    fn extensions_match_case_insensitively() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "SHOUTY.JPG");
        touch(tmp.path(), "mixed.Png");

        let index = scan(&tmp.path().join("SHOUTY.JPG")).unwrap();
        assert_eq!(index.paths.len(), 2);
    }

    #[test]
    fn unknown_start_falls_back_to_zero() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a.jpg");
        touch(tmp.path(), "b.jpg");

        let index = scan(&tmp.path().join("missing.png")).unwrap();
        assert_eq!(index.start, 0);
    }

    #[test]
    fn empty_directory_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "notes.txt");

        let err = scan(&tmp.path().join("notes.txt")).unwrap_err();
        assert!(matches!(err, ViewerError::EmptyDirectory(_)));
    }
}
