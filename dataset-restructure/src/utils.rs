use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Regular files directly inside `dir`, sorted by path.
pub fn get_all_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if dir.is_dir() {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Sub-directories directly inside `dir`, sorted by path.
pub fn get_all_dirs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Extension check, case-insensitive.
pub fn is_valid_image(file_path: &Path, valid_exts: &[String]) -> bool {
    match file_path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            let ext = ext.to_lowercase();
            valid_exts.iter().any(|valid| *valid == ext)
        }
        None => false,
    }
}

/// YOLO label file that sits next to an image.
pub fn label_path_for(image: &Path) -> PathBuf {
    image.with_extension("txt")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn extension_match_ignores_case() {
        assert!(is_valid_image(Path::new("a/b/IMG_01.JPG"), &exts()));
        assert!(is_valid_image(Path::new("x.jpeg"), &exts()));
        assert!(!is_valid_image(Path::new("x.txt"), &exts()));
        assert!(!is_valid_image(Path::new("README"), &exts()));
    }

    #[test]
    fn label_replaces_extension() {
        assert_eq!(label_path_for(Path::new("naan/001.jpg")), PathBuf::from("naan/001.txt"));
    }

    #[test]
    fn lists_files_and_dirs_separately() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("poha")).unwrap();
        fs::write(dir.path().join("b.jpg"), b"x").unwrap();
        fs::write(dir.path().join("a.jpg"), b"x").unwrap();

        let files = get_all_files(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("a.jpg"), dir.path().join("b.jpg")]);
        assert_eq!(get_all_dirs(dir.path()).unwrap(), vec![dir.path().join("poha")]);
    }
}
