use rootscope_core::ContainerError;
use rootscope_core::path::sanitize_entry_path;
use rootscope_core::reader::ContainerReader;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Reads a directory of class files and resources, such as `target/classes`.
pub struct ExplodedReader {
    root: PathBuf,
}

impl ExplodedReader {
    pub fn open(root: &Path) -> Result<Self, ContainerError> {
        if !root.is_dir() {
            return Err(ContainerError::Unavailable(format!(
                "not a directory: {}",
                root.display()
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, ContainerError> {
        let relative = sanitize_entry_path(path);
        if relative.is_empty() || relative == ".." || relative.starts_with("../") {
            return Err(ContainerError::MissingResource(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl ContainerReader for ExplodedReader {
    fn list(&self) -> Result<Vec<String>, ContainerError> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", self.root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                paths.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }
        Ok(paths)
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, ContainerError> {
        let file = self.resolve(path)?;
        if !file.is_file() {
            return Err(ContainerError::MissingResource(path.to_string()));
        }
        Ok(Box::new(File::open(file)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lists_files_relative_to_root() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("com/example/empty")).unwrap();
        std::fs::write(dir.path().join("com/example/App.class"), b"app").unwrap();
        std::fs::write(dir.path().join("app.properties"), b"x=1").unwrap();

        let reader = ExplodedReader::open(dir.path()).unwrap();
        let mut paths = reader.list().unwrap();
        paths.sort();
        assert_eq!(paths, vec!["app.properties", "com/example/App.class"]);
        assert_eq!(&*reader.read("com/example/App.class").unwrap(), b"app");
    }

    #[test]
    fn test_rejects_paths_outside_root() {
        let dir = tempdir().unwrap();
        let reader = ExplodedReader::open(dir.path()).unwrap();
        assert!(matches!(
            reader.open("../secret"),
            Err(ContainerError::MissingResource(_))
        ));
        assert!(matches!(
            reader.open("com/example"),
            Err(ContainerError::MissingResource(_))
        ));
        assert!(ExplodedReader::open(&dir.path().join("missing")).is_err());
    }
}
