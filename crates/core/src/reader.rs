//! Contract between the scanner and concrete container decoders.

use crate::error::ContainerError;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Bytes of one resource, shared between the reader and a resource handle.
pub type ResourceBuffer = Arc<[u8]>;

/// Reads the resources of one container. Expensive to create, safe to reuse
/// from several threads at once.
pub trait ContainerReader: Send + Sync {
    /// Relative paths of every resource. May include `/`-terminated directories.
    fn list(&self) -> Result<Vec<String>, ContainerError>;

    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, ContainerError>;

    fn read(&self, path: &str) -> Result<ResourceBuffer, ContainerError> {
        let mut bytes = Vec::new();
        self.open(path)?.read_to_end(&mut bytes)?;
        Ok(bytes.into())
    }

    /// Give back a buffer obtained from [`read`](Self::read).
    fn release(&self, _buffer: ResourceBuffer) {}
}

/// Creates the reader of a container on first use.
pub trait ReaderFactory: Send + Sync {
    fn create(&self, module: &ModuleRef) -> Result<Box<dyn ContainerReader>, ContainerError>;
}

impl<F> ReaderFactory for F
where
    F: Fn(&ModuleRef) -> Result<Box<dyn ContainerReader>, ContainerError> + Send + Sync,
{
    fn create(&self, module: &ModuleRef) -> Result<Box<dyn ContainerReader>, ContainerError> {
        self(module)
    }
}

/// Identity of a container. Pool entries are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerKey(Arc<str>);

impl ContainerKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named module container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
    name: String,
    location: Option<String>,
    file: Option<PathBuf>,
}

impl ModuleRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
            file: None,
        }
    }

    /// Location URI, e.g. `file:///opt/jdk/jmods/java.sql.jmod`.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Backing file. Also sets the location when none was given.
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        if self.location.is_none() {
            self.location = url::Url::from_file_path(&file)
                .map(String::from)
                .ok();
        }
        self.file = Some(file);
        self
    }

    /// A module stored in a runtime image shared with other modules. The
    /// location stays unset, so the module is keyed as `jrt:/<name>`.
    pub fn in_image(mut self, image: impl Into<PathBuf>) -> Self {
        self.file = Some(image.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// The location, or `jrt:/<name>` for modules without one.
    pub fn key(&self) -> ContainerKey {
        let key = match &self.location {
            Some(location) => location.clone(),
            None => format!("jrt:/{}", self.name),
        };
        ContainerKey(Arc::from(key))
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} ({})", self.name, location),
            None => f.write_str(&self.name),
        }
    }
}

/// Container held in memory. Lists entries in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    entries: Vec<(String, ResourceBuffer)>,
}

impl MemoryReader {
    pub fn new<I, P, B>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, B)>,
        P: Into<String>,
        B: Into<Vec<u8>>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(path, bytes)| (path.into(), Into::<Vec<u8>>::into(bytes).into()))
                .collect(),
        }
    }

    fn find(&self, path: &str) -> Result<&ResourceBuffer, ContainerError> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == path)
            .map(|(_, bytes)| bytes)
            .ok_or_else(|| ContainerError::MissingResource(path.to_string()))
    }
}

impl ContainerReader for MemoryReader {
    fn list(&self) -> Result<Vec<String>, ContainerError> {
        Ok(self.entries.iter().map(|(path, _)| path.clone()).collect())
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, ContainerError> {
        let bytes = self.find(path)?.to_vec();
        Ok(Box::new(std::io::Cursor::new(bytes)))
    }

    fn read(&self, path: &str) -> Result<ResourceBuffer, ContainerError> {
        self.find(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reader() {
        let reader = MemoryReader::new([("b/2", b"two".to_vec()), ("a/1", b"one".to_vec())]);
        assert_eq!(reader.list().unwrap(), vec!["b/2", "a/1"]);
        assert_eq!(&*reader.read("a/1").unwrap(), b"one");

        let mut streamed = String::new();
        reader.open("b/2").unwrap().read_to_string(&mut streamed).unwrap();
        assert_eq!(streamed, "two");

        assert!(matches!(
            reader.read("missing"),
            Err(ContainerError::MissingResource(_))
        ));
    }

    #[test]
    fn test_key_falls_back_to_jrt() {
        assert_eq!(ModuleRef::new("java.base").key().as_str(), "jrt:/java.base");
        let located = ModuleRef::new("app").with_location("file:///opt/app.jar");
        assert_eq!(located.key().as_str(), "file:///opt/app.jar");

        let imaged = ModuleRef::new("java.sql").in_image("/opt/jdk/lib/modules");
        assert_eq!(imaged.key().as_str(), "jrt:/java.sql");
        assert!(imaged.file().is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_sets_location() {
        let module = ModuleRef::new("java.sql").with_file("/opt/jdk/jmods/java.sql.jmod");
        assert_eq!(module.location(), Some("file:///opt/jdk/jmods/java.sql.jmod"));
        assert_eq!(module.file(), Some(Path::new("/opt/jdk/jmods/java.sql.jmod")));
    }
}
