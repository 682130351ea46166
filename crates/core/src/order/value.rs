use std::fmt;
use std::path::{Path, PathBuf};

/// A path-bearing value surfaced by a loader-context discovery mechanism.
///
/// Discovery code can hand over a path list, a nested sequence of such values,
/// or some other value whose string form is expected to be a path list.
pub enum PathValue {
    /// One path, or several joined by the platform delimiter.
    Path(String),
    /// Ordered items, each handled recursively.
    Sequence(Vec<PathValue>),
    /// Anything else. Its `Display` form is treated as a path list.
    Opaque(Box<dyn fmt::Display + Send + Sync>),
}

impl PathValue {
    pub fn opaque(value: impl fmt::Display + Send + Sync + 'static) -> Self {
        PathValue::Opaque(Box::new(value))
    }
}

impl fmt::Debug for PathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathValue::Path(path) => f.debug_tuple("Path").field(path).finish(),
            PathValue::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            PathValue::Opaque(value) => f.debug_tuple("Opaque").field(&value.to_string()).finish(),
        }
    }
}

impl From<&str> for PathValue {
    fn from(path: &str) -> Self {
        PathValue::Path(path.to_string())
    }
}

impl From<String> for PathValue {
    fn from(path: String) -> Self {
        PathValue::Path(path)
    }
}

impl From<&Path> for PathValue {
    fn from(path: &Path) -> Self {
        PathValue::Path(path.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for PathValue {
    fn from(path: PathBuf) -> Self {
        PathValue::from(path.as_path())
    }
}

impl From<url::Url> for PathValue {
    fn from(url: url::Url) -> Self {
        PathValue::opaque(url)
    }
}

impl<T: Into<PathValue>> From<Vec<T>> for PathValue {
    fn from(items: Vec<T>) -> Self {
        PathValue::Sequence(items.into_iter().map(Into::into).collect())
    }
}
