use crate::error::UsageError;
use crate::pool::{ReaderPool, ScopedReader};
use crate::reader::{ContainerKey, ModuleRef, ResourceBuffer};
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;
use url::Url;

enum ResourceScope {
    Closed,
    Buffered {
        reader: ScopedReader,
        buffer: ResourceBuffer,
    },
    Streaming {
        reader: ScopedReader,
        stream: Box<dyn Read + Send>,
    },
}

/// One resource of a module container.
///
/// A resource is opened at most once at a time, either buffered or as a
/// stream, and holds a pooled reader lease while open. Opening it again before
/// [`close`](Self::close) is a usage error. Closing returns the lease to the
/// pool without destroying the reader, and also happens on drop.
pub struct ModuleResource {
    path: String,
    module: Arc<ModuleRef>,
    pool: Arc<ReaderPool>,
    scope: ResourceScope,
    length: Option<u64>,
}

impl ModuleResource {
    pub(crate) fn new(path: String, module: Arc<ModuleRef>, pool: Arc<ReaderPool>) -> Self {
        Self {
            path,
            module,
            pool,
            scope: ResourceScope::Closed,
            length: None,
        }
    }

    /// Path relative to the container root.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn module(&self) -> &ModuleRef {
        &self.module
    }

    pub fn key(&self) -> ContainerKey {
        self.module.key()
    }

    /// `<location>!/<path>`, or `jrt:/<module>/<path>` for modules without a location.
    pub fn url(&self) -> crate::Result<Url> {
        let raw = match self.module.location() {
            Some(location) => format!("{}!/{}", location, self.path),
            None => format!("jrt:/{}/{}", self.module.name(), self.path),
        };
        Ok(Url::parse(&raw)?)
    }

    /// Byte length, known once the resource has been read buffered.
    pub fn len(&self) -> Option<u64> {
        self.length
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.scope, ResourceScope::Closed)
    }

    fn ensure_closed(&self) -> crate::Result<()> {
        if self.is_open() {
            return Err(UsageError::ResourceAlreadyOpen(self.path.clone()).into());
        }
        Ok(())
    }

    fn lease(&self) -> crate::Result<ScopedReader> {
        Ok(self.pool.acquire_scoped(&self.module)?)
    }

    /// Read the whole resource into a buffer. The resource stays open until
    /// [`close`](Self::close).
    pub fn read_buffered(&mut self) -> crate::Result<ResourceBuffer> {
        self.ensure_closed()?;
        let reader = self.lease()?;
        // On failure the lease is dropped here and the resource stays closed
        let buffer = reader.read(&self.path)?;
        self.length = Some(buffer.len() as u64);
        self.scope = ResourceScope::Buffered {
            reader,
            buffer: buffer.clone(),
        };
        Ok(buffer)
    }

    /// Open the resource as a stream. Its length is unknown.
    pub fn open_stream(&mut self) -> crate::Result<ResourceStream<'_>> {
        self.ensure_closed()?;
        let reader = self.lease()?;
        let stream = reader.open(&self.path)?;
        self.length = None;
        self.scope = ResourceScope::Streaming { reader, stream };
        Ok(ResourceStream { resource: self })
    }

    /// Read the whole resource, then close it whatever the outcome.
    pub fn load_all_bytes(&mut self) -> crate::Result<Vec<u8>> {
        let loaded = self.read_buffered().map(|buffer| buffer.to_vec());
        self.close();
        let bytes = loaded?;
        self.length = Some(bytes.len() as u64);
        Ok(bytes)
    }

    /// Release the stream or buffer and return the reader lease. Idempotent.
    pub fn close(&mut self) {
        match std::mem::replace(&mut self.scope, ResourceScope::Closed) {
            ResourceScope::Closed => {}
            ResourceScope::Buffered { reader, buffer } => {
                reader.release(buffer);
            }
            ResourceScope::Streaming { reader, stream } => {
                drop(stream);
                drop(reader);
            }
        }
    }
}

impl Drop for ModuleResource {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for ModuleResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleResource")
            .field("path", &self.path)
            .field("module", &self.module.name())
            .field("open", &self.is_open())
            .finish()
    }
}

impl fmt::Display for ModuleResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.module.key(), self.path)
    }
}

/// Stream view of an open [`ModuleResource`]. Reads end once the resource is closed.
pub struct ResourceStream<'a> {
    resource: &'a mut ModuleResource,
}

impl ResourceStream<'_> {
    /// Close the underlying resource.
    pub fn close(self) {
        self.resource.close();
    }
}

impl Read for ResourceStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.resource.scope {
            ResourceScope::Streaming { stream, .. } => stream.read(buf),
            _ => Ok(0),
        }
    }
}
