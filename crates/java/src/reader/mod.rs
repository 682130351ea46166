//! Container readers for Java archives and class directories.

pub mod exploded;
pub mod jar;
pub mod jimage;

pub use exploded::ExplodedReader;
pub use jar::JarReader;
pub use jimage::JimageReader;

use rootscope_core::ContainerError;
use rootscope_core::reader::{ContainerReader, ModuleRef, ReaderFactory};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Container formats recognised by their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Directory,
    Jar,
    Jmod,
    Jimage,
}

impl ContainerFormat {
    pub fn detect(path: &Path) -> Result<Self, ContainerError> {
        if path.is_dir() {
            return Ok(ContainerFormat::Directory);
        }

        let mut file = File::open(path)?;
        let mut magic = [0u8; 4];
        file.read_exact(&mut magic).map_err(|_| {
            ContainerError::Format(format!("too short to be an archive: {}", path.display()))
        })?;

        match &magic {
            // PK\x03\x04, or PK\x05\x06 for an empty archive
            [0x50, 0x4B, _, _] => Ok(ContainerFormat::Jar),
            [b'J', b'M', 0x01, 0x00] => Ok(ContainerFormat::Jmod),
            // CAFEDADA in either byte order
            [0xCA, 0xFE, 0xDA, 0xDA] | [0xDA, 0xDA, 0xFE, 0xCA] => Ok(ContainerFormat::Jimage),
            _ => Err(ContainerError::Format(format!(
                "unrecognised container: {}",
                path.display()
            ))),
        }
    }
}

/// Creates readers for modules backed by a jar, jmod, runtime image or directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct JavaReaderFactory;

impl JavaReaderFactory {
    pub fn new() -> Self {
        Self
    }
}

impl ReaderFactory for JavaReaderFactory {
    fn create(&self, module: &ModuleRef) -> Result<Box<dyn ContainerReader>, ContainerError> {
        let path = module.file().ok_or_else(|| {
            ContainerError::Unavailable(format!("module {} has no backing file", module.name()))
        })?;

        let format = ContainerFormat::detect(path)?;
        debug!("Opening {} as {:?}", path.display(), format);
        Ok(match format {
            ContainerFormat::Directory => Box::new(ExplodedReader::open(path)?),
            ContainerFormat::Jar => Box::new(JarReader::open(path)?),
            ContainerFormat::Jmod => Box::new(JarReader::open_jmod(path)?),
            ContainerFormat::Jimage => Box::new(JimageReader::open(path, module.name())?),
        })
    }
}
