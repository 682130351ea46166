use rootscope_core::reader::{ContainerReader, ResourceBuffer};
use rootscope_core::ContainerError;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;
use zip::ZipArchive;
use zip::result::ZipError;

/// Entries of a jmod archive live under this directory.
pub const JMOD_CLASSES_DIR: &str = "classes/";

/// Length of the `JM\x01\x00` header in front of the zip data of a jmod.
pub const JMOD_HEADER_LEN: u64 = 4;

/// Cap on the buffer reserved up front for an entry. The size recorded in the
/// archive is not trusted beyond this.
const MAX_PREALLOCATION: usize = 1 << 20;

fn initial_capacity(declared: u64) -> usize {
    usize::try_from(declared).map_or(MAX_PREALLOCATION, |size| size.min(MAX_PREALLOCATION))
}

/// A file read from a fixed offset, as if the bytes before it did not exist.
struct OffsetFile {
    file: File,
    offset: u64,
}

impl OffsetFile {
    fn new(mut file: File, offset: u64) -> io::Result<Self> {
        file.seek(SeekFrom::Start(offset))?;
        Ok(Self { file, offset })
    }
}

impl Read for OffsetFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for OffsetFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => SeekFrom::Start(n + self.offset),
            other => other,
        };
        let absolute = self.file.seek(target)?;
        absolute.checked_sub(self.offset).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of archive")
        })
    }
}

fn zip_error(e: ZipError) -> ContainerError {
    match e {
        ZipError::Io(e) => ContainerError::Io(e),
        other => ContainerError::Format(other.to_string()),
    }
}

/// Reads a jar, or the `classes/` tree of a jmod.
pub struct JarReader {
    archive: Mutex<ZipArchive<OffsetFile>>,
    prefix: &'static str,
}

impl JarReader {
    pub fn open(path: &Path) -> Result<Self, ContainerError> {
        Self::with_layout(path, 0, "")
    }

    pub fn open_jmod(path: &Path) -> Result<Self, ContainerError> {
        Self::with_layout(path, JMOD_HEADER_LEN, JMOD_CLASSES_DIR)
    }

    fn with_layout(path: &Path, offset: u64, prefix: &'static str) -> Result<Self, ContainerError> {
        let file = OffsetFile::new(File::open(path)?, offset)?;
        let archive = ZipArchive::new(file).map_err(zip_error)?;
        Ok(Self {
            archive: Mutex::new(archive),
            prefix,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ZipArchive<OffsetFile>>, ContainerError> {
        self.archive
            .lock()
            .map_err(|_| ContainerError::Unavailable("archive lock poisoned".to_string()))
    }
}

impl ContainerReader for JarReader {
    fn list(&self) -> Result<Vec<String>, ContainerError> {
        let archive = self.lock()?;
        Ok(archive
            .file_names()
            .filter_map(|name| name.strip_prefix(self.prefix))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, ContainerError> {
        let bytes = self.read(path)?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn read(&self, path: &str) -> Result<ResourceBuffer, ContainerError> {
        let mut archive = self.lock()?;
        let name = format!("{}{}", self.prefix, path);
        let mut entry = match archive.by_name(&name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                return Err(ContainerError::MissingResource(path.to_string()));
            }
            Err(e) => return Err(zip_error(e)),
        };
        let mut bytes = Vec::with_capacity(initial_capacity(entry.size()));
        entry.read_to_end(&mut bytes)?;
        Ok(bytes.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_reads_jar_entries() {
        let dir = tempdir().unwrap();
        let jar = dir.path().join("app.jar");
        std::fs::write(
            &jar,
            zip_bytes(&[("META-INF/", b""), ("com/example/App.class", b"\xCA\xFE")]),
        )
        .unwrap();

        let reader = JarReader::open(&jar).unwrap();
        assert_eq!(reader.list().unwrap(), vec!["META-INF/", "com/example/App.class"]);
        assert_eq!(&*reader.read("com/example/App.class").unwrap(), b"\xCA\xFE");
        assert!(matches!(
            reader.read("missing.txt"),
            Err(ContainerError::MissingResource(_))
        ));
    }

    #[test]
    fn test_declared_entry_size_is_not_trusted() {
        assert_eq!(initial_capacity(0), 0);
        assert_eq!(initial_capacity(512), 512);
        assert_eq!(initial_capacity(u64::MAX), MAX_PREALLOCATION);
    }

    #[test]
    fn test_jmod_is_rooted_at_classes() {
        let dir = tempdir().unwrap();
        let jmod = dir.path().join("java.demo.jmod");
        let mut bytes = b"JM\x01\x00".to_vec();
        bytes.extend(zip_bytes(&[
            ("classes/module-info.class", b"mi"),
            ("classes/demo/Api.class", b"api"),
            ("lib/libdemo.so", b"so"),
        ]));
        std::fs::write(&jmod, bytes).unwrap();

        let reader = JarReader::open_jmod(&jmod).unwrap();
        assert_eq!(reader.list().unwrap(), vec!["module-info.class", "demo/Api.class"]);

        let mut text = String::new();
        reader.open("demo/Api.class").unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "api");
    }
}
