use indexmap::IndexMap;
use ristretto_jimage::Image;
use rootscope_core::ContainerError;
use rootscope_core::reader::{ContainerReader, ResourceBuffer};
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::debug;

/// Split a jimage resource name `/java.base/java/lang/Object.class` into the
/// module name and the path inside the module.
pub fn split_module_name(name: &str) -> Option<(&str, &str)> {
    let (module, path) = name.strip_prefix('/')?.split_once('/')?;
    (!module.is_empty() && !path.is_empty()).then_some((module, path))
}

fn image_error(e: impl std::fmt::Display) -> ContainerError {
    ContainerError::Format(e.to_string())
}

/// Reads one module of a runtime image (`lib/modules`).
///
/// The image is walked once, on open, and the module's resources are kept in
/// memory keyed by path.
pub struct JimageReader {
    module: String,
    resources: IndexMap<String, ResourceBuffer>,
}

impl JimageReader {
    pub fn open(path: &Path, module: &str) -> Result<Self, ContainerError> {
        let image = Image::from_file(path).map_err(image_error)?;

        let mut resources = Vec::new();
        for resource in image.iter() {
            let resource = resource.map_err(image_error)?;
            let name = resource.name();
            if split_module_name(&name).is_some_and(|(owner, _)| owner == module) {
                resources.push((name.to_string(), resource.data().to_vec()));
            }
        }

        let reader = Self::from_resources(module, resources);
        debug!(
            "Indexed {} resources of module {} in {}",
            reader.resources.len(),
            module,
            path.display()
        );
        Ok(reader)
    }

    /// Keep the resources of `module` among image `(name, data)` pairs.
    fn from_resources<I>(module: &str, resources: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        let resources = resources
            .into_iter()
            .filter_map(|(name, data)| match split_module_name(&name) {
                Some((owner, path)) if owner == module => Some((path.to_string(), data.into())),
                _ => None,
            })
            .collect();
        Self {
            module: module.to_string(),
            resources,
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Names of every module in the image, sorted.
    pub fn module_names(path: &Path) -> Result<Vec<String>, ContainerError> {
        let image = Image::from_file(path).map_err(image_error)?;
        let mut modules = Vec::new();
        for resource in image.iter() {
            let resource = resource.map_err(image_error)?;
            if let Some((module, _)) = split_module_name(&resource.name()) {
                modules.push(module.to_string());
            }
        }
        modules.sort_unstable();
        modules.dedup();
        Ok(modules)
    }
}

impl ContainerReader for JimageReader {
    fn list(&self) -> Result<Vec<String>, ContainerError> {
        Ok(self.resources.keys().cloned().collect())
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, ContainerError> {
        let bytes = self.read(path)?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn read(&self, path: &str) -> Result<ResourceBuffer, ContainerError> {
        self.resources
            .get(path)
            .cloned()
            .ok_or_else(|| ContainerError::MissingResource(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_module_name() {
        assert_eq!(
            split_module_name("/java.base/java/lang/Object.class"),
            Some(("java.base", "java/lang/Object.class"))
        );
        assert_eq!(
            split_module_name("/java.sql/module-info.class"),
            Some(("java.sql", "module-info.class"))
        );
        assert_eq!(split_module_name("java/lang/Object.class"), None);
        assert_eq!(split_module_name("/java.base"), None);
    }

    #[test]
    fn test_indexes_only_its_module() {
        let reader = JimageReader::from_resources(
            "java.sql",
            [
                ("/java.base/java/lang/Object.class".to_string(), b"object".to_vec()),
                ("/java.sql/java/sql/Driver.class".to_string(), b"driver".to_vec()),
                ("/java.sql/module-info.class".to_string(), b"info".to_vec()),
                ("/packages/java.sql".to_string(), Vec::new()),
            ],
        );

        assert_eq!(reader.module(), "java.sql");
        assert_eq!(
            reader.list().unwrap(),
            vec!["java/sql/Driver.class", "module-info.class"]
        );
        assert_eq!(&*reader.read("java/sql/Driver.class").unwrap(), b"driver");
        assert!(matches!(
            reader.read("java/lang/Object.class"),
            Err(ContainerError::MissingResource(_))
        ));

        let mut text = String::new();
        reader.open("module-info.class").unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "info");
    }
}
