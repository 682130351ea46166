pub mod jdk;
pub mod reader;

pub use reader::{ContainerFormat, ExplodedReader, JarReader, JavaReaderFactory, JimageReader};
