//! Persister: the public entry point
//!
//! A [`Persister`] reads documents into objects of a requested type and
//! writes objects back out. Every failure is reported as a
//! [`PersistenceError`] naming the operation, with the engine [`Error`] that
//! caused it attached.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::converters::{Composite, Context};
use crate::documents::{Document, Element, WriteOptions};
use crate::error::{Error, PersistenceError, Result};
use crate::limits::Limits;
use crate::loaders::Loader;
use crate::names::validate_name;
use crate::object::{Mapped, Object};
use crate::schema::{Registry, SchemaDescriptor, SchemaDump};
use crate::DEFAULT_MARKER;

/// Configuration for a [`Persister`]
#[derive(Debug, Clone)]
pub struct PersisterConfig {
    /// Attribute naming the runtime type of an element
    marker: String,
    /// Traversal and document limits
    limits: Limits,
    /// Output formatting
    write_options: WriteOptions,
}

impl Default for PersisterConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            limits: Limits::default(),
            write_options: WriteOptions::default(),
        }
    }
}

impl PersisterConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the override marker name
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Get the limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Get the output options
    pub fn write_options(&self) -> &WriteOptions {
        &self.write_options
    }

    /// Set the override marker name
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the indentation, 0 for compact output
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.write_options.indent = indent;
        self
    }

    /// Set whether an XML declaration is written
    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.write_options.declaration = declaration;
        self
    }
}

/// Reads and writes mapped objects
///
/// ```
/// use xmlbind::{ClassBuilder, Mapped, Persister};
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct Greeting {
///     lang: String,
///     text: Option<String>,
/// }
///
/// impl Mapped for Greeting {
///     const TYPE_NAME: &'static str = "doc::Greeting";
///
///     fn declare(class: &mut ClassBuilder<Self>) {
///         class
///             .root("greeting")
///             .attribute("lang", true, |g| &g.lang, |g| &mut g.lang)
///             .text("text", true, |g| &g.text, |g| &mut g.text);
///     }
/// }
///
/// let persister = Persister::new();
/// let greeting: Greeting =
///     persister.read(r#"<greeting lang="en"><text>hello</text></greeting>"#).unwrap();
/// assert_eq!(greeting.text.as_deref(), Some("hello"));
///
/// let xml = persister.write(&greeting).unwrap();
/// assert_eq!(persister.read::<Greeting>(&xml).unwrap(), greeting);
/// ```
#[derive(Debug, Clone)]
pub struct Persister {
    registry: Arc<Registry>,
    config: PersisterConfig,
}

impl Default for Persister {
    fn default() -> Self {
        Self::new()
    }
}

impl Persister {
    /// Create a persister on the process-wide registry
    pub fn new() -> Self {
        Self {
            registry: Registry::global(),
            config: PersisterConfig::default(),
        }
    }

    /// Use another registry
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    /// Use another configuration
    pub fn with_config(mut self, config: PersisterConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the registry
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Get the configuration
    pub fn config(&self) -> &PersisterConfig {
        &self.config
    }

    /// Register `T` so documents may name it in a type override
    pub fn register<T: Mapped>(&self) -> std::result::Result<(), PersistenceError> {
        self.registry
            .descriptor_of::<T>()
            .map(|_| ())
            .map_err(|e| failure("register", T::TYPE_NAME, e))
    }

    /// Resolved descriptor of `T`
    pub fn descriptor<T: Mapped>(
        &self,
    ) -> std::result::Result<Arc<SchemaDescriptor>, PersistenceError> {
        self.registry
            .descriptor_of::<T>()
            .map_err(|e| failure("describe", T::TYPE_NAME, e))
    }

    /// Schema dump of `T`
    pub fn schema<T: Mapped>(&self) -> std::result::Result<SchemaDump, PersistenceError> {
        self.descriptor::<T>()
            .map(|descriptor| SchemaDump::from_descriptor(&descriptor))
    }

    /// Read a value of type `T` from document text
    pub fn read<T: Mapped>(&self, xml: &str) -> std::result::Result<T, PersistenceError> {
        self.read_bytes::<T>(xml.as_bytes())
            .and_then(downcast::<T>)
            .map_err(|e| failure("read", T::TYPE_NAME, e))
    }

    /// Read a value declared as `T` from document text, keeping its runtime type
    pub fn read_object<T: Mapped>(
        &self,
        xml: &str,
    ) -> std::result::Result<Box<dyn Object>, PersistenceError> {
        self.read_bytes::<T>(xml.as_bytes())
            .map_err(|e| failure("read", T::TYPE_NAME, e))
    }

    /// Read a value of type `T` from a parsed document
    pub fn read_document<T: Mapped>(
        &self,
        document: &Document,
    ) -> std::result::Result<T, PersistenceError> {
        document
            .root()
            .ok_or_else(|| Error::Xml("Document has no root element".to_string()))
            .and_then(|root| self.read_root::<T>(root))
            .and_then(downcast::<T>)
            .map_err(|e| failure("read", T::TYPE_NAME, e))
    }

    /// Read a value of type `T` from a reader
    pub fn read_from<T: Mapped, R: Read>(
        &self,
        reader: R,
    ) -> std::result::Result<T, PersistenceError> {
        self.loader()
            .load_reader(reader)
            .and_then(|content| self.read_bytes::<T>(&content))
            .and_then(downcast::<T>)
            .map_err(|e| failure("read", T::TYPE_NAME, e))
    }

    /// Read a value of type `T` from a file
    pub fn read_file<T: Mapped, P: AsRef<Path>>(
        &self,
        path: P,
    ) -> std::result::Result<T, PersistenceError> {
        self.loader()
            .load_file(path)
            .and_then(|content| self.read_bytes::<T>(&content))
            .and_then(downcast::<T>)
            .map_err(|e| failure("read", T::TYPE_NAME, e))
    }

    /// Write a value as document text
    pub fn write<T: Mapped>(&self, value: &T) -> std::result::Result<String, PersistenceError> {
        self.write_object(value)
    }

    /// Write an object of any mapped type as document text
    pub fn write_object(
        &self,
        object: &dyn Object,
    ) -> std::result::Result<String, PersistenceError> {
        self.build_document(object)
            .and_then(|document| document.to_xml(self.config.write_options()))
            .map_err(|e| failure("write", object.type_name(), e))
    }

    /// Write an object into a new document tree
    pub fn write_document(
        &self,
        object: &dyn Object,
    ) -> std::result::Result<Document, PersistenceError> {
        self.build_document(object)
            .map_err(|e| failure("write", object.type_name(), e))
    }

    /// Write an object to a writer
    pub fn write_to<W: Write>(
        &self,
        object: &dyn Object,
        out: W,
    ) -> std::result::Result<(), PersistenceError> {
        self.build_document(object)
            .and_then(|document| document.write(out, self.config.write_options()))
            .map_err(|e| failure("write", object.type_name(), e))
    }

    /// Write an object to a file, replacing its content
    pub fn write_file<P: AsRef<Path>>(
        &self,
        object: &dyn Object,
        path: P,
    ) -> std::result::Result<(), PersistenceError> {
        let file = File::create(path.as_ref())
            .map_err(|e| failure("write", object.type_name(), Error::Io(e)))?;
        let mut out = BufWriter::new(file);
        self.write_to(object, &mut out)?;
        out.flush()
            .map_err(|e| failure("write", object.type_name(), Error::Io(e)))
    }

    fn loader(&self) -> Loader {
        Loader::new().with_limits(self.config.limits().clone())
    }

    fn context(&self) -> Result<Context<'_>> {
        validate_name(self.config.marker())?;
        Ok(Context::new(
            &self.registry,
            self.config.marker(),
            self.config.limits(),
        ))
    }

    fn read_bytes<T: Mapped>(&self, content: &[u8]) -> Result<Box<dyn Object>> {
        let document = self.loader().parse(content)?;
        let root = document
            .root()
            .ok_or_else(|| Error::Xml("Document has no root element".to_string()))?;
        self.read_root::<T>(root)
    }

    fn read_root<T: Mapped>(&self, root: &Element) -> Result<Box<dyn Object>> {
        debug!(type_name = T::TYPE_NAME, element = root.name(), "reading document");
        let declared = self.registry.register::<T>()?;
        let context = self.context()?;
        let object = Composite::new(&context, declared).read_root(root)?;
        debug!(type_name = object.type_name(), "read complete");
        Ok(object)
    }

    fn build_document(&self, object: &dyn Object) -> Result<Document> {
        debug!(type_name = object.type_name(), "writing document");
        let declared = object.class(&self.registry)?;
        let context = self.context()?;
        let root = Composite::new(&context, declared).write_root(object)?;
        Ok(Document::with_root(root))
    }
}

fn downcast<T: Mapped>(object: Box<dyn Object>) -> Result<T> {
    let name = object.type_name();
    object.downcast::<T>().map(|value| *value).ok_or_else(|| {
        Error::TypeMismatch(format!(
            "Document holds '{}' which cannot be returned as '{}'",
            name,
            T::TYPE_NAME
        ))
    })
}

fn failure(operation: &str, type_name: &str, cause: Error) -> PersistenceError {
    PersistenceError::new(format!(
        "Unable to {} '{}': {}",
        operation, type_name, cause
    ))
    .with_cause(cause)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::ClassBuilder;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Setting {
        key: String,
        value: Option<String>,
    }

    impl Mapped for Setting {
        const TYPE_NAME: &'static str = "persister::tests::Setting";

        fn declare(class: &mut ClassBuilder<Self>) {
            class
                .root("setting")
                .attribute("key", true, |s| &s.key, |s| &mut s.key)
                .text("value", false, |s| &s.value, |s| &mut s.value);
        }
    }

    fn persister() -> Persister {
        Persister::new().with_registry(Arc::new(Registry::new()))
    }

    #[test]
    fn test_read_and_write() {
        let persister = persister();
        let setting: Setting = persister
            .read(r#"<setting key="mode"><value>fast</value></setting>"#)
            .unwrap();
        assert_eq!(setting.key, "mode");
        assert_eq!(setting.value.as_deref(), Some("fast"));

        let xml = persister.write(&setting).unwrap();
        assert!(xml.contains(r#"<setting key="mode">"#));
        assert_eq!(persister.read::<Setting>(&xml).unwrap(), setting);
    }

    #[test]
    fn test_compact_output() {
        let config = PersisterConfig::new().with_indent(0).with_declaration(false);
        let persister = persister().with_config(config);
        let setting = Setting {
            key: "a".to_string(),
            value: None,
        };
        assert_eq!(persister.write(&setting).unwrap(), r#"<setting key="a"/>"#);
    }

    #[test]
    fn test_error_names_operation_and_cause() {
        let persister = persister();
        let err = persister.read::<Setting>("<setting/>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FieldRequired);
        assert!(err.message().starts_with("Unable to read 'persister::tests::Setting'"));
    }

    #[test]
    fn test_empty_and_malformed_documents() {
        let persister = persister();
        assert_eq!(persister.read::<Setting>("").unwrap_err().kind(), ErrorKind::Xml);
        assert_eq!(
            persister.read::<Setting>("<setting key='a'>").unwrap_err().kind(),
            ErrorKind::Xml
        );
    }

    #[test]
    fn test_custom_marker() {
        let config = PersisterConfig::new().with_marker("type");
        let persister = persister().with_config(config);
        let setting: Setting = persister
            .read(r#"<setting type="persister::tests::Setting" key="k"/>"#)
            .unwrap();
        assert_eq!(setting.key, "k");
    }

    #[test]
    fn test_invalid_marker_is_rejected() {
        let setting = Setting {
            key: "k".to_string(),
            value: None,
        };
        for marker in ["bad name", "", "1class", "a<b"] {
            let persister = persister().with_config(PersisterConfig::new().with_marker(marker));
            assert_eq!(persister.write(&setting).unwrap_err().kind(), ErrorKind::Schema);
            assert_eq!(
                persister
                    .read::<Setting>(r#"<setting key="k"/>"#)
                    .unwrap_err()
                    .kind(),
                ErrorKind::Schema
            );
        }
    }
}
