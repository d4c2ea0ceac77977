//! Converters between element trees and mapped objects
//!
//! Every label is read and written by one of three converters:
//!
//! - [`Primitive`]: leaf text, for attributes and text-only elements
//! - [`Composite`]: an object with attributes and child elements
//! - [`CompositeList`]: an element whose children are list entries
//!
//! Converters are cheap values created per label and traversal. All of them
//! share one [`Context`] carrying the registry, the override marker and the
//! depth counter of the current call.

mod composite;
mod factory;
mod list;
mod primitive;

pub use composite::Composite;
pub use factory::{CollectionFactory, ObjectFactory};
pub use list::CompositeList;
pub use primitive::Primitive;

use std::cell::Cell;
use std::sync::Arc;

use crate::documents::Element;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::object::Object;
use crate::schema::{Class, Label, Registry, Role, SchemaDescriptor, Value, ValueRef};

/// Reads a value from an element and writes a value into an element
pub trait Converter {
    /// Read the value represented by `node`
    fn read(&self, node: &Element) -> Result<Value>;

    /// Write `value` into `node`, which the caller has already named
    fn write(&self, value: ValueRef<'_>, node: &mut Element) -> Result<()>;
}

/// Converter selected for a label
pub enum ConverterVariant<'a> {
    /// Leaf text
    Primitive(Primitive),
    /// Composite object
    Composite(Composite<'a>),
    /// Element list
    List(CompositeList<'a>),
}

impl Converter for ConverterVariant<'_> {
    fn read(&self, node: &Element) -> Result<Value> {
        match self {
            ConverterVariant::Primitive(converter) => converter.read(node),
            ConverterVariant::Composite(converter) => converter.read(node),
            ConverterVariant::List(converter) => converter.read(node),
        }
    }

    fn write(&self, value: ValueRef<'_>, node: &mut Element) -> Result<()> {
        match self {
            ConverterVariant::Primitive(converter) => converter.write(value, node),
            ConverterVariant::Composite(converter) => converter.write(value, node),
            ConverterVariant::List(converter) => converter.write(value, node),
        }
    }
}

/// State shared by the converters of one read or write call
pub struct Context<'a> {
    registry: &'a Registry,
    marker: &'a str,
    limits: &'a Limits,
    depth: Cell<usize>,
}

impl<'a> Context<'a> {
    /// Create a context for one call
    pub fn new(registry: &'a Registry, marker: &'a str, limits: &'a Limits) -> Self {
        Self {
            registry,
            marker,
            limits,
            depth: Cell::new(0),
        }
    }

    /// Registry used to resolve classes
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Name of the type-override marker attribute
    pub fn marker(&self) -> &'a str {
        self.marker
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Class of an object's runtime type
    pub fn class_of(&self, object: &dyn Object) -> Result<Arc<Class>> {
        object.class(self.registry)
    }

    /// Resolved descriptor of a class
    ///
    /// Fails if the class declares an attribute under the marker name, since
    /// that attribute could never be matched.
    pub fn descriptor(&self, class: &Arc<Class>) -> Result<Arc<SchemaDescriptor>> {
        let descriptor = self.registry.descriptor(class)?;
        if descriptor.attributes().contains(self.marker) {
            return Err(Error::Schema(format!(
                "Type '{}' declares attribute '{}' which is reserved for type overrides",
                descriptor.type_name(),
                self.marker
            )));
        }
        Ok(descriptor)
    }

    /// Converter for a label
    pub fn converter(&self, label: &Label) -> Result<ConverterVariant<'_>> {
        match label.role() {
            Role::Attribute { .. } | Role::Text { .. } => Ok(ConverterVariant::Primitive(Primitive)),
            Role::Element { .. } => {
                let declared = label.declared_class(self.registry)?;
                Ok(ConverterVariant::Composite(Composite::new(
                    self,
                    Arc::clone(declared),
                )))
            }
            Role::ElementList { collection, .. } => {
                let entry = label.declared_class(self.registry)?;
                Ok(ConverterVariant::List(CompositeList::new(
                    self,
                    Arc::clone(entry),
                    *collection,
                )))
            }
        }
    }

    pub(crate) fn enter(&self) -> Result<DepthGuard<'_>> {
        let depth = self.depth.get() + 1;
        self.limits.check_depth(depth)?;
        self.depth.set(depth);
        Ok(DepthGuard { depth: &self.depth })
    }
}

pub(crate) struct DepthGuard<'g> {
    depth: &'g Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_guard() {
        let registry = Registry::new();
        let limits = Limits::default().with_max_depth(2);
        let context = Context::new(&registry, "class", &limits);

        {
            let _a = context.enter().unwrap();
            let _b = context.enter().unwrap();
            assert_eq!(context.depth(), 2);
            assert!(matches!(context.enter(), Err(Error::LimitExceeded(_))));
        }
        assert_eq!(context.depth(), 0);
    }
}
