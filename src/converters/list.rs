//! Element list converter

use std::sync::Arc;

use tracing::trace;

use super::composite::Composite;
use super::factory::CollectionFactory;
use super::{Context, Converter};
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::schema::{Class, Value, ValueRef};

/// Reads and writes a collection of root-bound entries
///
/// Each child element of the list element is one entry, named by the root
/// binding of the entry's runtime type. Entries may be any subtype of the
/// declared entry type.
pub struct CompositeList<'a> {
    context: &'a Context<'a>,
    factory: CollectionFactory<'a>,
    entry: Arc<Class>,
}

impl<'a> CompositeList<'a> {
    /// Create a converter for lists of `entry`, collected into `collection`
    pub fn new(context: &'a Context<'a>, entry: Arc<Class>, collection: &'static str) -> Self {
        Self {
            context,
            factory: CollectionFactory::new(context, collection),
            entry,
        }
    }

    /// The declared entry class
    pub fn entry(&self) -> &Arc<Class> {
        &self.entry
    }
}

impl Converter for CompositeList<'_> {
    fn read(&self, node: &Element) -> Result<Value> {
        let _depth = self.context.enter()?;
        if let Some((name, _)) = node
            .attributes()
            .find(|(name, _)| *name != self.context.marker())
        {
            return Err(Error::Attribute(format!(
                "Attribute '{}' does not exist in list '{}'",
                name,
                node.name()
            )));
        }

        let mut collection = self.factory.instantiate(node)?;
        let entries = Composite::new(self.context, Arc::clone(&self.entry));
        for child in node.child_elements() {
            collection.insert(entries.read_root(child)?)?;
        }
        trace!(
            element = node.name(),
            entries = collection.len(),
            collection = collection.collection_type(),
            "read list"
        );
        Ok(Value::Collection(collection))
    }

    fn write(&self, value: ValueRef<'_>, node: &mut Element) -> Result<()> {
        let collection = match value {
            ValueRef::Collection(collection) => collection,
            _ => {
                return Err(Error::TypeMismatch(format!(
                    "Element '{}' can only hold a collection",
                    node.name()
                )))
            }
        };

        let _depth = self.context.enter()?;
        let registry = self.context.registry();
        let runtime = collection.collection_type();
        if !registry.is_collection_assignable(runtime, self.factory.declared()) {
            return Err(Error::TypeMismatch(format!(
                "Collection type '{}' does not match declared '{}'",
                runtime,
                self.factory.declared()
            )));
        }
        if runtime != self.factory.default_type() {
            self.factory.set_override(runtime, node);
        }

        let entries = Composite::new(self.context, Arc::clone(&self.entry));
        for item in collection.entries() {
            let class = self.context.class_of(item)?;
            if !registry.is_assignable(&class, self.entry.name())? {
                return Err(Error::TypeMismatch(format!(
                    "Entry of type '{}' does not match list entry '{}'",
                    class.name(),
                    self.entry.name()
                )));
            }
            node.append_child(entries.write_root(item)?);
        }
        Ok(())
    }
}
