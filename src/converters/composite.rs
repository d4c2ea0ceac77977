//! Composite object converter

use std::sync::Arc;

use tracing::trace;

use super::factory::ObjectFactory;
use super::{Context, Converter};
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::object::Object;
use crate::schema::{Class, SchemaDescriptor, Slot, Value, ValueRef};

/// Reads and writes objects of a declared type
///
/// Reading matches every attribute and child element of the node against
/// the descriptor of the instantiated type. Anything without a label is an
/// error, and so is any required label the node never supplies.
pub struct Composite<'a> {
    context: &'a Context<'a>,
    factory: ObjectFactory<'a>,
}

impl<'a> Composite<'a> {
    /// Create a converter for the declared class
    pub fn new(context: &'a Context<'a>, declared: Arc<Class>) -> Self {
        Self {
            context,
            factory: ObjectFactory::new(context, declared),
        }
    }

    /// Read a root-bound value: the element name must match the root of the
    /// instantiated type
    pub fn read_root(&self, node: &Element) -> Result<Box<dyn Object>> {
        let (object, class) = self.factory.instantiate(node)?;
        match class.root() {
            Some(root) if root == node.name() => self.populate(node, object, &class),
            Some(root) => Err(Error::Root(format!(
                "Element '{}' does not match root '{}' of '{}'",
                node.name(),
                root,
                class.name()
            ))),
            None => Err(Error::Root(format!(
                "Type '{}' has no root binding",
                class.name()
            ))),
        }
    }

    /// Write a root-bound value into a new element named after its root
    pub fn write_root(&self, object: &dyn Object) -> Result<Element> {
        let class = self.context.class_of(object)?;
        let root = class.root().ok_or_else(|| {
            Error::Root(format!("Type '{}' has no root binding", class.name()))
        })?;
        let mut element = Element::new(root);
        self.write_object(object, &class, &mut element)?;
        Ok(element)
    }

    fn populate(
        &self,
        node: &Element,
        mut object: Box<dyn Object>,
        class: &Arc<Class>,
    ) -> Result<Box<dyn Object>> {
        let _depth = self.context.enter()?;
        let descriptor = self.context.descriptor(class)?;
        trace!(element = node.name(), type_name = class.name(), "reading object");

        self.read_attributes(node, object.as_mut(), &descriptor)?;
        self.read_elements(node, object.as_mut(), &descriptor)?;
        Ok(object)
    }

    fn read_attributes(
        &self,
        node: &Element,
        object: &mut dyn Object,
        descriptor: &SchemaDescriptor,
    ) -> Result<()> {
        let mut labels = descriptor.attribute_traversal();
        for (name, value) in node.attributes() {
            if name == self.context.marker() {
                continue;
            }
            let label = labels.take(name).ok_or_else(|| {
                Error::Attribute(format!(
                    "Attribute '{}' does not exist in '{}'",
                    name,
                    descriptor.type_name()
                ))
            })?;
            label.access().set(object, Value::Text(value.to_string()))?;
        }
        labels.check_required(descriptor.type_name())
    }

    fn read_elements(
        &self,
        node: &Element,
        object: &mut dyn Object,
        descriptor: &SchemaDescriptor,
    ) -> Result<()> {
        let mut labels = descriptor.element_traversal();
        for child in node.child_elements() {
            let label = labels.take(child.name()).ok_or_else(|| {
                Error::Element(format!(
                    "Element '{}' does not exist in '{}'",
                    child.name(),
                    descriptor.type_name()
                ))
            })?;
            let value = self.context.converter(label)?.read(child)?;
            label.access().set(object, value)?;
        }
        labels.check_required(descriptor.type_name())
    }

    fn write_object(&self, object: &dyn Object, class: &Arc<Class>, node: &mut Element) -> Result<()> {
        let _depth = self.context.enter()?;
        let declared = self.factory.declared();
        if !self.context.registry().is_assignable(class, declared.name())? {
            return Err(Error::TypeMismatch(format!(
                "Value of type '{}' is not assignable to '{}'",
                class.name(),
                declared.name()
            )));
        }
        if class.name() != declared.name() {
            self.factory.set_override(class.name(), node);
        }

        let descriptor = self.context.descriptor(class)?;
        trace!(element = node.name(), type_name = class.name(), "writing object");
        self.write_attributes(object, &descriptor, node)?;
        self.write_elements(object, &descriptor, node)
    }

    fn write_attributes(
        &self,
        object: &dyn Object,
        descriptor: &SchemaDescriptor,
        node: &mut Element,
    ) -> Result<()> {
        for label in descriptor.attributes().iter() {
            match label.access().get(object)? {
                Some(Slot::Text(text)) => node.set_attribute(label.name(), text),
                Some(_) => {
                    return Err(Error::TypeMismatch(format!(
                        "{} of '{}' does not hold text",
                        label,
                        descriptor.type_name()
                    )))
                }
                None if label.is_required() => {
                    return Err(Error::Attribute(format!(
                        "Value for {} is null in '{}'",
                        label,
                        descriptor.type_name()
                    )))
                }
                None => {}
            }
        }
        Ok(())
    }

    fn write_elements(
        &self,
        object: &dyn Object,
        descriptor: &SchemaDescriptor,
        node: &mut Element,
    ) -> Result<()> {
        for label in descriptor.children() {
            let slot = match label.access().get(object)? {
                Some(slot) => slot,
                None if label.is_required() => {
                    return Err(Error::Element(format!(
                        "Value for {} is null in '{}'",
                        label,
                        descriptor.type_name()
                    )))
                }
                None => continue,
            };
            let mut child = Element::new(label.name());
            self.context
                .converter(label)?
                .write(slot.as_value(), &mut child)?;
            node.append_child(child);
        }
        Ok(())
    }
}

impl Converter for Composite<'_> {
    fn read(&self, node: &Element) -> Result<Value> {
        let (object, class) = self.factory.instantiate(node)?;
        Ok(Value::Object(self.populate(node, object, &class)?))
    }

    fn write(&self, value: ValueRef<'_>, node: &mut Element) -> Result<()> {
        match value {
            ValueRef::Object(object) => {
                let class = self.context.class_of(object)?;
                self.write_object(object, &class, node)
            }
            _ => Err(Error::TypeMismatch(format!(
                "Element '{}' can only hold an object of '{}'",
                node.name(),
                self.factory.declared().name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::Limits;
    use crate::object::Mapped;
    use crate::schema::{ClassBuilder, Registry};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Entry {
        id: i32,
        text: Option<String>,
    }

    impl Mapped for Entry {
        const TYPE_NAME: &'static str = "composite::tests::Entry";

        fn declare(class: &mut ClassBuilder<Self>) {
            class
                .root("entry")
                .attribute("id", false, |e| &e.id, |e| &mut e.id)
                .text("text", true, |e| &e.text, |e| &mut e.text);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Tagged {
        entry: Entry,
        tag: String,
    }

    impl Mapped for Tagged {
        const TYPE_NAME: &'static str = "composite::tests::Tagged";

        fn declare(class: &mut ClassBuilder<Self>) {
            class
                .root("tagged")
                .extends(|t| &t.entry, |t| &mut t.entry)
                .attribute("tag", true, |t| &t.tag, |t| &mut t.tag);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Base;

    impl Mapped for Base {
        const TYPE_NAME: &'static str = "composite::tests::Base";

        fn declare(class: &mut ClassBuilder<Self>) {
            class.root("base").abstract_type();
        }
    }

    fn entry_converter<'a>(context: &'a Context<'a>) -> Composite<'a> {
        let declared = context.registry().register::<Entry>().unwrap();
        Composite::new(context, declared)
    }

    #[test]
    fn test_read_root() {
        let registry = Registry::new();
        let limits = Limits::default();
        let context = Context::new(&registry, "class", &limits);
        let converter = entry_converter(&context);

        let node = Element::new("entry")
            .with_attribute("id", "7")
            .with_child(Element::new("text").with_text("hello"));
        let object = converter.read_root(&node).unwrap();
        assert_eq!(
            object.downcast_ref::<Entry>(),
            Some(&Entry {
                id: 7,
                text: Some("hello".to_string())
            })
        );
    }

    #[test]
    fn test_read_root_name_mismatch() {
        let registry = Registry::new();
        let limits = Limits::default();
        let context = Context::new(&registry, "class", &limits);
        let converter = entry_converter(&context);

        let node = Element::new("item").with_child(Element::new("text"));
        assert!(matches!(converter.read_root(&node), Err(Error::Root(_))));
    }

    #[test]
    fn test_unknown_and_missing_labels() {
        let registry = Registry::new();
        let limits = Limits::default();
        let context = Context::new(&registry, "class", &limits);
        let converter = entry_converter(&context);

        let extra = Element::new("entry")
            .with_attribute("error", "x")
            .with_child(Element::new("text"));
        assert!(matches!(converter.read(&extra), Err(Error::Attribute(_))));

        let missing = Element::new("entry").with_attribute("id", "1");
        assert!(matches!(converter.read(&missing), Err(Error::FieldRequired(_))));

        let twice = Element::new("entry")
            .with_child(Element::new("text"))
            .with_child(Element::new("text"));
        assert!(matches!(converter.read(&twice), Err(Error::Element(_))));
    }

    #[test]
    fn test_write_object() {
        let registry = Registry::new();
        let limits = Limits::default();
        let context = Context::new(&registry, "class", &limits);
        let converter = entry_converter(&context);

        let entry = Entry {
            id: 3,
            text: Some("body".to_string()),
        };
        let element = converter.write_root(&entry).unwrap();
        assert_eq!(element.name(), "entry");
        assert_eq!(element.attribute("id"), Some("3"));
        assert_eq!(element.attribute("class"), None);
        assert_eq!(element.find_children("text")[0].text(), "body");

        let empty = Entry::default();
        assert!(matches!(converter.write_root(&empty), Err(Error::Element(_))));
    }

    #[test]
    fn test_read_instantiates_override_type() {
        let registry = Registry::new();
        let limits = Limits::default();
        let context = Context::new(&registry, "class", &limits);
        let converter = entry_converter(&context);
        registry.register::<Tagged>().unwrap();

        let node = Element::new("tagged")
            .with_attribute("class", Tagged::TYPE_NAME)
            .with_attribute("id", "2")
            .with_attribute("tag", "red")
            .with_child(Element::new("text").with_text("hi"));
        let object = converter.read_root(&node).unwrap();
        assert_eq!(
            object.downcast_ref::<Tagged>(),
            Some(&Tagged {
                entry: Entry {
                    id: 2,
                    text: Some("hi".to_string())
                },
                tag: "red".to_string()
            })
        );

        let declared = registry.register::<Base>().unwrap();
        let abstract_converter = Composite::new(&context, declared);
        assert!(matches!(
            abstract_converter.read_root(&Element::new("base")),
            Err(Error::Instantiation(_))
        ));
    }
}
