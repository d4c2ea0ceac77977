//! Instance factories
//!
//! A factory decides which concrete type to build for an element: the
//! declared type, or the type named by the element's override marker when
//! that type is assignable to the declared one.

use std::sync::Arc;

use tracing::trace;

use super::Context;
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::object::{Collection, Object, COLLECTION, VEC};
use crate::schema::Class;

/// Builds objects for a declared composite type
pub struct ObjectFactory<'a> {
    context: &'a Context<'a>,
    declared: Arc<Class>,
}

impl<'a> ObjectFactory<'a> {
    /// Create a factory for the declared class
    pub fn new(context: &'a Context<'a>, declared: Arc<Class>) -> Self {
        Self { context, declared }
    }

    /// The declared class
    pub fn declared(&self) -> &Arc<Class> {
        &self.declared
    }

    /// Class to instantiate for `node`
    fn resolve(&self, node: &Element) -> Result<Arc<Class>> {
        let name = match node.attribute(self.context.marker()) {
            Some(name) => name,
            None => return Ok(Arc::clone(&self.declared)),
        };

        let registry = self.context.registry();
        let class = registry.class(name).ok_or_else(|| {
            Error::Instantiation(format!(
                "Type '{}' named by element '{}' is not registered",
                name,
                node.name()
            ))
        })?;
        if !registry.is_assignable(&class, self.declared.name())? {
            return Err(Error::Instantiation(format!(
                "Type '{}' is not assignable to '{}'",
                name,
                self.declared.name()
            )));
        }
        Ok(class)
    }

    /// Create a default instance of the type to build for `node`
    pub fn instantiate(&self, node: &Element) -> Result<(Box<dyn Object>, Arc<Class>)> {
        let class = self.resolve(node)?;
        let object = class.instantiate()?;
        trace!(element = node.name(), type_name = class.name(), "instantiated object");
        Ok((object, class))
    }

    /// Mark `node` as holding a value of another type than declared
    pub fn set_override(&self, type_name: &str, node: &mut Element) {
        node.set_attribute(self.context.marker(), type_name);
    }
}

/// Builds collections for a declared collection type
pub struct CollectionFactory<'a> {
    context: &'a Context<'a>,
    declared: &'static str,
}

impl<'a> CollectionFactory<'a> {
    /// Create a factory for the declared collection type
    pub fn new(context: &'a Context<'a>, declared: &'static str) -> Self {
        Self { context, declared }
    }

    /// The declared collection type
    pub fn declared(&self) -> &'static str {
        self.declared
    }

    /// Collection type built when no override is present
    pub fn default_type(&self) -> &'static str {
        if self.declared == COLLECTION {
            VEC
        } else {
            self.declared
        }
    }

    /// Create an empty collection for `node`
    pub fn instantiate(&self, node: &Element) -> Result<Box<dyn Collection>> {
        let name = node
            .attribute(self.context.marker())
            .unwrap_or_else(|| self.default_type());

        let registry = self.context.registry();
        let constructor = registry.collection(name).ok_or_else(|| {
            Error::Instantiation(format!(
                "Collection type '{}' named by element '{}' is not registered",
                name,
                node.name()
            ))
        })?;
        let collection = constructor();
        if !registry.is_collection_assignable(collection.collection_type(), self.declared) {
            return Err(Error::Instantiation(format!(
                "Collection type '{}' is not assignable to '{}'",
                name, self.declared
            )));
        }
        Ok(collection)
    }

    /// Mark `node` as holding another collection type than declared
    pub fn set_override(&self, collection_type: &str, node: &mut Element) {
        node.set_attribute(self.context.marker(), collection_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::Limits;
    use crate::object::{Mapped, DEQUE};
    use crate::schema::{ClassBuilder, Registry};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Vehicle;

    impl Mapped for Vehicle {
        const TYPE_NAME: &'static str = "factory::tests::Vehicle";

        fn declare(class: &mut ClassBuilder<Self>) {
            class.abstract_type();
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Car {
        vehicle: Vehicle,
    }

    impl Mapped for Car {
        const TYPE_NAME: &'static str = "factory::tests::Car";

        fn declare(class: &mut ClassBuilder<Self>) {
            class.extends(|c| &c.vehicle, |c| &mut c.vehicle);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Stone;

    impl Mapped for Stone {
        const TYPE_NAME: &'static str = "factory::tests::Stone";

        fn declare(_class: &mut ClassBuilder<Self>) {}
    }

    #[test]
    fn test_object_factory_override() {
        let registry = Registry::new();
        let limits = Limits::default();
        let context = Context::new(&registry, "class", &limits);
        let declared = registry.register::<Vehicle>().unwrap();
        registry.register::<Car>().unwrap();
        registry.register::<Stone>().unwrap();
        let factory = ObjectFactory::new(&context, declared);

        let plain = Element::new("vehicle");
        assert!(matches!(
            factory.instantiate(&plain),
            Err(Error::Instantiation(_))
        ));

        let car = Element::new("vehicle").with_attribute("class", Car::TYPE_NAME);
        let (object, class) = factory.instantiate(&car).unwrap();
        assert!(object.is::<Car>());
        assert_eq!(class.name(), Car::TYPE_NAME);

        let stone = Element::new("vehicle").with_attribute("class", Stone::TYPE_NAME);
        assert!(matches!(
            factory.instantiate(&stone),
            Err(Error::Instantiation(_))
        ));

        let unknown = Element::new("vehicle").with_attribute("class", "no::Such");
        assert!(matches!(
            factory.instantiate(&unknown),
            Err(Error::Instantiation(_))
        ));
    }

    #[test]
    fn test_collection_factory() {
        let registry = Registry::new();
        let limits = Limits::default();
        let context = Context::new(&registry, "class", &limits);

        let any = CollectionFactory::new(&context, COLLECTION);
        let plain = Element::new("list");
        assert_eq!(any.instantiate(&plain).unwrap().collection_type(), VEC);
        let deque = Element::new("list").with_attribute("class", DEQUE);
        assert_eq!(any.instantiate(&deque).unwrap().collection_type(), DEQUE);

        let vec_only = CollectionFactory::new(&context, VEC);
        assert!(matches!(
            vec_only.instantiate(&deque),
            Err(Error::Instantiation(_))
        ));
        let unknown = Element::new("list").with_attribute("class", "set");
        assert!(matches!(
            vec_only.instantiate(&unknown),
            Err(Error::Instantiation(_))
        ));
    }
}
