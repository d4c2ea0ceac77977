//! Type registry
//!
//! The registry is the metadata cache of the engine. It maps type names to
//! classes (so type-override markers can be resolved), keeps resolved
//! descriptors, and knows the collection types a list may be instantiated
//! as. Descriptors are computed once and then shared read-only, so one
//! registry can serve any number of concurrent reads and writes.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use tracing::debug;

use super::class::Class;
use super::descriptor::{self, SchemaDescriptor};
use crate::error::{Error, Result};
use crate::object::{Collection, Mapped, Object, COLLECTION, DEQUE, VEC};

/// Constructor of an empty collection
pub type CollectionConstructor = fn() -> Box<dyn Collection>;

static GLOBAL: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::new()));

fn new_vec() -> Box<dyn Collection> {
    Box::new(Vec::<Box<dyn Object>>::new())
}

fn new_deque() -> Box<dyn Collection> {
    Box::new(std::collections::VecDeque::<Box<dyn Object>>::new())
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of classes, descriptors and collection types
#[derive(Debug)]
pub struct Registry {
    classes: RwLock<HashMap<&'static str, Arc<Class>>>,
    descriptors: RwLock<HashMap<&'static str, Arc<SchemaDescriptor>>>,
    collections: RwLock<IndexMap<&'static str, CollectionConstructor>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an isolated registry knowing only the built-in collections
    pub fn new() -> Self {
        let mut collections: IndexMap<&'static str, CollectionConstructor> = IndexMap::new();
        collections.insert(VEC, new_vec);
        collections.insert(DEQUE, new_deque);

        Self {
            classes: RwLock::new(HashMap::new()),
            descriptors: RwLock::new(HashMap::new()),
            collections: RwLock::new(collections),
        }
    }

    /// The process-wide registry
    pub fn global() -> Arc<Registry> {
        Arc::clone(&GLOBAL)
    }

    /// Register `T` and its ancestors, returning the class of `T`
    ///
    /// Registering an already known type is a lookup. A type name bound to a
    /// different Rust type is rejected.
    pub fn register<T: Mapped>(&self) -> Result<Arc<Class>> {
        if let Some(class) = self.class(T::TYPE_NAME) {
            return same_type::<T>(class);
        }

        let class = Arc::new(Class::of::<T>());
        let class = Arc::clone(write(&self.classes).entry(T::TYPE_NAME).or_insert(class));
        let class = same_type::<T>(class)?;
        debug!(type_name = T::TYPE_NAME, root = ?class.root(), "registered class");

        if let Some(parent) = class.parent_type() {
            parent.resolve(self)?;
        }
        Ok(class)
    }

    /// Look up a registered class by type name
    pub fn class(&self, name: &str) -> Option<Arc<Class>> {
        read(&self.classes).get(name).cloned()
    }

    /// Names of all registered types
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = read(&self.classes).keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Resolved descriptor of a class, computed on first use
    pub fn descriptor(&self, class: &Arc<Class>) -> Result<Arc<SchemaDescriptor>> {
        if let Some(descriptor) = read(&self.descriptors).get(class.name()) {
            return Ok(Arc::clone(descriptor));
        }

        let resolved = Arc::new(descriptor::resolve(self, class)?);
        debug!(
            type_name = class.name(),
            attributes = resolved.attributes().len(),
            elements = resolved.elements().len(),
            element_lists = resolved.element_lists().len(),
            "resolved schema descriptor"
        );
        Ok(Arc::clone(
            write(&self.descriptors)
                .entry(class.name())
                .or_insert(resolved),
        ))
    }

    /// Resolved descriptor of `T`
    pub fn descriptor_of<T: Mapped>(&self) -> Result<Arc<SchemaDescriptor>> {
        let class = self.register::<T>()?;
        self.descriptor(&class)
    }

    /// Check whether `class` is `declared` or inherits from it
    pub fn is_assignable(&self, class: &Class, declared: &str) -> Result<bool> {
        let mut seen = HashSet::new();
        let mut name = class.name();
        let mut parent = class.parent_type();

        loop {
            if name == declared {
                return Ok(true);
            }
            if !seen.insert(name) {
                return Err(Error::Schema(format!(
                    "Type '{}' inherits from itself",
                    name
                )));
            }
            match parent {
                Some(next) => {
                    let next = next.resolve(self)?;
                    name = next.name();
                    parent = next.parent_type();
                }
                None => return Ok(false),
            }
        }
    }

    /// Register a collection type under a name
    pub fn register_collection(
        &self,
        name: &'static str,
        constructor: CollectionConstructor,
    ) -> Result<()> {
        if name == COLLECTION {
            return Err(Error::Schema(format!(
                "'{}' names the abstract collection type and cannot be registered",
                name
            )));
        }
        write(&self.collections).insert(name, constructor);
        debug!(collection = name, "registered collection type");
        Ok(())
    }

    /// Look up a collection constructor
    pub fn collection(&self, name: &str) -> Option<CollectionConstructor> {
        read(&self.collections).get(name).copied()
    }

    /// Check whether a runtime collection type satisfies a declared one
    pub fn is_collection_assignable(&self, runtime: &str, declared: &str) -> bool {
        declared == COLLECTION || runtime == declared
    }
}

fn same_type<T: Mapped>(class: Arc<Class>) -> Result<Arc<Class>> {
    if class.type_id() == std::any::TypeId::of::<T>() {
        Ok(class)
    } else {
        Err(Error::Schema(format!(
            "Type name '{}' is already bound to a different type",
            T::TYPE_NAME
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ClassBuilder;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Animal {
        name: String,
    }

    impl Mapped for Animal {
        const TYPE_NAME: &'static str = "registry::tests::Animal";

        fn declare(class: &mut ClassBuilder<Self>) {
            class.attribute("name", true, |a| &a.name, |a| &mut a.name);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Dog {
        animal: Animal,
    }

    impl Mapped for Dog {
        const TYPE_NAME: &'static str = "registry::tests::Dog";

        fn declare(class: &mut ClassBuilder<Self>) {
            class.root("dog").extends(|d| &d.animal, |d| &mut d.animal);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Impostor;

    impl Mapped for Impostor {
        const TYPE_NAME: &'static str = "registry::tests::Dog";

        fn declare(_class: &mut ClassBuilder<Self>) {}
    }

    #[test]
    fn test_register_includes_ancestors() {
        let registry = Registry::new();
        registry.register::<Dog>().unwrap();

        assert!(registry.class(Dog::TYPE_NAME).is_some());
        assert!(registry.class(Animal::TYPE_NAME).is_some());
        assert_eq!(
            registry.type_names(),
            vec!["registry::tests::Animal", "registry::tests::Dog"]
        );
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = Registry::new();
        let a = registry.register::<Dog>().unwrap();
        let b = registry.register::<Dog>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_name_clash_rejected() {
        let registry = Registry::new();
        registry.register::<Dog>().unwrap();
        assert!(matches!(
            registry.register::<Impostor>(),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_is_assignable() {
        let registry = Registry::new();
        let dog = registry.register::<Dog>().unwrap();
        let animal = registry.register::<Animal>().unwrap();

        assert!(registry.is_assignable(&dog, Animal::TYPE_NAME).unwrap());
        assert!(registry.is_assignable(&dog, Dog::TYPE_NAME).unwrap());
        assert!(!registry.is_assignable(&animal, Dog::TYPE_NAME).unwrap());
    }

    #[test]
    fn test_descriptor_is_cached() {
        let registry = Registry::new();
        let a = registry.descriptor_of::<Dog>().unwrap();
        let b = registry.descriptor_of::<Dog>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_collections() {
        let registry = Registry::new();
        assert!(registry.collection(VEC).is_some());
        assert!(registry.collection(DEQUE).is_some());
        assert!(registry.collection(COLLECTION).is_none());
        assert!(registry.register_collection(COLLECTION, new_vec).is_err());

        assert!(registry.is_collection_assignable(DEQUE, COLLECTION));
        assert!(registry.is_collection_assignable(VEC, VEC));
        assert!(!registry.is_collection_assignable(VEC, DEQUE));
    }
}
