//! Class declarations
//!
//! A [`Class`] is the raw, unresolved declaration of one mapped type: its
//! root binding, optional parent and own labels. It is produced by running
//! [`Mapped::declare`] against a [`ClassBuilder`].

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::access::{
    Access, CompositeAccess, CompositeField, Lift, ListAccess, ListField, Projection,
    ScalarAccess, ScalarField,
};
use super::label::{Label, Role};
use super::registry::Registry;
use crate::error::{Error, Result};
use crate::object::{Mapped, Object};

/// Lazily resolvable reference to a mapped type
#[derive(Clone, Copy)]
pub struct TypeRef {
    name: &'static str,
    resolve: fn(&Registry) -> Result<Arc<Class>>,
}

fn register<T: Mapped>(registry: &Registry) -> Result<Arc<Class>> {
    registry.register::<T>()
}

impl TypeRef {
    /// Reference the mapped type `T`
    pub fn of<T: Mapped>() -> Self {
        Self {
            name: T::TYPE_NAME,
            resolve: register::<T>,
        }
    }

    /// Name of the referenced type
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Resolve the class in a registry, registering it if needed
    pub fn resolve(&self, registry: &Registry) -> Result<Arc<Class>> {
        (self.resolve)(registry)
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeRef").field(&self.name).finish()
    }
}

pub(crate) struct Parent {
    pub(crate) class: TypeRef,
    pub(crate) lift: Arc<dyn Lift>,
}

/// Declaration of one mapped type
pub struct Class {
    name: &'static str,
    type_id: TypeId,
    root: Option<String>,
    parent: Option<Parent>,
    labels: Vec<Label>,
    construct: Option<fn() -> Box<dyn Object>>,
    problems: Vec<String>,
}

fn construct<T: Mapped>() -> Box<dyn Object> {
    Box::new(T::default())
}

impl Class {
    /// Build the class of `T` from its declaration
    pub fn of<T: Mapped>() -> Self {
        let mut builder = ClassBuilder::<T>::new();
        T::declare(&mut builder);
        builder.build()
    }

    /// Type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Rust type identity
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Root element name, if bound
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Name of the parent type, if any
    pub fn parent_name(&self) -> Option<&'static str> {
        self.parent.as_ref().map(|parent| parent.class.name())
    }

    /// Check whether the type may be instantiated
    pub fn is_abstract(&self) -> bool {
        self.construct.is_none()
    }

    /// Labels declared by this type itself
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Create a default instance
    pub fn instantiate(&self) -> Result<Box<dyn Object>> {
        match self.construct {
            Some(construct) => Ok(construct()),
            None => Err(Error::Instantiation(format!(
                "Type '{}' is abstract and cannot be instantiated",
                self.name
            ))),
        }
    }

    pub(crate) fn parent(&self) -> Option<&Parent> {
        self.parent.as_ref()
    }

    pub(crate) fn parent_type(&self) -> Option<TypeRef> {
        self.parent.as_ref().map(|parent| parent.class)
    }

    pub(crate) fn problems(&self) -> &[String] {
        &self.problems
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("parent", &self.parent_name())
            .field("labels", &self.labels)
            .field("abstract", &self.is_abstract())
            .finish()
    }
}

/// Collects the declarations of a mapped type
///
/// Accessors are passed as a pair of `fn` pointers, usually written as
/// non-capturing closures. The field type selects how the value is mapped:
///
/// - [`attribute`](Self::attribute) and [`text`](Self::text) take any
///   [`Scalar`](crate::Scalar) or `Option` of one.
/// - [`element`](Self::element) takes `Option<D>`, `Option<Box<dyn Object>>`
///   or `Box<dyn Object>`.
/// - [`element_list`](Self::element_list) takes `Vec`, `VecDeque`, their
///   `Option`s or `Box<dyn Collection>`.
pub struct ClassBuilder<T: Mapped> {
    root: Option<String>,
    parent: Option<Parent>,
    labels: Vec<Label>,
    is_abstract: bool,
    problems: Vec<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Mapped> ClassBuilder<T> {
    fn new() -> Self {
        Self {
            root: None,
            parent: None,
            labels: Vec::new(),
            is_abstract: false,
            problems: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Bind the type to a root element name
    pub fn root(&mut self, name: &str) -> &mut Self {
        self.root = Some(name.to_string());
        self
    }

    /// Inherit the labels of `P`, reached through an embedded field
    pub fn extends<P: Mapped>(
        &mut self,
        base: fn(&T) -> &P,
        base_mut: fn(&mut T) -> &mut P,
    ) -> &mut Self {
        if let Some(existing) = &self.parent {
            self.problems.push(format!(
                "Type '{}' extends both '{}' and '{}'",
                T::TYPE_NAME,
                existing.class.name(),
                P::TYPE_NAME
            ));
            return self;
        }
        self.parent = Some(Parent {
            class: TypeRef::of::<P>(),
            lift: Arc::new(Projection::<T, P> { base, base_mut }),
        });
        self
    }

    /// Mark the type as abstract: it can be declared but never instantiated
    pub fn abstract_type(&mut self) -> &mut Self {
        self.is_abstract = true;
        self
    }

    /// Declare an attribute
    pub fn attribute<F: ScalarField>(
        &mut self,
        name: &str,
        required: bool,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        let role = Role::Attribute {
            scalar: F::scalar_type(),
        };
        self.push(name, required, role, Arc::new(ScalarAccess { get, get_mut }))
    }

    /// Declare a child element holding leaf text
    pub fn text<F: ScalarField>(
        &mut self,
        name: &str,
        required: bool,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        let role = Role::Text {
            scalar: F::scalar_type(),
        };
        self.push(name, required, role, Arc::new(ScalarAccess { get, get_mut }))
    }

    /// Declare a child element holding an object of type `D` or a subtype
    pub fn element<D: Mapped, F: CompositeField>(
        &mut self,
        name: &str,
        required: bool,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        let role = Role::Element {
            declared: TypeRef::of::<D>(),
        };
        self.push(name, required, role, Arc::new(CompositeAccess { get, get_mut }))
    }

    /// Declare a child element whose children are entries of type `D`
    pub fn element_list<D: Mapped, F: ListField>(
        &mut self,
        name: &str,
        required: bool,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        let role = Role::ElementList {
            entry: TypeRef::of::<D>(),
            collection: F::COLLECTION,
        };
        self.push(name, required, role, Arc::new(ListAccess { get, get_mut }))
    }

    fn push(
        &mut self,
        name: &str,
        required: bool,
        role: Role,
        access: Arc<dyn Access>,
    ) -> &mut Self {
        self.labels
            .push(Label::new(name, required, role, access, T::TYPE_NAME));
        self
    }

    fn build(self) -> Class {
        Class {
            name: T::TYPE_NAME,
            type_id: TypeId::of::<T>(),
            root: self.root,
            parent: self.parent,
            labels: self.labels,
            construct: if self.is_abstract {
                None
            } else {
                Some(construct::<T>)
            },
            problems: self.problems,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Shape {
        id: String,
    }

    impl Mapped for Shape {
        const TYPE_NAME: &'static str = "class::tests::Shape";

        fn declare(class: &mut ClassBuilder<Self>) {
            class
                .abstract_type()
                .attribute("id", true, |s| &s.id, |s| &mut s.id);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Circle {
        shape: Shape,
        radius: f64,
        centre: Option<Shape>,
        rings: Vec<Shape>,
    }

    impl Mapped for Circle {
        const TYPE_NAME: &'static str = "class::tests::Circle";

        fn declare(class: &mut ClassBuilder<Self>) {
            class
                .root("circle")
                .extends(|c| &c.shape, |c| &mut c.shape)
                .text("radius", true, |c| &c.radius, |c| &mut c.radius)
                .element::<Shape, _>("centre", false, |c| &c.centre, |c| &mut c.centre)
                .element_list::<Shape, _>("rings", false, |c| &c.rings, |c| &mut c.rings);
        }
    }

    #[test]
    fn test_class_of() {
        let class = Class::of::<Circle>();
        assert_eq!(class.name(), "class::tests::Circle");
        assert_eq!(class.root(), Some("circle"));
        assert_eq!(class.parent_name(), Some("class::tests::Shape"));
        assert!(!class.is_abstract());

        let names: Vec<&str> = class.labels().iter().map(Label::name).collect();
        assert_eq!(names, vec!["radius", "centre", "rings"]);
        assert!(class.labels().iter().all(|l| l.declared_by() == Circle::TYPE_NAME));
    }

    #[test]
    fn test_list_role_records_collection() {
        let class = Class::of::<Circle>();
        match class.labels()[2].role() {
            Role::ElementList { entry, collection } => {
                assert_eq!(entry.name(), Shape::TYPE_NAME);
                assert_eq!(*collection, "vec");
            }
            other => panic!("unexpected role {:?}", other),
        }
    }

    #[test]
    fn test_abstract_class_cannot_instantiate() {
        let class = Class::of::<Shape>();
        assert!(class.is_abstract());
        assert!(matches!(class.instantiate(), Err(Error::Instantiation(_))));

        let circle = Class::of::<Circle>().instantiate().unwrap();
        assert!(circle.is::<Circle>());
    }
}
