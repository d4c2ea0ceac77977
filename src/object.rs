//! Mapped object model
//!
//! [`Mapped`] is implemented by every type that is read from or written to
//! an element with attributes and children. It names the type and declares
//! its fields. [`Object`] is the object-safe view of a mapped value used
//! wherever the concrete type is only known at runtime: polymorphic fields,
//! heterogeneous lists and type-override resolution.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::schema::{Class, ClassBuilder, Registry};

/// Name of the abstract collection type, accepting any registered collection
pub const COLLECTION: &str = "collection";

/// Name of the `Vec` collection type
pub const VEC: &str = "vec";

/// Name of the `VecDeque` collection type
pub const DEQUE: &str = "deque";

/// A type with declarative mapping metadata
///
/// ```
/// use xmlbind::{ClassBuilder, Mapped};
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct Entry {
///     id: i32,
///     text: Option<String>,
/// }
///
/// impl Mapped for Entry {
///     const TYPE_NAME: &'static str = "doc::Entry";
///
///     fn declare(class: &mut ClassBuilder<Self>) {
///         class
///             .root("entry")
///             .attribute("id", false, |e| &e.id, |e| &mut e.id)
///             .text("text", true, |e| &e.text, |e| &mut e.text);
///     }
/// }
/// ```
pub trait Mapped: Default + Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Fully qualified type name, written into type-override markers
    const TYPE_NAME: &'static str;

    /// Declare the root binding, parent type and fields of this type
    fn declare(class: &mut ClassBuilder<Self>);
}

/// Object-safe view of a [`Mapped`] value
pub trait Object: Any + Send + Sync + fmt::Debug {
    /// Runtime type name, as declared by [`Mapped::TYPE_NAME`]
    fn type_name(&self) -> &'static str;

    /// Borrow as `Any`
    fn as_any(&self) -> &dyn Any;

    /// Borrow mutably as `Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Convert into a boxed `Any`
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Clone into a new box
    fn clone_object(&self) -> Box<dyn Object>;

    /// Compare with another object of any type
    fn eq_object(&self, other: &dyn Object) -> bool;

    /// Look up (registering on first use) the class of the runtime type
    fn class(&self, registry: &Registry) -> Result<Arc<Class>>;
}

impl<T: Mapped> Object for T {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_object(&self) -> Box<dyn Object> {
        Box::new(self.clone())
    }

    fn eq_object(&self, other: &dyn Object) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn class(&self, registry: &Registry) -> Result<Arc<Class>> {
        registry.register::<T>()
    }
}

impl dyn Object {
    /// Check whether the runtime type is `T`
    pub fn is<T: Mapped>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcast to a reference of the concrete type
    pub fn downcast_ref<T: Mapped>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcast to a mutable reference of the concrete type
    pub fn downcast_mut<T: Mapped>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Downcast a boxed object into the concrete type
    pub fn downcast<T: Mapped>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast::<T>().ok()
    }
}

impl Clone for Box<dyn Object> {
    fn clone(&self) -> Self {
        self.clone_object()
    }
}

// Implemented on the box rather than on `dyn Object` so that structs holding
// a bare `Box<dyn Object>` can derive `PartialEq`.
impl PartialEq for Box<dyn Object> {
    fn eq(&self, other: &Self) -> bool {
        self.eq_object(&**other)
    }
}

/// A value that can be stored in an element list
pub trait ListEntry: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Borrow the entry as an object
    fn as_object(&self) -> &dyn Object;

    /// Convert the entry into a boxed object
    fn into_object(self) -> Box<dyn Object>;

    /// Convert a boxed object into an entry
    fn from_object(object: Box<dyn Object>) -> Result<Self>;
}

impl<T: Mapped> ListEntry for T {
    fn as_object(&self) -> &dyn Object {
        self
    }

    fn into_object(self) -> Box<dyn Object> {
        Box::new(self)
    }

    fn from_object(object: Box<dyn Object>) -> Result<Self> {
        let name = object.type_name();
        object.downcast::<T>().map(|entry| *entry).ok_or_else(|| {
            Error::TypeMismatch(format!(
                "Entry of type '{}' cannot be stored as '{}'",
                name,
                T::TYPE_NAME
            ))
        })
    }
}

impl ListEntry for Box<dyn Object> {
    fn as_object(&self) -> &dyn Object {
        self.as_ref()
    }

    fn into_object(self) -> Box<dyn Object> {
        self
    }

    fn from_object(object: Box<dyn Object>) -> Result<Self> {
        Ok(object)
    }
}

/// A collection of list entries
pub trait Collection: fmt::Debug + Send + Sync + 'static {
    /// Registered name of the runtime collection type
    fn collection_type(&self) -> &'static str;

    /// Borrow the entries in iteration order
    fn entries(&self) -> Vec<&dyn Object>;

    /// Append an entry
    fn insert(&mut self, entry: Box<dyn Object>) -> Result<()>;

    /// Consume the collection, returning its entries in order
    fn into_entries(self: Box<Self>) -> Vec<Box<dyn Object>>;

    /// Clone into a new box
    fn clone_collection(&self) -> Box<dyn Collection>;

    /// Number of entries
    fn len(&self) -> usize;

    /// Check whether the collection has no entries
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: ListEntry> Collection for Vec<E> {
    fn collection_type(&self) -> &'static str {
        VEC
    }

    fn entries(&self) -> Vec<&dyn Object> {
        self.iter().map(ListEntry::as_object).collect()
    }

    fn insert(&mut self, entry: Box<dyn Object>) -> Result<()> {
        self.push(E::from_object(entry)?);
        Ok(())
    }

    fn into_entries(self: Box<Self>) -> Vec<Box<dyn Object>> {
        (*self).into_iter().map(ListEntry::into_object).collect()
    }

    fn clone_collection(&self) -> Box<dyn Collection> {
        Box::new(self.clone())
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl<E: ListEntry> Collection for VecDeque<E> {
    fn collection_type(&self) -> &'static str {
        DEQUE
    }

    fn entries(&self) -> Vec<&dyn Object> {
        self.iter().map(ListEntry::as_object).collect()
    }

    fn insert(&mut self, entry: Box<dyn Object>) -> Result<()> {
        self.push_back(E::from_object(entry)?);
        Ok(())
    }

    fn into_entries(self: Box<Self>) -> Vec<Box<dyn Object>> {
        (*self).into_iter().map(ListEntry::into_object).collect()
    }

    fn clone_collection(&self) -> Box<dyn Collection> {
        Box::new(self.clone())
    }

    fn len(&self) -> usize {
        VecDeque::len(self)
    }
}

impl Clone for Box<dyn Collection> {
    fn clone(&self) -> Self {
        self.clone_collection()
    }
}

impl PartialEq for Box<dyn Collection> {
    fn eq(&self, other: &Self) -> bool {
        self.collection_type() == other.collection_type()
            && self.len() == other.len()
            && self
                .entries()
                .into_iter()
                .zip(other.entries())
                .all(|(a, b)| a.eq_object(b))
    }
}

// Lets `derive(PartialEq)` compile on structs holding a bare
// `Box<dyn Collection>` field (works around rust-lang/rust#31740).
impl PartialEq<&Self> for Box<dyn Collection> {
    fn eq(&self, other: &&Self) -> bool {
        <Self as PartialEq>::eq(self, *other)
    }
}

impl Default for Box<dyn Collection> {
    fn default() -> Self {
        Box::new(Vec::<Box<dyn Object>>::new())
    }
}
