//! Typed field slots and their type-erased accessors
//!
//! A label reaches into its owning object through an [`Access`]. The
//! accessors are built from plain `fn` pointers supplied to the
//! [`ClassBuilder`](super::ClassBuilder), so no reflection is needed: the
//! field slot traits below decide how a Rust field type is viewed as a leaf
//! text, a composite object or a collection.

use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::object::{Collection, ListEntry, Mapped, Object, COLLECTION, DEQUE, VEC};
use crate::scalar::Scalar;

/// An owned field value moving from a document into an object
#[derive(Debug)]
pub enum Value {
    /// Leaf text
    Text(String),
    /// Composite object
    Object(Box<dyn Object>),
    /// Collection of composite objects
    Collection(Box<dyn Collection>),
}

/// A borrowed field value moving from an object into a document
#[derive(Debug, Clone, Copy)]
pub enum ValueRef<'a> {
    /// Leaf text
    Text(&'a str),
    /// Composite object
    Object(&'a dyn Object),
    /// Collection of composite objects
    Collection(&'a dyn Collection),
}

/// A field value read out of an object
///
/// Leaf text is produced on demand and owned, composite values are
/// borrowed from the object.
#[derive(Debug)]
pub enum Slot<'a> {
    /// Leaf text
    Text(String),
    /// Composite object
    Object(&'a dyn Object),
    /// Collection of composite objects
    Collection(&'a dyn Collection),
}

impl<'a> Slot<'a> {
    /// Borrow as a [`ValueRef`]
    pub fn as_value(&self) -> ValueRef<'_> {
        match self {
            Slot::Text(text) => ValueRef::Text(text),
            Slot::Object(object) => ValueRef::Object(*object),
            Slot::Collection(collection) => ValueRef::Collection(*collection),
        }
    }
}

/// Type-erased get and set of one field
pub trait Access: Send + Sync {
    /// Read the field, `None` when it holds no value
    fn get<'a>(&self, object: &'a dyn Object) -> Result<Option<Slot<'a>>>;

    /// Store a value into the field
    fn set(&self, object: &mut dyn Object, value: Value) -> Result<()>;
}

/// A field holding leaf text
pub trait ScalarField: Send + Sync + 'static {
    /// Name of the scalar type
    fn scalar_type() -> &'static str;

    /// Text form of the field, `None` when empty
    fn text(&self) -> Option<String>;

    /// Parse and store text
    fn assign(&mut self, text: &str) -> Result<()>;
}

impl<S: Scalar> ScalarField for S {
    fn scalar_type() -> &'static str {
        std::any::type_name::<S>()
    }

    fn text(&self) -> Option<String> {
        Some(self.to_text())
    }

    fn assign(&mut self, text: &str) -> Result<()> {
        *self = S::from_text(text)?;
        Ok(())
    }
}

impl<S: Scalar> ScalarField for Option<S> {
    fn scalar_type() -> &'static str {
        std::any::type_name::<S>()
    }

    fn text(&self) -> Option<String> {
        self.as_ref().map(Scalar::to_text)
    }

    fn assign(&mut self, text: &str) -> Result<()> {
        *self = Some(S::from_text(text)?);
        Ok(())
    }
}

/// A field holding a composite object
///
/// Recursive types hold their nested value as `Option<Box<dyn Object>>`.
pub trait CompositeField: Send + Sync + 'static {
    /// Borrow the held object, `None` when empty
    fn object(&self) -> Option<&dyn Object>;

    /// Store an object
    fn assign(&mut self, object: Box<dyn Object>) -> Result<()>;
}

impl<T: Mapped> CompositeField for Option<T> {
    fn object(&self) -> Option<&dyn Object> {
        self.as_ref().map(|value| value as &dyn Object)
    }

    fn assign(&mut self, object: Box<dyn Object>) -> Result<()> {
        *self = Some(T::from_object(object)?);
        Ok(())
    }
}

impl CompositeField for Option<Box<dyn Object>> {
    fn object(&self) -> Option<&dyn Object> {
        self.as_deref()
    }

    fn assign(&mut self, object: Box<dyn Object>) -> Result<()> {
        *self = Some(object);
        Ok(())
    }
}

impl CompositeField for Box<dyn Object> {
    fn object(&self) -> Option<&dyn Object> {
        Some(self.as_ref())
    }

    fn assign(&mut self, object: Box<dyn Object>) -> Result<()> {
        *self = object;
        Ok(())
    }
}

/// A field holding a collection of composite objects
pub trait ListField: Send + Sync + 'static {
    /// Declared collection type
    const COLLECTION: &'static str;

    /// Borrow the held collection, `None` when empty
    fn collection(&self) -> Option<&dyn Collection>;

    /// Store a collection
    fn assign(&mut self, collection: Box<dyn Collection>) -> Result<()>;
}

fn collect_entries<E: ListEntry, C: FromIterator<E>>(collection: Box<dyn Collection>) -> Result<C> {
    collection
        .into_entries()
        .into_iter()
        .map(E::from_object)
        .collect()
}

impl<E: ListEntry> ListField for Vec<E> {
    const COLLECTION: &'static str = VEC;

    fn collection(&self) -> Option<&dyn Collection> {
        Some(self)
    }

    fn assign(&mut self, collection: Box<dyn Collection>) -> Result<()> {
        *self = collect_entries::<E, _>(collection)?;
        Ok(())
    }
}

impl<E: ListEntry> ListField for VecDeque<E> {
    const COLLECTION: &'static str = DEQUE;

    fn collection(&self) -> Option<&dyn Collection> {
        Some(self)
    }

    fn assign(&mut self, collection: Box<dyn Collection>) -> Result<()> {
        *self = collect_entries::<E, _>(collection)?;
        Ok(())
    }
}

impl<E: ListEntry> ListField for Option<Vec<E>> {
    const COLLECTION: &'static str = VEC;

    fn collection(&self) -> Option<&dyn Collection> {
        self.as_ref().map(|list| list as &dyn Collection)
    }

    fn assign(&mut self, collection: Box<dyn Collection>) -> Result<()> {
        *self = Some(collect_entries::<E, _>(collection)?);
        Ok(())
    }
}

impl<E: ListEntry> ListField for Option<VecDeque<E>> {
    const COLLECTION: &'static str = DEQUE;

    fn collection(&self) -> Option<&dyn Collection> {
        self.as_ref().map(|list| list as &dyn Collection)
    }

    fn assign(&mut self, collection: Box<dyn Collection>) -> Result<()> {
        *self = Some(collect_entries::<E, _>(collection)?);
        Ok(())
    }
}

impl ListField for Box<dyn Collection> {
    const COLLECTION: &'static str = COLLECTION;

    fn collection(&self) -> Option<&dyn Collection> {
        Some(self.as_ref())
    }

    fn assign(&mut self, collection: Box<dyn Collection>) -> Result<()> {
        *self = collection;
        Ok(())
    }
}

impl ListField for Option<Box<dyn Collection>> {
    const COLLECTION: &'static str = COLLECTION;

    fn collection(&self) -> Option<&dyn Collection> {
        self.as_deref()
    }

    fn assign(&mut self, collection: Box<dyn Collection>) -> Result<()> {
        *self = Some(collection);
        Ok(())
    }
}

fn owner<T: Mapped>(object: &dyn Object) -> Result<&T> {
    object.downcast_ref::<T>().ok_or_else(|| wrong_owner::<T>(object))
}

fn owner_mut<T: Mapped>(object: &mut dyn Object) -> Result<&mut T> {
    let name = object.type_name();
    object.downcast_mut::<T>().ok_or_else(|| {
        Error::TypeMismatch(format!(
            "Field of '{}' cannot be set on '{}'",
            T::TYPE_NAME,
            name
        ))
    })
}

fn wrong_owner<T: Mapped>(object: &dyn Object) -> Error {
    Error::TypeMismatch(format!(
        "Field of '{}' cannot be read from '{}'",
        T::TYPE_NAME,
        object.type_name()
    ))
}

fn wrong_value(expected: &str, value: &Value) -> Error {
    let found = match value {
        Value::Text(_) => "text",
        Value::Object(_) => "object",
        Value::Collection(_) => "collection",
    };
    Error::TypeMismatch(format!("Expected {} value but found {}", expected, found))
}

pub(crate) struct ScalarAccess<T, F> {
    pub(crate) get: fn(&T) -> &F,
    pub(crate) get_mut: fn(&mut T) -> &mut F,
}

impl<T: Mapped, F: ScalarField> Access for ScalarAccess<T, F> {
    fn get<'a>(&self, object: &'a dyn Object) -> Result<Option<Slot<'a>>> {
        let target = owner::<T>(object)?;
        Ok((self.get)(target).text().map(Slot::Text))
    }

    fn set(&self, object: &mut dyn Object, value: Value) -> Result<()> {
        let target = owner_mut::<T>(object)?;
        match value {
            Value::Text(text) => (self.get_mut)(target).assign(&text),
            other => Err(wrong_value("text", &other)),
        }
    }
}

pub(crate) struct CompositeAccess<T, F> {
    pub(crate) get: fn(&T) -> &F,
    pub(crate) get_mut: fn(&mut T) -> &mut F,
}

impl<T: Mapped, F: CompositeField> Access for CompositeAccess<T, F> {
    fn get<'a>(&self, object: &'a dyn Object) -> Result<Option<Slot<'a>>> {
        let target = owner::<T>(object)?;
        Ok((self.get)(target).object().map(Slot::Object))
    }

    fn set(&self, object: &mut dyn Object, value: Value) -> Result<()> {
        let target = owner_mut::<T>(object)?;
        match value {
            Value::Object(value) => (self.get_mut)(target).assign(value),
            other => Err(wrong_value("object", &other)),
        }
    }
}

pub(crate) struct ListAccess<T, F> {
    pub(crate) get: fn(&T) -> &F,
    pub(crate) get_mut: fn(&mut T) -> &mut F,
}

impl<T: Mapped, F: ListField> Access for ListAccess<T, F> {
    fn get<'a>(&self, object: &'a dyn Object) -> Result<Option<Slot<'a>>> {
        let target = owner::<T>(object)?;
        Ok((self.get)(target).collection().map(Slot::Collection))
    }

    fn set(&self, object: &mut dyn Object, value: Value) -> Result<()> {
        let target = owner_mut::<T>(object)?;
        match value {
            Value::Collection(value) => (self.get_mut)(target).assign(value),
            other => Err(wrong_value("collection", &other)),
        }
    }
}

/// Rebases accessors declared on a parent type onto a derived type
pub(crate) trait Lift: Send + Sync {
    fn lift(&self, inner: Arc<dyn Access>) -> Arc<dyn Access>;
}

pub(crate) struct Projection<T, P> {
    pub(crate) base: fn(&T) -> &P,
    pub(crate) base_mut: fn(&mut T) -> &mut P,
}

impl<T: Mapped, P: Mapped> Lift for Projection<T, P> {
    fn lift(&self, inner: Arc<dyn Access>) -> Arc<dyn Access> {
        Arc::new(Inherited::<T, P> {
            base: self.base,
            base_mut: self.base_mut,
            inner,
            _marker: PhantomData,
        })
    }
}

struct Inherited<T, P> {
    base: fn(&T) -> &P,
    base_mut: fn(&mut T) -> &mut P,
    inner: Arc<dyn Access>,
    _marker: PhantomData<fn() -> (T, P)>,
}

impl<T: Mapped, P: Mapped> Access for Inherited<T, P> {
    fn get<'a>(&self, object: &'a dyn Object) -> Result<Option<Slot<'a>>> {
        let target = owner::<T>(object)?;
        self.inner.get((self.base)(target))
    }

    fn set(&self, object: &mut dyn Object, value: Value) -> Result<()> {
        let target = owner_mut::<T>(object)?;
        self.inner.set((self.base_mut)(target), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ClassBuilder;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Base {
        id: u32,
    }

    impl Mapped for Base {
        const TYPE_NAME: &'static str = "access::tests::Base";

        fn declare(class: &mut ClassBuilder<Self>) {
            class.attribute("id", true, |b| &b.id, |b| &mut b.id);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Derived {
        base: Base,
        name: Option<String>,
        items: Vec<Base>,
    }

    impl Mapped for Derived {
        const TYPE_NAME: &'static str = "access::tests::Derived";

        fn declare(class: &mut ClassBuilder<Self>) {
            class.extends(|d| &d.base, |d| &mut d.base);
        }
    }

    #[test]
    fn test_scalar_access_round_trip() {
        let access = ScalarAccess::<Derived, Option<String>> {
            get: |d| &d.name,
            get_mut: |d| &mut d.name,
        };
        let mut derived = Derived::default();
        assert!(access.get(&derived).unwrap().is_none());

        access
            .set(&mut derived, Value::Text("hello".to_string()))
            .unwrap();
        assert_eq!(derived.name.as_deref(), Some("hello"));
        assert!(matches!(
            access.get(&derived).unwrap(),
            Some(Slot::Text(text)) if text == "hello"
        ));
    }

    #[test]
    fn test_scalar_access_rejects_bad_text() {
        let access = ScalarAccess::<Base, u32> {
            get: |b| &b.id,
            get_mut: |b| &mut b.id,
        };
        let mut base = Base::default();
        let err = access
            .set(&mut base, Value::Text("minus one".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Value(_)));
    }

    #[test]
    fn test_wrong_owner() {
        let access = ScalarAccess::<Base, u32> {
            get: |b| &b.id,
            get_mut: |b| &mut b.id,
        };
        let derived = Derived::default();
        assert!(matches!(access.get(&derived), Err(Error::TypeMismatch(_))));
    }

    #[test]
    fn test_list_access_converts_entries() {
        let access = ListAccess::<Derived, Vec<Base>> {
            get: |d| &d.items,
            get_mut: |d| &mut d.items,
        };
        let mut derived = Derived::default();
        let list: Box<dyn Collection> =
            Box::new(vec![Box::new(Base { id: 7 }) as Box<dyn Object>]);
        access.set(&mut derived, Value::Collection(list)).unwrap();
        assert_eq!(derived.items, vec![Base { id: 7 }]);
    }

    #[test]
    fn test_inherited_access() {
        let inner: Arc<dyn Access> = Arc::new(ScalarAccess::<Base, u32> {
            get: |b| &b.id,
            get_mut: |b| &mut b.id,
        });
        let projection = Projection::<Derived, Base> {
            base: |d| &d.base,
            base_mut: |d| &mut d.base,
        };
        let access = projection.lift(inner);

        let mut derived = Derived::default();
        access.set(&mut derived, Value::Text("42".to_string())).unwrap();
        assert_eq!(derived.base.id, 42);
    }
}
