//! Metadata resolution
//!
//! Declarations flow through three stages:
//!
//! - [`ClassBuilder`] collects what a [`Mapped`](crate::Mapped) type declares.
//! - [`Class`] holds that raw declaration, one per type.
//! - [`SchemaDescriptor`] is the resolved view including inherited labels,
//!   cached in a [`Registry`].

mod access;
mod class;
mod descriptor;
mod dump;
mod label;
mod registry;

pub use access::{
    Access, CompositeField, ListField, ScalarField, Slot, Value, ValueRef,
};
pub use class::{Class, ClassBuilder, TypeRef};
pub use descriptor::SchemaDescriptor;
pub use dump::{LabelInfo, SchemaDump};
pub use label::{Label, LabelMap, Role, TraversalMap};
pub use registry::{CollectionConstructor, Registry};
