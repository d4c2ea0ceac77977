//! Labels: the resolved view of one declared field

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use super::access::Access;
use super::class::{Class, TypeRef};
use super::registry::Registry;
use crate::error::{Error, Result};

/// How a label appears in the document
#[derive(Debug, Clone, Copy)]
pub enum Role {
    /// An attribute carrying leaf text
    Attribute {
        /// Scalar type of the field
        scalar: &'static str,
    },
    /// A child element carrying leaf text
    Text {
        /// Scalar type of the field
        scalar: &'static str,
    },
    /// A child element carrying a composite object
    Element {
        /// Declared composite type
        declared: TypeRef,
    },
    /// A child element whose children are list entries
    ElementList {
        /// Declared entry type
        entry: TypeRef,
        /// Declared collection type
        collection: &'static str,
    },
}

impl Role {
    /// Name of the declared type
    pub fn declared_type(&self) -> &'static str {
        match self {
            Role::Attribute { scalar } | Role::Text { scalar } => *scalar,
            Role::Element { declared } => declared.name(),
            Role::ElementList { entry, .. } => entry.name(),
        }
    }

    /// Check whether the label is matched against attributes
    pub fn is_attribute(&self) -> bool {
        matches!(self, Role::Attribute { .. })
    }
}

/// A named, typed field binding of a class
pub struct Label {
    name: String,
    required: bool,
    role: Role,
    access: Arc<dyn Access>,
    declared_by: &'static str,
    order: usize,
    declared_class: OnceCell<Arc<Class>>,
}

impl Label {
    pub(crate) fn new(
        name: &str,
        required: bool,
        role: Role,
        access: Arc<dyn Access>,
        declared_by: &'static str,
    ) -> Self {
        Self {
            name: name.to_string(),
            required,
            role,
            access,
            declared_by,
            order: 0,
            declared_class: OnceCell::new(),
        }
    }

    /// Get the label name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether the label must be satisfied
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Get the role of the label
    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Get the field accessor
    pub fn access(&self) -> &dyn Access {
        self.access.as_ref()
    }

    /// Name of the type that declared the label
    pub fn declared_by(&self) -> &'static str {
        self.declared_by
    }

    /// Position of the label in declaration order, inherited labels first
    pub fn order(&self) -> usize {
        self.order
    }

    /// Class of the declared composite or entry type, resolved once
    pub fn declared_class(&self, registry: &Registry) -> Result<&Arc<Class>> {
        let declared = match self.role {
            Role::Element { declared } => declared,
            Role::ElementList { entry, .. } => entry,
            Role::Attribute { .. } | Role::Text { .. } => {
                return Err(Error::Schema(format!(
                    "Label '{}' holds leaf text and has no declared class",
                    self.name
                )))
            }
        };
        self.declared_class.get_or_try_init(|| declared.resolve(registry))
    }

    pub(crate) fn with_access(&self, access: Arc<dyn Access>) -> Self {
        Self {
            name: self.name.clone(),
            required: self.required,
            role: self.role,
            access,
            declared_by: self.declared_by,
            order: self.order,
            declared_class: OnceCell::new(),
        }
    }

    pub(crate) fn shared_access(&self) -> Arc<dyn Access> {
        Arc::clone(&self.access)
    }

    pub(crate) fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Label")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("role", &self.role)
            .field("declared_by", &self.declared_by)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            Role::Attribute { .. } => write!(f, "attribute '{}'", self.name),
            Role::Text { .. } | Role::Element { .. } => write!(f, "element '{}'", self.name),
            Role::ElementList { .. } => write!(f, "element list '{}'", self.name),
        }
    }
}

/// Labels of one partition keyed by name, in declaration order
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    labels: IndexMap<String, Arc<Label>>,
}

impl LabelMap {
    /// Look up a label by name
    pub fn get(&self, name: &str) -> Option<&Arc<Label>> {
        self.labels.get(name)
    }

    /// Check whether a label of that name exists
    pub fn contains(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    /// Iterate over labels in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Label>> {
        self.labels.values()
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub(crate) fn insert(&mut self, label: Label) {
        self.labels.insert(label.name.clone(), Arc::new(label));
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Arc<Label>> {
        self.labels.shift_remove(name)
    }
}

/// Single-use view of a partition for one traversal
///
/// Each label is taken at most once. Whatever remains after the document
/// has been walked is checked for required labels.
#[derive(Debug)]
pub struct TraversalMap<'d> {
    labels: IndexMap<&'d str, &'d Label>,
}

impl<'d> TraversalMap<'d> {
    pub(crate) fn new<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'d Arc<Label>>,
    {
        Self {
            labels: labels
                .into_iter()
                .map(|label| (label.name(), label.as_ref()))
                .collect(),
        }
    }

    /// Remove and return the label of that name
    pub fn take(&mut self, name: &str) -> Option<&'d Label> {
        self.labels.shift_remove(name)
    }

    /// Labels not yet taken
    pub fn remaining(&self) -> impl Iterator<Item = &'d Label> + '_ {
        self.labels.values().copied()
    }

    /// Fail if a required label was never taken
    pub fn check_required(&self, type_name: &str) -> Result<()> {
        match self.remaining().find(|label| label.is_required()) {
            Some(label) => Err(Error::FieldRequired(format!(
                "Unable to satisfy {} for '{}'",
                label, type_name
            ))),
            None => Ok(()),
        }
    }
}
