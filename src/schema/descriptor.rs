//! Schema descriptors
//!
//! A [`SchemaDescriptor`] is the resolved metadata of a class: its own labels
//! merged with everything it inherits, split into the attribute, element and
//! element-list partitions. Resolution happens once per class and registry.

use std::collections::HashSet;
use std::sync::Arc;

use super::class::Class;
use super::label::{Label, LabelMap, Role, TraversalMap};
use super::registry::Registry;
use crate::error::{Error, Result};
use crate::names::validate_name;

/// Resolved metadata of one mapped type
#[derive(Debug)]
pub struct SchemaDescriptor {
    type_name: &'static str,
    root: Option<String>,
    is_abstract: bool,
    attributes: LabelMap,
    elements: LabelMap,
    element_lists: LabelMap,
}

impl SchemaDescriptor {
    /// Name of the described type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Root element name, if bound
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Check whether the described type is abstract
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Attribute labels
    pub fn attributes(&self) -> &LabelMap {
        &self.attributes
    }

    /// Element labels, leaf text and composite
    pub fn elements(&self) -> &LabelMap {
        &self.elements
    }

    /// Element-list labels
    pub fn element_lists(&self) -> &LabelMap {
        &self.element_lists
    }

    /// Element and element-list labels in declaration order
    pub fn children(&self) -> Vec<&Arc<Label>> {
        let mut children: Vec<&Arc<Label>> = self
            .elements
            .iter()
            .chain(self.element_lists.iter())
            .collect();
        children.sort_by_key(|label| label.order());
        children
    }

    /// Look up an element or element-list label by name
    pub fn child(&self, name: &str) -> Option<&Arc<Label>> {
        self.elements
            .get(name)
            .or_else(|| self.element_lists.get(name))
    }

    /// All labels in declaration order
    pub fn labels(&self) -> Vec<&Arc<Label>> {
        let mut labels: Vec<&Arc<Label>> = self
            .attributes
            .iter()
            .chain(self.elements.iter())
            .chain(self.element_lists.iter())
            .collect();
        labels.sort_by_key(|label| label.order());
        labels
    }

    /// Fresh traversal over the attribute labels
    pub fn attribute_traversal(&self) -> TraversalMap<'_> {
        TraversalMap::new(self.attributes.iter())
    }

    /// Fresh traversal over the element and element-list labels
    pub fn element_traversal(&self) -> TraversalMap<'_> {
        TraversalMap::new(self.children())
    }
}

#[derive(Default)]
struct Partitions {
    attributes: LabelMap,
    elements: LabelMap,
    element_lists: LabelMap,
    own_attributes: HashSet<String>,
    own_children: HashSet<String>,
    next: usize,
}

impl Partitions {
    fn add(&mut self, label: Label) {
        let label = label.with_order(self.next);
        self.next += 1;
        let partition = match label.role() {
            Role::Attribute { .. } => &mut self.attributes,
            Role::Text { .. } | Role::Element { .. } => &mut self.elements,
            Role::ElementList { .. } => &mut self.element_lists,
        };
        partition.insert(label);
    }

    fn declare(&mut self, label: &Label, type_name: &str) -> Result<()> {
        validate_name(label.name())?;
        let name = label.name().to_string();

        if label.role().is_attribute() {
            if !self.own_attributes.insert(name) {
                return Err(duplicate(label, type_name));
            }
            self.attributes.remove(label.name());
        } else {
            if !self.own_children.insert(name) {
                return Err(duplicate(label, type_name));
            }
            self.elements.remove(label.name());
            self.element_lists.remove(label.name());
        }

        self.add(label.with_access(label.shared_access()));
        Ok(())
    }
}

fn duplicate(label: &Label, type_name: &str) -> Error {
    Error::Schema(format!(
        "Type '{}' declares {} more than once",
        type_name, label
    ))
}

fn check_ancestry(registry: &Registry, class: &Class) -> Result<()> {
    let mut seen = HashSet::from([class.name()]);
    let mut parent = class.parent_type();
    while let Some(next) = parent {
        if !seen.insert(next.name()) {
            return Err(Error::Schema(format!(
                "Type '{}' inherits from itself",
                next.name()
            )));
        }
        parent = next.resolve(registry)?.parent_type();
    }
    Ok(())
}

/// Resolve the descriptor of a class
///
/// Inherited labels come first, in the parent's order. A label declared by
/// the class itself replaces an inherited label of the same name and kind.
/// Root bindings are not inherited.
pub(crate) fn resolve(registry: &Registry, class: &Class) -> Result<SchemaDescriptor> {
    if let Some(problem) = class.problems().first() {
        return Err(Error::Schema(problem.clone()));
    }
    check_ancestry(registry, class)?;
    if let Some(root) = class.root() {
        validate_name(root)?;
    }

    let mut partitions = Partitions::default();
    if let Some(parent) = class.parent() {
        let base_class = parent.class.resolve(registry)?;
        let base = registry.descriptor(&base_class)?;
        for label in base.labels() {
            partitions.add(label.with_access(parent.lift.lift(label.shared_access())));
        }
    }

    for label in class.labels() {
        partitions.declare(label, class.name())?;
    }

    Ok(SchemaDescriptor {
        type_name: class.name(),
        root: class.root().map(str::to_string),
        is_abstract: class.is_abstract(),
        attributes: partitions.attributes,
        elements: partitions.elements,
        element_lists: partitions.element_lists,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Mapped;
    use crate::schema::ClassBuilder;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Base {
        id: String,
        note: Option<String>,
        version: Option<String>,
    }

    impl Mapped for Base {
        const TYPE_NAME: &'static str = "descriptor::tests::Base";

        fn declare(class: &mut ClassBuilder<Self>) {
            class
                .root("base")
                .attribute("id", true, |b| &b.id, |b| &mut b.id)
                .attribute("version", false, |b| &b.version, |b| &mut b.version)
                .text("note", false, |b| &b.note, |b| &mut b.note);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Derived {
        base: Base,
        version: u32,
        items: Vec<Base>,
    }

    impl Mapped for Derived {
        const TYPE_NAME: &'static str = "descriptor::tests::Derived";

        fn declare(class: &mut ClassBuilder<Self>) {
            class
                .extends(|d| &d.base, |d| &mut d.base)
                .attribute("version", true, |d| &d.version, |d| &mut d.version)
                .element_list::<Base, _>("items", false, |d| &d.items, |d| &mut d.items);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Twice {
        a: String,
        b: String,
    }

    impl Mapped for Twice {
        const TYPE_NAME: &'static str = "descriptor::tests::Twice";

        fn declare(class: &mut ClassBuilder<Self>) {
            class
                .text("value", false, |t| &t.a, |t| &mut t.a)
                .text("value", false, |t| &t.b, |t| &mut t.b);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct BadName {
        a: String,
    }

    impl Mapped for BadName {
        const TYPE_NAME: &'static str = "descriptor::tests::BadName";

        fn declare(class: &mut ClassBuilder<Self>) {
            class.attribute("1st", false, |t| &t.a, |t| &mut t.a);
        }
    }

    #[test]
    fn test_inherited_labels_come_first() {
        let registry = Registry::new();
        let descriptor = registry.descriptor_of::<Derived>().unwrap();

        let names: Vec<&str> = descriptor.labels().iter().map(|l| l.name()).collect();
        assert_eq!(names, vec!["id", "note", "version", "items"]);
        assert_eq!(descriptor.attributes().len(), 2);
        assert_eq!(descriptor.elements().len(), 1);
        assert_eq!(descriptor.element_lists().len(), 1);
    }

    #[test]
    fn test_most_derived_declaration_wins() {
        let registry = Registry::new();
        let descriptor = registry.descriptor_of::<Derived>().unwrap();

        let version = descriptor.attributes().get("version").unwrap();
        assert_eq!(version.declared_by(), Derived::TYPE_NAME);
        assert!(version.is_required());
        assert_eq!(
            descriptor.attributes().get("id").unwrap().declared_by(),
            Base::TYPE_NAME
        );
    }

    #[test]
    fn test_root_not_inherited() {
        let registry = Registry::new();
        assert_eq!(registry.descriptor_of::<Base>().unwrap().root(), Some("base"));
        assert_eq!(registry.descriptor_of::<Derived>().unwrap().root(), None);
    }

    #[test]
    fn test_duplicate_own_label() {
        let registry = Registry::new();
        let err = registry.descriptor_of::<Twice>().unwrap_err();
        assert!(matches!(err, Error::Schema(ref m) if m.contains("'value'")));
    }

    #[test]
    fn test_invalid_label_name() {
        let registry = Registry::new();
        assert!(matches!(
            registry.descriptor_of::<BadName>(),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_traversal_takes_once() {
        let registry = Registry::new();
        let descriptor = registry.descriptor_of::<Base>().unwrap();
        let mut traversal = descriptor.attribute_traversal();

        assert!(traversal.take("id").is_some());
        assert!(traversal.take("id").is_none());
        assert!(traversal.check_required(Base::TYPE_NAME).is_ok());

        let untouched = descriptor.attribute_traversal();
        assert!(matches!(
            untouched.check_required(Base::TYPE_NAME),
            Err(Error::FieldRequired(_))
        ));
    }
}
