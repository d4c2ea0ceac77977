//! Serializable schema dumps
//!
//! A dump is a plain-data snapshot of a resolved descriptor, useful for
//! inspecting what a type declaration actually resolved to (inherited
//! labels, overrides, collection types) and for comparing schemas in tests.

use serde::{Deserialize, Serialize};

use super::descriptor::SchemaDescriptor;
use super::label::{Label, Role};
use crate::error::Result;

/// Snapshot of a resolved descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaDump {
    /// Described type name
    pub type_name: String,

    /// Root element name
    pub root: Option<String>,

    /// Whether the type is abstract
    #[serde(rename = "abstract")]
    pub is_abstract: bool,

    /// Attribute labels
    pub attributes: Vec<LabelInfo>,

    /// Element and element-list labels, in write order
    pub children: Vec<LabelInfo>,
}

/// One label of a dump
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelInfo {
    /// Label name
    pub name: String,

    /// attribute, text, element or element-list
    pub kind: String,

    /// Declared scalar, composite or entry type
    #[serde(rename = "type")]
    pub declared_type: String,

    /// Declared collection type, for element lists
    pub collection: Option<String>,

    /// Whether the label must be satisfied
    pub required: bool,

    /// Type that declared the label
    pub declared_by: String,
}

impl From<&Label> for LabelInfo {
    fn from(label: &Label) -> Self {
        let (kind, collection) = match label.role() {
            Role::Attribute { .. } => ("attribute", None),
            Role::Text { .. } => ("text", None),
            Role::Element { .. } => ("element", None),
            Role::ElementList { collection, .. } => ("element-list", Some(collection.to_string())),
        };
        Self {
            name: label.name().to_string(),
            kind: kind.to_string(),
            declared_type: label.role().declared_type().to_string(),
            collection,
            required: label.is_required(),
            declared_by: label.declared_by().to_string(),
        }
    }
}

impl SchemaDump {
    /// Snapshot a descriptor
    pub fn from_descriptor(descriptor: &SchemaDescriptor) -> Self {
        Self {
            type_name: descriptor.type_name().to_string(),
            root: descriptor.root().map(str::to_string),
            is_abstract: descriptor.is_abstract(),
            attributes: descriptor
                .attributes()
                .iter()
                .map(|label| LabelInfo::from(label.as_ref()))
                .collect(),
            children: descriptor
                .children()
                .into_iter()
                .map(|label| LabelInfo::from(label.as_ref()))
                .collect(),
        }
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Mapped;
    use crate::schema::{ClassBuilder, Registry};
    use std::collections::VecDeque;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Entry {
        id: u32,
    }

    impl Mapped for Entry {
        const TYPE_NAME: &'static str = "dump::tests::Entry";

        fn declare(class: &mut ClassBuilder<Self>) {
            class.root("entry").attribute("id", true, |e| &e.id, |e| &mut e.id);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Journal {
        title: Option<String>,
        entries: VecDeque<Entry>,
    }

    impl Mapped for Journal {
        const TYPE_NAME: &'static str = "dump::tests::Journal";

        fn declare(class: &mut ClassBuilder<Self>) {
            class
                .root("journal")
                .text("title", false, |j| &j.title, |j| &mut j.title)
                .element_list::<Entry, _>("entries", true, |j| &j.entries, |j| &mut j.entries);
        }
    }

    #[test]
    fn test_dump_descriptor() {
        let registry = Registry::new();
        let descriptor = registry.descriptor_of::<Journal>().unwrap();
        let dump = SchemaDump::from_descriptor(&descriptor);

        assert_eq!(dump.type_name, "dump::tests::Journal");
        assert_eq!(dump.root.as_deref(), Some("journal"));
        assert!(dump.attributes.is_empty());
        assert_eq!(dump.children.len(), 2);
        assert_eq!(dump.children[0].kind, "text");
        assert_eq!(dump.children[1].kind, "element-list");
        assert_eq!(dump.children[1].declared_type, "dump::tests::Entry");
        assert_eq!(dump.children[1].collection.as_deref(), Some("deque"));
    }

    #[test]
    fn test_dump_json() {
        let registry = Registry::new();
        let descriptor = registry.descriptor_of::<Entry>().unwrap();
        let json = SchemaDump::from_descriptor(&descriptor).to_json().unwrap();

        assert!(json.contains("\"type_name\": \"dump::tests::Entry\""));
        assert!(json.contains("\"abstract\": false"));
        let parsed: SchemaDump = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.attributes[0].declared_type, "u32");
    }
}
