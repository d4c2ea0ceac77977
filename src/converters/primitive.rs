//! Leaf text converter

use super::Converter;
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::schema::{Value, ValueRef};

/// Reads and writes the text content of a leaf element
///
/// A leaf element carries text only: attributes and child elements are
/// rejected the same way unknown labels are rejected on a composite.
#[derive(Debug, Clone, Copy, Default)]
pub struct Primitive;

impl Converter for Primitive {
    fn read(&self, node: &Element) -> Result<Value> {
        if let Some((name, _)) = node.attributes().next() {
            return Err(Error::Attribute(format!(
                "Attribute '{}' does not exist in leaf element '{}'",
                name,
                node.name()
            )));
        }
        if let Some(child) = node.child_elements().next() {
            return Err(Error::Element(format!(
                "Element '{}' does not exist in leaf element '{}'",
                child.name(),
                node.name()
            )));
        }
        Ok(Value::Text(node.text()))
    }

    fn write(&self, value: ValueRef<'_>, node: &mut Element) -> Result<()> {
        match value {
            ValueRef::Text(text) => {
                if !text.is_empty() {
                    node.append_text(text);
                }
                Ok(())
            }
            _ => Err(Error::TypeMismatch(format!(
                "Leaf element '{}' can only hold text",
                node.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_text() {
        let node = Element::new("text").with_text("Some example text");
        match Primitive.read(&node).unwrap() {
            Value::Text(text) => assert_eq!(text, "Some example text"),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_read_empty() {
        let node = Element::new("text");
        assert!(matches!(Primitive.read(&node).unwrap(), Value::Text(t) if t.is_empty()));
    }

    #[test]
    fn test_read_rejects_structure() {
        let node = Element::new("text").with_attribute("lang", "en");
        assert!(matches!(Primitive.read(&node), Err(Error::Attribute(_))));

        let node = Element::new("text").with_child(Element::new("b"));
        assert!(matches!(Primitive.read(&node), Err(Error::Element(_))));
    }

    #[test]
    fn test_write_text() {
        let mut node = Element::new("text");
        Primitive.write(ValueRef::Text("a & b"), &mut node).unwrap();
        assert_eq!(node.text(), "a & b");

        let mut empty = Element::new("text");
        Primitive.write(ValueRef::Text(""), &mut empty).unwrap();
        assert!(empty.children.is_empty());
    }
}
