//! # xmlbind
//!
//! Declarative mapping between typed Rust object graphs and XML element trees.
//!
//! Types describe their mapping once, through [`Mapped::declare`]: a root
//! element name, attributes, text elements, composite elements and element
//! lists, plus an optional parent type whose declarations are inherited.
//! The engine resolves those declarations into cached descriptors and uses
//! them to read documents into objects and to write objects back out.
//!
//! ## Features
//!
//! - Closed schemas: unknown attributes or elements are errors, and so are
//!   required fields the document never supplies
//! - Polymorphic fields and heterogeneous lists, resolved through a
//!   type-override attribute (`class` by default)
//! - Inherited declarations with most-derived-wins precedence
//! - Thread-safe, process-wide metadata caching
//! - Limits on document size, nesting depth and attribute count
//!
//! ## Example
//!
//! ```rust
//! use xmlbind::{ClassBuilder, Mapped, Persister};
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct Entry {
//!     id: i32,
//!     text: Option<String>,
//! }
//!
//! impl Mapped for Entry {
//!     const TYPE_NAME: &'static str = "example::Entry";
//!
//!     fn declare(class: &mut ClassBuilder<Self>) {
//!         class
//!             .root("entry")
//!             .attribute("id", false, |e| &e.id, |e| &mut e.id)
//!             .text("text", true, |e| &e.text, |e| &mut e.text);
//!     }
//! }
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct Log {
//!     entries: Vec<Entry>,
//! }
//!
//! impl Mapped for Log {
//!     const TYPE_NAME: &'static str = "example::Log";
//!
//!     fn declare(class: &mut ClassBuilder<Self>) {
//!         class
//!             .root("log")
//!             .element_list::<Entry, _>("entries", true, |l| &l.entries, |l| &mut l.entries);
//!     }
//! }
//!
//! let persister = Persister::new();
//! let log: Log = persister.read(
//!     "<log><entries><entry id='1'><text>started</text></entry></entries></log>",
//! )?;
//! assert_eq!(log.entries[0].text.as_deref(), Some("started"));
//!
//! let xml = persister.write(&log)?;
//! assert_eq!(persister.read::<Log>(&xml)?, log);
//! # Ok::<(), xmlbind::PersistenceError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;
pub mod names;

// Documents
pub mod documents;
pub mod loaders;

// Object model and metadata
pub mod object;
pub mod scalar;
pub mod schema;

// Conversion
pub mod converters;
pub mod persister;

// Re-exports for convenience
pub use documents::{Document, Element, Node, WriteOptions};
pub use error::{Error, ErrorKind, PersistenceError, Result};
pub use limits::Limits;
pub use object::{Collection, ListEntry, Mapped, Object};
pub use persister::{Persister, PersisterConfig};
pub use scalar::Scalar;
pub use schema::{ClassBuilder, Registry, SchemaDescriptor, SchemaDump};

/// Version of the xmlbind library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default name of the type-override marker attribute
pub const DEFAULT_MARKER: &str = "class";
