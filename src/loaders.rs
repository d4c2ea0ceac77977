//! Document loading utilities
//!
//! This module handles loading of documents from files and readers with the
//! configured size limit applied before anything is parsed.

use crate::documents::Document;
use crate::error::Result;
use crate::limits::Limits;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Document loader
#[derive(Debug, Clone, Default)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Get the limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Load a file as bytes
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        let path = path.as_ref();
        let size = fs::metadata(path)?.len();
        self.limits
            .check_document_size(usize::try_from(size).unwrap_or(usize::MAX))?;
        Ok(fs::read(path)?)
    }

    /// Load everything a reader yields, stopping once the size limit is passed
    pub fn load_reader<R: Read>(&self, reader: R) -> Result<Vec<u8>> {
        let cap = self.limits.max_document_size.saturating_add(1);
        let mut content = Vec::new();
        reader
            .take(u64::try_from(cap).unwrap_or(u64::MAX))
            .read_to_end(&mut content)?;
        self.limits.check_document_size(content.len())?;
        Ok(content)
    }

    /// Parse loaded bytes into a document
    pub fn parse(&self, content: &[u8]) -> Result<Document> {
        Document::parse(content, &self.limits)
    }

    /// Load and parse a file
    pub fn load_document<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        let content = self.load_file(path)?;
        self.parse(&content)
    }
}
