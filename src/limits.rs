//! Limits and constraints for document traversal
//!
//! This module defines limits that bound the resources a single read or
//! write may consume. Reads and writes recurse once per nested object, so
//! the depth limit is also what keeps deep object graphs and documents from
//! exhausting the thread stack. The default fits a 2 MB thread stack in an
//! unoptimized build.

use crate::error::{Error, Result};

/// Traversal limits configuration
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum nesting depth of composite values / elements
    pub max_depth: usize,

    /// Maximum document size in bytes
    pub max_document_size: usize,

    /// Maximum number of attributes per element
    pub max_attributes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 200,
            max_document_size: 100 * 1024 * 1024, // 100 MB
            max_attributes: 1000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_depth: 64,
            max_document_size: 10 * 1024 * 1024, // 10 MB
            max_attributes: 100,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    ///
    /// Traversals this deep need a thread stack larger than the default.
    pub fn permissive() -> Self {
        Self {
            max_depth: 2000,
            max_document_size: 1024 * 1024 * 1024, // 1 GB
            max_attributes: 10000,
        }
    }

    /// Set the maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Check if nesting depth is within limits
    pub fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            Err(Error::LimitExceeded(format!(
                "Depth {} exceeds maximum {}",
                depth, self.max_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if document size is within limits
    pub fn check_document_size(&self, size: usize) -> Result<()> {
        if size > self.max_document_size {
            Err(Error::LimitExceeded(format!(
                "Document size {} bytes exceeds maximum {} bytes",
                size, self.max_document_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if number of attributes is within limits
    pub fn check_attributes(&self, count: usize) -> Result<()> {
        if count > self.max_attributes {
            Err(Error::LimitExceeded(format!(
                "Attribute count {} exceeds maximum {}",
                count, self.max_attributes
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_depth, 200);
        assert!(limits.check_depth(200).is_ok());
        assert!(limits.check_depth(201).is_err());
    }

    #[test]
    fn test_strict_limits() {
        let limits = Limits::strict();
        assert!(limits.max_depth < Limits::default().max_depth);
        assert!(limits.check_depth(65).is_err());
    }

    #[test]
    fn test_permissive_limits() {
        let limits = Limits::permissive();
        assert!(limits.max_depth > Limits::default().max_depth);
        assert!(limits.check_depth(2000).is_ok());
    }

    #[test]
    fn test_check_document_size() {
        let limits = Limits::default();
        assert!(limits.check_document_size(1024).is_ok());
        assert!(limits.check_document_size(200 * 1024 * 1024).is_err());
    }

    #[test]
    fn test_check_attributes() {
        let limits = Limits::strict();
        assert!(limits.check_attributes(10).is_ok());
        assert!(matches!(
            limits.check_attributes(101),
            Err(Error::LimitExceeded(_))
        ));
    }
}
