//! Document module - the immutable pipeline input

use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier for a document based on UUIDv7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(u128);

impl DocumentId {
    /// Generate a new UUIDv7-based DocumentId
    ///
    /// # Examples
    ///
    /// ```
    /// use gleaner_domain::DocumentId;
    ///
    /// let id = DocumentId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a DocumentId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a DocumentId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid document id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// A text document submitted for extraction
///
/// Documents are read-only once created. Metadata carries free-form hints
/// such as document type or jurisdiction.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: DocumentId,
    text: String,
    metadata: BTreeMap<String, String>,
}

impl Document {
    /// Create a document with a fresh identifier and no metadata
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_id(DocumentId::new(), text)
    }

    /// Create a document with a caller-supplied identifier
    pub fn with_id(id: DocumentId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry (builder style, used before the document enters the pipeline)
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Document identifier
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Full document text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Metadata entries
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Look up a single metadata value
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Length in characters (not bytes)
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// True when the text holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
