//! Gleaner Pattern Library
//!
//! In-memory store of few-shot examples per entity type, implementing the
//! `PatternExampleProvider` lookup used when prompts are composed.
//!
//! Libraries are loaded once (from TOML or the built-in set) and read-only
//! afterwards, so lookups are plain map reads.
//!
//! # Examples
//!
//! ```
//! use gleaner_patterns::PatternLibrary;
//! use gleaner_domain::traits::PatternExampleProvider;
//! use gleaner_domain::EntityType;
//! use std::collections::BTreeSet;
//!
//! let library = PatternLibrary::from_toml(r#"
//!     [[examples]]
//!     entity_type = "person"
//!     text = "Dr. Jane Okafor signed on behalf of the lessee."
//! "#).unwrap();
//!
//! let types: BTreeSet<_> = [EntityType::Person].into_iter().collect();
//! assert_eq!(library.lookup(&types).len(), 1);
//! ```

#![warn(missing_docs)]

use gleaner_domain::traits::{PatternExample, PatternExampleProvider};
use gleaner_domain::EntityType;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Pattern library errors
#[derive(Debug, Error)]
pub enum PatternError {
    /// Failed to read the library file
    #[error("Failed to read pattern file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse pattern TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Example names a type outside the taxonomy
    #[error("Unknown entity type in pattern library: {0}")]
    UnknownEntityType(String),

    /// Example has no text
    #[error("Empty example text for entity type: {0}")]
    EmptyExample(String),
}

/// On-disk representation
#[derive(Debug, Deserialize)]
struct PatternFile {
    #[serde(default)]
    per_type_limit: Option<usize>,
    #[serde(default)]
    examples: Vec<PatternEntry>,
}

#[derive(Debug, Deserialize)]
struct PatternEntry {
    entity_type: String,
    text: String,
}

/// Default cap on examples returned per type
pub const DEFAULT_PER_TYPE_LIMIT: usize = 3;

/// Few-shot example library keyed by entity type
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    examples: BTreeMap<EntityType, Vec<String>>,
    per_type_limit: usize,
}

impl PatternLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self {
            examples: BTreeMap::new(),
            per_type_limit: DEFAULT_PER_TYPE_LIMIT,
        }
    }

    /// Library with the built-in examples for every taxonomy type
    pub fn builtin() -> Self {
        let mut library = Self::new();
        for (entity_type, text) in BUILTIN_EXAMPLES {
            library.add(*entity_type, *text);
        }
        library
    }

    /// Parse a library from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, PatternError> {
        let file: PatternFile = toml::from_str(toml_str)?;
        let mut library = Self::new();
        if let Some(limit) = file.per_type_limit {
            library.per_type_limit = limit;
        }

        for entry in file.examples {
            let entity_type = EntityType::parse(&entry.entity_type)
                .ok_or_else(|| PatternError::UnknownEntityType(entry.entity_type.clone()))?;
            if entry.text.trim().is_empty() {
                return Err(PatternError::EmptyExample(entry.entity_type));
            }
            library.add(entity_type, entry.text);
        }

        debug!("Loaded {} pattern examples", library.len());
        Ok(library)
    }

    /// Load a library from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PatternError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Set the per-type cap (builder style)
    pub fn with_per_type_limit(mut self, limit: usize) -> Self {
        self.per_type_limit = limit;
        self
    }

    /// Add an example
    pub fn add(&mut self, entity_type: EntityType, text: impl Into<String>) {
        self.examples.entry(entity_type).or_default().push(text.into());
    }

    /// Total number of examples
    pub fn len(&self) -> usize {
        self.examples.values().map(Vec::len).sum()
    }

    /// True if the library holds no examples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Types that have at least one example
    pub fn covered_types(&self) -> BTreeSet<EntityType> {
        self.examples.keys().copied().collect()
    }
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PatternExampleProvider for PatternLibrary {
    fn lookup(&self, entity_types: &BTreeSet<EntityType>) -> Vec<PatternExample> {
        entity_types
            .iter()
            .filter_map(|t| self.examples.get(t).map(|texts| (*t, texts)))
            .flat_map(|(entity_type, texts)| {
                texts
                    .iter()
                    .take(self.per_type_limit)
                    .map(move |text| PatternExample {
                        entity_type,
                        example_text: text.clone(),
                    })
            })
            .collect()
    }
}

const BUILTIN_EXAMPLES: &[(EntityType, &str)] = &[
    (EntityType::Person, "Counsel for the appellant, Maria Delgado, filed the motion."),
    (EntityType::Person, "The agreement was witnessed by Thomas Reinholt."),
    (EntityType::Organization, "Northwind Logistics GmbH (the \"Supplier\") agrees to deliver..."),
    (EntityType::Organization, "The Securities and Exchange Commission opened an inquiry."),
    (EntityType::Location, "The premises at 14 Harbour Street, Portsmouth, shall be vacated."),
    (EntityType::Location, "Disputes shall be resolved in Geneva, Switzerland."),
    (EntityType::Date, "This lease commences on 1 March 2024 and ends on 28 February 2027."),
    (EntityType::MonetaryAmount, "The purchase price is USD 4,250,000 payable in two installments."),
    (EntityType::Percentage, "Late payments accrue interest at 1.5% per month."),
    (EntityType::Statute, "pursuant to Section 10(b) of the Securities Exchange Act of 1934"),
    (EntityType::Statute, "as required by Article 6 of the GDPR"),
    (EntityType::CaseCitation, "See Marbury v. Madison, 5 U.S. 137 (1803)."),
    (EntityType::Court, "The Court of Appeal for the Ninth Circuit affirmed."),
    (EntityType::Contract, "under the Master Services Agreement dated 3 June 2021"),
    (EntityType::Product, "Licensee may deploy the Orion Analytics Suite on up to 50 servers."),
    (EntityType::Event, "following the 2022 annual shareholders' meeting"),
];
