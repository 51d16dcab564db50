//! Closed entity and relationship taxonomies
//!
//! Model output naming a type outside these enums is rejected when the
//! response is parsed, so downstream stages only ever see known types.

use std::fmt;

/// Entity type in the closed extraction taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityType {
    /// Natural person
    Person,
    /// Company, agency, institution
    Organization,
    /// Geographic or postal location
    Location,
    /// Calendar date or date range
    Date,
    /// Amount of money with or without currency
    MonetaryAmount,
    /// Percentage or rate
    Percentage,
    /// Statute, regulation or section thereof
    Statute,
    /// Reference to a court decision
    CaseCitation,
    /// Court or tribunal
    Court,
    /// Named agreement or contract
    Contract,
    /// Product or service name
    Product,
    /// Named event
    Event,
}

impl EntityType {
    /// Every entity type, in declaration order
    pub const ALL: [EntityType; 12] = [
        EntityType::Person,
        EntityType::Organization,
        EntityType::Location,
        EntityType::Date,
        EntityType::MonetaryAmount,
        EntityType::Percentage,
        EntityType::Statute,
        EntityType::CaseCitation,
        EntityType::Court,
        EntityType::Contract,
        EntityType::Product,
        EntityType::Event,
    ];

    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "person",
            EntityType::Organization => "organization",
            EntityType::Location => "location",
            EntityType::Date => "date",
            EntityType::MonetaryAmount => "monetary_amount",
            EntityType::Percentage => "percentage",
            EntityType::Statute => "statute",
            EntityType::CaseCitation => "case_citation",
            EntityType::Court => "court",
            EntityType::Contract => "contract",
            EntityType::Product => "product",
            EntityType::Event => "event",
        }
    }

    /// Parse a type name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown entity type: {}", s))
    }
}

/// Relationship type in the closed extraction taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationshipType {
    /// Person works for organization
    EmployedBy,
    /// Entity is situated in a location
    LocatedIn,
    /// Party to a contract or proceeding
    PartyTo,
    /// One reference cites another
    Cites,
    /// Counsel or agent represents a party
    Represents,
    /// Ownership
    Owns,
    /// A statute or court governs an entity or agreement
    Governs,
    /// Event or agreement happened on a date
    OccurredOn,
    /// Generic affiliation
    AffiliatedWith,
}

impl RelationshipType {
    /// Every relationship type, in declaration order
    pub const ALL: [RelationshipType; 9] = [
        RelationshipType::EmployedBy,
        RelationshipType::LocatedIn,
        RelationshipType::PartyTo,
        RelationshipType::Cites,
        RelationshipType::Represents,
        RelationshipType::Owns,
        RelationshipType::Governs,
        RelationshipType::OccurredOn,
        RelationshipType::AffiliatedWith,
    ];

    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::EmployedBy => "employed_by",
            RelationshipType::LocatedIn => "located_in",
            RelationshipType::PartyTo => "party_to",
            RelationshipType::Cites => "cites",
            RelationshipType::Represents => "represents",
            RelationshipType::Owns => "owns",
            RelationshipType::Governs => "governs",
            RelationshipType::OccurredOn => "occurred_on",
            RelationshipType::AffiliatedWith => "affiliated_with",
        }
    }

    /// Parse a relationship name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationshipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown relationship type: {}", s))
    }
}
