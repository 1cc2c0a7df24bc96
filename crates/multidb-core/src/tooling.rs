// crates/multidb-core/src/tooling.rs
// ============================================================================
// Module: Tooling Identifiers
// Description: Canonical tool identifiers for the Multi-DB gateway.
// Purpose: Closed, per-domain tool naming shared by adapters, router, and config.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every invocable tool is a variant of a closed enum owned by exactly one
//! backend domain. The wire name is `<domain token>_<operation>`; these names
//! are part of the external contract surface.
//!
//! ## Invariants
//! - Domain tokens partition the name space: a wire name resolves to at most
//!   one domain (longest token prefix wins).
//! - `ToolName::parse(name.as_str()) == Some(name)` for every variant.

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

// ============================================================================
// SECTION: Domains
// ============================================================================

/// Backend domain that owns a set of tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolDomain {
    /// Key-value store (Redis).
    Kv,
    /// Document store (MongoDB).
    Document,
    /// Relational store (MySQL or `SQLite`).
    Relational,
    /// Wiki content API (`BookStack`).
    Wiki,
}

impl ToolDomain {
    /// Returns the name prefix token for the domain.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Kv => "kv",
            Self::Document => "document",
            Self::Relational => "relational",
            Self::Wiki => "wiki",
        }
    }

    /// Returns all domains in registration order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Kv, Self::Document, Self::Relational, Self::Wiki]
    }

    /// Resolves the domain owning `name` by its longest matching token prefix.
    #[must_use]
    pub fn resolve(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .filter(|domain| {
                name.strip_prefix(domain.token()).is_some_and(|rest| rest.starts_with('_'))
            })
            .max_by_key(|domain| domain.token().len())
    }
}

impl fmt::Display for ToolDomain {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.token())
    }
}

// ============================================================================
// SECTION: Per-Domain Tools
// ============================================================================

/// Key-value store tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KvTool {
    /// Read a string value.
    Get,
    /// Write a string value with optional expiry.
    Set,
    /// Delete a key.
    Del,
    /// Write a hash field.
    HSet,
    /// Read a hash field.
    HGet,
    /// Read every field of a hash.
    HGetAll,
    /// Delete a hash field.
    HDel,
}

impl KvTool {
    /// Returns the canonical wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "kv_get",
            Self::Set => "kv_set",
            Self::Del => "kv_del",
            Self::HSet => "kv_hset",
            Self::HGet => "kv_hget",
            Self::HGetAll => "kv_hgetall",
            Self::HDel => "kv_hdel",
        }
    }

    /// Returns all key-value tools in catalog order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Get, Self::Set, Self::Del, Self::HSet, Self::HGet, Self::HGetAll, Self::HDel]
    }

    /// Parses a key-value tool from its wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|tool| tool.as_str() == name)
    }
}

/// Document store tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentTool {
    /// Query documents by filter.
    Find,
    /// Insert a single document.
    Insert,
    /// Update one or many documents.
    Update,
    /// Delete one or many documents.
    Delete,
}

impl DocumentTool {
    /// Returns the canonical wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Find => "document_find",
            Self::Insert => "document_insert",
            Self::Update => "document_update",
            Self::Delete => "document_delete",
        }
    }

    /// Returns all document tools in catalog order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Find, Self::Insert, Self::Update, Self::Delete]
    }

    /// Parses a document tool from its wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|tool| tool.as_str() == name)
    }
}

/// Relational store tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationalTool {
    /// Run a row-returning statement.
    Query,
    /// Run a mutating statement.
    Execute,
    /// Describe the columns of a table.
    ShowColumns,
    /// List tables in the database.
    ListTables,
}

impl RelationalTool {
    /// Returns the canonical wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "relational_query",
            Self::Execute => "relational_execute",
            Self::ShowColumns => "relational_show_columns",
            Self::ListTables => "relational_list_tables",
        }
    }

    /// Returns all relational tools in catalog order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Query, Self::Execute, Self::ShowColumns, Self::ListTables]
    }

    /// Parses a relational tool from its wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|tool| tool.as_str() == name)
    }
}

/// Wiki content tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WikiTool {
    /// Full-text search across books, chapters, and pages.
    Search,
    /// Fetch a page by identifier.
    GetPage,
    /// List books.
    ListBooks,
}

impl WikiTool {
    /// Returns the canonical wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "wiki_search",
            Self::GetPage => "wiki_get_page",
            Self::ListBooks => "wiki_list_books",
        }
    }

    /// Returns all wiki tools in catalog order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Search, Self::GetPage, Self::ListBooks]
    }

    /// Parses a wiki tool from its wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|tool| tool.as_str() == name)
    }
}

// ============================================================================
// SECTION: Tool Name
// ============================================================================

/// Canonical tool name, tagged by owning domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToolName {
    /// Key-value store tool.
    Kv(KvTool),
    /// Document store tool.
    Document(DocumentTool),
    /// Relational store tool.
    Relational(RelationalTool),
    /// Wiki content tool.
    Wiki(WikiTool),
}

impl ToolName {
    /// Returns the canonical wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kv(tool) => tool.as_str(),
            Self::Document(tool) => tool.as_str(),
            Self::Relational(tool) => tool.as_str(),
            Self::Wiki(tool) => tool.as_str(),
        }
    }

    /// Returns the domain that owns this tool.
    #[must_use]
    pub const fn domain(self) -> ToolDomain {
        match self {
            Self::Kv(_) => ToolDomain::Kv,
            Self::Document(_) => ToolDomain::Document,
            Self::Relational(_) => ToolDomain::Relational,
            Self::Wiki(_) => ToolDomain::Wiki,
        }
    }

    /// Parses a wire name by resolving its domain, then its operation.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match ToolDomain::resolve(name)? {
            ToolDomain::Kv => KvTool::parse(name).map(Self::Kv),
            ToolDomain::Document => DocumentTool::parse(name).map(Self::Document),
            ToolDomain::Relational => RelationalTool::parse(name).map(Self::Relational),
            ToolDomain::Wiki => WikiTool::parse(name).map(Self::Wiki),
        }
    }

    /// Returns every tool name across all domains in catalog order.
    #[must_use]
    pub fn all() -> Vec<Self> {
        let mut names = Vec::new();
        names.extend(KvTool::all().iter().copied().map(Self::Kv));
        names.extend(DocumentTool::all().iter().copied().map(Self::Document));
        names.extend(RelationalTool::all().iter().copied().map(Self::Relational));
        names.extend(WikiTool::all().iter().copied().map(Self::Wiki));
        names
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl Serialize for ToolName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ToolName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown tool name: {raw}")))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
