// crates/multidb-core/src/registry.rs
// ============================================================================
// Module: Tool Registry
// Description: Flat, name-unique catalog aggregated from backend adapters.
// Purpose: Publish the tool catalog and map each tool to its owning adapter.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The registry is built once at startup from the configured adapters and is
//! read-only afterward. Catalog conflicts are configuration errors reported
//! from [`ToolRegistry::new`], never masked at call time.
//!
//! ## Invariants
//! - Descriptors are listed in adapter-registration order.
//! - Every listed tool name is unique and owned by exactly one adapter.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

use crate::adapter::ToolAdapter;
use crate::envelope::ToolDescriptor;
use crate::tooling::ToolDomain;
use crate::tooling::ToolName;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog construction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two descriptors share a tool name.
    #[error("duplicate tool name: {0}")]
    DuplicateTool(ToolName),
    /// Two adapters claim the same domain.
    #[error("duplicate adapter for domain: {0}")]
    DuplicateDomain(ToolDomain),
    /// An adapter published a tool owned by another domain.
    #[error("adapter for domain {adapter} published foreign tool {tool}")]
    DomainMismatch {
        /// Domain of the publishing adapter.
        adapter: ToolDomain,
        /// Offending tool name.
        tool: ToolName,
    },
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Read-only tool catalog.
pub struct ToolRegistry {
    /// Adapters keyed by the domain they serve.
    adapters: BTreeMap<ToolDomain, Arc<dyn ToolAdapter>>,
    /// Flattened descriptors in registration order.
    descriptors: Vec<ToolDescriptor>,
    /// Registered tool names for membership checks.
    names: BTreeSet<ToolName>,
}

impl ToolRegistry {
    /// Builds the catalog from adapters in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when adapters conflict on domain or tool name.
    pub fn new(adapters: Vec<Arc<dyn ToolAdapter>>) -> Result<Self, RegistryError> {
        let mut by_domain = BTreeMap::new();
        let mut descriptors = Vec::new();
        let mut names = BTreeSet::new();
        for adapter in adapters {
            let domain = adapter.domain();
            if by_domain.contains_key(&domain) {
                return Err(RegistryError::DuplicateDomain(domain));
            }
            for descriptor in adapter.descriptors() {
                if descriptor.name.domain() != domain {
                    return Err(RegistryError::DomainMismatch {
                        adapter: domain,
                        tool: descriptor.name,
                    });
                }
                if !names.insert(descriptor.name) {
                    return Err(RegistryError::DuplicateTool(descriptor.name));
                }
                descriptors.push(descriptor);
            }
            by_domain.insert(domain, adapter);
        }
        Ok(Self {
            adapters: by_domain,
            descriptors,
            names,
        })
    }

    /// Returns the catalog in registration order.
    #[must_use]
    pub fn list(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    /// Returns true when `tool` is published by a registered adapter.
    #[must_use]
    pub fn contains(&self, tool: ToolName) -> bool {
        self.names.contains(&tool)
    }

    /// Returns the adapter serving `domain`, if registered.
    #[must_use]
    pub fn adapter_for(&self, domain: ToolDomain) -> Option<&Arc<dyn ToolAdapter>> {
        self.adapters.get(&domain)
    }

    /// Returns the number of published tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true when no tools are published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
