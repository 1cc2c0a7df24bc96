// crates/multidb-adapters/src/wiki.rs
// ============================================================================
// Module: Wiki Adapter
// Description: Read-only search and retrieval over a wiki content API.
// Purpose: Publish the `wiki_*` tools and map them onto a `WikiApi`.
// Dependencies: async-trait, multidb-core, serde
// ============================================================================

//! ## Overview
//! The adapter forwards searches, page fetches, and book listings to a
//! [`WikiApi`] and renders the API's JSON payload verbatim (pretty printed).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use multidb_core::AdapterError;
use multidb_core::Arguments;
use multidb_core::InvocationResult;
use multidb_core::ToolAdapter;
use multidb_core::ToolDescriptor;
use multidb_core::ToolDomain;
use multidb_core::ToolName;
use multidb_core::WikiTool;
use multidb_core::decode_arguments;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::error::StoreError;

mod bookstack;

pub use bookstack::BookStackClient;

/// Result count used when a call omits `count`.
const DEFAULT_COUNT: u32 = 10;

// ============================================================================
// SECTION: API Contract
// ============================================================================

/// Wiki operations the adapter needs from a content API.
#[async_trait]
pub trait WikiApi: Send + Sync {
    /// Searches books, chapters, and pages.
    async fn search(&self, query: &str, count: u32) -> Result<Value, StoreError>;
    /// Fetches one page by id.
    async fn page(&self, id: u64) -> Result<Value, StoreError>;
    /// Lists books.
    async fn books(&self, count: u32) -> Result<Value, StoreError>;
}

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// Arguments for `wiki_search`.
#[derive(Debug, Deserialize)]
struct SearchArgs {
    /// Search query string.
    query: String,
    /// Result count.
    #[serde(default)]
    count: Option<u32>,
}

/// Arguments for `wiki_get_page`.
#[derive(Debug, Deserialize)]
struct PageArgs {
    /// Page id.
    id: u64,
}

/// Arguments for `wiki_list_books`.
#[derive(Debug, Deserialize)]
struct ListArgs {
    /// Result count.
    #[serde(default)]
    count: Option<u32>,
}

/// Resolves an optional count, treating zero as absent.
fn count_or_default(count: Option<u32>) -> u32 {
    count.filter(|count| *count > 0).unwrap_or(DEFAULT_COUNT)
}

// ============================================================================
// SECTION: Adapter
// ============================================================================

/// Adapter publishing the wiki tools.
pub struct WikiAdapter {
    /// Content API client.
    api: Arc<dyn WikiApi>,
}

impl WikiAdapter {
    /// Creates an adapter over `api`.
    #[must_use]
    pub fn new(api: Arc<dyn WikiApi>) -> Self {
        Self {
            api,
        }
    }

    /// Runs one wiki operation.
    async fn run(&self, tool: WikiTool, arguments: Arguments) -> Result<InvocationResult, AdapterError> {
        let payload = match tool {
            WikiTool::Search => {
                let args: SearchArgs = decode_arguments(arguments)?;
                self.api.search(&args.query, count_or_default(args.count)).await?
            }
            WikiTool::GetPage => {
                let args: PageArgs = decode_arguments(arguments)?;
                self.api.page(args.id).await?
            }
            WikiTool::ListBooks => {
                let args: ListArgs = decode_arguments(arguments)?;
                self.api.books(count_or_default(args.count)).await?
            }
        };
        Ok(InvocationResult::json(&payload))
    }
}

#[async_trait]
impl ToolAdapter for WikiAdapter {
    fn domain(&self) -> ToolDomain {
        ToolDomain::Wiki
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        WikiTool::all().iter().map(|tool| descriptor(*tool)).collect()
    }

    async fn invoke(
        &self,
        tool: ToolName,
        arguments: Arguments,
    ) -> Result<InvocationResult, AdapterError> {
        match tool {
            ToolName::Wiki(op) => self.run(op, arguments).await,
            other => Err(AdapterError::ForeignTool(other)),
        }
    }
}

// ============================================================================
// SECTION: Descriptors
// ============================================================================

/// Builds the published descriptor for a wiki tool.
fn descriptor(tool: WikiTool) -> ToolDescriptor {
    let (description, schema) = match tool {
        WikiTool::Search => (
            "Search for content (books, chapters, pages) in the wiki",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search query string"},
                    "count": {"type": "number", "description": "Number of results to return", "default": DEFAULT_COUNT}
                },
                "required": ["query"]
            }),
        ),
        WikiTool::GetPage => (
            "Get the full content of a specific page by ID",
            json!({
                "type": "object",
                "properties": {"id": {"type": "number", "description": "The ID of the page"}},
                "required": ["id"]
            }),
        ),
        WikiTool::ListBooks => (
            "List all books available in the wiki",
            json!({
                "type": "object",
                "properties": {
                    "count": {"type": "number", "description": "Number of books to return", "default": DEFAULT_COUNT}
                }
            }),
        ),
    };
    ToolDescriptor::new(ToolName::Wiki(tool), description, schema)
}
