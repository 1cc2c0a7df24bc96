// crates/multidb-adapters/src/document/mongo.rs
// ============================================================================
// Module: MongoDB Document Store
// Description: MongoDB client bound to one database, opened lazily.
// Purpose: Serve the document tools from a shared MongoDB deployment.
// Dependencies: mongodb, futures-util, tokio
// ============================================================================

//! ## Overview
//! The connection string is parsed and the client built on first use; the
//! driver's internal pool is then shared by all calls. JSON arguments are
//! read as extended JSON and results written as relaxed extended JSON.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::Client;
use mongodb::Collection;
use mongodb::Database;
use mongodb::bson::Bson;
use mongodb::bson::Document;
use mongodb::error::Error as MongoError;
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use serde_json::Map;
use serde_json::Value;
use tokio::sync::OnceCell;

use super::DocumentStore;
use crate::error::StoreError;

/// Application name reported to the server.
const APP_NAME: &str = "multidb-gateway";
/// Bound on server selection so unreachable clusters fail promptly.
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// MongoDB-backed document store.
pub struct MongoStore {
    /// Connection string.
    url: String,
    /// Database name.
    database: String,
    /// Database handle, created on first use.
    handle: OnceCell<Database>,
}

impl MongoStore {
    /// Creates a store without connecting.
    #[must_use]
    pub fn new(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            handle: OnceCell::new(),
        }
    }

    /// Returns the named collection, building the client if needed.
    async fn collection(&self, name: &str) -> Result<Collection<Document>, StoreError> {
        let database = self
            .handle
            .get_or_try_init(|| async {
                let mut options = ClientOptions::parse(&self.url)
                    .await
                    .map_err(|err| StoreError::Unavailable(err.to_string()))?;
                options.app_name = Some(APP_NAME.to_string());
                options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);
                let client = Client::with_options(options)
                    .map_err(|err| StoreError::Unavailable(err.to_string()))?;
                Ok::<_, StoreError>(client.database(&self.database))
            })
            .await?;
        Ok(database.collection::<Document>(name))
    }
}

/// Converts an extended-JSON object into a BSON document.
fn to_document(field: &str, value: Map<String, Value>) -> Result<Document, StoreError> {
    match Bson::try_from(Value::Object(value)) {
        Ok(Bson::Document(document)) => Ok(document),
        Ok(_) => Err(StoreError::Backend(format!("{field} must be a document"))),
        Err(err) => Err(StoreError::Backend(format!("invalid {field}: {err}"))),
    }
}

/// Renders an inserted id the way callers expect to see it.
fn render_id(id: Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(text) => text,
        other => other.into_relaxed_extjson().to_string(),
    }
}

/// Classifies a driver error as connectivity or command failure.
fn classify(err: &MongoError) -> StoreError {
    match *err.kind {
        ErrorKind::ServerSelection {
            ..
        }
        | ErrorKind::Io(_)
        | ErrorKind::DnsResolve {
            ..
        }
        | ErrorKind::ConnectionPoolCleared {
            ..
        } => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Backend(err.to_string()),
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find(
        &self,
        collection: &str,
        filter: Map<String, Value>,
        limit: u32,
    ) -> Result<Vec<Value>, StoreError> {
        let filter = to_document("query", filter)?;
        let cursor = self
            .collection(collection)
            .await?
            .find(filter)
            .limit(i64::from(limit))
            .await
            .map_err(|err| classify(&err))?;
        let documents: Vec<Document> = cursor.try_collect().await.map_err(|err| classify(&err))?;
        Ok(documents.into_iter().map(|doc| Bson::Document(doc).into_relaxed_extjson()).collect())
    }

    async fn insert(
        &self,
        collection: &str,
        document: Map<String, Value>,
    ) -> Result<String, StoreError> {
        let document = to_document("document", document)?;
        let result = self
            .collection(collection)
            .await?
            .insert_one(document)
            .await
            .map_err(|err| classify(&err))?;
        Ok(render_id(result.inserted_id))
    }

    async fn update(
        &self,
        collection: &str,
        filter: Map<String, Value>,
        update: Map<String, Value>,
        multi: bool,
    ) -> Result<u64, StoreError> {
        let filter = to_document("filter", filter)?;
        let update = to_document("update", update)?;
        let target = self.collection(collection).await?;
        let result = if multi {
            target.update_many(filter, update).await
        } else {
            target.update_one(filter, update).await
        }
        .map_err(|err| classify(&err))?;
        Ok(result.modified_count)
    }

    async fn delete(
        &self,
        collection: &str,
        filter: Map<String, Value>,
        multi: bool,
    ) -> Result<u64, StoreError> {
        let filter = to_document("filter", filter)?;
        let target = self.collection(collection).await?;
        let result = if multi {
            target.delete_many(filter).await
        } else {
            target.delete_one(filter).await
        }
        .map_err(|err| classify(&err))?;
        Ok(result.deleted_count)
    }
}
