//! Document store abstraction used by the consistency rules.
//!
//! A `DocumentStore` hands out transactions; every read and write of one
//! service operation goes through a single `StoreTx`, so a cascade either
//! lands in every collection or in none. Dropping a transaction without
//! calling `commit` rolls it back.

use crate::domain::model::{Collection, Entity};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;
pub mod query;

pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use query::{Document, Filter, Update};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("document serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("document {id} already exists in {collection}")]
    Duplicate { collection: Collection, id: String },

    #[error("document in {collection} has no string `id` field")]
    MissingId { collection: Collection },

    #[error("injected store failure: {0}")]
    Injected(String),
}

impl StoreError {
    /// True when the store could not be reached at all (pool exhausted,
    /// connection refused), as opposed to a failed statement.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Database(sqlx::Error::PoolTimedOut)
                | StoreError::Database(sqlx::Error::PoolClosed)
                | StoreError::Database(sqlx::Error::Io(_))
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;

    /// Cheap round trip used by health checks.
    async fn ping(&self) -> StoreResult<()>;
}

#[async_trait]
pub trait StoreTx: Send {
    /// Exclusive lock on an arbitrary key, held until the transaction ends.
    async fn lock_key(&mut self, key: &str) -> StoreResult<()>;

    async fn find_one(&mut self, collection: Collection, filter: &Filter)
        -> StoreResult<Option<Document>>;

    /// Matching documents in insertion order.
    async fn find_many(&mut self, collection: Collection, filter: &Filter)
        -> StoreResult<Vec<Document>>;

    async fn insert_one(&mut self, collection: Collection, doc: Document) -> StoreResult<()>;

    /// Returns the number of documents modified (0 or 1).
    async fn update_one(
        &mut self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<u64>;

    async fn update_many(
        &mut self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<u64>;

    async fn delete_one(&mut self, collection: Collection, filter: &Filter) -> StoreResult<u64>;

    async fn delete_many(&mut self, collection: Collection, filter: &Filter) -> StoreResult<u64>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Locks several keys in sorted order so concurrent operations that share
/// keys always acquire them in the same sequence.
pub async fn lock_keys(tx: &mut dyn StoreTx, keys: &[String]) -> StoreResult<()> {
    let mut keys: Vec<&String> = keys.iter().collect();
    keys.sort();
    keys.dedup();
    for key in keys {
        tx.lock_key(key).await?;
    }
    Ok(())
}

pub fn to_document<E: Entity>(entity: &E) -> StoreResult<Document> {
    match serde_json::to_value(entity)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(StoreError::MissingId {
            collection: E::COLLECTION,
        }),
    }
}

pub fn from_document<E: Entity>(doc: Document) -> StoreResult<E> {
    Ok(serde_json::from_value(serde_json::Value::Object(doc))?)
}

pub(crate) fn document_id(collection: Collection, doc: &Document) -> StoreResult<String> {
    doc.get("id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or(StoreError::MissingId { collection })
}

pub async fn find_entity<E: Entity>(
    tx: &mut dyn StoreTx,
    filter: &Filter,
) -> StoreResult<Option<E>> {
    tx.find_one(E::COLLECTION, filter)
        .await?
        .map(from_document)
        .transpose()
}

pub async fn find_entities<E: Entity>(
    tx: &mut dyn StoreTx,
    filter: &Filter,
) -> StoreResult<Vec<E>> {
    tx.find_many(E::COLLECTION, filter)
        .await?
        .into_iter()
        .map(from_document)
        .collect()
}

pub async fn insert_entity<E: Entity>(tx: &mut dyn StoreTx, entity: &E) -> StoreResult<()> {
    let doc = to_document(entity)?;
    tx.insert_one(E::COLLECTION, doc).await
}
