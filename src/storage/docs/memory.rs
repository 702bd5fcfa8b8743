//! In-memory document store for tests and local development.
//!
//! Transactions are fully serialized: `begin` holds the store mutex until the
//! transaction is committed or dropped, and works on a private copy.

use super::{document_id, Document, DocumentStore, Filter, StoreError, StoreResult, StoreTx, Update};
use crate::domain::model::Collection;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};

type Collections = HashMap<Collection, Vec<Document>>;

#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    state: Arc<Mutex<Collections>>,
    /// Remaining successful writes before every further write fails.
    write_budget: Arc<StdMutex<Option<usize>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fault injection: allow `n` more writes, then fail every write with
    /// `StoreError::Injected` until `clear_faults` is called.
    pub fn fail_writes_after(&self, n: usize) {
        if let Ok(mut budget) = self.write_budget.lock() {
            *budget = Some(n);
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut budget) = self.write_budget.lock() {
            *budget = None;
        }
    }

    /// Committed contents of one collection, in insertion order.
    pub async fn documents(&self, collection: Collection) -> Vec<Document> {
        let state = self.state.lock().await;
        state.get(&collection).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTx {
            guard,
            working,
            write_budget: self.write_budget.clone(),
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

struct InMemoryTx {
    guard: OwnedMutexGuard<Collections>,
    working: Collections,
    write_budget: Arc<StdMutex<Option<usize>>>,
}

impl InMemoryTx {
    fn charge_write(&self, collection: Collection) -> StoreResult<()> {
        let mut budget = self
            .write_budget
            .lock()
            .map_err(|_| StoreError::Injected("fault budget lock poisoned".into()))?;
        match *budget {
            None => Ok(()),
            Some(0) => Err(StoreError::Injected(format!("write to {} refused", collection))),
            Some(n) => {
                *budget = Some(n - 1);
                Ok(())
            }
        }
    }

    fn docs(&mut self, collection: Collection) -> &mut Vec<Document> {
        self.working.entry(collection).or_default()
    }

    fn update(
        &mut self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
        limit: Option<usize>,
    ) -> StoreResult<u64> {
        self.charge_write(collection)?;
        let mut modified = 0u64;
        for doc in self.docs(collection).iter_mut().filter(|d| filter.matches(d)) {
            if limit.is_some_and(|l| modified as usize >= l) {
                break;
            }
            update.apply(doc);
            modified += 1;
        }
        Ok(modified)
    }

    fn delete(
        &mut self,
        collection: Collection,
        filter: &Filter,
        limit: Option<usize>,
    ) -> StoreResult<u64> {
        self.charge_write(collection)?;
        let mut deleted = 0usize;
        self.docs(collection).retain(|doc| {
            let remove = filter.matches(doc) && limit.map_or(true, |l| deleted < l);
            if remove {
                deleted += 1;
            }
            !remove
        });
        Ok(deleted as u64)
    }
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn lock_key(&mut self, _key: &str) -> StoreResult<()> {
        Ok(())
    }

    async fn find_one(
        &mut self,
        collection: Collection,
        filter: &Filter,
    ) -> StoreResult<Option<Document>> {
        Ok(self
            .docs(collection)
            .iter()
            .find(|d| filter.matches(d))
            .cloned())
    }

    async fn find_many(
        &mut self,
        collection: Collection,
        filter: &Filter,
    ) -> StoreResult<Vec<Document>> {
        Ok(self
            .docs(collection)
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect())
    }

    async fn insert_one(&mut self, collection: Collection, doc: Document) -> StoreResult<()> {
        let id = document_id(collection, &doc)?;
        self.charge_write(collection)?;
        let docs = self.docs(collection);
        if docs.iter().any(|d| d.get("id").and_then(|v| v.as_str()) == Some(id.as_str())) {
            return Err(StoreError::Duplicate { collection, id });
        }
        docs.push(doc);
        Ok(())
    }

    async fn update_one(
        &mut self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<u64> {
        self.update(collection, filter, update, Some(1))
    }

    async fn update_many(
        &mut self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<u64> {
        self.update(collection, filter, update, None)
    }

    async fn delete_one(&mut self, collection: Collection, filter: &Filter) -> StoreResult<u64> {
        self.delete(collection, filter, Some(1))
    }

    async fn delete_many(&mut self, collection: Collection, filter: &Filter) -> StoreResult<u64> {
        self.delete(collection, filter, None)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let InMemoryTx {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}
