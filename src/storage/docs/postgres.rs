//! Document store backed by a single PostgreSQL JSONB table.
//!
//! Layout: one row per document, keyed by `(collection, id)`. Filters are
//! pushed down as `doc -> field @> value` conditions, which cover both scalar
//! equality and array membership. Updates lock the matched rows, apply the
//! `Update` in Rust and write the documents back, all inside the caller's
//! transaction.

use super::{document_id, Document, DocumentStore, Filter, StoreResult, StoreTx, Update};
use crate::domain::model::Collection;
use crate::infra::config::DatabaseConfig;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};
use std::time::Duration;

#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Connects a pool sized from configuration. Connections are health
    /// checked before being handed out.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .test_before_acquire(true)
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the document table and its indexes if they are missing.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                doc JSONB NOT NULL,
                seq BIGSERIAL,
                PRIMARY KEY (collection, id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS documents_doc_gin ON documents USING GIN (doc)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS documents_seq ON documents (collection, seq)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTx { tx }))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

/// `SELECT id, doc FROM documents WHERE collection = $1 AND <filter>`.
fn select_matching<'a>(
    collection: Collection,
    filter: &'a Filter,
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT id, doc FROM documents WHERE collection = ");
    qb.push_bind(collection.name());
    for (field, value) in filter.conditions() {
        qb.push(" AND doc -> ");
        qb.push_bind(field.as_str());
        qb.push(" @> ");
        qb.push_bind(value);
    }
    qb
}

impl PostgresTx {
    async fn fetch(
        &mut self,
        collection: Collection,
        filter: &Filter,
        limit: Option<i64>,
        for_update: bool,
    ) -> StoreResult<Vec<(String, Document)>> {
        let mut qb = select_matching(collection, filter);
        qb.push(" ORDER BY seq");
        if let Some(limit) = limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
        }
        if for_update {
            qb.push(" FOR UPDATE");
        }

        let rows = qb.build().fetch_all(&mut *self.tx).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let doc: JsonValue = row.try_get("doc")?;
            if let JsonValue::Object(map) = doc {
                out.push((id, map));
            }
        }
        Ok(out)
    }

    async fn apply_update(
        &mut self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
        limit: Option<i64>,
    ) -> StoreResult<u64> {
        let matched = self.fetch(collection, filter, limit, true).await?;
        let mut modified = 0u64;
        for (id, mut doc) in matched {
            update.apply(&mut doc);
            sqlx::query("UPDATE documents SET doc = $1 WHERE collection = $2 AND id = $3")
                .bind(JsonValue::Object(doc))
                .bind(collection.name())
                .bind(&id)
                .execute(&mut *self.tx)
                .await?;
            modified += 1;
        }
        Ok(modified)
    }
}

#[async_trait]
impl StoreTx for PostgresTx {
    async fn lock_key(&mut self, key: &str) -> StoreResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(key)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn find_one(
        &mut self,
        collection: Collection,
        filter: &Filter,
    ) -> StoreResult<Option<Document>> {
        let mut rows = self.fetch(collection, filter, Some(1), false).await?;
        Ok(rows.pop().map(|(_, doc)| doc))
    }

    async fn find_many(
        &mut self,
        collection: Collection,
        filter: &Filter,
    ) -> StoreResult<Vec<Document>> {
        let rows = self.fetch(collection, filter, None, false).await?;
        Ok(rows.into_iter().map(|(_, doc)| doc).collect())
    }

    async fn insert_one(&mut self, collection: Collection, doc: Document) -> StoreResult<()> {
        let id = document_id(collection, &doc)?;
        let inserted = sqlx::query(
            "INSERT INTO documents (collection, id, doc) VALUES ($1, $2, $3)
             ON CONFLICT (collection, id) DO NOTHING",
        )
        .bind(collection.name())
        .bind(&id)
        .bind(JsonValue::Object(doc))
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Err(super::StoreError::Duplicate { collection, id });
        }
        Ok(())
    }

    async fn update_one(
        &mut self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<u64> {
        self.apply_update(collection, filter, update, Some(1)).await
    }

    async fn update_many(
        &mut self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<u64> {
        self.apply_update(collection, filter, update, None).await
    }

    async fn delete_one(&mut self, collection: Collection, filter: &Filter) -> StoreResult<u64> {
        let matched = self.fetch(collection, filter, Some(1), true).await?;
        let mut deleted = 0u64;
        for (id, _) in matched {
            deleted += sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection.name())
                .bind(&id)
                .execute(&mut *self.tx)
                .await?
                .rows_affected();
        }
        Ok(deleted)
    }

    async fn delete_many(&mut self, collection: Collection, filter: &Filter) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM documents WHERE collection = ");
        qb.push_bind(collection.name());
        for (field, value) in filter.conditions() {
            qb.push(" AND doc -> ");
            qb.push_bind(field.as_str());
            qb.push(" @> ");
            qb.push_bind(value);
        }
        let result = qb.build().execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
