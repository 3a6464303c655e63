//! Per-company news index cache backed by LanceDB.
//!
//! Each build writes one table `news_<company>_<embedder>_<hash>` holding
//! `(position, title, vector)` rows, so the document list is persisted with
//! the vectors and a loaded index can never disagree with its documents.
//! A per-company meta table points at the active build for each embedder.
//!
//! Directory layout: `<index_dir>/v<CACHE_FORMAT_VERSION>/`. Builds are keyed
//! by embedder id, so switching models never reads vectors from another one.
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, DistanceType, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

use talentctx_core::config::Staleness;
use talentctx_core::error::{Error, Result};
use talentctx_core::traits::{Embedder, NewsStore};
use talentctx_core::types::{CompanyId, NewsItem};

use crate::schema::build_news_schema;
use crate::table::{get_meta, open_db, set_meta, table_exists};

/// Bump when the on-disk layout changes; old directories are left untouched.
pub const CACHE_FORMAT_VERSION: u32 = 1;

fn persistence(e: impl std::fmt::Display) -> Error {
    Error::Persistence(e.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrigin {
    Built,
    Loaded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexManifest {
    table: String,
    embedder_id: String,
    dim: usize,
    len: usize,
    titles_hash: String,
    built_at: String,
}

/// Flat (exhaustive) L2 index over one company's news documents.
#[derive(Clone)]
pub struct CompanyVectorIndex {
    table: Table,
    company_id: CompanyId,
    embedder_id: String,
    dim: usize,
    len: usize,
}

impl CompanyVectorIndex {
    pub fn company_id(&self) -> CompanyId { self.company_id }
    pub fn embedder_id(&self) -> &str { &self.embedder_id }
    pub fn dim(&self) -> usize { self.dim }
    pub fn len(&self) -> usize { self.len }
    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Row positions of the `k` nearest vectors, nearest first.
    pub async fn nearest(&self, query: Vec<f32>, k: usize) -> Result<Vec<usize>> {
        if k == 0 { return Ok(Vec::new()); }
        let mut stream = self
            .table
            .vector_search(query)
            .map_err(persistence)?
            .distance_type(DistanceType::L2)
            .limit(k)
            .execute()
            .await
            .map_err(persistence)?;
        let mut positions = Vec::with_capacity(k);
        while let Some(batch) = stream.try_next().await.map_err(persistence)? {
            let col = batch
                .column_by_name("position")
                .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
                .ok_or_else(|| Error::Persistence("position column missing".to_string()))?;
            positions.extend(col.values().iter().filter_map(|&p| usize::try_from(p).ok()));
        }
        Ok(positions)
    }
}

/// An index together with the exact document list it was built from.
#[derive(Clone)]
pub struct CachedNewsIndex {
    pub index: CompanyVectorIndex,
    pub documents: Vec<String>,
    pub origin: IndexOrigin,
}

pub struct NewsIndexCache {
    conn: Connection,
    embedder: Arc<dyn Embedder>,
    news: Arc<dyn NewsStore>,
    staleness: Staleness,
    build_locks: Mutex<HashMap<CompanyId, Arc<tokio::sync::Mutex<()>>>>,
}

impl NewsIndexCache {
    pub async fn open(
        index_dir: &Path,
        embedder: Arc<dyn Embedder>,
        news: Arc<dyn NewsStore>,
        staleness: Staleness,
    ) -> Result<Self> {
        let dir = index_dir.join(format!("v{CACHE_FORMAT_VERSION}"));
        std::fs::create_dir_all(&dir).map_err(|e| Error::Persistence(format!("creating {}: {}", dir.display(), e)))?;
        let conn = open_db(&dir.to_string_lossy()).await.map_err(persistence)?;
        Ok(Self { conn, embedder, news, staleness, build_locks: Mutex::new(HashMap::new()) })
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> { &self.embedder }

    /// Load the company's index, or build and persist it on first use.
    /// `Ok(None)` when the company has no news.
    ///
    /// Calls for the same company are serialized, so concurrent first uses
    /// build once and later callers load what the first one persisted.
    pub async fn get_or_build(&self, company_id: CompanyId) -> Result<Option<CachedNewsIndex>> {
        let lock = self.build_lock(company_id);
        let result = {
            let _guard = lock.lock().await;
            self.load_or_build(company_id).await
        };
        self.release_build_lock(company_id, lock);
        result
    }

    async fn load_or_build(&self, company_id: CompanyId) -> Result<Option<CachedNewsIndex>> {
        if let Some(cached) = self.load(company_id).await? {
            if self.staleness == Staleness::Pinned {
                return Ok(Some(cached));
            }
            let documents = self.fetch_documents(company_id).await?;
            if titles_hash(&documents) == titles_hash(&cached.documents) {
                return Ok(Some(cached));
            }
            info!(company_id, before = cached.documents.len(), after = documents.len(), "news changed since index build; rebuilding");
            return self.build(company_id, documents).await;
        }

        let documents = self.fetch_documents(company_id).await?;
        self.build(company_id, documents).await
    }

    fn build_lock(&self, company_id: CompanyId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.build_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(company_id).or_default())
    }

    /// Drops the map entry once no other caller holds or waits on it.
    fn release_build_lock(&self, company_id: CompanyId, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.build_locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if locks.get(&company_id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&company_id);
        }
    }

    fn embedder_tag(&self) -> String {
        blake3::hash(self.embedder.embedder_id().as_bytes()).to_hex()[..12].to_string()
    }

    fn active_key(&self) -> String {
        format!("active_index:{}", self.embedder_tag())
    }

    async fn fetch_documents(&self, company_id: CompanyId) -> Result<Vec<String>> {
        let news = Arc::clone(&self.news);
        let items = tokio::task::spawn_blocking(move || news.news_for(company_id))
            .await
            .map_err(|e| Error::Operation(format!("news fetch task: {e}")))?
            .map_err(|e| Error::Operation(format!("news store read for company {company_id}: {e}")))?;
        Ok(items.iter().map(NewsItem::document).collect())
    }

    async fn load(&self, company_id: CompanyId) -> Result<Option<CachedNewsIndex>> {
        let Some(raw) = get_meta(&self.conn, &meta_table(company_id), &self.active_key()).await.map_err(persistence)? else {
            return Ok(None);
        };
        let manifest: IndexManifest = serde_json::from_str(&raw)
            .map_err(|e| Error::Persistence(format!("index manifest for company {company_id}: {e}")))?;
        if !table_exists(&self.conn, &manifest.table).await.map_err(persistence)? {
            warn!(company_id, table = %manifest.table, "active index table is missing; rebuilding");
            return Ok(None);
        }
        let table = self.conn.open_table(&manifest.table).execute().await.map_err(persistence)?;
        let documents = read_documents(&table).await?;
        if documents.len() != manifest.len {
            return Err(Error::Persistence(format!(
                "index {} holds {} documents, manifest says {}",
                manifest.table,
                documents.len(),
                manifest.len
            )));
        }
        info!(company_id, documents = documents.len(), "loaded cached news index");
        let index = CompanyVectorIndex { table, company_id, embedder_id: manifest.embedder_id, dim: manifest.dim, len: documents.len() };
        Ok(Some(CachedNewsIndex { index, documents, origin: IndexOrigin::Loaded }))
    }

    async fn build(&self, company_id: CompanyId, documents: Vec<String>) -> Result<Option<CachedNewsIndex>> {
        if documents.is_empty() {
            warn!(company_id, "company has no news; no index");
            return Ok(None);
        }

        let embedder = Arc::clone(&self.embedder);
        let (documents, vectors) = tokio::task::spawn_blocking(move || {
            let vectors = embedder.embed_batch(&documents);
            (documents, vectors)
        })
        .await
        .map_err(|e| Error::Operation(format!("embedding task: {e}")))?;
        let vectors = vectors.map_err(|e| Error::Inference(e.to_string()))?;

        let dim = self.embedder.dim();
        if vectors.len() != documents.len() {
            return Err(Error::Inference(format!("embedder returned {} vectors for {} documents", vectors.len(), documents.len())));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(Error::Inference(format!("dim mismatch: got {} expected {}", bad.len(), dim)));
        }

        let hash = titles_hash(&documents);
        let table_name = format!("news_{}_{}_{}", company_id, self.embedder_tag(), &hash[..16]);
        let table = if table_exists(&self.conn, &table_name).await.map_err(persistence)? {
            self.conn.open_table(&table_name).execute().await.map_err(persistence)?
        } else {
            let batch = news_record_batch(&documents, &vectors, dim)?;
            let schema = batch.schema();
            let reader = RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema);
            self.conn.create_table(&table_name, reader).execute().await.map_err(persistence)?
        };

        let manifest = IndexManifest {
            table: table_name.clone(),
            embedder_id: self.embedder.embedder_id().to_string(),
            dim,
            len: documents.len(),
            titles_hash: hash,
            built_at: chrono::Utc::now().to_rfc3339(),
        };
        let value = serde_json::to_string(&manifest).map_err(persistence)?;
        set_meta(&self.conn, &meta_table(company_id), &self.active_key(), &value).await.map_err(persistence)?;
        info!(company_id, documents = documents.len(), table = %table_name, "built and persisted news index");

        let index = CompanyVectorIndex { table, company_id, embedder_id: manifest.embedder_id, dim, len: documents.len() };
        Ok(Some(CachedNewsIndex { index, documents, origin: IndexOrigin::Built }))
    }
}

fn meta_table(company_id: CompanyId) -> String {
    format!("meta_{company_id}")
}

fn titles_hash(documents: &[String]) -> String {
    let mut hasher = blake3::Hasher::new();
    for doc in documents {
        hasher.update(doc.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize().to_hex().to_string()
}

fn news_record_batch(documents: &[String], vectors: &[Vec<f32>], dim: usize) -> Result<RecordBatch> {
    let dim = i32::try_from(dim).map_err(|_| Error::Inference(format!("embedding dim {dim} does not fit the index schema")))?;
    let positions = (0..documents.len())
        .map(i32::try_from)
        .collect::<std::result::Result<Vec<i32>, _>>()
        .map_err(|_| Error::Persistence(format!("{} documents do not fit the index schema", documents.len())))?;
    let vectors = vectors.iter().map(|v| Some(v.iter().copied().map(Some).collect::<Vec<_>>()));
    RecordBatch::try_new(
        build_news_schema(dim),
        vec![
            Arc::new(Int32Array::from(positions)),
            Arc::new(StringArray::from(documents.to_vec())),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, dim)),
        ],
    )
    .map_err(persistence)
}

async fn read_documents(table: &Table) -> Result<Vec<String>> {
    let mut rows: Vec<(i32, String)> = Vec::new();
    let mut stream = table
        .query()
        .select(Select::columns(&["position", "title"]))
        .execute()
        .await
        .map_err(persistence)?;
    while let Some(batch) = stream.try_next().await.map_err(persistence)? {
        let positions = batch
            .column_by_name("position")
            .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
            .ok_or_else(|| Error::Persistence("position column missing".to_string()))?;
        let titles = batch
            .column_by_name("title")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| Error::Persistence("title column missing".to_string()))?;
        for i in 0..batch.num_rows() {
            rows.push((positions.value(i), titles.value(i).to_string()));
        }
    }
    rows.sort_by_key(|(p, _)| *p);
    if rows.iter().enumerate().any(|(i, (p, _))| usize::try_from(*p).ok() != Some(i)) {
        return Err(Error::Persistence("index rows are not a contiguous 0..n position range".to_string()));
    }
    Ok(rows.into_iter().map(|(_, title)| title).collect())
}
