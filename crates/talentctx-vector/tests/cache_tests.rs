use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use talentctx_core::config::Staleness;
use talentctx_core::error::Error;
use talentctx_core::store::InMemoryStore;
use talentctx_core::traits::Embedder;
use talentctx_embed::FakeEmbedder;
use talentctx_vector::{IndexOrigin, NewsIndexCache, SemanticRetriever};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("date")
}

fn two_news() -> InMemoryStore {
    InMemoryStore::new()
        .with_news(1, "Acme launches AcmeCloud", day(2021, 3, 2))
        .with_news(1, "Acme raises Series B", day(2020, 6, 1))
}

async fn cache(dir: &TempDir, news: InMemoryStore, staleness: Staleness) -> NewsIndexCache {
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(1024));
    NewsIndexCache::open(dir.path(), embedder, Arc::new(news), staleness).await.expect("open cache")
}

#[tokio::test]
async fn company_without_news_has_no_index() {
    let tmp = TempDir::new().expect("tmp");
    let cache = cache(&tmp, two_news(), Staleness::Pinned).await;
    assert!(cache.get_or_build(99).await.expect("lookup").is_none());
}

#[tokio::test]
async fn built_index_is_reloaded_and_searchable() {
    let tmp = TempDir::new().expect("tmp");
    let first = cache(&tmp, two_news(), Staleness::Pinned).await;
    let built = first.get_or_build(1).await.expect("build").expect("index");
    assert_eq!(built.origin, IndexOrigin::Built);
    assert_eq!(built.documents, vec!["Acme raises Series B (2020-06-01)", "Acme launches AcmeCloud (2021-03-02)"]);
    drop(first);

    let second = cache(&tmp, two_news(), Staleness::Pinned).await;
    let loaded = second.get_or_build(1).await.expect("load").expect("index");
    assert_eq!(loaded.origin, IndexOrigin::Loaded);
    assert_eq!(loaded.documents, built.documents);
    assert_eq!(loaded.index.len(), 2);

    let retriever = SemanticRetriever::new(Arc::clone(second.embedder()));
    let hits = retriever
        .search("Acme launches AcmeCloud (2021-03-02)", &loaded.index, &loaded.documents, 5)
        .await
        .expect("search");
    assert_eq!(hits.len(), 2, "k is capped at the document count");
    assert_eq!(hits[0], "Acme launches AcmeCloud (2021-03-02)");

    let none = retriever.search("anything", &loaded.index, &loaded.documents, 0).await.expect("search");
    assert!(none.is_empty());
}

#[tokio::test]
async fn staleness_policy_decides_whether_new_news_is_picked_up() {
    let tmp = TempDir::new().expect("tmp");
    cache(&tmp, two_news(), Staleness::Pinned).await.get_or_build(1).await.expect("build");

    let three = || two_news().with_news(1, "Acme opens Berlin office", day(2022, 1, 10));

    let pinned = cache(&tmp, three(), Staleness::Pinned).await.get_or_build(1).await.expect("load").expect("index");
    assert_eq!(pinned.origin, IndexOrigin::Loaded);
    assert_eq!(pinned.documents.len(), 2);

    let rebuilt = cache(&tmp, three(), Staleness::RebuildOnNewsChange).await.get_or_build(1).await.expect("rebuild").expect("index");
    assert_eq!(rebuilt.origin, IndexOrigin::Built);
    assert_eq!(rebuilt.documents.len(), 3);
    assert_eq!(rebuilt.documents[2], "Acme opens Berlin office (2022-01-10)");

    let unchanged = cache(&tmp, three(), Staleness::RebuildOnNewsChange).await.get_or_build(1).await.expect("load").expect("index");
    assert_eq!(unchanged.origin, IndexOrigin::Loaded);
    assert_eq!(unchanged.documents, rebuilt.documents);
}

#[tokio::test]
async fn concurrent_first_use_builds_once() {
    let tmp = TempDir::new().expect("tmp");
    let cache = cache(&tmp, two_news(), Staleness::Pinned).await;
    let (a, b) = futures::join!(cache.get_or_build(1), cache.get_or_build(1));
    let (a, b) = (a.expect("a").expect("index"), b.expect("b").expect("index"));
    let built = [a.origin, b.origin].iter().filter(|o| **o == IndexOrigin::Built).count();
    assert_eq!(built, 1);
    assert_eq!(a.documents, b.documents);
}

#[tokio::test]
async fn query_embedder_must_match_index_embedder() {
    let tmp = TempDir::new().expect("tmp");
    let cache = cache(&tmp, two_news(), Staleness::Pinned).await;
    let cached = cache.get_or_build(1).await.expect("build").expect("index");
    let other = SemanticRetriever::new(Arc::new(FakeEmbedder::new(512)));
    assert!(other.search("Acme", &cached.index, &cached.documents, 3).await.is_err());
}

struct OfflineEmbedder;

impl Embedder for OfflineEmbedder {
    fn embedder_id(&self) -> &str { "offline" }
    fn dim(&self) -> usize { 8 }
    fn max_len(&self) -> usize { 64 }
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { anyhow::bail!("model weights unavailable") }
}

#[tokio::test]
async fn embedding_failure_during_build_is_an_inference_error() {
    let tmp = TempDir::new().expect("tmp");
    let cache = NewsIndexCache::open(tmp.path(), Arc::new(OfflineEmbedder), Arc::new(two_news()), Staleness::Pinned)
        .await
        .expect("open cache");
    let err = cache.get_or_build(1).await.err().expect("build fails");
    assert!(matches!(err, Error::Inference(_)), "got {err}");

    // Nothing was persisted, so a company without news is still fine.
    assert!(cache.get_or_build(99).await.expect("lookup").is_none());
}

#[tokio::test]
async fn index_dir_that_is_a_file_is_a_persistence_error() {
    let tmp = TempDir::new().expect("tmp");
    let file = tmp.path().join("index_cache");
    std::fs::write(&file, b"not a directory").expect("write file");
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(16));
    let err = NewsIndexCache::open(&file, embedder, Arc::new(two_news()), Staleness::Pinned).await.err().expect("open fails");
    assert!(matches!(err, Error::Persistence(_)), "got {err}");
}
