use crate::types::{CompanyId, CompanyRecord, NewsItem};

/// Text → fixed-dimension vector inference.
///
/// One instance is constructed per process and shared as `Arc<dyn Embedder>`
/// by every component that embeds text, so index vectors and query vectors
/// always come from the same model.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model (e.g., `local:bge-m3:d1024`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Read-only access to canonical company records.
pub trait CompanyStore: Send + Sync {
    /// Literal, case-sensitive name lookup. First match wins.
    fn find_by_name(&self, name: &str) -> anyhow::Result<Option<CompanyRecord>>;
    /// Every record, in the store's stable iteration order.
    fn scan(&self) -> anyhow::Result<Vec<CompanyRecord>>;
}

/// Read-only access to company news.
pub trait NewsStore: Send + Sync {
    /// News for one company, ascending by publication date.
    fn news_for(&self, company_id: CompanyId) -> anyhow::Result<Vec<NewsItem>>;
}
