use std::sync::Arc;
use tracing::debug;

use talentctx_core::error::{Error, Result};
use talentctx_core::traits::Embedder;
use talentctx_core::types::CareerPosition;

use crate::cache::CompanyVectorIndex;

/// Natural-language query describing what the person likely did in a role.
pub fn vector_query(position: &CareerPosition) -> String {
    format!(
        "Information about projects or experience that a person who worked as {} at {} from {} to {} likely led in this role.",
        position.title,
        position.company,
        position.start,
        position.end_label()
    )
}

/// Embeds a query and returns the nearest documents of a company index.
#[derive(Clone)]
pub struct SemanticRetriever {
    embedder: Arc<dyn Embedder>,
}

impl SemanticRetriever {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self { Self { embedder } }

    /// Up to `k` documents, nearest first. The query is embedded with the
    /// same model that built the index; a different model is an error.
    pub async fn search(&self, query: &str, index: &CompanyVectorIndex, documents: &[String], k: usize) -> Result<Vec<String>> {
        if k == 0 || documents.is_empty() || index.is_empty() {
            return Ok(Vec::new());
        }
        if index.embedder_id() != self.embedder.embedder_id() {
            return Err(Error::Inference(format!(
                "index was built with '{}' but queries are embedded with '{}'",
                index.embedder_id(),
                self.embedder.embedder_id()
            )));
        }

        let embedder = Arc::clone(&self.embedder);
        let text = query.to_string();
        let q = tokio::task::spawn_blocking(move || embedder.embed(&text))
            .await
            .map_err(|e| Error::Operation(format!("query embedding task: {e}")))?
            .map_err(|e| Error::Inference(e.to_string()))?;
        if q.len() != index.dim() {
            return Err(Error::Inference(format!("query dim {} does not match index dim {}", q.len(), index.dim())));
        }

        let positions = index.nearest(q, k.min(documents.len())).await?;
        debug!(company_id = index.company_id(), k, hits = positions.len(), "news search");
        Ok(positions.into_iter().filter_map(|p| documents.get(p).cloned()).collect())
    }
}
