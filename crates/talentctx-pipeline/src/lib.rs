//! Per-position evidence assembly.
//!
//! For each career position: resolve the employer, extract structured
//! evidence for the employment window, then search the company's news index.
//! Positions run concurrently and independently; a failure in one leaves
//! that position without evidence and does not touch the others.
use anyhow::Result;
use chrono::NaiveDate;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use talentctx_core::config::Settings;
use talentctx_core::extract::extract;
use talentctx_core::traits::{CompanyStore, Embedder, NewsStore};
use talentctx_core::types::{CareerPosition, EvidenceBundle};
use talentctx_match::{CompanyResolver, NameMatcher};
use talentctx_vector::{vector_query, NewsIndexCache, SemanticRetriever};

/// A position as it is handed downstream: its own fields plus whatever
/// evidence was found for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEvidence {
    #[serde(flatten)]
    pub position: CareerPosition,
    #[serde(flatten)]
    pub evidence: Option<EvidenceBundle>,
}

pub struct EvidencePipeline {
    resolver: CompanyResolver,
    cache: Arc<NewsIndexCache>,
    retriever: SemanticRetriever,
    top_k: usize,
    today: Option<NaiveDate>,
}

impl EvidencePipeline {
    pub fn new(resolver: CompanyResolver, cache: Arc<NewsIndexCache>, retriever: SemanticRetriever, top_k: usize) -> Self {
        Self { resolver, cache, retriever, top_k, today: None }
    }

    /// Pin the date used as the end of open-ended windows.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub async fn from_settings(
        settings: &Settings,
        companies: Arc<dyn CompanyStore>,
        news: Arc<dyn NewsStore>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let matcher = NameMatcher::from_settings(Arc::clone(&embedder), &settings.matcher);
        let resolver = CompanyResolver::new(companies, matcher);
        let cache = NewsIndexCache::open(&settings.index_dir(), Arc::clone(&embedder), news, settings.cache.staleness).await?;
        let retriever = SemanticRetriever::new(embedder);
        Ok(Self::new(resolver, Arc::new(cache), retriever, settings.retrieval.top_k))
    }

    pub fn cache(&self) -> &Arc<NewsIndexCache> { &self.cache }

    /// `Ok(None)` when the employer cannot be resolved.
    pub async fn evidence_for(&self, position: &CareerPosition) -> Result<Option<EvidenceBundle>> {
        let window = position.window()?;

        let resolver = self.resolver.clone();
        let name = position.company.clone();
        let Some(resolution) = tokio::task::spawn_blocking(move || resolver.resolve(&name)).await?? else {
            info!(company = %position.company, "employer not resolved; position left without evidence");
            return Ok(None);
        };

        let today = self.today.unwrap_or_else(|| chrono::Local::now().date_naive());
        let structured_docs = extract(&resolution.company, &window, today);

        let news_docs = match self.cache.get_or_build(resolution.company_id()).await? {
            Some(cached) => {
                self.retriever
                    .search(&vector_query(position), &cached.index, &cached.documents, self.top_k)
                    .await?
            }
            None => Vec::new(),
        };

        info!(
            company = %position.company,
            company_id = resolution.company_id(),
            structured = structured_docs.len(),
            news = news_docs.len(),
            "position enriched"
        );
        Ok(Some(EvidenceBundle { structured_docs, news_docs }))
    }

    /// Evidence for every position, in input order.
    pub async fn enrich(&self, positions: &[CareerPosition]) -> Vec<PositionEvidence> {
        join_all(positions.iter().map(|position| async move {
            let evidence = match self.evidence_for(position).await {
                Ok(evidence) => evidence,
                Err(e) => {
                    warn!(company = %position.company, title = %position.title, error = %e, "position degraded to no evidence");
                    None
                }
            };
            PositionEvidence { position: position.clone(), evidence }
        }))
        .await
    }
}
