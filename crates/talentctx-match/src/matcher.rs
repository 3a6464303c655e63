//! Company-name matching under two policies.
//!
//! - fuzzy: normalize (lowercase, alphanumerics only), then the Indel ratio
//!   `100 * (1 - indel_distance / (len(a) + len(b)))` compared against
//!   `fuzzy_threshold`
//! - semantic: cosine similarity of sentence embeddings of the raw strings
//!   compared against `semantic_threshold`
//!
//! The semantic policy never fails: an embedding error is logged and
//! counts as "no match" so resolution can continue with the next candidate.

use std::sync::Arc;
use tracing::debug;

use talentctx_core::config::MatcherSettings;
use talentctx_core::traits::Embedder;

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 85.0;
pub const DEFAULT_SEMANTIC_THRESHOLD: f32 = 0.90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    Fuzzy,
    Semantic,
}

pub fn normalize_name(name: &str) -> String {
    name.chars().flat_map(char::to_lowercase).filter(|c| c.is_alphanumeric()).collect()
}

/// Indel similarity of the normalized names, scaled to 0–100. A single
/// inserted or dropped character costs one edit out of `len(a) + len(b)`.
pub fn fuzzy_ratio(a: &str, b: &str) -> f64 {
    rapidfuzz::fuzz::ratio(normalize_name(a).chars(), normalize_name(b).chars()) * 100.0
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() { return 0.0; }
    let mut dot = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;
    for (x, y) in a.iter().zip(b) { dot += x * y; na += x * x; nb += y * y; }
    if na == 0.0 || nb == 0.0 { return 0.0; }
    dot / (na.sqrt() * nb.sqrt())
}

#[derive(Clone)]
pub struct NameMatcher {
    embedder: Arc<dyn Embedder>,
    fuzzy_threshold: f64,
    semantic_threshold: f32,
}

impl NameMatcher {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder, fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD, semantic_threshold: DEFAULT_SEMANTIC_THRESHOLD }
    }

    pub fn from_settings(embedder: Arc<dyn Embedder>, settings: &MatcherSettings) -> Self {
        Self { embedder, fuzzy_threshold: settings.fuzzy_threshold, semantic_threshold: settings.semantic_threshold }
    }

    /// Names that normalize to nothing (e.g. only punctuation) never match.
    pub fn is_fuzzy_match(&self, a: &str, b: &str) -> bool {
        if normalize_name(a).is_empty() || normalize_name(b).is_empty() { return false; }
        fuzzy_ratio(a, b) >= self.fuzzy_threshold
    }

    pub fn is_semantic_match(&self, a: &str, b: &str) -> bool {
        match self.semantic_similarity(a, b) {
            Ok(score) => score >= self.semantic_threshold,
            Err(e) => {
                debug!(a, b, error = %e, "semantic match inference failed; treating as no match");
                false
            }
        }
    }

    fn semantic_similarity(&self, a: &str, b: &str) -> anyhow::Result<f32> {
        let va = self.embedder.embed(a)?;
        let vb = self.embedder.embed(b)?;
        Ok(cosine_similarity(&va, &vb))
    }

    /// Fuzzy first; semantic only when fuzzy fails.
    pub fn matches(&self, a: &str, b: &str) -> Option<MatchPolicy> {
        if self.is_fuzzy_match(a, b) { return Some(MatchPolicy::Fuzzy); }
        if self.is_semantic_match(a, b) { return Some(MatchPolicy::Semantic); }
        None
    }
}
