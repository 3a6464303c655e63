use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;

use talentctx_core::store::InMemoryStore;
use talentctx_core::traits::Embedder;
use talentctx_core::types::CompanyRecord;
use talentctx_match::{CompanyResolver, MatchPath, NameMatcher};

/// Embeds only the strings it was given; anything else is an inference error.
struct TableEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
}

impl TableEmbedder {
    fn new(entries: &[(&str, [f32; 3])]) -> Self {
        let vectors = entries.iter().map(|(k, v)| (k.to_string(), v.to_vec())).collect();
        Self { vectors, calls: AtomicUsize::new(0) }
    }
}

impl Embedder for TableEmbedder {
    fn embedder_id(&self) -> &str { "table" }
    fn dim(&self) -> usize { 3 }
    fn max_len(&self) -> usize { 64 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        texts
            .iter()
            .map(|t| self.vectors.get(t).cloned().ok_or_else(|| anyhow::anyhow!("no vector for '{t}'")))
            .collect()
    }
}

fn store() -> InMemoryStore {
    InMemoryStore::new()
        .with_company(CompanyRecord::new(10, "Globex", json!({ "products": [{ "name": "Acme" }] })))
        .with_company(CompanyRecord::new(11, "Broken", json!({ "products": "not a list" })))
        .with_company(CompanyRecord::new(12, "NoProducts", json!({})))
        .with_company(CompanyRecord::new(1, "Acme", json!({ "products": [{ "name": "AcmeCloud" }, { "name": "AcmePay" }] })))
        .with_company(CompanyRecord::new(2, "비바리퍼블리카", json!({ "products": [{ "name": "토스" }] })))
}

fn resolver(embedder: Arc<TableEmbedder>) -> CompanyResolver {
    CompanyResolver::new(Arc::new(store()), NameMatcher::new(embedder))
}

#[test]
fn verbatim_name_resolves_via_exact_path() {
    let embedder = Arc::new(TableEmbedder::new(&[]));
    let resolver = resolver(embedder.clone());

    // "Acme" is also a product of Globex, which comes first in scan order.
    let hit = resolver.resolve("Acme").unwrap().expect("resolved");
    assert_eq!(hit.company_id(), 1);
    assert_eq!(hit.path, MatchPath::Exact);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0, "exact path never embeds");
}

#[test]
fn misspelled_product_resolves_via_fuzzy_path() {
    let resolver = resolver(Arc::new(TableEmbedder::new(&[])));
    let hit = resolver.resolve("AcmeClod").unwrap().expect("resolved");
    assert_eq!(hit.company_id(), 1);
    assert_eq!(hit.company.name, "Acme");
    assert_eq!(hit.path, MatchPath::Fuzzy { product: "AcmeCloud".to_string() });
}

#[test]
fn translated_product_resolves_via_semantic_path() {
    let embedder = Arc::new(TableEmbedder::new(&[
        ("Toss", [1.0, 0.0, 0.1]),
        ("토스", [0.98, 0.0, 0.12]),
        ("Acme", [0.0, 1.0, 0.0]),
        ("AcmeCloud", [0.0, 0.7, 0.7]),
        ("AcmePay", [0.0, 0.2, 1.0]),
    ]));
    let hit = resolver(embedder).resolve("Toss").unwrap().expect("resolved");
    assert_eq!(hit.company_id(), 2);
    assert_eq!(hit.path, MatchPath::Semantic { product: "토스".to_string() });
}

#[test]
fn first_match_in_scan_order_wins() {
    let store = InMemoryStore::new()
        .with_company(CompanyRecord::new(5, "First", json!({ "products": [{ "name": "Widget Pro" }] })))
        .with_company(CompanyRecord::new(6, "Second", json!({ "products": [{ "name": "WidgetPro" }] })));
    let resolver = CompanyResolver::new(Arc::new(store), NameMatcher::new(Arc::new(TableEmbedder::new(&[]))));
    let hit = resolver.resolve("WidgetPro").unwrap().expect("resolved");
    assert_eq!(hit.company_id(), 5, "earlier candidate wins even though the later one is identical");
}

#[test]
fn unknown_name_is_not_found_not_an_error() {
    let resolver = resolver(Arc::new(TableEmbedder::new(&[])));
    assert!(resolver.resolve("Initech").unwrap().is_none());
}

#[test]
fn product_one_character_longer_resolves_via_fuzzy_path() {
    let store = InMemoryStore::new().with_company(CompanyRecord::new(20, "Naver Corporation", json!({ "products": [{ "name": "Navers" }] })));
    let resolver = CompanyResolver::new(Arc::new(store), NameMatcher::new(Arc::new(TableEmbedder::new(&[]))));
    let hit = resolver.resolve("Naver").unwrap().expect("resolved");
    assert_eq!(hit.company_id(), 20);
    assert_eq!(hit.path, MatchPath::Fuzzy { product: "Navers".to_string() });
}

#[test]
fn bad_product_entry_does_not_hide_earlier_products() {
    let store = InMemoryStore::new()
        .with_company(CompanyRecord::new(30, "Acme", json!({ "products": [{ "name": "AcmeCloud" }, 7] })));
    let resolver = CompanyResolver::new(Arc::new(store), NameMatcher::new(Arc::new(TableEmbedder::new(&[]))));
    let hit = resolver.resolve("AcmeCloud").unwrap().expect("resolved");
    assert_eq!(hit.company_id(), 30);
    assert_eq!(hit.path, MatchPath::Fuzzy { product: "AcmeCloud".to_string() });
}
