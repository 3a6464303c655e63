use talentctx_core::config::EmbeddingSettings;
use talentctx_embed::{get_default_embedder, FakeEmbedder};
use talentctx_core::traits::Embedder;

#[test]
fn fake_embedder_shapes_and_determinism() {
    let settings = EmbeddingSettings { use_fake: true, ..EmbeddingSettings::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    let texts = vec!["Acme raises Series B".to_string(), "Acme raises Series B".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 1024, "embedding dim is 1024");
    assert_eq!(embedder.dim(), 1024);

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn single_and_batch_variants_agree() {
    let embedder = FakeEmbedder::new(64);
    let single = embedder.embed("AcmeCloud launch").expect("embed");
    let batch = embedder.embed_batch(&["AcmeCloud launch".to_string()]).expect("embed_batch");
    assert_eq!(single, batch[0]);
    assert!(embedder.embedder_id().ends_with("d64"));
}
