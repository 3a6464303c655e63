//! Shared start-up for the command-line tools.
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use talentctx_core::config::{Config, Settings};
use talentctx_core::store::InMemoryStore;
use talentctx_core::traits::Embedder;
use talentctx_embed::get_default_embedder;

/// Logs go to stderr so stdout stays machine-readable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

pub struct AppContext {
    pub settings: Settings,
    pub store: Arc<InMemoryStore>,
    pub embedder: Arc<dyn Embedder>,
}

pub fn load_context() -> anyhow::Result<AppContext> {
    let settings = Config::load()?.settings()?;
    let data_dir = settings.data_dir();
    let store = InMemoryStore::load_dir(&data_dir)?;
    info!(data_dir = %data_dir.display(), companies = store.companies().len(), "store loaded");
    let embedder = get_default_embedder(&settings.embedding)?;
    Ok(AppContext { settings, store: Arc::new(store), embedder })
}

pub fn usage_exit(lines: &[&str]) -> ! {
    for line in lines { eprintln!("{line}"); }
    std::process::exit(1);
}
