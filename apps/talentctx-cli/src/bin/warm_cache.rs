use std::env;

use indicatif::{ProgressBar, ProgressStyle};
use talentctx_cli::{init_tracing, load_context, usage_exit};
use talentctx_vector::{IndexOrigin, NewsIndexCache};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().skip(1).collect();
    let mut limit = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--limit" => {
                let Some(n) = args.get(i + 1).and_then(|s| s.parse::<usize>().ok()) else { usage_exit(&["Error: --limit requires a number"]) };
                limit = Some(n);
                i += 1;
            }
            _ => usage_exit(&["Usage: talentctx-warm-cache [--limit N]"]),
        }
        i += 1;
    }

    let ctx = load_context()?;
    let cache = NewsIndexCache::open(&ctx.settings.index_dir(), ctx.embedder, ctx.store.clone(), ctx.settings.cache.staleness).await?;
    let ids: Vec<_> = ctx.store.companies().iter().map(|c| c.id).take(limit.unwrap_or(usize::MAX)).collect();

    let pb = ProgressBar::new(ids.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} companies {msg}")?
            .progress_chars("#>-"),
    );
    let (mut built, mut loaded, mut empty, mut failed) = (0usize, 0usize, 0usize, 0usize);
    for id in ids {
        pb.set_message(format!("company {id}"));
        match cache.get_or_build(id).await {
            Ok(Some(c)) if c.origin == IndexOrigin::Built => built += 1,
            Ok(Some(_)) => loaded += 1,
            Ok(None) => empty += 1,
            Err(e) => {
                tracing::warn!(company_id = id, error = %e, "index build failed");
                failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");
    println!("built {built}, already cached {loaded}, without news {empty}, failed {failed}");
    Ok(())
}
