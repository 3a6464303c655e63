use std::env;

use talentctx_cli::{init_tracing, load_context, usage_exit};
use talentctx_match::{CompanyResolver, MatchPath, NameMatcher};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        usage_exit(&["Usage: talentctx-resolve <company name>", "Example: talentctx-resolve 'AcmeClod'"]);
    }
    let name = args.join(" ");

    let ctx = load_context()?;
    let resolver = CompanyResolver::new(ctx.store, NameMatcher::from_settings(ctx.embedder, &ctx.settings.matcher));
    match resolver.resolve(&name)? {
        Some(hit) => {
            let via = match &hit.path {
                MatchPath::Exact => "exact name".to_string(),
                MatchPath::Fuzzy { product } => format!("fuzzy product match '{product}'"),
                MatchPath::Semantic { product } => format!("semantic product match '{product}'"),
            };
            println!("{} -> {} (id {}) via {}", name, hit.company.name, hit.company_id(), via);
        }
        None => println!("{name} -> not found"),
    }
    Ok(())
}
