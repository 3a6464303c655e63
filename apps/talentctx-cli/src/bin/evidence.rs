use std::{env, fs, path::PathBuf};

use chrono::NaiveDate;
use talentctx_cli::{init_tracing, load_context, usage_exit};
use talentctx_core::types::CareerPosition;
use talentctx_pipeline::EvidencePipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().collect();
    let usage = [
        "Usage: talentctx-evidence <positions.json> [--today YYYY-MM-DD]",
        "  positions.json: [{\"company\": \"Acme\", \"title\": \"Engineer\", \"start\": \"2020-01\", \"end\": null}]",
    ];
    let mut input = None;
    let mut today = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--today" => {
                let Some(raw) = args.get(i + 1) else { usage_exit(&usage) };
                let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") else { usage_exit(&["Error: --today requires a YYYY-MM-DD date"]) };
                today = Some(date);
                i += 1;
            }
            arg if !arg.starts_with('-') => input = Some(PathBuf::from(arg)),
            _ => usage_exit(&usage),
        }
        i += 1;
    }
    let Some(input) = input else { usage_exit(&usage) };

    let positions: Vec<CareerPosition> = serde_json::from_str(&fs::read_to_string(&input)?)?;
    let ctx = load_context()?;
    let mut pipeline = EvidencePipeline::from_settings(&ctx.settings, ctx.store.clone(), ctx.store.clone(), ctx.embedder).await?;
    if let Some(today) = today { pipeline = pipeline.with_today(today); }

    let out = pipeline.enrich(&positions).await;
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
