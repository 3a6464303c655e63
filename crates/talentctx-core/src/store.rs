//! File-backed company and news store.
//!
//! Layout under a data directory:
//! - `companies/**/*.json`: one `{id, name, data}` object or a list of them
//! - `news/**/*.json`: lists of `{company_id, title, news_date}` rows
//!
//! Rows that do not parse are skipped with a warning so one bad file entry
//! does not hide the rest of the dataset.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::traits::{CompanyStore, NewsStore};
use crate::types::{CompanyId, CompanyRecord, NewsItem};

#[derive(Debug, Deserialize)]
struct NewsRow {
    company_id: CompanyId,
    title: String,
    news_date: String,
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    companies: Vec<CompanyRecord>,
    news: HashMap<CompanyId, Vec<NewsItem>>,
}

impl InMemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_company(mut self, record: CompanyRecord) -> Self {
        self.companies.push(record);
        self
    }

    pub fn with_news(mut self, company_id: CompanyId, title: impl Into<String>, published: NaiveDate) -> Self {
        self.push_news(NewsItem { company_id, title: title.into(), published });
        self
    }

    pub fn companies(&self) -> &[CompanyRecord] { &self.companies }

    /// Keeps each company's list ascending by date; equal dates keep insertion order.
    fn push_news(&mut self, item: NewsItem) {
        let list = self.news.entry(item.company_id).or_default();
        let at = list.partition_point(|n| n.published <= item.published);
        list.insert(at, item);
    }

    pub fn load_dir(data_dir: &Path) -> Result<Self> {
        let mut store = Self::new();
        for path in list_json_files(&data_dir.join("companies")) {
            for row in read_rows(&path)? {
                match serde_json::from_value::<CompanyRecord>(row) {
                    Ok(record) => store.companies.push(record),
                    Err(e) => warn!(path = %path.display(), error = %e, "skipping malformed company row"),
                }
            }
        }
        for path in list_json_files(&data_dir.join("news")) {
            for row in read_rows(&path)? {
                let parsed = serde_json::from_value::<NewsRow>(row)
                    .map_err(|e| e.to_string())
                    .and_then(|r| {
                        NaiveDate::parse_from_str(&r.news_date, "%Y-%m-%d")
                            .map(|published| NewsItem { company_id: r.company_id, title: r.title, published })
                            .map_err(|e| format!("news_date '{}': {}", r.news_date, e))
                    });
                match parsed {
                    Ok(item) => store.push_news(item),
                    Err(reason) => warn!(path = %path.display(), %reason, "skipping malformed news row"),
                }
            }
        }
        info!(
            companies = store.companies.len(),
            news = store.news.values().map(Vec::len).sum::<usize>(),
            dir = %data_dir.display(),
            "loaded company store"
        );
        Ok(store)
    }
}

fn read_rows(path: &Path) -> Result<Vec<Value>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(match value {
        Value::Array(rows) => rows,
        single => vec![single],
    })
}

fn list_json_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") { files.push(path.to_path_buf()); }
    }
    files.sort();
    files
}

impl CompanyStore for InMemoryStore {
    fn find_by_name(&self, name: &str) -> Result<Option<CompanyRecord>> {
        Ok(self.companies.iter().find(|c| c.name == name).cloned())
    }

    fn scan(&self) -> Result<Vec<CompanyRecord>> {
        Ok(self.companies.clone())
    }
}

impl NewsStore for InMemoryStore {
    fn news_for(&self, company_id: CompanyId) -> Result<Vec<NewsItem>> {
        Ok(self.news.get(&company_id).cloned().unwrap_or_default())
    }
}
