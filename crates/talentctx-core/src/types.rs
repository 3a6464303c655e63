//! Domain types shared by the resolver, the extractor and the vector cache.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::window::EmploymentWindow;

pub type CompanyId = i64;

/// Canonical company record as held by the company store.
///
/// `data` is the nested evidence document exactly as stored:
/// - `products[]` with `name`
/// - `investment.data[]`, `finance.data[]`, `organization.data[]`
/// - `base_company_info.data.seedCorp.corpIntroKr`
///
/// Records come from an external store and are not trusted to be
/// well-formed, so nested fields are read through accessors that report a
/// [`RecordDefect`] instead of failing the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyRecord {
    pub id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub name: String,
}

/// Why a record (or part of one) was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDefect {
    Missing(&'static str),
    Malformed { field: &'static str, reason: String },
}

impl std::fmt::Display for RecordDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "missing field '{field}'"),
            Self::Malformed { field, reason } => write!(f, "malformed field '{field}': {reason}"),
        }
    }
}

impl CompanyRecord {
    pub fn new(id: CompanyId, name: impl Into<String>, data: Value) -> Self {
        Self { id, name: name.into(), data }
    }

    /// Product names in stored order. Entries without a string `name` are
    /// dropped and non-object entries are skipped with a warning; only a
    /// missing or non-list `products` is a defect of the whole list.
    pub fn products(&self) -> std::result::Result<Vec<Product>, RecordDefect> {
        let raw = self.data.get("products").ok_or(RecordDefect::Missing("products"))?;
        let items = raw.as_array().ok_or_else(|| RecordDefect::Malformed {
            field: "products",
            reason: format!("expected a list, found {}", json_kind(raw)),
        })?;
        let mut products = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let Some(obj) = item.as_object() else {
                warn!(company_id = self.id, entry = i, found = json_kind(item), "skipping non-object product entry");
                continue;
            };
            if let Some(name) = obj.get("name").and_then(Value::as_str) {
                products.push(Product { name: name.to_string() });
            }
        }
        Ok(products)
    }

    /// Entries of `<category>.data[]`, e.g. `investment`. `None` when the
    /// category is absent or not shaped as `{ "data": [...] }`.
    pub fn category_entries(&self, category: &str) -> Option<&[Value]> {
        self.data.get(category)?.get("data")?.as_array().map(Vec::as_slice)
    }

    pub fn description(&self) -> Option<&str> {
        self.data
            .get("base_company_info")?
            .get("data")?
            .get("seedCorp")?
            .get("corpIntroKr")?
            .as_str()
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// A single news headline for one company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    pub company_id: CompanyId,
    pub title: String,
    pub published: NaiveDate,
}

impl NewsItem {
    /// The document string that gets embedded and returned by retrieval.
    pub fn document(&self) -> String {
        format!("{} ({})", self.title, self.published.format("%Y-%m-%d"))
    }
}

/// One entry of a candidate's career history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CareerPosition {
    pub company: String,
    pub title: String,
    /// `YYYY-MM`
    pub start: String,
    /// `YYYY-MM`, or `None` while still employed.
    pub end: Option<String>,
}

impl CareerPosition {
    pub fn window(&self) -> Result<EmploymentWindow> {
        EmploymentWindow::parse(&self.start, self.end.as_deref())
            .map_err(|e| Error::Malformed(format!("position at '{}': {}", self.company, e)))
    }

    pub fn end_label(&self) -> &str {
        self.end.as_deref().unwrap_or(crate::window::PRESENT)
    }
}

/// Evidence gathered for one position.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceBundle {
    pub structured_docs: Vec<String>,
    pub news_docs: Vec<String>,
}
