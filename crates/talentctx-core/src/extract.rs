//! Time-windowed structured evidence for one employment period.
//!
//! Output is a flat list of human-readable lines: the period header first,
//! then investment, finance, organization and description lines, each
//! category in source order. A record with an unparsable date or a missing
//! required field is skipped on its own; extraction itself never fails.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::types::CompanyRecord;
use crate::window::{EmploymentWindow, YearMonth};

pub fn extract(company: &CompanyRecord, window: &EmploymentWindow, today: NaiveDate) -> Vec<String> {
    let mut docs = vec![format!(
        "{} employment period: {} ~ {}",
        company.name,
        window.start,
        window.end_label()
    )];
    docs.extend(investment_lines(company, window, today));
    docs.extend(finance_lines(company, window, today));
    docs.extend(organization_lines(company, window, today));
    if let Some(intro) = company.description() {
        docs.push(format!("Company description: {intro}"));
    }
    docs
}

fn investment_lines(company: &CompanyRecord, window: &EmploymentWindow, today: NaiveDate) -> Vec<String> {
    let Some(entries) = company.category_entries("investment") else { return Vec::new() };
    let mut out = Vec::new();
    for entry in entries {
        let Some(raw_date) = entry.get("investAt").and_then(Value::as_str) else {
            debug!(company_id = company.id, "investment entry without investAt; skipped");
            continue;
        };
        let Ok(invest_at) = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") else {
            debug!(company_id = company.id, raw_date, "unparsable investAt; skipped");
            continue;
        };
        if !window.contains(invest_at, today) {
            continue;
        }
        let Some(level) = entry.get("level").filter(|v| !v.is_null()) else {
            debug!(company_id = company.id, raw_date, "investment entry without level; skipped");
            continue;
        };
        let amount = entry.get("investmentAmount").map(display_value).unwrap_or_default();
        let investors = entry
            .get("investor")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .map(|i| i.get("name").map(display_value).unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        out.push(format!(
            "{raw_date}; {}; total investment: {amount}; investors: {investors}",
            display_value(level)
        ));
    }
    out
}

fn finance_lines(company: &CompanyRecord, window: &EmploymentWindow, today: NaiveDate) -> Vec<String> {
    let Some(entries) = company.category_entries("finance") else { return Vec::new() };
    entries
        .iter()
        .filter_map(|entry| {
            let year = entry.get("year").and_then(Value::as_i64).and_then(|y| i32::try_from(y).ok());
            let Some(as_of) = year.and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)) else {
                debug!(company_id = company.id, "finance entry without a usable year; skipped");
                return None;
            };
            window.contains(as_of, today).then(|| {
                format!(
                    "{} capital: {}, net profit: {}",
                    as_of.format("%Y"),
                    entry.get("capital").map(display_value).unwrap_or_default(),
                    entry.get("netProfit").map(display_value).unwrap_or_default(),
                )
            })
        })
        .collect()
}

fn organization_lines(company: &CompanyRecord, window: &EmploymentWindow, today: NaiveDate) -> Vec<String> {
    let Some(entries) = company.category_entries("organization") else { return Vec::new() };
    let mut out = Vec::new();
    for entry in entries {
        let month = entry
            .get("referenceMonth")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse::<YearMonth>().ok().map(|ym| (raw, ym)));
        let Some((raw_month, ym)) = month else {
            debug!(company_id = company.id, "organization entry without a usable referenceMonth; skipped");
            continue;
        };
        if !window.contains(ym.first_day(), today) {
            continue;
        }
        let headcount = match entry.get("value").filter(|v| !v.is_null()) {
            Some(value) => display_value(value),
            None => {
                debug!(company_id = company.id, raw_month, "organization entry without value");
                "unknown".to_string()
            }
        };
        out.push(format!("{raw_month} headcount: {headcount}"));
    }
    out
}

/// Strings verbatim, numbers and other scalars via their JSON text, null as empty.
fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
