use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use talentctx_core::traits::CompanyStore;
use talentctx_core::types::{CompanyId, CompanyRecord};

use crate::matcher::{MatchPolicy, NameMatcher};

/// Which step of resolution produced the company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchPath {
    Exact,
    Fuzzy { product: String },
    Semantic { product: String },
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub company: CompanyRecord,
    pub path: MatchPath,
}

impl Resolution {
    pub fn company_id(&self) -> CompanyId { self.company.id }
}

/// Free-text employer name → canonical company record.
///
/// Exact (case-sensitive) name lookup first. Otherwise every record is
/// scanned in store order and the first product whose name matches (fuzzy,
/// then semantic) wins; there is no best-score ranking. An unresolved name
/// is `Ok(None)`; only store read failures are errors.
#[derive(Clone)]
pub struct CompanyResolver {
    store: Arc<dyn CompanyStore>,
    matcher: NameMatcher,
}

impl CompanyResolver {
    pub fn new(store: Arc<dyn CompanyStore>, matcher: NameMatcher) -> Self { Self { store, matcher } }

    pub fn resolve(&self, company_name: &str) -> Result<Option<Resolution>> {
        if let Some(company) = self.store.find_by_name(company_name)? {
            return Ok(Some(Resolution { company, path: MatchPath::Exact }));
        }

        info!(company_name, "no company with this exact name; matching against product names");
        for candidate in self.store.scan()? {
            let products = match candidate.products() {
                Ok(products) => products,
                Err(defect) => {
                    warn!(company_id = candidate.id, %defect, "skipping candidate during product scan");
                    continue;
                }
            };
            for product in products {
                let Some(policy) = self.matcher.matches(company_name, &product.name) else { continue };
                info!(company_name, product = %product.name, company_id = candidate.id, ?policy, "product match");
                let path = match policy {
                    MatchPolicy::Fuzzy => MatchPath::Fuzzy { product: product.name },
                    MatchPolicy::Semantic => MatchPath::Semantic { product: product.name },
                };
                return Ok(Some(Resolution { company: candidate, path }));
            }
        }

        warn!(company_name, "no company or product matched");
        Ok(None)
    }
}
