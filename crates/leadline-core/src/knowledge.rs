//! Company knowledge base.
//!
//! Structured facts about the company, its services and products. Loaded
//! once at startup and shared read-only by every component that needs it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{LeadlineError, Result};
use crate::types::{FragmentCategory, KnowledgeFragment};

const BUILTIN_DATA: &str = include_str!("../data/company_data.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub description: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Services {
    pub general: String,
    #[serde(default)]
    pub specific: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Technologies {
    #[serde(default)]
    pub frontend: Vec<String>,
    #[serde(default)]
    pub backend: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomSolutions {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub development_process: Vec<String>,
    #[serde(default)]
    pub industries_served: Vec<String>,
    #[serde(default)]
    pub technologies: Technologies,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub description: String,
    pub use_case: String,
}

/// Immutable company dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub company: Company,
    #[serde(default)]
    pub services: Services,
    #[serde(default)]
    pub custom_solutions: CustomSolutions,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl KnowledgeBase {
    /// Load the dataset from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let kb = Self::from_json(&content)?;
        info!(
            path = %path.display(),
            products = kb.products.len(),
            "Knowledge base loaded"
        );
        Ok(kb)
    }

    /// Parse the dataset from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let kb: KnowledgeBase = serde_json::from_str(json)
            .map_err(|e| LeadlineError::Knowledge(format!("invalid company data: {e}")))?;
        if kb.company.name.trim().is_empty() {
            return Err(LeadlineError::Knowledge("company name is empty".into()));
        }
        Ok(kb)
    }

    /// The dataset compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_DATA)
    }

    /// Corpus for the similarity index: the company description followed by
    /// one fragment per product.
    pub fn fragments(&self) -> Vec<KnowledgeFragment> {
        let mut out = Vec::with_capacity(self.products.len() + 1);
        out.push(KnowledgeFragment {
            text: self.company.description.clone(),
            category: FragmentCategory::CompanyInfo,
        });
        for product in &self.products {
            out.push(KnowledgeFragment {
                text: format!("{}: {}", product.name, product.description),
                category: FragmentCategory::Product,
            });
        }
        out
    }

    /// Keyword-driven context assembled from the structured data.
    ///
    /// Returns `None` when nothing in the query matches a rule.
    pub fn rule_context(&self, query: &str) -> Option<String> {
        let q = query.to_lowercase();
        let has = |kw: &str| q.contains(kw);
        let mut parts: Vec<String> = Vec::new();

        // First matching product rule wins.
        if has("inventory") {
            if let Some(p) = self.product_for("inventory") {
                parts.push(format!("{}: {}", p.name, p.description));
            }
        } else if has("erp") {
            if let Some(p) = self.product_for("erp") {
                parts.push(format!("{}: {}", p.name, p.description));
            }
        } else if has("management") {
            parts.push("We offer specialized management solutions tailored to your business needs.".into());
        }

        if has("app") || has("mobile") {
            parts.push("We offer comprehensive mobile app development services.".into());
        } else if has("web") || has("website") {
            parts.push("Our web development team specializes in creating modern, responsive websites.".into());
        }

        let tech = &self.custom_solutions.technologies;
        if (has("app") || has("mobile")) && !tech.frontend.is_empty() {
            parts.push(format!(
                "We work with technologies including: {}",
                tech.frontend.join(", ")
            ));
        } else if (has("backend") || has("server")) && !tech.backend.is_empty() {
            parts.push(format!(
                "We work with technologies including: {}",
                tech.backend.join(", ")
            ));
        }

        if ["price", "cost", "quote", "how much"].iter().any(|kw| has(kw)) {
            parts.push(
                "Pricing depends on project scope; we provide a free quote once we understand your requirements."
                    .into(),
            );
        }

        if ["service", "consulting", "development", "solution"]
            .iter()
            .any(|kw| has(kw))
            && !self.services.general.is_empty()
        {
            parts.push(self.services.general.clone());
        }

        if has("location") || has("where") || has("address") || has("office") {
            parts.push(format!("We are located at {}.", self.company.location));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// Products ranked by keyword relevance to the query, best first.
    /// Products with no overlap are omitted.
    pub fn relevant_products(&self, query: &str) -> Vec<&Product> {
        let q = query.to_lowercase();
        let words: Vec<&str> = q.split_whitespace().collect();

        let mut scored: Vec<(f64, &Product)> = self
            .products
            .iter()
            .filter_map(|p| {
                let mut score = 0.0;
                if q.contains(&p.name.to_lowercase()) {
                    score += 2.0;
                }
                let desc = p.description.to_lowercase();
                if words.iter().any(|w| desc.contains(w)) {
                    score += 1.0;
                }
                if q.contains(&p.use_case.to_lowercase()) {
                    score += 1.5;
                }
                (score > 0.0).then_some((score, p))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(_, p)| p).collect()
    }

    /// Bulleted services summary used for service enquiries.
    pub fn services_summary(&self) -> String {
        let mut out = self.services.general.clone();
        for item in &self.services.specific {
            out.push_str("\n- ");
            out.push_str(item);
        }
        out
    }

    /// Numbered development process summary.
    pub fn process_summary(&self) -> String {
        let mut out = String::from("Our development process:");
        for (i, step) in self.custom_solutions.development_process.iter().enumerate() {
            out.push_str(&format!("\n{}. {}", i + 1, step));
        }
        out
    }

    /// Name or use case match beats a passing mention in a description.
    fn product_for(&self, keyword: &str) -> Option<&Product> {
        self.products
            .iter()
            .find(|p| {
                p.name.to_lowercase().contains(keyword)
                    || p.use_case.to_lowercase().contains(keyword)
            })
            .or_else(|| {
                self.products
                    .iter()
                    .find(|p| p.description.to_lowercase().contains(keyword))
            })
    }
}
