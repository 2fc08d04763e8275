//! LLM-backed query planning: language detection, translation, and retrieval filters.
//!
//! The planner sends one low-temperature exchange to the generation provider and
//! parses the reply strictly into [`QueryPlan`]. There is deliberately no repair
//! pass: a reply that is not plain JSON of the documented shape is a provider
//! failure, not something to patch around. Optional fields degrade gracefully
//! instead (no translation means the original query is used downstream, absent
//! filter lists are empty).

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use crate::corpus::normalize_tag_list;
use crate::generation::{GenerationClient, GenerationClientError};

const PLANNER_SYSTEM_PROMPT: &str = "\
You are the retrieval planner for a financial-advice knowledge base. Given a user \
query, detect its language, translate it to English when it is not English, and \
derive optional retrieval filters. Respond with a single JSON object and nothing \
else, shaped exactly like this: {\"language\": \"English\", \"translatedQuery\": \
\"...\", \"filters\": {\"docIds\": [], \"tags\": [], \"mustInclude\": [], \
\"exclude\": []}}. Known tags include emergency-fund, budgeting, saving, investing, \
retirement, debt, credit, insurance and taxes. Only add a filter when the query \
itself justifies it.";

/// Errors raised while planning a query.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The generation provider failed outright.
    #[error(transparent)]
    Generation(#[from] GenerationClientError),
    /// Provider output was not the documented JSON shape.
    #[error("Planner returned malformed JSON: {0}")]
    MalformedPlan(String),
}

/// Structured plan derived from one query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Language the provider detected, when reported.
    pub language: Option<String>,
    /// English translation of the query, when the provider supplied one.
    pub translated_query: Option<String>,
    /// Normalized retrieval filters.
    pub filters: PlanFilters,
}

/// Conjunctive retrieval filters proposed by the planner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanFilters {
    /// Restrict candidates to these document ids.
    pub doc_ids: Vec<String>,
    /// Restrict candidates to chunks carrying any of these tags.
    pub tags: Vec<String>,
    /// Terms that must all occur in the chunk text.
    pub must_include: Vec<String>,
    /// Terms that must not occur in the chunk text.
    pub exclude: Vec<String>,
}

impl PlanFilters {
    /// True when no list narrows the candidate set.
    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
            && self.tags.is_empty()
            && self.must_include.is_empty()
            && self.exclude.is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    translated_query: Option<String>,
    #[serde(default)]
    filters: RawFilters,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFilters {
    #[serde(default)]
    doc_ids: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    must_include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

/// Ask the generation provider to plan `query` and strictly parse the reply.
pub async fn plan_query(
    client: &(dyn GenerationClient + Send + Sync),
    query: &str,
) -> Result<QueryPlan, PlanError> {
    let raw = client.generate(PLANNER_SYSTEM_PROMPT, query).await?;
    parse_plan(&raw)
}

/// Parse and normalize one raw planner reply.
pub fn parse_plan(raw: &str) -> Result<QueryPlan, PlanError> {
    let response: PlanResponse =
        serde_json::from_str(raw).map_err(|error| PlanError::MalformedPlan(error.to_string()))?;

    Ok(QueryPlan {
        language: response.language.and_then(non_blank),
        translated_query: response.translated_query.and_then(non_blank),
        filters: PlanFilters {
            doc_ids: normalize_terms(response.filters.doc_ids),
            tags: normalize_tag_list(response.filters.tags),
            must_include: normalize_terms(response.filters.must_include),
            exclude: normalize_terms(response.filters.exclude),
        },
    })
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Trim, drop empties, and dedupe case-insensitively while preserving order and
/// original case. Text filters compare case-insensitively downstream, so keeping
/// the provider's casing is purely cosmetic.
fn normalize_terms(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut terms = Vec::new();
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            terms.push(trimmed.to_string());
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticPlanner(&'static str);

    #[async_trait]
    impl GenerationClient for StaticPlanner {
        async fn generate(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
        ) -> Result<String, GenerationClientError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn parses_the_full_shape() {
        let plan = parse_plan(
            r#"{
                "language": "Spanish",
                "translatedQuery": "how do I start an emergency fund",
                "filters": {
                    "docIds": ["doc-emergency"],
                    "tags": ["Emergency-Fund"],
                    "mustInclude": ["fund"],
                    "exclude": ["crypto"]
                }
            }"#,
        )
        .expect("plan parses");

        assert_eq!(plan.language.as_deref(), Some("Spanish"));
        assert_eq!(
            plan.translated_query.as_deref(),
            Some("how do I start an emergency fund")
        );
        assert_eq!(plan.filters.doc_ids, vec!["doc-emergency"]);
        assert_eq!(plan.filters.tags, vec!["emergency-fund"]);
        assert_eq!(plan.filters.must_include, vec!["fund"]);
        assert_eq!(plan.filters.exclude, vec!["crypto"]);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let plan = parse_plan("{}").expect("empty object parses");
        assert!(plan.language.is_none());
        assert!(plan.translated_query.is_none());
        assert!(plan.filters.is_empty());
    }

    #[test]
    fn blank_translation_counts_as_missing() {
        let plan = parse_plan(r#"{"translatedQuery": "   "}"#).expect("plan parses");
        assert!(plan.translated_query.is_none());
    }

    #[test]
    fn markdown_fences_are_rejected_not_repaired() {
        let error = parse_plan("```json\n{}\n```").expect_err("fenced output fails");
        assert!(matches!(error, PlanError::MalformedPlan(_)));
    }

    #[test]
    fn wrong_types_are_rejected() {
        let error = parse_plan(r#"{"filters": {"tags": "debt"}}"#).expect_err("wrong type fails");
        assert!(matches!(error, PlanError::MalformedPlan(_)));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let plan = parse_plan(r#"{"confidence": 0.9, "filters": {"tags": ["debt"]}}"#)
            .expect("extra fields tolerated");
        assert_eq!(plan.filters.tags, vec!["debt"]);
    }

    #[test]
    fn filter_lists_are_normalized() {
        let plan = parse_plan(
            r#"{"filters": {
                "docIds": ["a", "a", " b "],
                "tags": [" Debt ", "debt", ""],
                "mustInclude": ["  ", "Fund", "fund"],
                "exclude": []
            }}"#,
        )
        .expect("plan parses");

        assert_eq!(plan.filters.doc_ids, vec!["a", "b"]);
        assert_eq!(plan.filters.tags, vec!["debt"]);
        assert_eq!(plan.filters.must_include, vec!["Fund"]);
        assert!(plan.filters.exclude.is_empty());
    }

    #[tokio::test]
    async fn plan_query_runs_the_provider_roundtrip() {
        let client = StaticPlanner(r#"{"language": "English", "filters": {"tags": ["debt"]}}"#);
        let plan = plan_query(&client, "how to pay off loans fast")
            .await
            .expect("plan");
        assert_eq!(plan.language.as_deref(), Some("English"));
        assert_eq!(plan.filters.tags, vec!["debt"]);
        assert!(plan.translated_query.is_none());
    }
}
