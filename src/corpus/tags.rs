//! Declarative topic tagging for untagged documents.

use std::collections::HashSet;

/// One tagging rule: the tag applies when any keyword occurs in the document text.
pub(crate) struct TagRule {
    /// Tag emitted when the rule matches.
    pub tag: &'static str,
    /// Lowercase keywords searched as substrings.
    pub keywords: &'static [&'static str],
}

/// Keyword table checked against `title + " " + content`, lowercased.
///
/// Rows are evaluated in order and matched tags collect in table order, so derived
/// tag lists are deterministic for a given document.
pub(crate) const TAG_RULES: &[TagRule] = &[
    TagRule {
        tag: "emergency-fund",
        keywords: &["emergency fund", "rainy day", "liquid savings"],
    },
    TagRule {
        tag: "budgeting",
        keywords: &["budget", "50/30/20", "spending plan", "cash flow"],
    },
    TagRule {
        tag: "saving",
        keywords: &["high-yield", "savings account", "save for"],
    },
    TagRule {
        tag: "investing",
        keywords: &["invest", "portfolio", "index fund", "etf", "stocks", "bonds"],
    },
    TagRule {
        tag: "retirement",
        keywords: &["retirement", "401(k)", "401k", "roth ira", "pension"],
    },
    TagRule {
        tag: "debt",
        keywords: &["debt", "loan", "interest rate", "avalanche", "snowball"],
    },
    TagRule {
        tag: "credit",
        keywords: &["credit score", "credit report", "credit utilization"],
    },
    TagRule {
        tag: "insurance",
        keywords: &["insurance", "premium", "deductible", "coverage"],
    },
    TagRule {
        tag: "taxes",
        keywords: &["tax", "deduction", "capital gains"],
    },
];

/// Derive tags for a document that carries none.
pub(crate) fn derive_tags(title: &str, content: &str) -> Vec<String> {
    let haystack = format!("{title} {content}").to_lowercase();
    TAG_RULES
        .iter()
        .filter(|rule| rule.keywords.iter().any(|keyword| haystack.contains(keyword)))
        .map(|rule| rule.tag.to_string())
        .collect()
}

/// Normalize a tag list: trim, lowercase, drop empties, dedupe preserving order.
pub(crate) fn normalize_tag_list(values: Vec<String>) -> Vec<String> {
    let mut unique = HashSet::new();
    let mut normalized = Vec::new();
    for tag in values {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lower = trimmed.to_lowercase();
        if unique.insert(lower.clone()) {
            normalized.push(lower);
        }
    }
    normalized
}

/// Normalize explicit document tags, returning `None` when nothing survives.
pub(crate) fn sanitize_tags(values: Option<Vec<String>>) -> Option<Vec<String>> {
    let normalized = normalize_tag_list(values?);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_tags_matches_keywords_case_insensitively() {
        let tags = derive_tags("Why an Emergency Fund matters", "Keep three months of expenses.");
        assert_eq!(tags, vec!["emergency-fund"]);
    }

    #[test]
    fn derived_tags_collect_in_table_order() {
        let tags = derive_tags("Debt payoff", "Budget first, then attack the debt avalanche.");
        // "budgeting" precedes "debt" in the rule table regardless of text order.
        assert_eq!(tags, vec!["budgeting", "debt"]);
    }

    #[test]
    fn unmatched_documents_get_no_tags() {
        assert!(derive_tags("Weather", "It rained all week.").is_empty());
    }

    #[test]
    fn normalize_tag_list_uniquifies_and_trims() {
        let tags = normalize_tag_list(vec![
            "Alpha".into(),
            " beta".into(),
            "alpha".into(),
            "".into(),
        ]);
        assert_eq!(tags, vec!["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn sanitize_tags_drops_all_blank_input() {
        assert!(sanitize_tags(Some(vec!["  ".into(), "".into()])).is_none());
        assert!(sanitize_tags(None).is_none());
    }
}
