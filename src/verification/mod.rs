//! Document verification
//!
//! Rules-based check deciding whether a document is financial.
//! Deterministic; the language model is not consulted.

use crate::document::NormalizedDocument;
use crate::models::{DocumentVerdict, DocumentVerification, VerificationCheck};
use chrono::Utc;
use tracing::info;

/// Trait for verification rules
pub trait VerificationRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn verify(&self, document: &NormalizedDocument) -> VerificationCheckResult;
}

pub struct VerificationCheckResult {
    pub passed: bool,
    pub details: String,
}

/// Verification engine that enforces rules
pub struct VerificationEngine {
    rules: Vec<Box<dyn VerificationRule>>,
}

impl VerificationEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule(&mut self, rule: Box<dyn VerificationRule>) {
        self.rules.push(rule);
    }

    /// A document is valid only if every rule passes
    pub fn verify(&self, document: &NormalizedDocument) -> DocumentVerification {
        let mut checks = Vec::with_capacity(self.rules.len());
        let mut issues = Vec::new();

        for rule in &self.rules {
            let result = rule.verify(document);

            if !result.passed {
                issues.push(format!("{}: {}", rule.name(), result.details));
            }

            checks.push(VerificationCheck {
                rule_name: rule.name().to_string(),
                passed: result.passed,
                details: result.details,
            });
        }

        let verdict = if issues.is_empty() {
            DocumentVerdict::ValidFinancialDocument
        } else {
            DocumentVerdict::NotFinancialDocument
        };

        info!(
            path = %document.path.display(),
            rule_count = self.rules.len(),
            verdict = %verdict,
            "Verification completed"
        );

        DocumentVerification {
            verdict,
            checks,
            issues,
            verified_at: Utc::now(),
        }
    }
}

impl Default for VerificationEngine {
    fn default() -> Self {
        Self::new()
    }
}

//
// ================= Rules =================
//

/// Rule: extraction produced some text
pub struct NonEmptyDocumentRule;

impl VerificationRule for NonEmptyDocumentRule {
    fn name(&self) -> &'static str {
        "non_empty_document"
    }

    fn verify(&self, document: &NormalizedDocument) -> VerificationCheckResult {
        VerificationCheckResult {
            passed: !document.is_empty(),
            details: format!(
                "{} page(s), {} character(s) extracted",
                document.page_count,
                document.text.len()
            ),
        }
    }
}

/// Key metrics the analysis task extracts
pub const KEY_FINANCIAL_TERMS: &[&str] = &["revenue", "net income", "eps", "cash flow"];

const SUPPORTING_FINANCIAL_TERMS: &[&str] = &[
    "earnings per share",
    "operating income",
    "gross margin",
    "balance sheet",
    "income statement",
    "total assets",
    "liabilities",
    "shareholders' equity",
    "ebitda",
    "free cash flow",
];

/// Rule: the text mentions at least `min_matches` financial terms
pub struct FinancialTermsRule {
    min_matches: usize,
}

impl FinancialTermsRule {
    pub fn new(min_matches: usize) -> Self {
        Self {
            min_matches: min_matches.max(1),
        }
    }

    /// Terms found in the text, matched on word boundaries
    pub fn matched_terms(text: &str) -> Vec<&'static str> {
        let lowered = text.to_lowercase();

        KEY_FINANCIAL_TERMS
            .iter()
            .chain(SUPPORTING_FINANCIAL_TERMS.iter())
            .filter(|term| contains_word(&lowered, term))
            .copied()
            .collect()
    }
}

impl VerificationRule for FinancialTermsRule {
    fn name(&self) -> &'static str {
        "financial_terms_present"
    }

    fn verify(&self, document: &NormalizedDocument) -> VerificationCheckResult {
        let matched = Self::matched_terms(&document.text);

        VerificationCheckResult {
            passed: matched.len() >= self.min_matches,
            details: if matched.is_empty() {
                "No financial terms found".to_string()
            } else {
                format!("Found: {}", matched.join(", "))
            },
        }
    }
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.map_or(false, char::is_alphanumeric) && !after.map_or(false, char::is_alphanumeric)
    })
}

/// Create a default verification engine with standard rules
pub fn create_default_verification_engine() -> VerificationEngine {
    let mut engine = VerificationEngine::new();
    engine.add_rule(Box::new(NonEmptyDocumentRule));
    engine.add_rule(Box::new(FinancialTermsRule::new(1)));
    engine
}

//
// ================= Tests =================
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::content_hash;
    use std::path::PathBuf;

    fn document(text: &str, page_count: usize) -> NormalizedDocument {
        NormalizedDocument {
            path: PathBuf::from("test.pdf"),
            page_count,
            text: text.to_string(),
            content_hash: content_hash(text),
        }
    }

    #[test]
    fn test_financial_document_is_valid() {
        let engine = create_default_verification_engine();

        let result = engine.verify(&document("Q2 Revenue: 1000 Net Income: 200 Diluted EPS 0.41", 3));

        assert_eq!(result.verdict, DocumentVerdict::ValidFinancialDocument);
        assert!(result.issues.is_empty());
        assert!(result.checks.iter().all(|c| c.passed));
    }

    #[test]
    fn test_non_financial_document_is_rejected() {
        let engine = create_default_verification_engine();

        let result = engine.verify(&document("Grandma's apple pie: flour, butter, apples", 1));

        assert_eq!(result.verdict, DocumentVerdict::NotFinancialDocument);
        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].starts_with("financial_terms_present"));
    }

    #[test]
    fn test_empty_document_is_rejected() {
        let engine = create_default_verification_engine();

        let result = engine.verify(&document("", 0));

        assert_eq!(result.verdict, DocumentVerdict::NotFinancialDocument);
        assert_eq!(result.issues.len(), 2);
    }

    #[test]
    fn test_terms_match_whole_words() {
        assert!(FinancialTermsRule::matched_terms("steps forward").is_empty());
        assert_eq!(FinancialTermsRule::matched_terms("EPS: 1.2"), vec!["eps"]);
        assert_eq!(
            FinancialTermsRule::matched_terms("Free Cash Flow rose"),
            vec!["cash flow", "free cash flow"]
        );
    }

    #[test]
    fn test_min_matches_threshold() {
        let mut engine = VerificationEngine::new();
        engine.add_rule(Box::new(FinancialTermsRule::new(2)));

        let result = engine.verify(&document("Revenue grew", 1));
        assert_eq!(result.verdict, DocumentVerdict::NotFinancialDocument);

        let result = engine.verify(&document("Revenue grew and cash flow improved", 1));
        assert_eq!(result.verdict, DocumentVerdict::ValidFinancialDocument);
    }
}
