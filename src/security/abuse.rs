//! Abuse detection over the raw request surface.
//!
//! # Responsibilities
//! - Scan the request URL and serialized headers for injection signatures
//! - Flag on any match; the pipeline short-circuits with a 400
//!
//! # Design Decisions
//! - Coarse pre-filter, not a WAF replacement; false positives are the
//!   accepted cost of defense in depth
//! - Signatures are an ordered, replaceable rule list so the set can be
//!   extended without touching pipeline control flow

use axum::http::{HeaderMap, Uri};
use regex::Regex;

/// A single named signature. The name shows up in logs when it fires.
pub struct SignatureRule {
    pub name: &'static str,
    pub pattern: Regex,
}

impl SignatureRule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("signature pattern"),
        }
    }
}

/// Scans request metadata against a fixed, ordered signature list.
pub struct AbuseDetector {
    rules: Vec<SignatureRule>,
}

impl AbuseDetector {
    /// Detector with the built-in signature set.
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    /// Detector with a caller-supplied rule list, checked in order.
    pub fn with_rules(rules: Vec<SignatureRule>) -> Self {
        Self { rules }
    }

    /// Pure scan; returns the name of the first matching signature.
    pub fn is_suspicious(&self, target: &str) -> Option<&'static str> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(target))
            .map(|rule| rule.name)
    }
}

impl Default for AbuseDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Concatenate the request URL and a serialized form of its headers into
/// the single string the detector scans.
pub fn scan_target(uri: &Uri, headers: &HeaderMap) -> String {
    let mut target = uri.to_string();
    for (name, value) in headers {
        target.push('\n');
        target.push_str(name.as_str());
        target.push('=');
        target.push_str(value.to_str().unwrap_or(""));
    }
    target
}

fn default_rules() -> Vec<SignatureRule> {
    vec![
        SignatureRule::new(
            "sql-keywords",
            r"(?i)(\bunion\b\s+\bselect\b|\bselect\b.+\bfrom\b|\bdrop\b\s+\btable\b|\binsert\b\s+\binto\b)",
        ),
        SignatureRule::new("script-tag", r"(?i)<\s*script|%3c\s*script"),
        SignatureRule::new("javascript-uri", r"(?i)javascript\s*:"),
        SignatureRule::new("template-injection", r"\{\{.+\}\}|%7b%7b"),
        SignatureRule::new("path-traversal", r"(?i)(\.\./|\.\.\\|%2e%2e%2f)"),
        SignatureRule::new("eval-call", r"(?i)\beval\s*\("),
        SignatureRule::new("cookie-manipulation", r"(?i)document\s*\.\s*(cookie|domain)"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn detector() -> AbuseDetector {
        AbuseDetector::new()
    }

    #[test]
    fn flags_sql_keyword_sequences() {
        assert_eq!(
            detector().is_suspicious("/api?q=1 UNION SELECT password"),
            Some("sql-keywords")
        );
        assert_eq!(
            detector().is_suspicious("/api?q=select id from accounts"),
            Some("sql-keywords")
        );
    }

    #[test]
    fn flags_script_tags_and_js_uris() {
        assert_eq!(
            detector().is_suspicious("/search?q=<script>alert(1)</script>"),
            Some("script-tag")
        );
        assert_eq!(
            detector().is_suspicious("/search?q=%3Cscript%3E"),
            Some("script-tag")
        );
        assert_eq!(
            detector().is_suspicious("/redirect?to=javascript:alert(1)"),
            Some("javascript-uri")
        );
    }

    #[test]
    fn flags_template_braces_traversal_eval_and_cookies() {
        assert!(detector().is_suspicious("/render?tpl={{7*7}}").is_some());
        assert!(detector().is_suspicious("/files/../../etc/passwd").is_some());
        assert!(detector().is_suspicious("/run?cmd=eval(payload)").is_some());
        assert!(detector().is_suspicious("/x?v=document.cookie").is_some());
    }

    #[test]
    fn clean_requests_pass() {
        for target in [
            "/api/agents?page=2&limit=50",
            "/api/trust/declarations/3f2c",
            "/api/auth/login",
        ] {
            assert_eq!(detector().is_suspicious(target), None);
        }
    }

    #[test]
    fn scan_target_includes_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("<script>probe"));
        let uri: Uri = "/api/agents".parse().unwrap();
        let target = scan_target(&uri, &headers);
        assert_eq!(detector().is_suspicious(&target), Some("script-tag"));
    }

    #[test]
    fn rule_order_is_respected() {
        // Traversal plus SQL in one URL reports the earlier rule.
        assert_eq!(
            detector().is_suspicious("/q?v=union select ../../x"),
            Some("sql-keywords")
        );
    }
}
