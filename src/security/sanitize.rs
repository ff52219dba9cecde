//! Input sanitization for arbitrary nested JSON values.
//!
//! # Responsibilities
//! - Strip document-store operator injection from object keys
//! - Strip inline script tags and path-traversal runs from string leaves
//! - Trim surrounding whitespace
//!
//! # Design Decisions
//! - Applied before schema validation, so contracts always see clean input
//! - Idempotent: string cleaning loops to a fixpoint so that stripping one
//!   pattern can never uncover a fresh one on the next pass

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static SCRIPT_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<\s*script\b[^>]*>.*?<\s*/\s*script\s*>").expect("script tag pattern"));
static SCRIPT_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<\s*/?\s*script\b[^>]*>").expect("script fragment pattern"));
static TRAVERSAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.\.[/\\]").expect("traversal pattern"));

/// Recursively sanitize every string leaf of a JSON value.
///
/// Object keys that look like document-store operators (`$`-prefixed or
/// dotted) are dropped outright; the value under such a key is never kept.
pub fn clean(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(clean_string(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(clean).collect()),
        Value::Object(entries) => {
            let mut cleaned = Map::with_capacity(entries.len());
            for (key, val) in entries {
                if is_operator_key(&key) {
                    continue;
                }
                cleaned.insert(clean_string(&key), clean(val));
            }
            Value::Object(cleaned)
        }
        other => other,
    }
}

/// Clean a single string: strip script tags, traversal runs and null
/// bytes, then trim. Loops until the output stops changing.
pub fn clean_string(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let mut next = SCRIPT_TAG.replace_all(&current, "").into_owned();
        next = SCRIPT_FRAGMENT.replace_all(&next, "").into_owned();
        next = TRAVERSAL.replace_all(&next, "").into_owned();
        next = next.replace('\0', "");
        let next = next.trim().to_string();
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Keys the document store would interpret as operators or field paths.
fn is_operator_key(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_script_tags() {
        assert_eq!(clean_string("hello <script>alert(1)</script> world"), "hello  world");
    }

    #[test]
    fn strips_unclosed_script_fragment() {
        assert_eq!(clean_string("<script src='x'>payload"), "payload");
    }

    #[test]
    fn collapses_path_traversal() {
        assert_eq!(clean_string("../../etc/passwd"), "etc/passwd");
        assert_eq!(clean_string("..\\..\\windows"), "windows");
    }

    #[test]
    fn trims_whitespace_and_null_bytes() {
        assert_eq!(clean_string("  name\0  "), "name");
    }

    #[test]
    fn drops_operator_keys() {
        let input = json!({
            "name": "alice",
            "$where": "this.secret",
            "profile.role": "admin",
            "nested": { "$gt": 0, "ok": "yes" }
        });
        let cleaned = clean(input);
        assert_eq!(
            cleaned,
            json!({ "name": "alice", "nested": { "ok": "yes" } })
        );
    }

    #[test]
    fn idempotent_on_nested_evasion() {
        // Stripping the inner tag would re-form "<script>" in a single
        // pass; the fixpoint loop removes it entirely.
        let once = clean_string("<scr<script>ipt>alert(1)</script>");
        let twice = clean_string(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn idempotent_on_plain_input() {
        for input in ["hello world", "user@example.com", "a/b/c", "  padded  "] {
            let once = clean_string(input);
            assert_eq!(clean_string(&once), once);
        }
    }

    #[test]
    fn leaves_non_string_scalars_alone() {
        let input = json!({ "count": 3, "ratio": 0.5, "active": true, "gone": null });
        assert_eq!(clean(input.clone()), input);
    }

    #[test]
    fn cleans_array_elements() {
        let input = json!(["ok", "../..//tmp", { "$set": 1 }]);
        assert_eq!(clean(input), json!(["ok", "/tmp", {}]));
    }
}
