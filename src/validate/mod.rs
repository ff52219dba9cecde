//! Contract-driven schema validation.
//!
//! # Responsibilities
//! - Check sanitized body/query/route-parameter values against the
//!   contract declared on the endpoint policy
//! - Produce an ordered list of field-level errors on failure
//!
//! # Design Decisions
//! - Coercion (numeric query params arriving as strings) is opt-in per
//!   rule, never implicit in the parser
//! - The unknown-field policy is a declared contract property, not a
//!   hidden default

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// One validation failure: field path, human message, machine code.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: &'static str,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            code,
        }
    }
}

/// What to do with fields the contract does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownFields {
    /// Undeclared fields are an error.
    Strict,
    /// Undeclared fields pass through untouched (already sanitized).
    Permissive,
}

#[derive(Debug, Clone)]
enum Kind {
    String {
        min_len: Option<usize>,
        max_len: Option<usize>,
        pattern: Option<Regex>,
        one_of: Option<Vec<&'static str>>,
    },
    Integer {
        min: Option<i64>,
        max: Option<i64>,
        coerce: bool,
    },
    Number {
        coerce: bool,
    },
    Boolean {
        coerce: bool,
    },
    Array,
    Object,
}

/// A declared rule for one top-level field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: &'static str,
    required: bool,
    kind: Kind,
}

impl FieldRule {
    pub fn string(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            kind: Kind::String {
                min_len: None,
                max_len: None,
                pattern: None,
                one_of: None,
            },
        }
    }

    pub fn integer(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            kind: Kind::Integer {
                min: None,
                max: None,
                coerce: false,
            },
        }
    }

    pub fn number(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            kind: Kind::Number { coerce: false },
        }
    }

    pub fn boolean(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            kind: Kind::Boolean { coerce: false },
        }
    }

    pub fn array(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            kind: Kind::Array,
        }
    }

    pub fn object(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            kind: Kind::Object,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_len(mut self, len: usize) -> Self {
        if let Kind::String { min_len, .. } = &mut self.kind {
            *min_len = Some(len);
        }
        self
    }

    pub fn max_len(mut self, len: usize) -> Self {
        if let Kind::String { max_len, .. } = &mut self.kind {
            *max_len = Some(len);
        }
        self
    }

    pub fn pattern(mut self, expr: &str) -> Self {
        if let Kind::String { pattern, .. } = &mut self.kind {
            *pattern = Some(Regex::new(expr).expect("field pattern"));
        }
        self
    }

    pub fn one_of(mut self, values: &[&'static str]) -> Self {
        if let Kind::String { one_of, .. } = &mut self.kind {
            *one_of = Some(values.to_vec());
        }
        self
    }

    pub fn min(mut self, value: i64) -> Self {
        if let Kind::Integer { min, .. } = &mut self.kind {
            *min = Some(value);
        }
        self
    }

    pub fn max(mut self, value: i64) -> Self {
        if let Kind::Integer { max, .. } = &mut self.kind {
            *max = Some(value);
        }
        self
    }

    /// Allow string representations of this field to be parsed. Meant
    /// for query and route parameters, which always arrive as strings.
    pub fn coerce(mut self) -> Self {
        match &mut self.kind {
            Kind::Integer { coerce, .. }
            | Kind::Number { coerce }
            | Kind::Boolean { coerce } => *coerce = true,
            _ => {}
        }
        self
    }
}

/// An ordered set of field rules for one input channel.
#[derive(Debug, Clone)]
pub struct Contract {
    fields: Vec<FieldRule>,
    unknown: UnknownFields,
}

impl Contract {
    pub fn new(unknown: UnknownFields) -> Self {
        Self {
            fields: Vec::new(),
            unknown,
        }
    }

    pub fn strict() -> Self {
        Self::new(UnknownFields::Strict)
    }

    pub fn permissive() -> Self {
        Self::new(UnknownFields::Permissive)
    }

    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    /// Validate a sanitized value. `Null` input is treated as an empty
    /// object so that a missing body trips `required` errors rather than
    /// a type error. On success the returned object contains the
    /// declared fields (coerced where requested) plus, under
    /// `Permissive`, the untouched extras.
    pub fn validate(&self, input: &Value) -> Result<Value, Vec<FieldError>> {
        let empty = Map::new();
        let entries = match input {
            Value::Object(entries) => entries,
            Value::Null => &empty,
            _ => {
                return Err(vec![FieldError::new(
                    "",
                    "expected an object",
                    "invalid_type",
                )])
            }
        };

        let mut errors = Vec::new();
        let mut output = Map::new();

        for rule in &self.fields {
            match entries.get(rule.name) {
                None | Some(Value::Null) => {
                    if rule.required {
                        errors.push(FieldError::new(
                            rule.name,
                            format!("{} is required", rule.name),
                            "required",
                        ));
                    }
                }
                Some(value) => match check_field(rule, value) {
                    Ok(valid) => {
                        output.insert(rule.name.to_string(), valid);
                    }
                    Err(err) => errors.push(err),
                },
            }
        }

        for key in entries.keys() {
            if self.fields.iter().any(|rule| rule.name == key.as_str()) {
                continue;
            }
            match self.unknown {
                UnknownFields::Strict => errors.push(FieldError::new(
                    key,
                    format!("{key} is not an accepted field"),
                    "unknown_field",
                )),
                UnknownFields::Permissive => {
                    output.insert(key.clone(), entries[key].clone());
                }
            }
        }

        if errors.is_empty() {
            Ok(Value::Object(output))
        } else {
            Err(errors)
        }
    }
}

fn check_field(rule: &FieldRule, value: &Value) -> Result<Value, FieldError> {
    let name = rule.name;
    match &rule.kind {
        Kind::String {
            min_len,
            max_len,
            pattern,
            one_of,
        } => {
            let Value::String(s) = value else {
                return Err(FieldError::new(
                    name,
                    format!("{name} must be a string"),
                    "invalid_type",
                ));
            };
            if let Some(min) = min_len {
                if s.chars().count() < *min {
                    return Err(FieldError::new(
                        name,
                        format!("{name} must be at least {min} characters"),
                        "min_length",
                    ));
                }
            }
            if let Some(max) = max_len {
                if s.chars().count() > *max {
                    return Err(FieldError::new(
                        name,
                        format!("{name} must be at most {max} characters"),
                        "max_length",
                    ));
                }
            }
            if let Some(re) = pattern {
                if !re.is_match(s) {
                    return Err(FieldError::new(
                        name,
                        format!("{name} has an invalid format"),
                        "pattern",
                    ));
                }
            }
            if let Some(allowed) = one_of {
                if !allowed.contains(&s.as_str()) {
                    return Err(FieldError::new(
                        name,
                        format!("{name} must be one of: {}", allowed.join(", ")),
                        "invalid_value",
                    ));
                }
            }
            Ok(value.clone())
        }
        Kind::Integer { min, max, coerce } => {
            let parsed = match value {
                Value::Number(n) if n.is_i64() => n.as_i64(),
                Value::String(s) if *coerce => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            let Some(n) = parsed else {
                return Err(FieldError::new(
                    name,
                    format!("{name} must be an integer"),
                    "invalid_type",
                ));
            };
            if let Some(lo) = min {
                if n < *lo {
                    return Err(FieldError::new(
                        name,
                        format!("{name} must be at least {lo}"),
                        "min_value",
                    ));
                }
            }
            if let Some(hi) = max {
                if n > *hi {
                    return Err(FieldError::new(
                        name,
                        format!("{name} must be at most {hi}"),
                        "max_value",
                    ));
                }
            }
            Ok(Value::Number(Number::from(n)))
        }
        Kind::Number { coerce } => {
            let parsed = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) if *coerce => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            match parsed.and_then(Number::from_f64) {
                Some(n) => Ok(Value::Number(n)),
                None => Err(FieldError::new(
                    name,
                    format!("{name} must be a number"),
                    "invalid_type",
                )),
            }
        }
        Kind::Boolean { coerce } => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::String(s) if *coerce => match s.as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(FieldError::new(
                    name,
                    format!("{name} must be a boolean"),
                    "invalid_type",
                )),
            },
            _ => Err(FieldError::new(
                name,
                format!("{name} must be a boolean"),
                "invalid_type",
            )),
        },
        Kind::Array => match value {
            Value::Array(_) => Ok(value.clone()),
            _ => Err(FieldError::new(
                name,
                format!("{name} must be an array"),
                "invalid_type",
            )),
        },
        Kind::Object => match value {
            Value::Object(_) => Ok(value.clone()),
            _ => Err(FieldError::new(
                name,
                format!("{name} must be an object"),
                "invalid_type",
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn agent_contract() -> Contract {
        Contract::strict()
            .field(FieldRule::string("name").required().min_len(1).max_len(64))
            .field(
                FieldRule::string("email")
                    .required()
                    .pattern(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"),
            )
            .field(FieldRule::string("kind").one_of(&["autonomous", "supervised"]))
            .field(FieldRule::array("capabilities"))
    }

    #[test]
    fn valid_input_passes_and_keeps_declared_fields() {
        let input = json!({
            "name": "crawler",
            "email": "ops@example.com",
            "kind": "autonomous",
            "capabilities": ["fetch"]
        });
        let output = agent_contract().validate(&input).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn one_error_per_invalid_field_in_declaration_order() {
        let input = json!({ "email": "not-an-email", "kind": "rogue" });
        let errors = agent_contract().validate(&input).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].field, "name");
        assert_eq!(errors[0].code, "required");
        assert_eq!(errors[1].field, "email");
        assert_eq!(errors[1].code, "pattern");
        assert_eq!(errors[2].field, "kind");
        assert_eq!(errors[2].code, "invalid_value");
        assert!(errors.iter().all(|e| !e.field.is_empty() && !e.message.is_empty()));
    }

    #[test]
    fn null_body_reports_required_fields() {
        let errors = agent_contract().validate(&Value::Null).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.code == "required"));
    }

    #[test]
    fn strict_contract_rejects_unknown_fields() {
        let input = json!({ "name": "a", "email": "a@b.co", "extra": 1 });
        let errors = agent_contract().validate(&input).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "unknown_field");
        assert_eq!(errors[0].field, "extra");
    }

    #[test]
    fn permissive_contract_passes_unknown_fields_through() {
        let contract = Contract::permissive().field(FieldRule::string("q"));
        let input = json!({ "q": "hi", "extra": "kept" });
        let output = contract.validate(&input).unwrap();
        assert_eq!(output["extra"], "kept");
    }

    #[test]
    fn coercion_is_explicit() {
        let coercing = Contract::permissive()
            .field(FieldRule::integer("page").coerce().min(1))
            .field(FieldRule::boolean("active").coerce());
        let output = coercing
            .validate(&json!({ "page": "3", "active": "true" }))
            .unwrap();
        assert_eq!(output, json!({ "page": 3, "active": true }));

        // Without coerce(), the same strings are type errors.
        let plain = Contract::permissive().field(FieldRule::integer("page"));
        let errors = plain.validate(&json!({ "page": "3" })).unwrap_err();
        assert_eq!(errors[0].code, "invalid_type");
    }

    #[test]
    fn integer_bounds_are_enforced() {
        let contract = Contract::permissive()
            .field(FieldRule::integer("limit").coerce().min(1).max(100));
        assert!(contract.validate(&json!({ "limit": "100" })).is_ok());
        let errors = contract.validate(&json!({ "limit": "101" })).unwrap_err();
        assert_eq!(errors[0].code, "max_value");
    }

    #[test]
    fn non_object_input_is_a_single_type_error() {
        let errors = agent_contract().validate(&json!([1, 2])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "invalid_type");
    }
}
