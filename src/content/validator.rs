//! Client configuration validation.
//!
//! # Responsibilities
//! - Walk an untyped JSON tree against the schema
//! - Collect every violation with a dotted path, not just the first
//! - Produce a typed `ClientConfig` only when the whole tree is valid
//!
//! # Design Decisions
//! - All-or-nothing: there is no partially accepted config
//! - Pure function of its input: no I/O, no shared state

use std::sync::LazyLock;

use regex::Regex;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::{Map, Number, Value};

use crate::content::error::{Issue, IssueCode, SchemaViolation};
use crate::content::model::ClientConfig;
use crate::content::schema::{
    client_config_schema, NumberRule, ObjectRule, Rule, StringFormat, StringRule,
};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

/// Strict parse of a raw document into a `ClientConfig`.
pub fn validate(raw: &Value) -> Result<ClientConfig, SchemaViolation> {
    let issues = check(client_config_schema(), raw);
    if !issues.is_empty() {
        return Err(SchemaViolation::new(issues));
    }

    // The tree matched the schema, so this only fails if schema and model drift apart.
    serde_json::from_value(raw.clone()).map_err(|e| {
        SchemaViolation::new(vec![Issue {
            path: String::new(),
            message: e.to_string(),
            code: IssueCode::Custom,
        }])
    })
}

/// Non-failing variant of [`validate`] that reports every violation.
pub fn safe_validate(raw: &Value) -> ValidationReport {
    match validate(raw) {
        Ok(config) => ValidationReport::Valid(Box::new(config)),
        Err(violation) => ValidationReport::Invalid(violation.into_issues()),
    }
}

/// Outcome of [`safe_validate`].
///
/// Serializes as `{ "success": true, "data": ... }` or
/// `{ "success": false, "errors": [{ path, message, code }] }`.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationReport {
    Valid(Box<ClientConfig>),
    Invalid(Vec<Issue>),
}

impl ValidationReport {
    pub fn is_success(&self) -> bool {
        matches!(self, ValidationReport::Valid(_))
    }

    /// Violations, empty on success.
    pub fn errors(&self) -> &[Issue] {
        match self {
            ValidationReport::Valid(_) => &[],
            ValidationReport::Invalid(issues) => issues,
        }
    }

    pub fn into_result(self) -> Result<ClientConfig, SchemaViolation> {
        match self {
            ValidationReport::Valid(config) => Ok(*config),
            ValidationReport::Invalid(issues) => Err(SchemaViolation::new(issues)),
        }
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationReport", 2)?;
        match self {
            ValidationReport::Valid(config) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", config)?;
            }
            ValidationReport::Invalid(issues) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("errors", issues)?;
            }
        }
        state.end()
    }
}

/// Evaluate any rule against a value, returning all violations.
pub fn check(rule: &Rule, value: &Value) -> Vec<Issue> {
    let mut walker = Walker::default();
    walker.visit(rule, value);
    walker.issues
}

#[derive(Default)]
struct Walker {
    path: Vec<String>,
    issues: Vec<Issue>,
}

impl Walker {
    fn report(&mut self, code: IssueCode, message: impl Into<String>) {
        self.issues.push(Issue {
            path: self.path.join("."),
            message: message.into(),
            code,
        });
    }

    fn expected(&mut self, expected: &str, value: &Value) {
        let message = format!("Expected {}, received {}", expected, type_name(value));
        self.report(IssueCode::InvalidType, message);
    }

    fn nested(&mut self, segment: String, rule: &Rule, value: &Value) {
        self.path.push(segment);
        self.visit(rule, value);
        self.path.pop();
    }

    fn visit(&mut self, rule: &Rule, value: &Value) {
        match rule {
            Rule::Any => {}
            Rule::String(r) => match value.as_str() {
                Some(s) => self.visit_string(r, s),
                None => self.expected("string", value),
            },
            Rule::Number(r) => match value {
                Value::Number(n) => self.visit_number(r, n),
                _ => self.expected("number", value),
            },
            Rule::Boolean => {
                if !value.is_boolean() {
                    self.expected("boolean", value);
                }
            }
            Rule::Enum(allowed) => self.visit_enum(allowed, value),
            Rule::Array(item) => match value.as_array() {
                Some(items) => {
                    for (i, v) in items.iter().enumerate() {
                        self.nested(i.to_string(), item, v);
                    }
                }
                None => self.expected("array", value),
            },
            Rule::Object(obj) => match value.as_object() {
                Some(map) => self.visit_object(obj, map),
                None => self.expected("object", value),
            },
            Rule::Record(inner) => match value.as_object() {
                Some(map) => {
                    for (key, v) in map {
                        self.nested(key.clone(), inner, v);
                    }
                }
                None => self.expected("object", value),
            },
        }
    }

    fn visit_string(&mut self, rule: &StringRule, s: &str) {
        let len = s.chars().count();

        if let Some(exact) = rule.exact_len {
            if len != exact {
                let code = if len < exact {
                    IssueCode::TooSmall
                } else {
                    IssueCode::TooBig
                };
                self.report(code, format!("String must contain exactly {} character(s)", exact));
            }
        }
        if let Some(min) = rule.min_len {
            if len < min {
                self.report(
                    IssueCode::TooSmall,
                    format!("String must contain at least {} character(s)", min),
                );
            }
        }
        if let Some(max) = rule.max_len {
            if len > max {
                self.report(
                    IssueCode::TooBig,
                    format!("String must contain at most {} character(s)", max),
                );
            }
        }

        if let Some(format) = rule.format {
            let (ok, label) = match format {
                StringFormat::Url => (is_url(s), "url"),
                StringFormat::Email => (is_email(s), "email"),
                StringFormat::Uuid => (is_uuid(s), "uuid"),
                StringFormat::DateTime => (is_utc_datetime(s), "datetime"),
                StringFormat::Pattern { regex, label } => (regex.is_match(s), label),
            };
            if !ok {
                self.report(IssueCode::InvalidString, format!("Invalid {}", label));
            }
        }
    }

    fn visit_number(&mut self, rule: &NumberRule, n: &Number) {
        if rule.integer && !(n.is_i64() || n.is_u64()) {
            self.report(IssueCode::InvalidType, "Expected integer, received float");
            return;
        }
        let Some(v) = n.as_f64() else {
            self.report(IssueCode::InvalidType, "Expected number, received unrepresentable number");
            return;
        };

        if rule.positive && v <= 0.0 {
            self.report(IssueCode::TooSmall, "Number must be greater than 0");
        }
        if let Some(min) = rule.min {
            if v < min {
                self.report(
                    IssueCode::TooSmall,
                    format!("Number must be greater than or equal to {}", min),
                );
            }
        }
        if let Some(max) = rule.max {
            if v > max {
                self.report(
                    IssueCode::TooBig,
                    format!("Number must be less than or equal to {}", max),
                );
            }
        }
    }

    fn visit_enum(&mut self, allowed: &[&str], value: &Value) {
        let options = allowed
            .iter()
            .map(|v| format!("'{}'", v))
            .collect::<Vec<_>>()
            .join(" | ");

        match value.as_str() {
            Some(s) if allowed.contains(&s) => {}
            Some(s) => self.report(
                IssueCode::InvalidEnumValue,
                format!("Invalid enum value. Expected {}, received '{}'", options, s),
            ),
            None => self.expected(&options, value),
        }
    }

    fn visit_object(&mut self, rule: &ObjectRule, map: &Map<String, Value>) {
        for field in &rule.fields {
            match map.get(field.name) {
                Some(v) => self.nested(field.name.to_string(), &field.rule, v),
                None if field.required => {
                    self.path.push(field.name.to_string());
                    self.report(IssueCode::InvalidType, "Required");
                    self.path.pop();
                }
                None => {}
            }
        }

        if rule.strict {
            let unknown: Vec<String> = map
                .keys()
                .filter(|k| rule.field(k).is_none())
                .map(|k| format!("'{}'", k))
                .collect();
            if !unknown.is_empty() {
                self.report(
                    IssueCode::UnrecognizedKeys,
                    format!("Unrecognized key(s) in object: {}", unknown.join(", ")),
                );
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

fn is_email(s: &str) -> bool {
    !s.starts_with('.') && !s.contains("..") && EMAIL_PATTERN.is_match(s)
}

fn is_uuid(s: &str) -> bool {
    // Only the canonical hyphenated form; `Uuid::parse_str` also takes braced/urn forms.
    s.len() == 36 && uuid::Uuid::parse_str(s).is_ok()
}

fn is_utc_datetime(s: &str) -> bool {
    s.ends_with('Z') && chrono::DateTime::parse_from_rfc3339(s).is_ok()
}
