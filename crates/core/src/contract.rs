//! Output contracts: declared response shapes, validation and coercion.
//!
//! The validator consumes a structured reply (`serde_json::Value`, already
//! extracted from the provider's text by the caller) and either coerces it
//! into a [`ContractResult`] or reports every invalid field at once, so one
//! corrective round-trip can address all problems.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LoadError;

// ──────────────────────────────────────────────
// Schema
// ──────────────────────────────────────────────

/// Typed field descriptor. Constraints vary by type; `code` carries its
/// language tag as metadata only — the code itself is never checked against
/// real syntax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    Str {
        #[serde(default)]
        min_len: Option<usize>,
        #[serde(default)]
        max_len: Option<usize>,
    },
    Int {
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
    },
    Float {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        #[serde(default)]
        precision: Option<u32>,
    },
    Bool,
    Code {
        language: String,
    },
    List {
        item: Box<FieldType>,
        #[serde(default)]
        exactly: Option<usize>,
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
    },
    Optional {
        item: Box<FieldType>,
    },
    Enum {
        choices: Vec<String>,
        #[serde(default)]
        case_insensitive: bool,
    },
}

impl FieldType {
    pub fn str() -> FieldType {
        FieldType::Str {
            min_len: None,
            max_len: None,
        }
    }

    pub fn int() -> FieldType {
        FieldType::Int {
            min: None,
            max: None,
        }
    }

    pub fn list(item: FieldType) -> FieldType {
        FieldType::List {
            item: Box::new(item),
            exactly: None,
            min: None,
            max: None,
        }
    }

    /// Natural-language description, used in prompt instructions and in
    /// type-mismatch failures.
    pub fn describe(&self) -> String {
        match self {
            FieldType::Str { min_len, max_len } => {
                let mut parts = vec!["text".to_string()];
                if let Some(max) = max_len {
                    parts.push(format!("(maximum {} characters)", max));
                }
                if let Some(min) = min_len {
                    parts.push(format!("(minimum {} characters)", min));
                }
                parts.join(" ")
            }
            FieldType::Int { min, max } => {
                let mut parts = vec!["integer number".to_string()];
                match (min, max) {
                    (Some(lo), Some(hi)) => parts.push(format!("(between {} and {})", lo, hi)),
                    (Some(lo), None) => parts.push(format!("(minimum {})", lo)),
                    (None, Some(hi)) => parts.push(format!("(maximum {})", hi)),
                    (None, None) => {}
                }
                parts.join(" ")
            }
            FieldType::Float { precision, .. } => {
                let mut parts = vec!["decimal number".to_string()];
                if let Some(p) = precision {
                    parts.push(format!("(to {} decimal places)", p));
                }
                parts.join(" ")
            }
            FieldType::Bool => "boolean (true/false)".to_string(),
            FieldType::Code { language } => {
                format!("code in {} (just the code, no markdown fences)", language)
            }
            FieldType::List {
                item,
                exactly,
                min,
                max,
            } => {
                let mut parts = vec!["list".to_string()];
                match (exactly, min, max) {
                    (Some(n), _, _) => parts.push(format!("of exactly {} items", n)),
                    (None, Some(lo), Some(hi)) => parts.push(format!("of {}-{} items", lo, hi)),
                    (None, Some(lo), None) => parts.push(format!("of at least {} items", lo)),
                    (None, None, Some(hi)) => parts.push(format!("of at most {} items", hi)),
                    (None, None, None) => {}
                }
                parts.push(format!("where each item is {}", item.describe()));
                parts.join(" ")
            }
            FieldType::Optional { item } => {
                format!("{} (or null if not applicable)", item.describe())
            }
            FieldType::Enum { choices, .. } => format!("one of: {}", choices.join(", ")),
        }
    }
}

/// One named field in a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(flatten)]
    pub ty: FieldType,
}

/// Ordered field list. Names are unique; declaration order is preserved so
/// result objects come back in a deterministic order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractSchema {
    pub fields: Vec<SchemaField>,
}

impl ContractSchema {
    pub fn new() -> ContractSchema {
        ContractSchema::default()
    }

    /// Append a field, replacing any earlier field with the same name.
    pub fn with(mut self, name: impl Into<String>, ty: FieldType) -> ContractSchema {
        let name = name.into();
        self.fields.retain(|f| f.name != name);
        self.fields.push(SchemaField { name, ty });
        self
    }

    /// Load a schema from a JSON array of field descriptors. Duplicate field
    /// names are rejected.
    pub fn from_json(src: &str) -> Result<ContractSchema, LoadError> {
        let schema: ContractSchema =
            serde_json::from_str(src).map_err(|e| LoadError::new(format!("schema: {}", e)))?;
        let mut seen = BTreeSet::new();
        for field in &schema.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(LoadError::new(format!(
                    "schema: duplicate field '{}'",
                    field.name
                )));
            }
        }
        Ok(schema)
    }

    /// Render the output-format block appended to a prompt: one line per
    /// field, declaration order.
    pub fn prompt_instructions(&self) -> String {
        let mut lines = vec![
            "Respond with a JSON object containing exactly these fields:".to_string(),
            String::new(),
        ];
        for field in &self.fields {
            lines.push(format!("- \"{}\": {}", field.name, field.ty.describe()));
        }
        lines.push(String::new());
        lines.push("Return ONLY the JSON object, no other text or markdown.".to_string());
        lines.join("\n")
    }
}

// ──────────────────────────────────────────────
// Results and failures
// ──────────────────────────────────────────────

/// A coerced field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Code { language: String, text: String },
    List(Vec<FieldValue>),
    /// Absent or null optional.
    None,
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Int(n) => Value::from(*n),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Code { text, .. } => Value::String(text.clone()),
            FieldValue::List(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            FieldValue::None => Value::Null,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Code { text: s, .. } => Some(s),
            _ => None,
        }
    }
}

/// Successful validation: every field coerced, addressable by name,
/// declaration order preserved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContractResult {
    fields: Vec<(String, FieldValue)>,
}

impl ContractResult {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON object in declaration order.
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.to_json());
        }
        Value::Object(map)
    }
}

/// Why a field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Type,
    Missing,
    MinLen,
    MaxLen,
    Min,
    Max,
    Length,
    Choice,
}

/// One invalid field (or list element — the field name then carries the
/// index, e.g. `items[2]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFailure {
    pub field: String,
    pub expected: String,
    pub actual: String,
    pub reason: Reason,
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}': expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

/// Aggregated validation failure: every invalid field, never just the first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub failures: Vec<FieldFailure>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid field(s): ", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

// ──────────────────────────────────────────────
// Validation
// ──────────────────────────────────────────────

/// Validate a structured reply against a schema.
///
/// Returns a fully populated result only if every field is valid; otherwise
/// a single [`ValidationError`] listing each failing field.
pub fn validate(schema: &ContractSchema, reply: &Value) -> Result<ContractResult, ValidationError> {
    let obj = match reply.as_object() {
        Some(obj) => obj,
        None => {
            return Err(ValidationError {
                failures: vec![FieldFailure {
                    field: "$".to_string(),
                    expected: "a JSON object".to_string(),
                    actual: render(reply),
                    reason: Reason::Type,
                }],
            })
        }
    };

    let mut failures = Vec::new();
    let mut result = ContractResult::default();

    for field in &schema.fields {
        match obj.get(&field.name) {
            None => {
                if let FieldType::Optional { .. } = field.ty {
                    result.fields.push((field.name.clone(), FieldValue::None));
                } else {
                    failures.push(FieldFailure {
                        field: field.name.clone(),
                        expected: field.ty.describe(),
                        actual: "nothing".to_string(),
                        reason: Reason::Missing,
                    });
                }
            }
            Some(value) => {
                if let Some(coerced) = check(&field.ty, value, &field.name, &mut failures) {
                    result.fields.push((field.name.clone(), coerced));
                }
            }
        }
    }

    if failures.is_empty() {
        Ok(result)
    } else {
        Err(ValidationError { failures })
    }
}

/// Per-field state machine: type check, then constraint checks in
/// declaration order. Pushes a failure and returns `None` on the first
/// failing check for this field; list elements are the exception, where
/// every failing index is reported.
fn check(
    ty: &FieldType,
    value: &Value,
    path: &str,
    failures: &mut Vec<FieldFailure>,
) -> Option<FieldValue> {
    let fail = |failures: &mut Vec<FieldFailure>, expected: String, reason: Reason| {
        failures.push(FieldFailure {
            field: path.to_string(),
            expected,
            actual: render(value),
            reason,
        });
        Option::<FieldValue>::None
    };

    match ty {
        FieldType::Str { min_len, max_len } => {
            let text = match value.as_str() {
                Some(s) => s,
                None => return fail(failures, ty.describe(), Reason::Type),
            };
            let chars = text.chars().count();
            if let Some(min) = min_len {
                if chars < *min {
                    return fail(
                        failures,
                        format!("at least {} characters", min),
                        Reason::MinLen,
                    );
                }
            }
            if let Some(max) = max_len {
                if chars > *max {
                    return fail(
                        failures,
                        format!("at most {} characters", max),
                        Reason::MaxLen,
                    );
                }
            }
            Some(FieldValue::Text(text.to_string()))
        }

        FieldType::Int { min, max } => {
            // Accept a JSON integer or text that parses fully as one.
            let parsed = match value {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            let n = match parsed {
                Some(n) => n,
                None => return fail(failures, ty.describe(), Reason::Type),
            };
            if let Some(lo) = min {
                if n < *lo {
                    return fail(failures, format!("at least {}", lo), Reason::Min);
                }
            }
            if let Some(hi) = max {
                if n > *hi {
                    return fail(failures, format!("at most {}", hi), Reason::Max);
                }
            }
            Some(FieldValue::Int(n))
        }

        FieldType::Float {
            min,
            max,
            precision,
        } => {
            let parsed = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            let v = match parsed {
                Some(v) if v.is_finite() => v,
                _ => return fail(failures, ty.describe(), Reason::Type),
            };
            // Bounds apply to the unrounded value; rounding happens after.
            if let Some(lo) = min {
                if v < *lo {
                    return fail(failures, format!("at least {}", lo), Reason::Min);
                }
            }
            if let Some(hi) = max {
                if v > *hi {
                    return fail(failures, format!("at most {}", hi), Reason::Max);
                }
            }
            let v = match precision {
                Some(p) => {
                    let factor = 10f64.powi(*p as i32);
                    (v * factor).round() / factor
                }
                None => v,
            };
            Some(FieldValue::Float(v))
        }

        FieldType::Bool => {
            let parsed = match value {
                Value::Bool(b) => Some(*b),
                Value::String(s) => match s.to_lowercase().as_str() {
                    "true" | "yes" | "1" => Some(true),
                    "false" | "no" | "0" => Some(false),
                    _ => None,
                },
                Value::Number(n) => match n.as_i64() {
                    Some(1) => Some(true),
                    Some(0) => Some(false),
                    _ => None,
                },
                _ => None,
            };
            match parsed {
                Some(b) => Some(FieldValue::Bool(b)),
                None => fail(failures, ty.describe(), Reason::Type),
            }
        }

        FieldType::Code { language } => {
            let text = match value.as_str() {
                Some(s) => s,
                None => return fail(failures, ty.describe(), Reason::Type),
            };
            Some(FieldValue::Code {
                language: language.clone(),
                text: strip_fences(text),
            })
        }

        FieldType::List {
            item,
            exactly,
            min,
            max,
        } => {
            let items = match value.as_array() {
                Some(a) => a,
                None => return fail(failures, ty.describe(), Reason::Type),
            };
            // Length is checked before element validity.
            if let Some(n) = exactly {
                if items.len() != *n {
                    return fail(failures, format!("exactly {} items", n), Reason::Length);
                }
            }
            if let Some(lo) = min {
                if items.len() < *lo {
                    return fail(failures, format!("at least {} items", lo), Reason::Length);
                }
            }
            if let Some(hi) = max {
                if items.len() > *hi {
                    return fail(failures, format!("at most {} items", hi), Reason::Length);
                }
            }
            let before = failures.len();
            let mut coerced = Vec::with_capacity(items.len());
            for (i, element) in items.iter().enumerate() {
                let element_path = format!("{}[{}]", path, i);
                if let Some(v) = check(item, element, &element_path, failures) {
                    coerced.push(v);
                }
            }
            if failures.len() > before {
                return None;
            }
            Some(FieldValue::List(coerced))
        }

        FieldType::Optional { item } => {
            if value.is_null() {
                Some(FieldValue::None)
            } else {
                check(item, value, path, failures)
            }
        }

        FieldType::Enum {
            choices,
            case_insensitive,
        } => {
            let text = match value.as_str() {
                Some(s) => s,
                None => return fail(failures, ty.describe(), Reason::Type),
            };
            let matched = choices.iter().find(|c| {
                if *case_insensitive {
                    c.eq_ignore_ascii_case(text)
                } else {
                    c.as_str() == text
                }
            });
            match matched {
                // Coerced to the declared choice's casing.
                Some(choice) => Some(FieldValue::Text(choice.clone())),
                None => fail(failures, ty.describe(), Reason::Choice),
            }
        }
    }
}

fn render(value: &Value) -> String {
    value.to_string()
}

/// Drop a surrounding markdown code fence, if present, and trim.
fn strip_fences(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let body = match rest.find('\n') {
            Some(i) => &rest[i + 1..],
            None => "",
        };
        let body = body.strip_suffix("```").unwrap_or(body);
        return body.trim().to_string();
    }
    trimmed.to_string()
}
