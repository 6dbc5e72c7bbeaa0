//! # Registration Models
//!
//! Wire payload, stored record, and the rules that turn one into the other.
//!
//! ## Payload
//! - `POST /api/form` body is a loose JSON object, every field optional on the wire
//! - Text fields are cast like a document store would: numbers and booleans become text
//! - Integral floats lose their fraction (`98.0` is stored as `"98"`)
//! - `agreement` casts `true`, `1`, `"true"`, `"1"`, `"yes"` to true and their opposites to false
//!
//! ## Record
//! - Built only through [`RegistrationRecord::from_form`], which runs every schema rule
//!   before anything touches the store
//! - Immutable once built, `created_at` is stamped by the caller
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub const DEFAULT_ROLE: &str = "Student";

/// Fields the intake endpoint checks for presence, in reporting order.
pub const REQUIRED_FIELDS: [&str; 4] = ["firstName", "lastName", "phone", "caste"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Caste {
    General,
    #[serde(rename = "OBC")]
    Obc,
    #[serde(rename = "SC/ST")]
    ScSt,
    Others,
}

impl Caste {
    pub const ALL: [Caste; 4] = [Caste::General, Caste::Obc, Caste::ScSt, Caste::Others];

    pub fn as_str(&self) -> &'static str {
        match self {
            Caste::General => "General",
            Caste::Obc => "OBC",
            Caste::ScSt => "SC/ST",
            Caste::Others => "Others",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|caste| caste.as_str() == value)
    }
}

impl fmt::Display for Caste {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field value after casting, or the raw value that refused to cast.
#[derive(Debug, Clone, PartialEq)]
pub enum Cast<T> {
    Absent,
    Value(T),
    Invalid(Value),
}

impl<T> Default for Cast<T> {
    fn default() -> Self {
        Cast::Absent
    }
}

/// Inbound `POST /api/form` payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    #[serde(default, deserialize_with = "text")]
    pub role: Cast<String>,
    #[serde(default, deserialize_with = "text")]
    pub first_name: Cast<String>,
    #[serde(default, deserialize_with = "text")]
    pub last_name: Cast<String>,
    #[serde(default, deserialize_with = "text")]
    pub email: Cast<String>,
    #[serde(default, deserialize_with = "text")]
    pub phone: Cast<String>,
    #[serde(default, deserialize_with = "text")]
    pub cet_percentile: Cast<String>,
    #[serde(default, deserialize_with = "text")]
    pub grade_level: Cast<String>,
    #[serde(default, deserialize_with = "text")]
    pub caste: Cast<String>,
    #[serde(default, deserialize_with = "flag")]
    pub agreement: Cast<bool>,
}

fn text<'de, D>(deserializer: D) -> Result<Cast<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Cast::Absent,
        Value::String(s) => Cast::Value(s),
        Value::Number(n) => Cast::Value(number_text(&n)),
        Value::Bool(b) => Cast::Value(b.to_string()),
        other => Cast::Invalid(other),
    })
}

fn flag<'de, D>(deserializer: D) -> Result<Cast<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Cast::Absent,
        Value::Bool(b) => Cast::Value(b),
        Value::Number(n) if n.as_f64() == Some(1.0) => Cast::Value(true),
        Value::Number(n) if n.as_f64() == Some(0.0) => Cast::Value(false),
        Value::String(s) if TRUE_WORDS.contains(&s.as_str()) => Cast::Value(true),
        Value::String(s) if FALSE_WORDS.contains(&s.as_str()) => Cast::Value(false),
        other => Cast::Invalid(other),
    })
}

const TRUE_WORDS: [&str; 3] = ["true", "1", "yes"];
const FALSE_WORDS: [&str; 3] = ["false", "0", "no"];

/// Decimal text of a JSON number, integral floats written without a fraction.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => {
            if f == 0.0 {
                "0".to_string()
            } else {
                format!("{f:.0}")
            }
        }
        _ => n.to_string(),
    }
}

/// Truthiness the way a browser form handler sees it.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Required fields that are absent or falsy in `payload`, in [`REQUIRED_FIELDS`] order.
pub fn missing_fields(payload: &Value) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .into_iter()
        .filter(|field| !is_truthy(payload.get(*field)))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    Required(&'static str),
    NotText { field: &'static str, value: Value },
    UnknownCaste(String),
    AgreementNotAccepted(Value),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Required(field) => write!(f, "{field}: Path `{field}` is required."),
            Violation::NotText { field, value } => {
                write!(f, "{field}: Cast to string failed for value `{value}`")
            }
            Violation::UnknownCaste(value) => write!(
                f,
                "caste: `{value}` is not a valid enum value for path `caste`."
            ),
            Violation::AgreementNotAccepted(value) => write!(
                f,
                "agreement: Validator failed for path `agreement` with value `{value}`"
            ),
        }
    }
}

/// Every rule a record broke, reported together.
#[derive(Debug, Clone, PartialEq)]
pub struct Violations(pub Vec<Violation>);

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        write!(f, "Registration validation failed: {joined}")
    }
}

impl std::error::Error for Violations {}

/// Stored registration, one per accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub id: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cet_percentile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    pub caste: Caste,
    pub agreement: bool,
    pub created_at: DateTime<Utc>,
}

impl RegistrationRecord {
    pub fn from_form(
        form: RegistrationForm,
        id: String,
        created_at: DateTime<Utc>,
    ) -> Result<Self, Violations> {
        let mut violations = Vec::new();

        let role = optional("role", form.role, &mut violations)
            .unwrap_or_else(|| DEFAULT_ROLE.to_string());
        let first_name = required("firstName", form.first_name, &mut violations);
        let last_name = required("lastName", form.last_name, &mut violations);
        let email = optional("email", form.email, &mut violations);
        let phone = required("phone", form.phone, &mut violations);
        let cet_percentile = optional("cetPercentile", form.cet_percentile, &mut violations);
        let grade_level = optional("gradeLevel", form.grade_level, &mut violations);

        let caste = required("caste", form.caste, &mut violations).and_then(|value| {
            let caste = Caste::parse(&value);
            if caste.is_none() {
                violations.push(Violation::UnknownCaste(value));
            }
            caste
        });

        let agreement = match form.agreement {
            Cast::Value(true) => Some(true),
            Cast::Value(false) => {
                violations.push(Violation::AgreementNotAccepted(Value::Bool(false)));
                None
            }
            Cast::Invalid(value) => {
                violations.push(Violation::AgreementNotAccepted(value));
                None
            }
            Cast::Absent => {
                violations.push(Violation::Required("agreement"));
                None
            }
        };

        match (first_name, last_name, phone, caste, agreement) {
            (Some(first_name), Some(last_name), Some(phone), Some(caste), Some(agreement))
                if violations.is_empty() =>
            {
                Ok(Self {
                    id,
                    role,
                    first_name,
                    last_name,
                    email,
                    phone,
                    cet_percentile,
                    grade_level,
                    caste,
                    agreement,
                    created_at,
                })
            }
            _ => Err(Violations(violations)),
        }
    }
}

fn optional(
    field: &'static str,
    value: Cast<String>,
    violations: &mut Vec<Violation>,
) -> Option<String> {
    match value {
        Cast::Absent => None,
        Cast::Value(s) => Some(s),
        Cast::Invalid(value) => {
            violations.push(Violation::NotText { field, value });
            None
        }
    }
}

fn required(
    field: &'static str,
    value: Cast<String>,
    violations: &mut Vec<Violation>,
) -> Option<String> {
    match optional(field, value, violations) {
        Some(s) if !s.is_empty() => Some(s),
        Some(_) | None => {
            if !violations
                .iter()
                .any(|v| matches!(v, Violation::NotText { field: f, .. } if *f == field))
            {
                violations.push(Violation::Required(field));
            }
            None
        }
    }
}

/// Body of a `201 Created` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub success: bool,
    pub message: String,
    #[serde(rename = "savedToMongoDB")]
    pub saved_to_store: bool,
    pub saved_to_google_sheets: bool,
    pub id: String,
}

impl SubmissionReceipt {
    pub fn new(id: String, saved_to_google_sheets: bool) -> Self {
        Self {
            success: true,
            message: "Form submitted successfully".to_string(),
            saved_to_store: true,
            saved_to_google_sheets,
            id,
        }
    }
}
