//! Per-step validation rules and answer transforms.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ValidationError;

/// Local part and domain shape accepted for email answers.
///
/// Leading dots and consecutive dots are checked separately since the regex
/// engine has no look-around.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z0-9_'+\-.]*[A-Z0-9_+\-]@(?:[A-Z0-9][A-Z0-9\-]*\.)+[A-Z]{2,}$")
        .expect("email pattern is valid")
});

/// How a raw answer is checked and parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Free text of at least `min` characters.
    MinLength {
        min: usize,
        message: Option<String>,
    },
    /// An email address.
    Email { message: Option<String> },
    /// Text coerced to a number that must fall in `[min, max]`.
    NumberRange { min: f64, max: f64 },
}

impl Rule {
    pub fn min_length(min: usize) -> Self {
        Self::MinLength { min, message: None }
    }

    pub fn min_length_with(min: usize, message: impl Into<String>) -> Self {
        Self::MinLength {
            min,
            message: Some(message.into()),
        }
    }

    pub fn email(message: impl Into<String>) -> Self {
        Self::Email {
            message: Some(message.into()),
        }
    }

    pub fn number_range(min: f64, max: f64) -> Self {
        Self::NumberRange { min, max }
    }

    /// Check `raw` and return the parsed value to be stored.
    pub fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        match self {
            Self::MinLength { min, message } => {
                if raw.chars().count() < *min {
                    return Err(ValidationError::new(message.clone().unwrap_or_else(
                        || format!("Must be at least {min} characters"),
                    )));
                }
                Ok(Value::String(raw.to_string()))
            }
            Self::Email { message } => {
                if !is_email(raw) {
                    return Err(ValidationError::new(
                        message
                            .clone()
                            .unwrap_or_else(|| "Invalid email".to_string()),
                    ));
                }
                Ok(Value::String(raw.to_string()))
            }
            Self::NumberRange { min, max } => {
                let n = coerce_number(raw)
                    .ok_or_else(|| ValidationError::new("Expected a number"))?;
                if n < *min {
                    return Err(ValidationError::new(format!("Must be at least {min}")));
                }
                if n > *max {
                    return Err(ValidationError::new(format!("Must be at most {max}")));
                }
                Ok(number_value(n))
            }
        }
    }
}

fn is_email(raw: &str) -> bool {
    !raw.starts_with('.') && !raw.contains("..") && EMAIL.is_match(raw)
}

/// Lenient text-to-number coercion: surrounding whitespace is ignored and
/// blank text counts as zero. Non-finite results are rejected.
fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Store integral numbers as JSON integers, everything else as floats.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// How a validated value is reshaped before it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transform {
    /// Store as parsed.
    #[default]
    None,
    /// Ask the normalization collaborator for a polished phrasing.
    Professionalize,
    /// Comma-separated text becomes a list of trimmed, non-empty items.
    List,
    /// Like `List`, and every item ends with a period.
    Sentences,
}

/// Split comma-separated text into trimmed, non-empty items.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// `split_list`, with a period appended to items that lack one.
pub fn split_sentences(text: &str) -> Vec<String> {
    split_list(text)
        .into_iter()
        .map(|item| {
            if item.ends_with('.') {
                item
            } else {
                format!("{item}.")
            }
        })
        .collect()
}
