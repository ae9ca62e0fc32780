//! Parameter type registry and cast functions.
//!
//! # Responsibilities
//! - Resolve a case-insensitive type name to a [`ParamType`]
//! - Cast request values (JSON) into the declared type
//! - Match-test pattern types (MAIL) instead of casting them
//!
//! # Design Decisions
//! - Casts are idempotent: casting an already cast value returns it unchanged
//! - Integral numbers stay integers so configured defaults compare equal to request values
//! - Failures carry an HTTP-style code; the caller wraps them into `ValidationData`

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Number, Value};

use crate::error::{Error, Result};

static MAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)^(([^<>()\[\].,;:\s@"]+(\.[^<>()\[\].,;:\s@"]+)*)|(".+"))@(([^<>()\[\].,;:\s@"]+\.)+[^<>()\[\].,;:\s@"]{2,})$"#,
    )
    .expect("mail pattern is valid")
});

/// Declared type of a request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Number,
    String,
    Boolean,
    Object,
    Mail,
}

/// How a type validates a value.
#[derive(Debug, Clone, Copy)]
pub enum TypeHandler {
    /// Converts the value.
    Cast(fn(&Value) -> std::result::Result<Value, CastError>),
    /// Tests the value's string form against a pattern; the value is kept as-is.
    Pattern(&'static Regex),
}

/// A failed cast, with the HTTP status it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastError {
    pub code: u16,
    pub message: String,
}

impl CastError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: 400,
            message: message.into(),
        }
    }
}

impl fmt::Display for CastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl ParamType {
    /// Every registered type, in registry order.
    pub const ALL: [ParamType; 5] = [
        ParamType::Number,
        ParamType::String,
        ParamType::Boolean,
        ParamType::Object,
        ParamType::Mail,
    ];

    /// Look up a type by name, ignoring case.
    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| Error::invalid(format!("\"{}\" is not a valid parameter type", name)))
    }

    /// Canonical upper-case name.
    pub fn name(&self) -> &'static str {
        match self {
            ParamType::Number => "NUMBER",
            ParamType::String => "STRING",
            ParamType::Boolean => "BOOLEAN",
            ParamType::Object => "OBJECT",
            ParamType::Mail => "MAIL",
        }
    }

    pub fn handler(&self) -> TypeHandler {
        match self {
            ParamType::Number => TypeHandler::Cast(cast_number),
            ParamType::String => TypeHandler::Cast(cast_string),
            ParamType::Boolean => TypeHandler::Cast(cast_boolean),
            ParamType::Object => TypeHandler::Cast(cast_object),
            ParamType::Mail => TypeHandler::Pattern(&MAIL_PATTERN),
        }
    }

    /// Cast (or match-test) a present value.
    pub fn cast(&self, value: &Value) -> std::result::Result<Value, CastError> {
        match self.handler() {
            TypeHandler::Cast(cast) => cast(value),
            TypeHandler::Pattern(pattern) => {
                let text = stringify(value);
                if pattern.is_match(&text) {
                    Ok(value.clone())
                } else {
                    Err(CastError::bad_request(format!(
                        "'{}' doesn't match {} pattern",
                        text,
                        self.name()
                    )))
                }
            }
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn cast_number(value: &Value) -> std::result::Result<Value, CastError> {
    let not_a_number = || CastError::bad_request(format!("{} is not a number", stringify(value)));
    let parsed = match value {
        Value::Number(n) => return Ok(Value::Number(n.clone())),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                parse_numeric(s).ok_or_else(not_a_number)?
            }
        }
        Value::Array(_) | Value::Object(_) => return Err(not_a_number()),
    };
    number_value(parsed).ok_or_else(not_a_number)
}

/// Decimal, exponent, or unsigned `0x` / `0o` / `0b` literals.
fn parse_numeric(s: &str) -> Option<f64> {
    let radix = match s.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0o" | "0O") => 8,
        Some("0b" | "0B") => 2,
        _ => return s.parse::<f64>().ok(),
    };
    let digits = &s[2..];
    if digits.starts_with('+') {
        return None;
    }
    u64::from_str_radix(digits, radix).ok().map(|n| n as f64)
}

fn number_value(n: f64) -> Option<Value> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        return Some(Value::Number(Number::from(n as i64)));
    }
    Number::from_f64(n).map(Value::Number)
}

fn cast_string(value: &Value) -> std::result::Result<Value, CastError> {
    Ok(Value::String(stringify(value)))
}

fn cast_boolean(value: &Value) -> std::result::Result<Value, CastError> {
    let truthy = match value {
        Value::String(s) if s == "true" || s == "1" => true,
        Value::String(s) if s == "false" || s == "0" => false,
        Value::String(s) => !s.is_empty(),
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    };
    Ok(Value::Bool(truthy))
}

fn cast_object(value: &Value) -> std::result::Result<Value, CastError> {
    Ok(value.clone())
}

/// String form of a value, without JSON quoting for strings.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
