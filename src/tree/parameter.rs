//! Declared request parameters.

use std::fmt;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::http::response::ValidationData;
use crate::tree::element::{require_config, type_name, warn_unused_keys, Diagnostics, NodeKind};
use crate::validation::{stringify, ParamType};

const RECOGNIZED_KEYS: &[&str] = &["type", "default_value"];

/// A named, typed request value.
///
/// Declared either as a type alias (`id: number`) or as a mapping
/// (`id: { type: number, default_value: 4321 }`). Declaring a default makes the
/// parameter optional.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    param_type: ParamType,
    /// `Some` for optional parameters, holding the already cast default.
    default: Option<Value>,
}

impl Parameter {
    pub fn new(name: &str, decl: &Value, diagnostics: &dyn Diagnostics) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::invalid("parameter name must be a non-empty string"));
        }
        match require_config(NodeKind::Parameter, name, Some(decl))? {
            Value::String(alias) => Ok(Self {
                name: name.to_string(),
                param_type: ParamType::parse(alias)?,
                default: None,
            }),
            Value::Object(map) => {
                warn_unused_keys(diagnostics, NodeKind::Parameter, name, map, RECOGNIZED_KEYS);
                let param_type = match map.get("type") {
                    Some(Value::String(ty)) => ParamType::parse(ty)?,
                    Some(other) => {
                        return Err(Error::invalid(format!(
                            "Parameter \"{name}\": type must be a string, got {}",
                            type_name(other)
                        )))
                    }
                    None => {
                        return Err(Error::invalid(format!(
                            "Parameter \"{name}\": type is required"
                        )))
                    }
                };
                let default = match map.get("default_value") {
                    None => None,
                    Some(value) => Some(Self::cast_default(name, param_type, value)?),
                };
                Ok(Self {
                    name: name.to_string(),
                    param_type,
                    default,
                })
            }
            other => Err(Error::invalid(format!(
                "Parameter \"{name}\" must be a type name or a mapping, got {}",
                type_name(other)
            ))),
        }
    }

    /// Explicit null and empty-string defaults are kept as written.
    fn cast_default(name: &str, param_type: ParamType, value: &Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::String(s) if s.is_empty() => Ok(value.clone()),
            _ => param_type.cast(value).map_err(|e| {
                Error::invalid(format!("Parameter \"{name}\": default value rejected ({e})"))
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_type(&self) -> ParamType {
        self.param_type
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Validate a raw request value; absent and null are both missing.
    pub fn validate(&self, raw: Option<&Value>) -> std::result::Result<Value, ValidationData> {
        match raw {
            None | Some(Value::Null) => self.default.clone().ok_or_else(|| {
                ValidationData::new(400, format!("Parameter \"{}\" is mandatory", self.name))
            }),
            Some(value) => self.param_type.cast(value).map_err(|e| {
                ValidationData::new(
                    e.code,
                    format!(
                        "Parameter \"{}\" cannot be validated (Reason: {})",
                        self.name, e.message
                    ),
                )
            }),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.param_type)?;
        if let Some(default) = &self.default {
            write!(f, " = {}", stringify(default))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::element::CollectingDiagnostics;
    use serde_json::json;

    fn param(decl: Value) -> Result<Parameter> {
        Parameter::new("id", &decl, &CollectingDiagnostics::new())
    }

    #[test]
    fn test_alias_and_mapping_forms() {
        let alias = param(json!("Number")).unwrap();
        assert_eq!(alias.param_type(), ParamType::Number);
        assert!(!alias.is_optional());

        let mapping = param(json!({ "type": "number" })).unwrap();
        assert_eq!(alias, mapping);
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(matches!(param(json!("uuid")), Err(Error::InvalidArgument(_))));
        assert!(matches!(param(json!({})), Err(Error::InvalidArgument(_))));
        assert!(matches!(param(json!(5)), Err(Error::InvalidArgument(_))));
        assert!(matches!(param(Value::Null), Err(Error::ConfigurationMissing(_))));
    }

    #[test]
    fn test_missing_mandatory() {
        let err = param(json!("number")).unwrap().validate(None).unwrap_err();
        assert_eq!(err.code, 400);
        assert!(err.message.contains("is mandatory"));
    }

    #[test]
    fn test_missing_optional_returns_default() {
        let p = param(json!({ "type": "NUMBER", "default_value": 4321 })).unwrap();
        assert!(p.is_optional());
        assert_eq!(p.validate(None).unwrap(), json!(4321));
        assert_eq!(p.validate(Some(&Value::Null)).unwrap(), json!(4321));
        assert_eq!(p.validate(Some(&json!("12"))).unwrap(), json!(12));
    }

    #[test]
    fn test_null_and_empty_defaults_preserved() {
        let p = param(json!({ "type": "number", "default_value": null })).unwrap();
        assert!(p.is_optional());
        assert_eq!(p.validate(None).unwrap(), Value::Null);

        let p = param(json!({ "type": "number", "default_value": "" })).unwrap();
        assert_eq!(p.validate(None).unwrap(), json!(""));
    }

    #[test]
    fn test_default_is_cast_at_construction() {
        let p = param(json!({ "type": "boolean", "default_value": "1" })).unwrap();
        assert_eq!(p.default_value(), Some(&json!(true)));

        assert!(matches!(
            param(json!({ "type": "number", "default_value": "many" })),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            param(json!({ "type": "mail", "default_value": "nobody" })),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_cast_failure_is_validation_error() {
        let p = param(json!("number")).unwrap();
        let err = p.validate(Some(&json!("abc"))).unwrap_err();
        assert_eq!(err.code, 400);
        assert!(err.message.contains("abc is not a number"));

        let mail = param(json!("mail")).unwrap();
        assert!(mail.validate(Some(&json!("jane@example.com"))).is_ok());
        assert_eq!(mail.validate(Some(&json!("jane"))).unwrap_err().code, 400);
    }

    #[test]
    fn test_unknown_keys_warn() {
        let diagnostics = CollectingDiagnostics::new();
        Parameter::new("id", &json!({ "type": "string", "min": 3 }), &diagnostics).unwrap();
        assert_eq!(
            diagnostics.warnings(),
            vec!["Parameter \"id\": unused key \"min\"".to_string()]
        );
    }

    #[test]
    fn test_display() {
        let p = param(json!({ "type": "number", "default_value": 4321 })).unwrap();
        assert_eq!(p.to_string(), "id: NUMBER = 4321");
    }
}
