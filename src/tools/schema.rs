//! Declarative parameter tables and the single validator that enforces them.
//!
//! Every tool describes its accepted arguments as a static [`ToolSpec`]. The
//! same table drives request validation and the `inputSchema` advertised by
//! `tools/list`.

use chrono::NaiveDate;
use serde_json::{Map, Value, json};

use crate::error::{McpError, McpResult, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Boolean,
    StringArray,
    /// Calendar date formatted `YYYY-MM-DD`.
    Date,
}

impl ParamType {
    fn json_type(&self) -> &'static str {
        match self {
            ParamType::String | ParamType::Date => "string",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::StringArray => "array",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Int(i64),
    Bool(bool),
    Str(&'static str),
}

impl DefaultValue {
    fn to_value(self) -> Value {
        match self {
            DefaultValue::Int(v) => json!(v),
            DefaultValue::Bool(v) => json!(v),
            DefaultValue::Str(v) => json!(v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub description: &'static str,
    pub required: bool,
    pub default: Option<DefaultValue>,
    /// Inclusive bounds: the value for integers, the length for arrays.
    pub range: Option<(i64, i64)>,
    pub one_of: Option<&'static [&'static str]>,
    /// Accept a comma-separated list where every item must be in `one_of`.
    pub comma_separated: bool,
}

impl ParamSpec {
    const fn new(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            description,
            required: false,
            default: None,
            range: None,
            one_of: None,
            comma_separated: false,
        }
    }

    pub const fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamType::String, description)
    }

    pub const fn integer(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamType::Integer, description)
    }

    pub const fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamType::Boolean, description)
    }

    pub const fn string_array(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamType::StringArray, description)
    }

    pub const fn date(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamType::Date, description)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn default_int(mut self, value: i64) -> Self {
        self.default = Some(DefaultValue::Int(value));
        self
    }

    pub const fn default_bool(mut self, value: bool) -> Self {
        self.default = Some(DefaultValue::Bool(value));
        self
    }

    pub const fn default_str(mut self, value: &'static str) -> Self {
        self.default = Some(DefaultValue::Str(value));
        self
    }

    pub const fn range(mut self, min: i64, max: i64) -> Self {
        self.range = Some((min, max));
        self
    }

    pub const fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.one_of = Some(values);
        self
    }

    pub const fn comma_separated(mut self) -> Self {
        self.comma_separated = true;
        self
    }

    /// Check one supplied value. `Ok(None)` drops an empty optional string.
    fn check(&self, value: Value) -> Result<Option<Value>, ValidationError> {
        match self.ty {
            ParamType::String | ParamType::Date => {
                let Value::String(s) = value else {
                    return Err(ValidationError::wrong_type(self.name, "string"));
                };
                if s.trim().is_empty() {
                    return if self.required {
                        Err(ValidationError::missing(self.name))
                    } else {
                        Ok(None)
                    };
                }
                if self.ty == ParamType::Date
                    && NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").is_err()
                {
                    return Err(ValidationError::invalid_format(self.name, "YYYY-MM-DD"));
                }
                self.check_allowed(&s)?;
                Ok(Some(Value::String(s)))
            }
            ParamType::Integer => {
                let n = value
                    .as_i64()
                    .ok_or_else(|| ValidationError::wrong_type(self.name, "integer"))?;
                self.check_range(n, "value")?;
                Ok(Some(json!(n)))
            }
            ParamType::Boolean => {
                let b = value
                    .as_bool()
                    .ok_or_else(|| ValidationError::wrong_type(self.name, "boolean"))?;
                Ok(Some(json!(b)))
            }
            ParamType::StringArray => {
                let Value::Array(items) = value else {
                    return Err(ValidationError::wrong_type(self.name, "array of strings"));
                };
                let mut strings = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) if !s.trim().is_empty() => strings.push(s),
                        Value::String(_) => {
                            return Err(ValidationError::out_of_range(
                                self.name,
                                "items must not be empty",
                            ));
                        }
                        _ => return Err(ValidationError::wrong_type(self.name, "array of strings")),
                    }
                }
                if strings.is_empty() && self.required {
                    return Err(ValidationError::missing(self.name));
                }
                self.check_range(strings.len() as i64, "length")?;
                Ok(Some(json!(strings)))
            }
        }
    }

    fn check_range(&self, n: i64, what: &str) -> Result<(), ValidationError> {
        if let Some((min, max)) = self.range
            && (n < min || n > max)
        {
            return Err(ValidationError::out_of_range(
                self.name,
                format!("{} {} not within {}..={}", what, n, min, max),
            ));
        }
        Ok(())
    }

    fn check_allowed(&self, s: &str) -> Result<(), ValidationError> {
        let Some(allowed) = self.one_of else {
            return Ok(());
        };
        let rejected = if self.comma_separated {
            s.split(',')
                .map(str::trim)
                .find(|item| !allowed.contains(item))
        } else {
            (!allowed.contains(&s)).then_some(s)
        };
        match rejected {
            Some(item) => Err(ValidationError::out_of_range(
                self.name,
                format!("'{}' is not one of {}", item, allowed.join(", ")),
            )),
            None => Ok(()),
        }
    }

    /// JSON Schema fragment for `tools/list`.
    pub fn json_schema(&self) -> Value {
        let mut schema = json!({
            "type": self.ty.json_type(),
            "description": self.description,
        });
        if let Some(default) = self.default {
            schema["default"] = default.to_value();
        }
        match self.ty {
            ParamType::StringArray => {
                schema["items"] = json!({"type": "string"});
                if let Some((min, max)) = self.range {
                    schema["minItems"] = json!(min);
                    schema["maxItems"] = json!(max);
                }
            }
            ParamType::Integer => {
                if let Some((min, max)) = self.range {
                    schema["minimum"] = json!(min);
                    schema["maximum"] = json!(max);
                }
            }
            ParamType::Date => schema["format"] = json!("date"),
            _ => {}
        }
        if let Some(values) = self.one_of
            && !self.comma_separated
        {
            schema["enum"] = json!(values);
        }
        schema
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

impl ToolSpec {
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn required_names(&self) -> Vec<&'static str> {
        self.params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect()
    }
}

/// Arguments that passed validation, with defaults applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }

    pub fn str_list(&self, name: &str) -> Vec<&str> {
        self.0
            .get(name)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    // Presence of required params is guaranteed by `validate`; a miss here
    // is a bug in the tool's table.
    pub fn require_str(&self, name: &str) -> McpResult<&str> {
        self.str(name)
            .ok_or_else(|| McpError::Internal(format!("validated parameter '{}' absent", name)))
    }

    pub fn require_int(&self, name: &str) -> McpResult<i64> {
        self.int(name)
            .ok_or_else(|| McpError::Internal(format!("validated parameter '{}' absent", name)))
    }
}

/// Validate raw tool arguments against a tool's parameter table.
pub fn validate(spec: &ToolSpec, arguments: Value) -> Result<Params, ValidationError> {
    let mut supplied = match arguments {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        _ => return Err(ValidationError::wrong_type("arguments", "object")),
    };

    if let Some(unknown) = supplied.keys().find(|k| spec.param(k).is_none()) {
        return Err(ValidationError::unknown(unknown.as_str()));
    }

    let mut params = Map::new();
    for param in spec.params {
        let checked = match supplied.remove(param.name) {
            None | Some(Value::Null) => None,
            Some(value) => param.check(value)?,
        };
        match (checked, param.default) {
            (Some(value), _) => {
                params.insert(param.name.to_string(), value);
            }
            (None, Some(default)) => {
                params.insert(param.name.to_string(), default.to_value());
            }
            (None, None) if param.required => {
                return Err(ValidationError::missing(param.name));
            }
            (None, None) => {}
        }
    }

    Ok(Params(params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationReason;
    use pretty_assertions::assert_eq;

    const SPEC: ToolSpec = ToolSpec {
        name: "test_tool",
        description: "Tool used by validator tests",
        params: &[
            ParamSpec::string("channel_id", "Channel").required(),
            ParamSpec::integer("limit", "Page size")
                .default_int(100)
                .range(1, 1000),
            ParamSpec::string("cursor", "Cursor"),
            ParamSpec::boolean("highlight", "Highlight").default_bool(false),
            ParamSpec::string("sort", "Sort")
                .one_of(&["score", "timestamp"])
                .default_str("score"),
            ParamSpec::string("types", "Types")
                .one_of(&["public_channel", "im"])
                .comma_separated(),
            ParamSpec::date("before", "Date"),
            ParamSpec::string_array("user_ids", "Users").range(1, 3),
        ],
    };

    #[test]
    fn test_defaults_applied() {
        let params = validate(&SPEC, json!({"channel_id": "C1"})).unwrap();

        assert_eq!(params.str("channel_id"), Some("C1"));
        assert_eq!(params.int("limit"), Some(100));
        assert_eq!(params.bool("highlight"), Some(false));
        assert_eq!(params.str("sort"), Some("score"));
        assert_eq!(params.str("cursor"), None);
    }

    #[test]
    fn test_missing_required() {
        let err = validate(&SPEC, json!({"limit": 5})).unwrap_err();
        assert_eq!(err, ValidationError::missing("channel_id"));

        let err = validate(&SPEC, Value::Null).unwrap_err();
        assert_eq!(err.field, "channel_id");

        let err = validate(&SPEC, json!({"channel_id": "  "})).unwrap_err();
        assert_eq!(err.reason, ValidationReason::Missing);
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let err = validate(&SPEC, json!({"channel_id": "C1", "channel": "C2"})).unwrap_err();
        assert_eq!(err, ValidationError::unknown("channel"));
    }

    #[test]
    fn test_wrong_type() {
        let err = validate(&SPEC, json!({"channel_id": "C1", "limit": "10"})).unwrap_err();
        assert_eq!(err, ValidationError::wrong_type("limit", "integer"));

        let err = validate(&SPEC, json!({"channel_id": 42})).unwrap_err();
        assert_eq!(err, ValidationError::wrong_type("channel_id", "string"));

        let err = validate(&SPEC, json!(["C1"])).unwrap_err();
        assert_eq!(err.field, "arguments");
    }

    #[test]
    fn test_limit_out_of_range() {
        let err = validate(&SPEC, json!({"channel_id": "C1", "limit": 1001})).unwrap_err();
        assert_eq!(err.field, "limit");
        assert_eq!(err.reason.code(), "out_of_range");

        let err = validate(&SPEC, json!({"channel_id": "C1", "limit": 0})).unwrap_err();
        assert_eq!(err.reason.code(), "out_of_range");
    }

    #[test]
    fn test_enum_and_csv_values() {
        let err = validate(&SPEC, json!({"channel_id": "C1", "sort": "newest"})).unwrap_err();
        assert_eq!(err.field, "sort");

        let ok = validate(&SPEC, json!({"channel_id": "C1", "types": "public_channel, im"}));
        assert!(ok.is_ok());

        let err = validate(&SPEC, json!({"channel_id": "C1", "types": "public_channel,dm"}))
            .unwrap_err();
        assert_eq!(err.field, "types");
    }

    #[test]
    fn test_date_format() {
        assert!(validate(&SPEC, json!({"channel_id": "C1", "before": "2024-02-29"})).is_ok());

        let err = validate(&SPEC, json!({"channel_id": "C1", "before": "02/29/2024"})).unwrap_err();
        assert_eq!(err, ValidationError::invalid_format("before", "YYYY-MM-DD"));
    }

    #[test]
    fn test_string_array_length() {
        let args = json!({"channel_id": "C1", "user_ids": ["U1", "U2"]});
        let params = validate(&SPEC, args).unwrap();
        assert_eq!(params.str_list("user_ids"), vec!["U1", "U2"]);

        let err = validate(
            &SPEC,
            json!({"channel_id": "C1", "user_ids": ["U1", "U2", "U3", "U4"]}),
        )
        .unwrap_err();
        assert_eq!(err.reason.code(), "out_of_range");

        let err = validate(&SPEC, json!({"channel_id": "C1", "user_ids": ["U1", 2]})).unwrap_err();
        assert_eq!(err.reason.code(), "wrong_type");
    }

    #[test]
    fn test_empty_optional_string_dropped() {
        let params = validate(&SPEC, json!({"channel_id": "C1", "cursor": ""})).unwrap();
        assert_eq!(params.str("cursor"), None);
    }

    #[test]
    fn test_json_schema_fragment() {
        let limit = SPEC.param("limit").unwrap().json_schema();
        assert_eq!(limit["type"], "integer");
        assert_eq!(limit["default"], 100);
        assert_eq!(limit["maximum"], 1000);

        let sort = SPEC.param("sort").unwrap().json_schema();
        assert_eq!(sort["enum"], json!(["score", "timestamp"]));

        assert_eq!(SPEC.required_names(), vec!["channel_id"]);
    }
}
