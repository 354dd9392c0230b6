//! Typed schema properties and their value coercion rules.
//!
//! A property maps an external (query-facing) name to a storage column and a
//! kind. The kind drives how raw values coming back from the database are
//! coerced into application values.
//!
//! # Supported kinds
//!
//! - `default` - pass-through (also the fallback when no type is declared)
//! - `string` - string coercion
//! - `boolean` - truthiness coercion
//! - `number` - lenient numeric parse (integer first, float second)
//! - `integer` - integer parse (floats truncate)
//! - `float` - float parse
//! - `primaryKey` - pass-through; forces the external name to `id`

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::errors::SchemaCatalogError;

/// External name every primary-key property is exposed under, regardless of
/// its storage column name.
pub const ID_PROPERTY_NAME: &str = "id";

/// Placeholder replaced by the resolved column name inside a raw expression
/// template.
pub const RAW_COLUMN_PLACEHOLDER: &str = "$1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Default,
    String,
    Boolean,
    Number,
    Integer,
    Float,
    PrimaryKey,
}

impl PropertyKind {
    /// Parse a type string from a schema definition.
    ///
    /// Case-insensitive and supports common aliases for convenience.
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(PropertyKind::Default),
            "string" | "text" => Ok(PropertyKind::String),
            "boolean" | "bool" => Ok(PropertyKind::Boolean),
            "number" => Ok(PropertyKind::Number),
            "integer" | "int" => Ok(PropertyKind::Integer),
            "float" | "double" => Ok(PropertyKind::Float),
            "primarykey" | "pk" => Ok(PropertyKind::PrimaryKey),
            _ => Err(format!(
                "Unknown type: '{}'. Supported: default, string, boolean, number, integer, float, primaryKey",
                s
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKind::Default => "default",
            PropertyKind::String => "string",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Number => "number",
            PropertyKind::Integer => "integer",
            PropertyKind::Float => "float",
            PropertyKind::PrimaryKey => "primaryKey",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Custom value parser applied before kind coercion during decoding.
pub type ValueParser = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// One property entry in a schema definition. Either a bare type string
/// (`"title": "string"`) or an options object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PropertyDef {
    Kind(String),
    Options(PropertyOptions),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyOptions {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Storage column name when it differs from the property name.
    pub alias: Option<String>,
    /// Column expression template; `$1` is replaced with the resolved column
    /// name at render time.
    pub raw: Option<String>,
    pub use_locale: bool,
    /// Whether decoded string values participate in highlight wrapping.
    pub htm: bool,
    pub default_value: Option<Value>,
}

/// A resolved schema property.
#[derive(Clone)]
pub struct SchemaProperty {
    /// External, query-facing name. Forced to [`ID_PROPERTY_NAME`] for
    /// primary keys.
    pub name: String,
    /// Storage column name.
    pub alias: String,
    pub kind: PropertyKind,
    pub raw: Option<String>,
    pub use_locale: bool,
    pub supports_highlight: bool,
    pub default_value: Option<Value>,
    pub parser: Option<ValueParser>,
}

impl fmt::Debug for SchemaProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaProperty")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("kind", &self.kind)
            .field("raw", &self.raw)
            .field("use_locale", &self.use_locale)
            .field("supports_highlight", &self.supports_highlight)
            .field("default_value", &self.default_value)
            .field("parser", &self.parser.is_some())
            .finish()
    }
}

impl SchemaProperty {
    /// Build a property from its definition entry.
    ///
    /// When the kind is `primaryKey` the external name is forced to `id` and
    /// the declared name becomes the storage column, so every schema exposes
    /// a uniform key field over arbitrary column names.
    pub fn from_def(
        schema: &str,
        declared_name: &str,
        def: &PropertyDef,
    ) -> Result<Self, SchemaCatalogError> {
        let opts = match def {
            PropertyDef::Kind(kind) => PropertyOptions {
                kind: Some(kind.clone()),
                ..Default::default()
            },
            PropertyDef::Options(opts) => opts.clone(),
        };
        let kind = match &opts.kind {
            Some(raw_kind) => PropertyKind::from_str(raw_kind).map_err(|_| {
                SchemaCatalogError::UnknownPropertyType {
                    schema: schema.to_string(),
                    property: declared_name.to_string(),
                    type_name: raw_kind.clone(),
                }
            })?,
            None => {
                log::debug!(
                    "Undefined type on prop `{}` of `{}`, using `default`",
                    declared_name,
                    schema
                );
                PropertyKind::Default
            }
        };
        let alias = opts.alias.clone().unwrap_or_else(|| declared_name.to_string());
        let name = if kind == PropertyKind::PrimaryKey {
            ID_PROPERTY_NAME.to_string()
        } else {
            declared_name.to_string()
        };
        Ok(SchemaProperty {
            name,
            alias,
            kind,
            raw: opts.raw,
            use_locale: opts.use_locale,
            supports_highlight: opts.htm,
            default_value: opts.default_value,
            parser: None,
        })
    }

    /// Resolved storage column, honoring the locale suffix for
    /// locale-sensitive properties.
    pub fn column_name(&self, locale_suffix: &str) -> String {
        if self.use_locale {
            format!("{}{}", self.alias, locale_suffix)
        } else {
            self.alias.clone()
        }
    }

    /// The raw expression with its placeholder resolved, if one is declared.
    pub fn raw_expression(&self) -> Option<String> {
        self.raw
            .as_ref()
            .map(|raw| raw.replace(RAW_COLUMN_PLACEHOLDER, &self.alias))
    }

    /// Coerce a raw database value into an application value.
    ///
    /// The custom parser (if any) runs first, then kind coercion, then the
    /// declared default substitutes an empty/falsy result.
    pub fn parse_value(&self, value: Value) -> Value {
        let value = match &self.parser {
            Some(parser) => parser(value),
            None => value,
        };
        let value = match self.kind {
            PropertyKind::String => coerce_string(value),
            PropertyKind::Boolean => Value::Bool(truthy(&value)),
            PropertyKind::Number => coerce_number(value),
            PropertyKind::Integer => coerce_integer(value),
            PropertyKind::Float => coerce_float(value),
            PropertyKind::Default | PropertyKind::PrimaryKey => value,
        };
        match &self.default_value {
            Some(default) if is_empty_or_falsy(&value) => default.clone(),
            _ => value,
        }
    }
}

/// JSON truthiness as the decoder sees it: `null`, `false`, `0`, `""`,
/// `"0"` and `"false"` are false, everything else is true.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")),
        _ => true,
    }
}

fn is_empty_or_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0).unwrap_or(false),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn coerce_string(value: Value) -> Value {
    match value {
        Value::String(_) => value,
        Value::Null => Value::String(String::new()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        other => other,
    }
}

fn coerce_number(value: Value) -> Value {
    match &value {
        Value::Number(_) => value,
        Value::String(s) => {
            if let Ok(i) = s.trim().parse::<i64>() {
                return Value::from(i);
            }
            match s.trim().parse::<f64>() {
                Ok(f) => serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(value),
                Err(_) => value,
            }
        }
        _ => value,
    }
}

fn coerce_integer(value: Value) -> Value {
    match &value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(f) = n.as_f64() {
                Value::from(f.trunc() as i64)
            } else {
                value
            }
        }
        Value::String(s) => {
            if let Ok(i) = s.trim().parse::<i64>() {
                Value::from(i)
            } else if let Ok(f) = s.trim().parse::<f64>() {
                Value::from(f.trunc() as i64)
            } else {
                value
            }
        }
        _ => value,
    }
}

fn coerce_float(value: Value) -> Value {
    match &value {
        Value::Number(n) => match n.as_f64().and_then(serde_json::Number::from_f64) {
            Some(f) => Value::Number(f),
            None => value,
        },
        Value::String(s) => match s.trim().parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
            Some(f) => Value::Number(f),
            None => value,
        },
        _ => value,
    }
}
