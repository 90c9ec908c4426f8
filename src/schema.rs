//! Parameter schemas for tool inputs.
//!
//! A `ParametersSchema` is the one description of a tool's arguments. Each
//! protocol adapter renders it through a [`TypeVocabulary`], and handlers
//! check incoming arguments against it with [`validate_args`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;
use crate::model::JsonObject;

/// The JSON types a property may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl JsonType {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|n| n.fract() == 0.0)
            }
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// Type names a protocol uses in its schemas.
///
/// The mapping is total: a missing or unrecognized type becomes the
/// vocabulary's string type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeVocabulary {
    /// Lower-case JSON Schema names (MCP, OpenAI).
    JsonSchema,
    /// Upper-case names used by Gemini function declarations.
    Gemini,
}

impl TypeVocabulary {
    pub fn map(&self, ty: Option<&str>) -> &'static str {
        let ty = ty.and_then(JsonType::parse).unwrap_or(JsonType::String);
        match self {
            Self::JsonSchema => ty.as_str(),
            Self::Gemini => match ty {
                JsonType::String => "STRING",
                JsonType::Number => "NUMBER",
                JsonType::Integer => "INTEGER",
                JsonType::Boolean => "BOOLEAN",
                JsonType::Array => "ARRAY",
                JsonType::Object => "OBJECT",
            },
        }
    }

    fn keeps_additional_properties(&self) -> bool {
        matches!(self, Self::JsonSchema)
    }
}

/// Schema of a single property. Recursive through `items` and `properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, PropertySchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl PropertySchema {
    pub fn of_type(ty: JsonType) -> Self {
        Self {
            ty: Some(ty.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn string() -> Self {
        Self::of_type(JsonType::String)
    }

    pub fn number() -> Self {
        Self::of_type(JsonType::Number)
    }

    pub fn boolean() -> Self {
        Self::of_type(JsonType::Boolean)
    }

    /// Array whose elements follow `items`.
    pub fn array_of(items: PropertySchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of_type(JsonType::Array)
        }
    }

    /// Nested object; properties keep insertion order.
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, PropertySchema)>,
        K: Into<String>,
    {
        Self {
            properties: Some(
                properties
                    .into_iter()
                    .map(|(name, schema)| (name.into(), schema))
                    .collect(),
            ),
            ..Self::of_type(JsonType::Object)
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(
            values
                .into_iter()
                .map(|value| Value::String(value.into()))
                .collect(),
        );
        self
    }

    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = Some(names.into_iter().map(Into::into).collect());
        self
    }

    fn translate(&self, vocab: TypeVocabulary) -> Self {
        Self {
            ty: Some(vocab.map(self.ty.as_deref()).to_string()),
            description: self.description.clone(),
            enum_values: self.enum_values.clone(),
            items: self
                .items
                .as_ref()
                .map(|items| Box::new(items.translate(vocab))),
            properties: self.properties.as_ref().map(|properties| {
                properties
                    .iter()
                    .map(|(name, schema)| (name.clone(), schema.translate(vocab)))
                    .collect()
            }),
            required: self.required.clone(),
        }
    }
}

/// Top-level schema of a tool's arguments. Always an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametersSchema {
    #[serde(rename = "type")]
    pub ty: String,
    pub properties: IndexMap<String, PropertySchema>,
    pub required: Vec<String>,
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,
}

impl Default for ParametersSchema {
    fn default() -> Self {
        Self {
            ty: JsonType::Object.as_str().to_string(),
            properties: IndexMap::new(),
            required: Vec::new(),
            additional_properties: None,
        }
    }
}

impl ParametersSchema {
    /// An empty, closed schema for tools that take no arguments.
    pub fn empty() -> Self {
        Self::default().closed()
    }

    pub fn property(mut self, name: impl Into<String>, schema: PropertySchema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = names.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the schema as rejecting undeclared properties in its advertised form.
    pub fn closed(mut self) -> Self {
        self.additional_properties = Some(false);
        self
    }

    /// Render this schema in a protocol's type vocabulary.
    ///
    /// Property order, `enum` values and every `required` list are kept
    /// verbatim; only type names change.
    pub fn translate(&self, vocab: TypeVocabulary) -> Self {
        Self {
            ty: vocab.map(Some(&self.ty)).to_string(),
            properties: self
                .properties
                .iter()
                .map(|(name, schema)| (name.clone(), schema.translate(vocab)))
                .collect(),
            required: self.required.clone(),
            additional_properties: if vocab.keeps_additional_properties() {
                self.additional_properties
            } else {
                None
            },
        }
    }

    /// Serialize to a JSON object (for rmcp's `input_schema`).
    pub fn to_json_object(&self) -> JsonObject {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => JsonObject::new(),
        }
    }
}

/// Check `args` against `schema`, collecting one message per offending field.
///
/// Undeclared arguments are ignored; `null` counts as absent.
pub fn validate_args(schema: &ParametersSchema, args: &JsonObject) -> Result<(), ToolError> {
    let mut errors = Vec::new();
    check_object(&schema.properties, &schema.required, args, "", &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ToolError::Validation(errors))
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn check_object(
    properties: &IndexMap<String, PropertySchema>,
    required: &[String],
    object: &JsonObject,
    prefix: &str,
    errors: &mut Vec<String>,
) {
    for name in required {
        if object.get(name).is_none_or(Value::is_null) {
            errors.push(format!("{}: is required", join_path(prefix, name)));
        }
    }

    for (name, schema) in properties {
        match object.get(name) {
            None | Some(Value::Null) => {}
            Some(value) => check_value(schema, value, &join_path(prefix, name), errors),
        }
    }
}

fn check_value(schema: &PropertySchema, value: &Value, path: &str, errors: &mut Vec<String>) {
    if let Some(ty) = schema.ty.as_deref().and_then(JsonType::parse)
        && !ty.matches(value)
    {
        errors.push(format!("{}: expected {}", path, ty.as_str()));
        return;
    }

    if let Some(allowed) = &schema.enum_values
        && !allowed.contains(value)
    {
        let options = allowed
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join(", ");
        errors.push(format!("{}: must be one of: {}", path, options));
    }

    match value {
        Value::Array(elements) => {
            if let Some(items) = &schema.items {
                for (index, element) in elements.iter().enumerate() {
                    check_value(items, element, &format!("{}[{}]", path, index), errors);
                }
            }
        }
        Value::Object(object) => {
            if let Some(properties) = &schema.properties {
                let required = schema.required.as_deref().unwrap_or_default();
                check_object(properties, required, object, path, errors);
            }
        }
        _ => {}
    }
}
