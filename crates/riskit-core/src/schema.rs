//! Output Schemas
//!
//! Declarative description of the JSON a provider must return. One schema
//! renders into two dialects: the Gemini `responseSchema` (upper-case type
//! names) and standard JSON Schema for providers that only take the schema
//! as instructions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Primitive and composite JSON types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl SchemaType {
    /// JSON Schema spelling
    pub const fn json_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    /// Gemini `Type` enum spelling
    pub const fn gemini_name(self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Number => "NUMBER",
            Self::Integer => "INTEGER",
            Self::Boolean => "BOOLEAN",
            Self::Object => "OBJECT",
            Self::Array => "ARRAY",
        }
    }
}

/// A node in the output schema tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputSchema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,

    /// Object fields, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<(String, OutputSchema)>,

    /// Element schema for arrays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<OutputSchema>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Allowed string values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

impl OutputSchema {
    fn of(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            properties: Vec::new(),
            items: None,
            required: Vec::new(),
            description: None,
            enum_values: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::of(SchemaType::String)
    }

    pub fn number() -> Self {
        Self::of(SchemaType::Number)
    }

    pub fn integer() -> Self {
        Self::of(SchemaType::Integer)
    }

    pub fn boolean() -> Self {
        Self::of(SchemaType::Boolean)
    }

    pub fn array(items: Self) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(SchemaType::Array)
        }
    }

    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, Self)>,
        K: Into<String>,
    {
        Self {
            properties: properties.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::of(SchemaType::Object)
        }
    }

    /// String restricted to a fixed set of values
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enum_values: values.into_iter().map(Into::into).collect(),
            ..Self::of(SchemaType::String)
        }
    }

    pub fn required<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Mark every declared property as required
    pub fn all_required(mut self) -> Self {
        self.required = self.properties.iter().map(|(name, _)| name.clone()).collect();
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_array_rooted(&self) -> bool {
        self.schema_type == SchemaType::Array
    }

    /// Look up a property schema by name
    pub fn property(&self, name: &str) -> Option<&Self> {
        self.properties
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, schema)| schema)
    }

    /// Render as a Gemini `responseSchema`
    pub fn to_gemini(&self) -> Value {
        self.render(SchemaType::gemini_name)
    }

    /// Render as standard JSON Schema
    pub fn to_json_schema(&self) -> Value {
        self.render(SchemaType::json_name)
    }

    fn render(&self, type_name: fn(SchemaType) -> &'static str) -> Value {
        let mut out = Map::new();
        out.insert("type".into(), json!(type_name(self.schema_type)));

        if let Some(description) = &self.description {
            out.insert("description".into(), json!(description));
        }
        if !self.enum_values.is_empty() {
            out.insert("enum".into(), json!(self.enum_values));
        }
        if !self.properties.is_empty() {
            let properties: Map<String, Value> = self
                .properties
                .iter()
                .map(|(name, schema)| (name.clone(), schema.render(type_name)))
                .collect();
            out.insert("properties".into(), Value::Object(properties));
        }
        if let Some(items) = &self.items {
            out.insert("items".into(), items.render(type_name));
        }
        if !self.required.is_empty() {
            out.insert("required".into(), json!(self.required));
        }

        Value::Object(out)
    }
}
