use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Prefix of every `$ref` pointing at a registered component schema
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Content type assumed for `file` tokens that do not declare one
pub const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// OpenAPI constraint keywords (`minimum`, `maxLength`, `example`, ...) attached to a type
pub type Constraints = Map<String, Value>;

/// Type resolver - turns short type tokens (`int`, `[string]`, `enum[a,b]`, `Model`)
/// into type descriptors that know how to render themselves as OpenAPI schemas.
///
/// Resolution is total: any token that is not a builtin keyword or bracket form is
/// treated as a reference to a named model, to be checked later by the document builder.
///
/// # Example
///
/// ```
/// use openapi_from_docstring::type_resolver::{resolve, TypeKind};
///
/// let resolved = resolve("[integer]", Default::default());
/// assert!(matches!(resolved.kind, TypeKind::Array { .. }));
/// ```
pub fn resolve(token: &str, constraints: Constraints) -> TypeDescriptor {
    let token = token.trim();
    let kind = resolve_kind(token);
    debug!("Resolved type token {:?} to {}", token, kind.name());
    TypeDescriptor { kind, constraints }
}

/// A resolved type together with the constraint keywords declared for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDescriptor {
    /// The kind of type
    #[serde(flatten)]
    pub kind: TypeKind,
    /// Constraint keywords merged into the rendered schema
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub constraints: Constraints,
}

/// Type kind - the closed set of types a token can resolve to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeKind {
    /// Absent or void type
    None,
    /// `bool`, `boolean`
    Boolean,
    /// `int`, `integer`, `int32`, `long`, `int64`
    Integer {
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    /// `number`, `float`, `double`
    Number {
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    /// `str`, `string` and the string formats (`date`, `uuid`, ...)
    String {
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    /// `file` or `file:<content-type>`
    File {
        #[serde(rename = "contentType", skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
    },
    /// `[<inner>]`
    Array { items: Box<TypeDescriptor> },
    /// `enum[a,b,c]`
    Enum { values: Vec<String> },
    /// `anyOf[..]`, `allOf[..]`, `oneOf[..]`, `not[..]`
    Combine {
        op: CombineOp,
        types: Vec<TypeDescriptor>,
    },
    /// Any other token, resolved by name against the registered schemas
    Model { name: String },
}

/// Schema composition keyword used by [`TypeKind::Combine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CombineOp {
    #[serde(rename = "anyOf")]
    AnyOf,
    #[serde(rename = "allOf")]
    AllOf,
    #[serde(rename = "oneOf")]
    OneOf,
    #[serde(rename = "not")]
    Not,
}

impl CombineOp {
    const ALL: [CombineOp; 4] = [
        CombineOp::OneOf,
        CombineOp::AnyOf,
        CombineOp::AllOf,
        CombineOp::Not,
    ];

    /// The OpenAPI keyword, which is also the token prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            CombineOp::AnyOf => "anyOf",
            CombineOp::AllOf => "allOf",
            CombineOp::OneOf => "oneOf",
            CombineOp::Not => "not",
        }
    }
}

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for primitive types (e.g., "int32", "int64", "float", "date")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Human readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Properties for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    /// Required property names for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Enum values for enum types
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "allOf", skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Schema>>,
    #[serde(rename = "anyOf", skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<Schema>>,
    #[serde(rename = "oneOf", skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,
    /// Constraint keywords with no dedicated field (`minimum`, `example`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Schema {
    /// Schema with a `type` and an optional `format`
    pub fn typed(schema_type: &str, format: Option<&str>) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            format: format.map(str::to_string),
            ..Default::default()
        }
    }

    /// `$ref` schema pointing at a registered component
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", SCHEMA_REF_PREFIX, name)),
            ..Default::default()
        }
    }

    /// Object schema with the given properties
    pub fn object(properties: BTreeMap<String, Schema>, required: Vec<String>) -> Self {
        Self {
            schema_type: Some("object".to_string()),
            properties: Some(properties),
            required: if required.is_empty() { None } else { Some(required) },
            ..Default::default()
        }
    }

    /// Sets the description unless it is empty
    pub fn with_description(mut self, description: &str) -> Self {
        let description = description.trim();
        if !description.is_empty() {
            self.description = Some(description.to_string());
        }
        self
    }

    /// Merges constraint keywords into the schema.
    ///
    /// Keywords that describe the structure of the schema itself (`type`, `items`,
    /// `$ref`, ...) are ignored so a stray annotation cannot produce a duplicate key.
    pub fn with_constraints(mut self, constraints: &Constraints) -> Self {
        for (key, value) in constraints {
            match key.as_str() {
                "format" => {
                    if let Some(format) = value.as_str() {
                        self.format = Some(format.to_string());
                    }
                }
                "description" => {
                    if let Some(description) = value.as_str() {
                        self.description = Some(description.to_string());
                    }
                }
                "enum" => match value {
                    Value::String(csv) => {
                        self.enum_values =
                            Some(csv.split(',').map(|v| v.trim().to_string()).collect());
                    }
                    Value::Array(values) => {
                        self.enum_values = Some(
                            values
                                .iter()
                                .map(|v| {
                                    v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())
                                })
                                .collect(),
                        );
                    }
                    _ => debug!("Ignoring non-list enum constraint: {}", value),
                },
                "type" | "items" | "$ref" | "properties" | "required" | "allOf" | "anyOf" | "oneOf"
                | "not" => {
                    debug!("Ignoring structural keyword used as constraint: {}", key);
                }
                _ => {
                    self.extra.insert(key.clone(), value.clone());
                }
            }
        }
        self
    }
}

impl TypeDescriptor {
    /// Resolves a token without constraints
    pub fn parse(token: &str) -> Self {
        resolve(token, Constraints::new())
    }

    /// The absent type
    pub fn none() -> Self {
        Self {
            kind: TypeKind::None,
            constraints: Constraints::new(),
        }
    }

    /// Short type name (`integer`, `array`, model name, ...)
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    pub fn is_none(&self) -> bool {
        matches!(self.kind, TypeKind::None)
    }

    /// True for scalar types rendered as plain text (enums are strings)
    pub fn is_primitive(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Boolean
                | TypeKind::Integer { .. }
                | TypeKind::Number { .. }
                | TypeKind::String { .. }
                | TypeKind::Enum { .. }
        )
    }

    /// Model name for `Model` types
    pub fn model_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Model { name } => Some(name),
            _ => None,
        }
    }

    /// Declared content type for `File` types, falling back to octet-stream
    pub fn file_content_type(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::File { content_type } => {
                Some(content_type.as_deref().unwrap_or(DEFAULT_FILE_CONTENT_TYPE))
            }
            _ => None,
        }
    }

    /// Renders the schema fragment for this type.
    ///
    /// Returns `None` only for the absent type. Constraints are merged into every
    /// fragment except model references, which stay a bare `$ref`.
    pub fn schema(&self) -> Option<Schema> {
        let schema = match &self.kind {
            TypeKind::None => return None,
            TypeKind::Boolean => Schema::typed("boolean", None),
            TypeKind::Integer { format } => Schema::typed("integer", format.as_deref()),
            TypeKind::Number { format } => Schema::typed("number", format.as_deref()),
            TypeKind::String { format } => Schema::typed("string", format.as_deref()),
            TypeKind::File { .. } => Schema::typed("string", Some("binary")),
            TypeKind::Array { items } => Schema {
                schema_type: Some("array".to_string()),
                items: Some(Box::new(items.schema().unwrap_or_default())),
                ..Default::default()
            },
            TypeKind::Enum { values } => Schema {
                schema_type: Some("string".to_string()),
                enum_values: Some(values.clone()),
                ..Default::default()
            },
            TypeKind::Combine { op, types } => {
                let mut schemas: Vec<Schema> = types.iter().filter_map(|t| t.schema()).collect();
                match op {
                    CombineOp::AnyOf => Schema {
                        any_of: Some(schemas),
                        ..Default::default()
                    },
                    CombineOp::AllOf => Schema {
                        all_of: Some(schemas),
                        ..Default::default()
                    },
                    CombineOp::OneOf => Schema {
                        one_of: Some(schemas),
                        ..Default::default()
                    },
                    CombineOp::Not => {
                        let negated = if schemas.len() == 1 {
                            schemas.remove(0)
                        } else {
                            Schema {
                                any_of: Some(schemas),
                                ..Default::default()
                            }
                        };
                        Schema {
                            not: Some(Box::new(negated)),
                            ..Default::default()
                        }
                    }
                }
            }
            TypeKind::Model { name } => return Some(Schema::reference(name)),
        };
        Some(schema.with_constraints(&self.constraints))
    }
}

impl TypeKind {
    /// Short type name, as the document builder inspects it
    pub fn name(&self) -> &str {
        match self {
            TypeKind::None => "None",
            TypeKind::Boolean => "boolean",
            TypeKind::Integer { .. } => "integer",
            TypeKind::Number { .. } => "number",
            TypeKind::String { .. } | TypeKind::Enum { .. } => "string",
            TypeKind::File { .. } => "file",
            TypeKind::Array { .. } => "array",
            TypeKind::Combine { op, .. } => op.as_str(),
            TypeKind::Model { name } => name,
        }
    }
}

fn resolve_kind(token: &str) -> TypeKind {
    if token.is_empty() {
        return TypeKind::None;
    }

    if let Some(inner) = bracketed(token, "") {
        return TypeKind::Array {
            items: Box::new(TypeDescriptor::parse(inner)),
        };
    }

    if let Some(csv) = bracketed(token, "enum") {
        let values = csv.split(',').map(|v| v.trim().to_string()).collect();
        return TypeKind::Enum { values };
    }

    for op in CombineOp::ALL {
        if let Some(csv) = bracketed(token, op.as_str()) {
            let types = split_top_level(csv)
                .into_iter()
                .map(TypeDescriptor::parse)
                .collect();
            return TypeKind::Combine { op, types };
        }
    }

    resolve_builtin(token)
}

/// Matches `<prefix>[<inner>]` and returns the inner text
fn bracketed<'a>(token: &'a str, prefix: &str) -> Option<&'a str> {
    token
        .strip_prefix(prefix)?
        .strip_prefix('[')?
        .strip_suffix(']')
}

/// Splits on commas that are not nested inside brackets
fn split_top_level(csv: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in csv.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(csv[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(csv[start..].trim());
    parts
}

fn resolve_builtin(token: &str) -> TypeKind {
    let (base, suffix) = match token.split_once(':') {
        Some((base, suffix)) => (base.trim(), Some(suffix.trim()).filter(|s| !s.is_empty())),
        None => (token, None),
    };
    let explicit = suffix.map(str::to_string);

    match base {
        "int" | "integer" => TypeKind::Integer { format: explicit },
        "int32" | "int64" => TypeKind::Integer {
            format: Some(base.to_string()),
        },
        "long" => TypeKind::Integer {
            format: Some("int64".to_string()),
        },
        "number" => TypeKind::Number { format: explicit },
        "float" | "double" => TypeKind::Number {
            format: Some(base.to_string()),
        },
        "str" | "string" => TypeKind::String { format: explicit },
        "date" | "date-time" | "password" | "byte" | "binary" | "email" | "uuid" | "uri"
        | "hostname" | "ipv4" | "ipv6" => TypeKind::String {
            format: Some(base.to_string()),
        },
        "bool" | "boolean" => TypeKind::Boolean,
        "file" => TypeKind::File {
            content_type: explicit,
        },
        _ => TypeKind::Model {
            name: base.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_json(token: &str, constraints: Value) -> Value {
        let constraints = match constraints {
            Value::Object(map) => map,
            _ => Constraints::new(),
        };
        let schema = resolve(token, constraints).schema();
        serde_json::to_value(schema).unwrap()
    }

    #[test]
    fn test_integer_tokens() {
        assert_eq!(schema_json("int", json!({})), json!({"type": "integer"}));
        assert_eq!(schema_json("integer", json!({})), json!({"type": "integer"}));
        assert_eq!(
            schema_json("int32", json!({})),
            json!({"type": "integer", "format": "int32"})
        );
        assert_eq!(
            schema_json("long", json!({})),
            json!({"type": "integer", "format": "int64"})
        );
        assert_eq!(
            schema_json("int64", json!({})),
            json!({"type": "integer", "format": "int64"})
        );
    }

    #[test]
    fn test_integer_with_constraints() {
        assert_eq!(
            schema_json("integer", json!({"minimum": 10})),
            json!({"type": "integer", "minimum": 10})
        );
        assert_eq!(
            schema_json("integer:int32", json!({"minimum": 10})),
            json!({"type": "integer", "format": "int32", "minimum": 10})
        );
    }

    #[test]
    fn test_format_keyword_wins_over_suffix() {
        assert_eq!(
            schema_json("long:int32", json!({})),
            json!({"type": "integer", "format": "int64"})
        );
        assert_eq!(
            schema_json("float:double", json!({})),
            json!({"type": "number", "format": "float"})
        );
    }

    #[test]
    fn test_number_tokens() {
        assert_eq!(schema_json("number", json!({})), json!({"type": "number"}));
        assert_eq!(
            schema_json("float", json!({})),
            json!({"type": "number", "format": "float"})
        );
        assert_eq!(
            schema_json("double", json!({})),
            json!({"type": "number", "format": "double"})
        );
        assert_eq!(
            schema_json("number:float", json!({"minimum": 1.5})),
            json!({"type": "number", "format": "float", "minimum": 1.5})
        );
    }

    #[test]
    fn test_string_tokens() {
        assert_eq!(schema_json("str", json!({})), json!({"type": "string"}));
        assert_eq!(schema_json("string", json!({})), json!({"type": "string"}));
        assert_eq!(
            schema_json("str:date", json!({})),
            json!({"type": "string", "format": "date"})
        );
        assert_eq!(
            schema_json("uuid", json!({})),
            json!({"type": "string", "format": "uuid"})
        );
        assert_eq!(
            schema_json("date-time", json!({})),
            json!({"type": "string", "format": "date-time"})
        );
    }

    #[test]
    fn test_boolean_tokens() {
        assert_eq!(schema_json("bool", json!({})), json!({"type": "boolean"}));
        assert_eq!(schema_json("boolean", json!({})), json!({"type": "boolean"}));
    }

    #[test]
    fn test_file_token() {
        let resolved = TypeDescriptor::parse("file:text/csv");
        assert_eq!(resolved.file_content_type(), Some("text/csv"));
        assert_eq!(
            serde_json::to_value(resolved.schema()).unwrap(),
            json!({"type": "string", "format": "binary"})
        );

        let bare = TypeDescriptor::parse("file");
        assert_eq!(bare.file_content_type(), Some(DEFAULT_FILE_CONTENT_TYPE));
    }

    #[test]
    fn test_array_token() {
        assert_eq!(
            schema_json("[integer]", json!({})),
            json!({"type": "array", "items": {"type": "integer"}})
        );
        assert_eq!(
            schema_json("[[str]]", json!({})),
            json!({"type": "array", "items": {"type": "array", "items": {"type": "string"}}})
        );
        assert_eq!(
            schema_json("[User]", json!({})),
            json!({"type": "array", "items": {"$ref": "#/components/schemas/User"}})
        );
    }

    #[test]
    fn test_enum_token() {
        assert_eq!(
            schema_json("enum[a,b,c]", json!({})),
            json!({"type": "string", "enum": ["a", "b", "c"]})
        );
        assert_eq!(
            schema_json("enum[foo, bar]", json!({})),
            json!({"type": "string", "enum": ["foo", "bar"]})
        );
    }

    #[test]
    fn test_combine_tokens() {
        let refs = json!([
            {"$ref": "#/components/schemas/A"},
            {"$ref": "#/components/schemas/B"},
            {"$ref": "#/components/schemas/C"}
        ]);
        assert_eq!(schema_json("anyOf[A,B,C]", json!({})), json!({"anyOf": refs}));
        assert_eq!(schema_json("allOf[A,B,C]", json!({})), json!({"allOf": refs}));
        assert_eq!(schema_json("oneOf[A, B, C]", json!({})), json!({"oneOf": refs}));
    }

    #[test]
    fn test_combine_with_primitives_and_nesting() {
        assert_eq!(
            schema_json("oneOf[int,[str]]", json!({})),
            json!({"oneOf": [
                {"type": "integer"},
                {"type": "array", "items": {"type": "string"}}
            ]})
        );
    }

    #[test]
    fn test_not_renders_single_schema() {
        assert_eq!(
            schema_json("not[A]", json!({})),
            json!({"not": {"$ref": "#/components/schemas/A"}})
        );
        assert_eq!(
            schema_json("not[A,int]", json!({})),
            json!({"not": {"anyOf": [{"$ref": "#/components/schemas/A"}, {"type": "integer"}]}})
        );
    }

    #[test]
    fn test_model_token() {
        let resolved = TypeDescriptor::parse("Model");
        assert_eq!(resolved.model_name(), Some("Model"));
        assert_eq!(resolved.name(), "Model");
        assert_eq!(
            schema_json("Model", json!({"minimum": 1})),
            json!({"$ref": "#/components/schemas/Model"})
        );
    }

    #[test]
    fn test_empty_token_is_none() {
        let resolved = TypeDescriptor::parse("   ");
        assert!(resolved.is_none());
        assert!(resolved.schema().is_none());
    }

    #[test]
    fn test_structural_constraints_are_ignored() {
        assert_eq!(
            schema_json("int", json!({"type": "string", "example": "42"})),
            json!({"type": "integer", "example": "42"})
        );
    }

    #[test]
    fn test_enum_constraint_is_split() {
        assert_eq!(
            schema_json("string", json!({"enum": "a, b"})),
            json!({"type": "string", "enum": ["a", "b"]})
        );
    }

    #[test]
    fn test_primitive_classification() {
        assert!(TypeDescriptor::parse("int").is_primitive());
        assert!(TypeDescriptor::parse("enum[a]").is_primitive());
        assert!(!TypeDescriptor::parse("[int]").is_primitive());
        assert!(!TypeDescriptor::parse("Pet").is_primitive());
        assert!(!TypeDescriptor::parse("file").is_primitive());
    }
}
