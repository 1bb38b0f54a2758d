//! Parsed documentation models.
//!
//! The docstring parser fills a [`PathSpec`] for every documented operation and a
//! [`SchemaSpec`] for every documented model. Both hold [`Param`] values, one per
//! documented item, whose [`TypeDescriptor`] renders the item's schema.

use crate::type_resolver::{Constraints, TypeDescriptor};
use serde::Serialize;
use std::collections::BTreeMap;

/// Parameters keyed by name
pub type ParamMap = BTreeMap<String, Param>;

/// Where a documented item belongs in the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Path parameter embedded in the URL (e.g., `/users/{id}`)
    Path,
    /// Query string parameter
    Query,
    /// HTTP header parameter
    Header,
    /// Cookie parameter
    Cookie,
    /// Request body field, file or model
    Body,
    /// Response payload, keyed by status code
    Response,
    /// Model property
    Property,
    /// Operation tag
    Tags,
}

impl ParamKind {
    /// Value used for the OpenAPI `in` field
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Path => "path",
            ParamKind::Query => "query",
            ParamKind::Header => "header",
            ParamKind::Cookie => "cookie",
            ParamKind::Body => "body",
            ParamKind::Response => "response",
            ParamKind::Property => "property",
            ParamKind::Tags => "tags",
        }
    }
}

/// One documented item of a section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    /// Item name (status code for responses)
    pub name: String,
    /// Resolved type
    #[serde(rename = "type")]
    pub param_type: TypeDescriptor,
    /// Section the item was declared in
    pub kind: ParamKind,
    /// Whether the item is required
    pub required: bool,
    /// Free text description, with constraint annotations removed
    pub description: String,
    /// Position within the section, used for stable output ordering
    pub order: usize,
}

impl Param {
    /// Create a new Param with no description or constraints
    pub fn new(
        name: impl Into<String>,
        param_type: TypeDescriptor,
        kind: ParamKind,
        required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            kind,
            required,
            description: String::new(),
            order: 0,
        }
    }

    /// Constraint keywords peeled from the description
    pub fn constraints(&self) -> &Constraints {
        &self.param_type.constraints
    }

    /// Params of a map in declaration order
    pub fn sorted(params: &ParamMap) -> Vec<&Param> {
        let mut sorted: Vec<&Param> = params.values().collect();
        sorted.sort_by_key(|p| p.order);
        sorted
    }
}

/// The parsed documentation of one REST API operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathSpec {
    pub summary: String,
    pub description: String,
    pub path_params: ParamMap,
    pub query_params: ParamMap,
    pub header_params: ParamMap,
    pub cookie_params: ParamMap,
    pub body_params: ParamMap,
    /// Responses keyed by HTTP status code
    pub responses: ParamMap,
    pub tags: ParamMap,
    pub deprecated: bool,
    /// Properties, filled when a model docstring is parsed
    pub properties: ParamMap,
}

impl PathSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag names in declaration order
    pub fn tag_names(&self) -> Vec<String> {
        Param::sorted(&self.tags)
            .into_iter()
            .map(|t| t.name.clone())
            .collect()
    }
}

/// The parsed documentation of one data model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaSpec {
    pub name: String,
    pub summary: String,
    pub description: String,
    pub deprecated: bool,
    pub properties: ParamMap,
    /// Names of the schemas this model extends, outermost first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
}

/// One entry of a model's `allOf` composition
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaFragment<'a> {
    /// Reference to a base schema
    Reference(&'a str),
    /// The model's own property block
    Properties(&'a SchemaSpec),
}

impl SchemaSpec {
    /// Builds a model spec from the sections parsed out of its docstring
    pub fn from_path_spec(name: impl Into<String>, spec: PathSpec) -> Self {
        Self {
            name: name.into(),
            summary: spec.summary,
            description: spec.description,
            deprecated: spec.deprecated,
            properties: spec.properties,
            bases: Vec::new(),
        }
    }

    /// Sets the base schemas this model extends
    pub fn with_bases(mut self, bases: Vec<String>) -> Self {
        self.bases = bases;
        self
    }

    /// Ordered fragments: base references first, then the model's own block
    pub fn fragments(&self) -> Vec<SchemaFragment<'_>> {
        self.bases
            .iter()
            .map(|base| SchemaFragment::Reference(base.as_str()))
            .chain(std::iter::once(SchemaFragment::Properties(self)))
            .collect()
    }

    /// Names of required properties in declaration order
    pub fn required_properties(&self) -> Vec<String> {
        Param::sorted(&self.properties)
            .into_iter()
            .filter(|p| p.required)
            .map(|p| p.name.clone())
            .collect()
    }
}
