use crate::error::Error;
use crate::model::{Param, ParamMap, PathSpec, SchemaFragment, SchemaSpec};
use crate::type_resolver::{Schema, DEFAULT_FILE_CONTENT_TYPE};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// OpenAPI version written to every document
pub const OPENAPI_VERSION: &str = "3.0.0";

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM_DATA: &str = "multipart/form-data";
const TEXT_PLAIN: &str = "text/plain";
const DEFAULT_JSON_MIME_TYPE: &str = "application/json";

/// HTTP method of a documented operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

impl HttpMethod {
    /// Methods rendered unless configured otherwise
    pub const DEFAULT_ENABLED: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    /// Lowercase method name, as used for path item keys and operation ids
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "patch" => Ok(HttpMethod::Patch),
            "delete" => Ok(HttpMethod::Delete),
            "options" => Ok(HttpMethod::Options),
            "head" => Ok(HttpMethod::Head),
            other => Err(Error::InvalidArgument(format!("未知的 HTTP 方法: {}", other))),
        }
    }
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    /// API title
    pub title: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// API version
    pub version: String,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "Your API".to_string(),
            description: Some("No description".to_string()),
            version: "v1.0".to_string(),
        }
    }
}

/// OpenAPI Server object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI ExternalDocumentation object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDocs {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Global tag declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "externalDocs", default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
}

impl Tag {
    /// Tag with an optional description and documentation URL
    pub fn new(name: impl Into<String>, description: Option<String>, url: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
            external_docs: url.map(|url| ExternalDocs {
                url,
                description: None,
            }),
        }
    }
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
}

impl PathItem {
    /// Operation registered for `method`, if any
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
        }
    }

    fn set(&mut self, method: HttpMethod, operation: Operation) {
        let slot = match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
        };
        *slot = Some(operation);
    }
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `<handler>.<method>`
    #[serde(rename = "operationId")]
    pub operation_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code
    pub responses: BTreeMap<String, Response>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    /// Parameter location (path, query, header, cookie)
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBody {
    pub required: bool,
    /// Content types and their schemas
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaType {
    pub schema: Schema,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Components {
    pub schemas: BTreeMap<String, Schema>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    pub paths: BTreeMap<String, PathItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

/// A documented route: one URL served by one handler
#[derive(Debug, Clone)]
struct Route {
    url: String,
    handler: String,
    operations: Vec<(HttpMethod, PathSpec)>,
}

/// OpenAPI document builder
///
/// Routes and schemas are collected first and rendered in [`OpenApiBuilder::build`],
/// so a body or response may reference a model registered after it.
pub struct OpenApiBuilder {
    info: Info,
    servers: Vec<Server>,
    tags: Vec<Tag>,
    json_mime_type: String,
    enabled_methods: Vec<HttpMethod>,
    routes: Vec<Route>,
    schemas: BTreeMap<String, SchemaSpec>,
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with default info
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: Info::default(),
            servers: Vec::new(),
            tags: Vec::new(),
            json_mime_type: DEFAULT_JSON_MIME_TYPE.to_string(),
            enabled_methods: HttpMethod::DEFAULT_ENABLED.to_vec(),
            routes: Vec::new(),
            schemas: BTreeMap::new(),
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, info: Info) -> Self {
        self.info = info;
        self
    }

    /// Media type used for model payloads
    pub fn with_json_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.json_mime_type = mime_type.into();
        self
    }

    /// Restricts which documented methods are rendered
    pub fn with_enabled_methods(mut self, methods: Vec<HttpMethod>) -> Self {
        self.enabled_methods = methods;
        self
    }

    pub fn add_server(&mut self, server: Server) {
        self.servers.push(server);
    }

    pub fn add_global_tag(&mut self, tag: Tag) {
        debug!("Adding global tag: {}", tag.name);
        self.tags.push(tag);
    }

    /// Registers the documented operations of one handler served at `url`.
    ///
    /// `url` may be a `{name}` template, a `:name` route or a regex route with groups.
    pub fn add_route(
        &mut self,
        url: impl Into<String>,
        handler: impl Into<String>,
        operations: Vec<(HttpMethod, PathSpec)>,
    ) {
        let route = Route {
            url: url.into(),
            handler: handler.into(),
            operations,
        };
        debug!(
            "Adding route: {} ({}, {} operations)",
            route.url,
            route.handler,
            route.operations.len()
        );
        self.routes.push(route);
    }

    /// Registers a model; a later model with the same name replaces it
    pub fn add_schema(&mut self, schema: SchemaSpec) {
        debug!("Adding schema: {}", schema.name);
        if self.schemas.contains_key(&schema.name) {
            warn!("Schema {} registered twice, keeping the last one", schema.name);
        }
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn is_defined_schema(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Build the final OpenAPI document
    pub fn build(self) -> OpenApiDocument {
        debug!("Building final OpenAPI document");

        let mut paths: BTreeMap<String, PathItem> = BTreeMap::new();
        for route in &self.routes {
            let operations: Vec<&(HttpMethod, PathSpec)> = route
                .operations
                .iter()
                .filter(|(method, _)| self.enabled_methods.contains(method))
                .collect();

            // Sibling operations share the largest path parameter set
            let largest = operations
                .iter()
                .copied()
                .map(|(_, spec)| &spec.path_params)
                .reduce(|largest, params| {
                    if params.len() > largest.len() {
                        params
                    } else {
                        largest
                    }
                });
            let Some(path_params) = largest else {
                debug!("Skipping route {} without enabled operations", route.url);
                continue;
            };

            let template = url_template(&route.url, path_params);
            let item = paths.entry(template).or_default();
            for (method, spec) in operations {
                let operation = self.render_operation(&route.handler, *method, spec, path_params);
                item.set(*method, operation);
            }
        }

        let components = if self.schemas.is_empty() {
            None
        } else {
            let schemas = self
                .schemas
                .values()
                .map(|spec| (spec.name.clone(), self.render_schema(spec)))
                .collect();
            Some(Components { schemas })
        };

        OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: self.info,
            servers: self.servers,
            tags: self.tags,
            paths,
            components,
        }
    }

    fn render_operation(
        &self,
        handler: &str,
        method: HttpMethod,
        spec: &PathSpec,
        path_params: &ParamMap,
    ) -> Operation {
        let parameters = [
            path_params,
            &spec.header_params,
            &spec.query_params,
            &spec.cookie_params,
        ]
        .into_iter()
        .flat_map(Param::sorted)
        .map(|param| Parameter {
            name: param.name.clone(),
            location: param.kind.as_str().to_string(),
            required: param.required,
            description: non_empty(&param.description),
            schema: param.param_type.schema(),
        })
        .collect();

        let responses = spec
            .responses
            .iter()
            .map(|(code, param)| {
                let response = Response {
                    description: param.description.trim().to_string(),
                    content: self.response_content(param),
                };
                (code.clone(), response)
            })
            .collect();

        Operation {
            tags: spec.tag_names(),
            summary: non_empty(&spec.summary),
            description: non_empty(&spec.description),
            operation_id: format!("{}.{}", handler, method),
            parameters,
            request_body: self.request_body(spec),
            responses,
            deprecated: spec.deprecated,
        }
    }

    fn request_body(&self, spec: &PathSpec) -> Option<RequestBody> {
        let params = Param::sorted(&spec.body_params);
        let first = params.first()?;

        let (mut files, mut models, mut fields) = (0, 0, 0);
        for param in &params {
            if param.param_type.file_content_type().is_some() {
                files += 1;
            } else if let Some(name) = param.param_type.model_name() {
                if self.is_defined_schema(name) {
                    models += 1;
                } else {
                    warn!("Body field {} references unknown schema {}", param.name, name);
                    fields += 1;
                }
            } else {
                fields += 1;
            }
        }

        let (media_type, schema) = match (files, models, fields) {
            (0, 0, _) => (FORM_URLENCODED.to_string(), form_schema(&params)),
            (1, 0, 0) => (
                first
                    .param_type
                    .file_content_type()
                    .unwrap_or(DEFAULT_FILE_CONTENT_TYPE)
                    .to_string(),
                Schema::typed("string", Some("binary")),
            ),
            (0, 1, 0) => (
                self.json_mime_type.clone(),
                first.param_type.schema().unwrap_or_default(),
            ),
            _ => (MULTIPART_FORM_DATA.to_string(), form_schema(&params)),
        };

        let mut content = BTreeMap::new();
        content.insert(media_type, MediaType { schema });
        Some(RequestBody {
            required: params.iter().any(|p| p.required),
            content,
        })
    }

    fn response_content(&self, param: &Param) -> Option<BTreeMap<String, MediaType>> {
        let schema = param.param_type.schema()?;
        let media_type = if param.param_type.is_primitive() {
            TEXT_PLAIN.to_string()
        } else if let Some(content_type) = param.param_type.file_content_type() {
            content_type.to_string()
        } else {
            self.json_mime_type.clone()
        };

        let mut content = BTreeMap::new();
        content.insert(media_type, MediaType { schema });
        Some(content)
    }

    fn render_schema(&self, spec: &SchemaSpec) -> Schema {
        let mut parts: Vec<Schema> = spec
            .fragments()
            .into_iter()
            .map(|fragment| match fragment {
                SchemaFragment::Reference(base) => {
                    if !self.is_defined_schema(base) {
                        warn!("Schema {} extends unknown schema {}", spec.name, base);
                    }
                    Schema::reference(base)
                }
                SchemaFragment::Properties(model) => model_block(model),
            })
            .collect();

        if parts.len() == 1 {
            parts.remove(0)
        } else {
            Schema {
                all_of: Some(parts),
                ..Default::default()
            }
        }
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn property_schema(param: &Param) -> Schema {
    param
        .param_type
        .schema()
        .unwrap_or_default()
        .with_description(&param.description)
}

fn form_schema(params: &[&Param]) -> Schema {
    let properties = params
        .iter()
        .map(|param| (param.name.clone(), property_schema(param)))
        .collect();
    let required = params
        .iter()
        .filter(|param| param.required)
        .map(|param| param.name.clone())
        .collect();
    Schema::object(properties, required)
}

fn model_block(model: &SchemaSpec) -> Schema {
    let properties = model
        .properties
        .values()
        .map(|param| (param.name.clone(), property_schema(param)))
        .collect();
    let description = if model.description.trim().is_empty() {
        &model.summary
    } else {
        &model.description
    };

    let mut schema =
        Schema::object(properties, model.required_properties()).with_description(description);
    if model.deprecated {
        schema.extra.insert("deprecated".to_string(), Value::Bool(true));
    }
    schema
}

/// Turns a route URL into an OpenAPI path template.
///
/// Regex groups become `{name}`, using the group name when present and the path
/// parameters in declaration order otherwise. `:name` segments become `{name}`.
fn url_template(url: &str, path_params: &ParamMap) -> String {
    let pattern = url.strip_prefix('^').unwrap_or(url);
    let pattern = pattern.strip_suffix('$').unwrap_or(pattern);

    let mut unnamed = Param::sorted(path_params).into_iter().map(|p| p.name.clone());
    let mut template = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    let mut groups = 0;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    template.push(escaped);
                }
            }
            '(' => {
                groups += 1;
                let group = take_group(&mut chars);
                let name = group_name(&group)
                    .or_else(|| unnamed.next())
                    .unwrap_or_else(|| format!("param{}", groups));
                template.push('{');
                template.push_str(&name);
                template.push('}');
            }
            _ => template.push(c),
        }
    }

    template
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{}}}", name),
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Consumes a group body up to its closing parenthesis
fn take_group(chars: &mut std::str::Chars<'_>) -> String {
    let mut depth = 1;
    let mut group = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                group.push(c);
                if let Some(escaped) = chars.next() {
                    group.push(escaped);
                }
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        group.push(c);
    }
    group
}

fn group_name(group: &str) -> Option<String> {
    let rest = group
        .strip_prefix("?P<")
        .or_else(|| group.strip_prefix("?<"))?;
    rest.split_once('>').map(|(name, _)| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docparser::{parse_from_docstring, parse_schema};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn build_single(url: &str, method: HttpMethod, doc: &str) -> OpenApiDocument {
        let mut builder = OpenApiBuilder::new();
        builder.add_route(url, "Handler", vec![(method, parse_from_docstring(doc))]);
        builder.build()
    }

    fn operation<'a>(doc: &'a OpenApiDocument, path: &str, method: HttpMethod) -> &'a Operation {
        doc.paths[path]
            .operation(method)
            .unwrap_or_else(|| panic!("missing {} {}", method, path))
    }

    #[test]
    fn test_new_builder() {
        let document = OpenApiBuilder::new().build();

        assert_eq!(document.openapi, "3.0.0");
        assert_eq!(document.info.title, "Your API");
        assert_eq!(document.info.version, "v1.0");
        assert!(document.paths.is_empty());
        assert!(document.components.is_none());
    }

    #[test]
    fn test_with_info() {
        let info = Info {
            title: "My API".to_string(),
            description: Some("Custom description".to_string()),
            version: "2.0.0".to_string(),
        };
        let document = OpenApiBuilder::new().with_info(info.clone()).build();
        assert_eq!(document.info, info);
    }

    #[test]
    fn test_http_method_from_str() {
        assert_eq!("GET".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!(" patch ".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert!("fetch".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_operation_basics() {
        let doc = "\
            Get things.

            Returns every thing.

            Tags:
                things -- Things
                admin -- Admin

            [Deprecated]
            ";
        let document = build_single("/things", HttpMethod::Get, doc);
        let op = operation(&document, "/things", HttpMethod::Get);

        assert_eq!(op.operation_id, "Handler.get");
        assert_eq!(op.summary.as_deref(), Some("Get things."));
        assert_eq!(op.description.as_deref(), Some("Returns every thing."));
        assert_eq!(op.tags, vec!["things".to_string(), "admin".to_string()]);
        assert!(op.deprecated);
        assert!(op.parameters.is_empty());
        assert!(op.request_body.is_none());
    }

    #[test]
    fn test_parameters_grouped_in_order() {
        let doc = "\
            Search.

            Query Params:
                q (string) -- Required. Terms.
                page (int) -- Page. minimum: 1

            Path Params:
                owner (int) -- Owner.

            Headers:
                X-Token -- Token.

            Cookie:
                session -- Session.
            ";
        let document = build_single("/owners/{owner}/search", HttpMethod::Get, doc);
        let op = operation(&document, "/owners/{owner}/search", HttpMethod::Get);

        let names: Vec<(&str, &str)> = op
            .parameters
            .iter()
            .map(|p| (p.location.as_str(), p.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("path", "owner"),
                ("header", "X-Token"),
                ("query", "q"),
                ("query", "page"),
                ("cookie", "session"),
            ]
        );

        let page = &op.parameters[3];
        assert!(!page.required);
        assert_eq!(
            serde_json::to_value(page.schema.as_ref().unwrap()).unwrap(),
            json!({"type": "integer", "minimum": 1})
        );
    }

    #[test]
    fn test_regex_url_template() {
        let doc = "Get item.\n\nPath Params:\n    item_id (int) -- The id.\n";
        let document = build_single(r"^/items/(\d+)$", HttpMethod::Get, doc);
        assert!(document.paths.contains_key("/items/{item_id}"));

        let named = build_single(r"/items/(?P<sku>[a-z]+)\.json", HttpMethod::Get, doc);
        assert!(named.paths.contains_key("/items/{sku}.json"));
    }

    #[test]
    fn test_colon_url_template() {
        let params = ParamMap::new();
        assert_eq!(url_template("/users/:id/posts/:post", &params), "/users/{id}/posts/{post}");
        assert_eq!(url_template("/users/{id}", &params), "/users/{id}");
        assert_eq!(url_template("/a/(x)/(y)", &params), "/a/{param1}/{param2}");
    }

    #[test]
    fn test_path_params_shared_across_methods() {
        let get = parse_from_docstring("Get.\n\nPath Params:\n    id (int) -- The id.\n");
        let delete = parse_from_docstring("Delete.\n");

        let mut builder = OpenApiBuilder::new();
        builder.add_route(
            r"/items/(\d+)",
            "ItemHandler",
            vec![(HttpMethod::Delete, delete), (HttpMethod::Get, get)],
        );
        let document = builder.build();

        let delete_op = operation(&document, "/items/{id}", HttpMethod::Delete);
        assert_eq!(delete_op.parameters.len(), 1);
        assert_eq!(delete_op.parameters[0].name, "id");
        assert_eq!(delete_op.operation_id, "ItemHandler.delete");
    }

    #[test]
    fn test_disabled_methods_are_skipped() {
        let mut builder = OpenApiBuilder::new().with_enabled_methods(vec![HttpMethod::Get]);
        builder.add_route(
            "/x",
            "X",
            vec![
                (HttpMethod::Get, parse_from_docstring("Get.")),
                (HttpMethod::Post, parse_from_docstring("Post.")),
            ],
        );
        builder.add_route("/y", "Y", vec![(HttpMethod::Options, parse_from_docstring("Opts."))]);
        let document = builder.build();

        assert!(document.paths["/x"].get.is_some());
        assert!(document.paths["/x"].post.is_none());
        assert!(!document.paths.contains_key("/y"));
    }

    #[test]
    fn test_form_body() {
        let doc = "\
            Post form.

            Request Body:
                a (string) -- The a.
                b (int) -- Optional. The b.
            ";
        let document = build_single("/form", HttpMethod::Post, doc);
        let body = operation(&document, "/form", HttpMethod::Post)
            .request_body
            .as_ref()
            .unwrap();

        assert!(body.required);
        assert_eq!(
            serde_json::to_value(&body.content).unwrap(),
            json!({
                "application/x-www-form-urlencoded": {
                    "schema": {
                        "type": "object",
                        "required": ["a"],
                        "properties": {
                            "a": {"type": "string", "description": "The a."},
                            "b": {"type": "integer", "description": "The b."}
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_single_file_body() {
        let doc = "Upload.\n\nBody:\n    img (file:image/png) -- The image.\n";
        let document = build_single("/upload", HttpMethod::Post, doc);
        let body = operation(&document, "/upload", HttpMethod::Post)
            .request_body
            .as_ref()
            .unwrap();

        assert_eq!(
            serde_json::to_value(&body.content).unwrap(),
            json!({"image/png": {"schema": {"type": "string", "format": "binary"}}})
        );
    }

    #[test]
    fn test_model_body_and_multipart() {
        let mut builder = OpenApiBuilder::new();
        builder.add_schema(parse_schema("User", "A user.\n\nProperties:\n    name -- Name.\n"));
        builder.add_route(
            "/users",
            "UserHandler",
            vec![
                (
                    HttpMethod::Post,
                    parse_from_docstring("Create.\n\nBody:\n    user (User) -- The user.\n"),
                ),
                (
                    HttpMethod::Put,
                    parse_from_docstring(
                        "Replace.\n\nBody:\n    user (User) -- The user.\n    avatar (file) -- Picture.\n",
                    ),
                ),
            ],
        );
        let document = builder.build();

        let post = operation(&document, "/users", HttpMethod::Post);
        let post_content = &post.request_body.as_ref().unwrap().content;
        assert_eq!(
            serde_json::to_value(post_content).unwrap(),
            json!({"application/json": {"schema": {"$ref": "#/components/schemas/User"}}})
        );

        let put = operation(&document, "/users", HttpMethod::Put);
        let put_content = &put.request_body.as_ref().unwrap().content;
        assert!(put_content.contains_key("multipart/form-data"));
    }

    #[test]
    fn test_unknown_model_body_is_form_data() {
        let doc = "Create.\n\nBody:\n    user (Missing) -- Unknown.\n";
        let document = build_single("/users", HttpMethod::Post, doc);
        let body = operation(&document, "/users", HttpMethod::Post)
            .request_body
            .as_ref()
            .unwrap();
        assert!(body.content.contains_key(FORM_URLENCODED));
    }

    #[test]
    fn test_response_content_detection() {
        let doc = "\
            Things.

            Response:
                out ([Thing]) -- The things.

            Error Responses:
                400 -- Bad Request

            404 Response:
                msg (string) -- Not found text.
            ";
        let document = build_single("/things", HttpMethod::Get, doc);
        let builder_json = "application/vnd.api+json";
        let mut custom = OpenApiBuilder::new().with_json_mime_type(builder_json);
        custom.add_route("/things", "Handler", vec![(HttpMethod::Get, parse_from_docstring(doc))]);
        let custom_document = custom.build();

        let responses = &operation(&document, "/things", HttpMethod::Get).responses;
        assert!(responses["200"].content.as_ref().unwrap().contains_key("application/json"));
        assert!(responses["400"].content.is_none());
        assert_eq!(responses["400"].description, "Bad Request");
        assert!(responses["404"].content.as_ref().unwrap().contains_key("text/plain"));

        let custom_responses = &operation(&custom_document, "/things", HttpMethod::Get).responses;
        assert!(custom_responses["200"].content.as_ref().unwrap().contains_key(builder_json));
    }

    #[test]
    fn test_schema_components() {
        let mut builder = OpenApiBuilder::new();
        builder.add_schema(parse_schema(
            "Animal",
            "An animal.\n\nProperties:\n    name (string) -- Required. The name.\n    age (int) -- The age. minimum: 0\n",
        ));
        builder.add_schema(
            parse_schema(
                "Cat",
                "A cat.\n\nDeprecated\n\nProperties:\n    lives (int) -- Lives left.\n",
            )
            .with_bases(vec!["Animal".to_string()]),
        );
        let document = builder.build();
        let schemas = serde_json::to_value(&document.components.unwrap().schemas).unwrap();

        assert_eq!(
            schemas["Animal"],
            json!({
                "type": "object",
                "description": "An animal.",
                "required": ["name"],
                "properties": {
                    "name": {"type": "string", "description": "The name."},
                    "age": {"type": "integer", "minimum": 0, "description": "The age."}
                }
            })
        );
        assert_eq!(
            schemas["Cat"],
            json!({
                "allOf": [
                    {"$ref": "#/components/schemas/Animal"},
                    {
                        "type": "object",
                        "description": "A cat.",
                        "deprecated": true,
                        "properties": {
                            "lives": {"type": "integer", "description": "Lives left."}
                        }
                    }
                ]
            })
        );
    }

    #[test]
    fn test_servers_and_global_tags() {
        let mut builder = OpenApiBuilder::new();
        builder.add_server(Server {
            url: "https://api.example.com".to_string(),
            description: None,
        });
        builder.add_global_tag(Tag::new(
            "pets",
            Some("Pet store".to_string()),
            Some("https://docs.example.com".to_string()),
        ));
        let value = serde_json::to_value(builder.build()).unwrap();

        assert_eq!(value["servers"], json!([{"url": "https://api.example.com"}]));
        assert_eq!(
            value["tags"],
            json!([{
                "name": "pets",
                "description": "Pet store",
                "externalDocs": {"url": "https://docs.example.com"}
            }])
        );
    }
}
