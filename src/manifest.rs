//! API manifest loading.
//!
//! A manifest lists everything a document is built from: API info, servers, global
//! tags, routes with one docstring per HTTP method, and documented models.
//!
//! ```yaml
//! info:
//!   title: Pet Store
//!   version: "1.0"
//! routes:
//!   - url: /pets/(?P<pet_id>\d+)
//!     handler: PetHandler
//!     operations:
//!       get: |
//!         Get a pet.
//!
//!         Path Params:
//!             pet_id (int) -- The pet.
//! schemas:
//!   - name: Pet
//!     doc: |
//!       A pet.
//!
//!       Properties:
//!           name (string) -- Required. The name.
//! ```

use crate::docparser::{parse_from_docstring, parse_schema};
use crate::error::{Error, Result};
use crate::openapi_builder::{HttpMethod, Info, OpenApiBuilder, Server, Tag};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// Documentation sources and document settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiManifest {
    #[serde(default)]
    pub info: Info,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Media type used for model payloads
    #[serde(default = "default_json_mime_type")]
    pub json_mime_type: String,
    /// Methods rendered in the document
    #[serde(default = "default_enabled_methods")]
    pub enabled_methods: Vec<String>,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
    #[serde(default)]
    pub schemas: Vec<SchemaEntry>,
}

/// One handler served at one URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub url: String,
    pub handler: String,
    /// Docstring per HTTP method
    #[serde(default)]
    pub operations: BTreeMap<String, String>,
}

/// One documented model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub name: String,
    /// Models this one extends
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub doc: String,
}

fn default_json_mime_type() -> String {
    "application/json".to_string()
}

fn default_enabled_methods() -> Vec<String> {
    HttpMethod::DEFAULT_ENABLED
        .iter()
        .map(|method| method.as_str().to_string())
        .collect()
}

impl Default for ApiManifest {
    fn default() -> Self {
        Self {
            info: Info::default(),
            servers: Vec::new(),
            tags: Vec::new(),
            json_mime_type: default_json_mime_type(),
            enabled_methods: default_enabled_methods(),
            routes: Vec::new(),
            schemas: Vec::new(),
        }
    }
}

impl ApiManifest {
    /// Loads a manifest, reading JSON for `.json` files and YAML otherwise
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading manifest: {}", path.display());
        let content = fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        let manifest = Self::parse(&content, is_json).map_err(|e| e.in_manifest(path))?;

        manifest.validate().map_err(|message| Error::ManifestError {
            file: path.to_path_buf(),
            message,
        })?;

        debug!(
            "Manifest has {} routes and {} schemas",
            manifest.routes.len(),
            manifest.schemas.len()
        );
        Ok(manifest)
    }

    /// Parses manifest text
    pub fn parse(content: &str, is_json: bool) -> Result<Self> {
        if is_json {
            Ok(serde_json::from_str(content)?)
        } else {
            Ok(serde_yaml::from_str(content)?)
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        for route in &self.routes {
            if route.url.trim().is_empty() {
                return Err(format!("路由缺少 url (handler: {})", route.handler));
            }
            if route.handler.trim().is_empty() {
                return Err(format!("路由 {} 缺少 handler", route.url));
            }
        }

        let mut names = HashSet::new();
        for schema in &self.schemas {
            if schema.name.trim().is_empty() {
                return Err("模型缺少 name".to_string());
            }
            if !names.insert(schema.name.as_str()) {
                return Err(format!("模型 {} 重复定义", schema.name));
            }
        }
        Ok(())
    }

    /// Parses every docstring and registers the results with a new builder
    pub fn into_builder(self) -> Result<OpenApiBuilder> {
        let enabled_methods = self
            .enabled_methods
            .iter()
            .map(|method| method.parse::<HttpMethod>())
            .collect::<Result<Vec<_>>>()?;

        let mut builder = OpenApiBuilder::new()
            .with_info(self.info)
            .with_json_mime_type(self.json_mime_type)
            .with_enabled_methods(enabled_methods);

        for server in self.servers {
            builder.add_server(server);
        }
        for tag in self.tags {
            builder.add_global_tag(tag);
        }

        for schema in self.schemas {
            let spec = parse_schema(&schema.name, &schema.doc).with_bases(schema.bases);
            builder.add_schema(spec);
        }

        for route in self.routes {
            let mut operations = Vec::with_capacity(route.operations.len());
            for (method, doc) in &route.operations {
                operations.push((method.parse::<HttpMethod>()?, parse_from_docstring(doc)));
            }
            builder.add_route(route.url, route.handler, operations);
        }

        Ok(builder)
    }
}
