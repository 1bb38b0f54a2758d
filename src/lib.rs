//! OpenAPI from docstrings - OpenAPI 3.0 documents from structured handler and model docstrings.
//!
//! Handlers and models are documented with plain-text docstrings: a summary paragraph,
//! an optional description, and sections such as `Path Parameters:`, `Query Params:`,
//! `Request Body:`, `Response:`, `Error Responses:`, `Properties:` and `Tags:`.
//!
//! # Architecture
//!
//! 1. [`type_resolver`] - Resolves type tokens (`int`, `[string]`, `enum[a,b]`, `Model`)
//! 2. [`model`] - Parsed parameters, operations and models
//! 3. [`processors`] - Section headers, item lines and constraint annotations
//! 4. [`docparser`] - Line-by-line state machine over a docstring
//! 5. [`openapi_builder`] - Constructs the complete OpenAPI document
//! 6. [`manifest`] - Loads routes, models and API info from YAML or JSON
//! 7. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```
//! use openapi_from_docstring::{
//!     docparser::{parse_from_docstring, parse_schema},
//!     openapi_builder::{HttpMethod, OpenApiBuilder},
//!     serializer::serialize_yaml,
//! };
//!
//! let mut builder = OpenApiBuilder::new();
//! builder.add_schema(parse_schema(
//!     "User",
//!     "A user.\n\nProperties:\n    name (string) -- Required. The name.\n",
//! ));
//! builder.add_route(
//!     "/users/{user_id}",
//!     "UserHandler",
//!     vec![(
//!         HttpMethod::Get,
//!         parse_from_docstring(
//!             "Get a user.\n\nPath Params:\n    user_id (int) -- The user.\n\nResponse:\n    user (User) -- The user.\n",
//!         ),
//!     )],
//! );
//!
//! let yaml = serialize_yaml(&builder.build()).unwrap();
//! assert!(yaml.contains("UserHandler.get"));
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod cli;
pub mod docparser;
pub mod error;
pub mod manifest;
pub mod model;
pub mod openapi_builder;
pub mod processors;
pub mod serializer;
pub mod type_resolver;
