//! Section processors for docstring parsing.
//!
//! A docstring section starts with a header line such as `Query Parameters:` and holds
//! one item per logical line:
//!
//! ```text
//! name (type) -- Required. Free text description.  minimum: 1  maximum: 10
//! ```
//!
//! The processors in this module recognise section headers, fold continuation lines,
//! parse each item into a [`Param`] and store it in the matching [`PathSpec`] map.

use crate::model::{Param, ParamKind, ParamMap, PathSpec};
use crate::type_resolver::{resolve, Constraints, TypeDescriptor};
use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Number, Value};

/// Separator between an item's name/type and its description
const ITEM_SEPARATOR: &str = " -- ";

/// Type used for items declared without one
const DEFAULT_TYPE: &str = "string";

/// Constraint keywords whose values are booleans
const BOOLEAN_KEYWORDS: &[&str] = &[
    "exclusiveMinimum",
    "exclusiveMaximum",
    "uniqueItems",
    "allowEmptyValue",
    "deprecated",
];

/// Constraint keywords whose values are numbers
const NUMERIC_KEYWORDS: &[&str] = &[
    "minimum",
    "maximum",
    "multipleOf",
    "minItems",
    "maxItems",
    "maxLength",
    "minLength",
    "minProperties",
    "maxProperties",
];

static SECTION_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w ]+:$").expect("valid section header regex"));

static DEPRECATED_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(deprecated|\[deprecated\])$").expect("valid deprecated marker regex")
});

static PARAM_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<name>\w[\w.\-]*)(\s+\((?P<type>[^()]*)\)?)?\s*(--(\s+((?P<required>required|optional)\.)?(?P<description>.*))?)?$",
    )
    .expect("valid parameter line regex")
});

static ERROR_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<code>\d+|default)(\s+\((?P<type>[^()]*)\)?)?\s*--\s*(?P<description>.*)$",
    )
    .expect("valid error line regex")
});

type SectionBuilder = fn(&Captures<'_>) -> Section;

static SECTION_TABLE: Lazy<Vec<(Regex, SectionBuilder)>> = Lazy::new(|| {
    let table: [(&str, SectionBuilder); 10] = [
        (r"query\s+param(s|eter(s)?)?:", |_| Section::Query),
        (r"(path|url)\s+param(s|eter(s)?)?:", |_| Section::Path),
        (r"(request\s+)?body:", |_| Section::Body),
        (r"cookie(s|\s*param(s|eter(s)?)?)?:", |_| Section::Cookie),
        (r"(http\s+)?(request\s+)?header(s)?:", |_| Section::Header),
        (
            r"(error(s|\s*response(s)?)?|default\s*response(s)?):",
            |_| Section::Errors,
        ),
        (
            r"(((http\s+)?(?P<code>\d+)\s+)?response|return(s)?):",
            |captures| Section::Response {
                code: captures
                    .name("code")
                    .map_or("200", |m| m.as_str())
                    .to_string(),
            },
        ),
        (r"propert(y|ies):", |_| Section::Properties),
        (r"tag(s)?:", |_| Section::Tags),
        (r"deprecated|\[deprecated\]", |_| Section::Deprecated),
    ];

    table
        .into_iter()
        .map(|(pattern, build)| {
            let regex = Regex::new(&format!("(?i)^(?:{})$", pattern))
                .expect("valid section table regex");
            (regex, build)
        })
        .collect()
});

/// The kind of section a header introduces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Query,
    Path,
    Body,
    Cookie,
    Header,
    /// Legacy `Errors:` block of `<code> -- <description>` lines
    Errors,
    /// Response payload for one status code
    Response { code: String },
    Properties,
    Tags,
    Deprecated,
}

/// How an item's required flag is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Requirement {
    /// Always required, whatever the marker says
    Always,
    /// Required unless marked `optional.`
    UnlessOptional,
    /// Required only when marked `required.`
    OnlyIfRequired,
}

/// Returns true when the line looks like a section header or a deprecation marker.
pub fn is_section_header(line: &str) -> bool {
    let line = line.trim();
    SECTION_HEADER.is_match(line) || DEPRECATED_MARKER.is_match(line)
}

/// Resolves a header line to its section, ignoring case.
///
/// Returns `None` for headers outside the fixed vocabulary.
pub fn lookup_section(header: &str) -> Option<Section> {
    let header = header.trim();
    SECTION_TABLE.iter().find_map(|(regex, build)| {
        regex.captures(header).map(|captures| build(&captures))
    })
}

/// Parses the buffered text of one section into `spec`.
pub fn apply_section(section: &Section, buffer: &str, spec: &mut PathSpec) {
    debug!("Processing {:?} section ({} bytes)", section, buffer.len());

    match section {
        Section::Query => merge(
            &mut spec.query_params,
            parse_params(buffer, ParamKind::Query, Requirement::OnlyIfRequired, DEFAULT_TYPE),
        ),
        Section::Path => merge(
            &mut spec.path_params,
            parse_params(buffer, ParamKind::Path, Requirement::Always, DEFAULT_TYPE),
        ),
        Section::Body => merge(
            &mut spec.body_params,
            parse_params(buffer, ParamKind::Body, Requirement::UnlessOptional, DEFAULT_TYPE),
        ),
        Section::Cookie => merge(
            &mut spec.cookie_params,
            parse_params(buffer, ParamKind::Cookie, Requirement::OnlyIfRequired, DEFAULT_TYPE),
        ),
        Section::Header => merge(
            &mut spec.header_params,
            parse_params(buffer, ParamKind::Header, Requirement::OnlyIfRequired, DEFAULT_TYPE),
        ),
        Section::Properties => merge(
            &mut spec.properties,
            parse_params(buffer, ParamKind::Property, Requirement::OnlyIfRequired, DEFAULT_TYPE),
        ),
        Section::Tags => merge(
            &mut spec.tags,
            parse_params(buffer, ParamKind::Tags, Requirement::OnlyIfRequired, DEFAULT_TYPE),
        ),
        Section::Response { code } => {
            // Only one payload per status code; the first item wins
            let first = parse_params(buffer, ParamKind::Response, Requirement::OnlyIfRequired, "")
                .into_iter()
                .next();
            if let Some(mut response) = first {
                response.name = code.clone();
                spec.responses.insert(code.clone(), response);
            }
        }
        Section::Errors => merge(&mut spec.responses, parse_errors(buffer)),
        Section::Deprecated => spec.deprecated = true,
    }
}

/// Folds continuation lines into the logical line they continue.
///
/// Every physical line containing ` -- ` starts a new logical line; any other line
/// is appended to the previous one. The first line always starts a logical line.
pub fn clean_lines(buffer: &str) -> Vec<String> {
    let mut lines = buffer.lines();
    let mut cleaned = match lines.next() {
        Some(first) => vec![first.trim().to_string()],
        None => return Vec::new(),
    };

    for line in lines {
        if line.trim_start().contains(ITEM_SEPARATOR) {
            cleaned.push(line.trim().to_string());
        } else if let Some(last) = cleaned.last_mut() {
            last.push(' ');
            last.push_str(line.trim());
        }
    }

    cleaned
}

/// Peels trailing `key: value` annotations off a description.
///
/// Scans right to left: the right-most colon splits off a value, and the word
/// before it (up to the preceding whitespace) is the key. A colon written as `\:`
/// is kept as text.
///
/// ```
/// use openapi_from_docstring::processors::split_constraints;
///
/// let (description, constraints) = split_constraints("The age. minimum: 1  maximum: 200");
/// assert_eq!(description, "The age.");
/// assert_eq!(constraints["minimum"], 1);
/// assert_eq!(constraints["maximum"], 200);
/// ```
pub fn split_constraints(description: &str) -> (String, Constraints) {
    let mut constraints = Constraints::new();
    let mut rest = description;

    while let Some(index) = rightmost_separator(rest) {
        let value = rest[index + 1..].trim();
        let head = rest[..index].trim_end();
        let (remaining, key) = match head.rfind(&[' ', '\t', '\n'][..]) {
            Some(boundary) => (&head[..boundary], &head[boundary + 1..]),
            None => ("", head),
        };

        if key.is_empty() {
            debug!("Dropping constraint value without a key: {:?}", value);
        } else {
            constraints.insert(key.to_string(), constraint_value(key, &unescape(value)));
        }
        rest = remaining;
    }

    (unescape(rest).trim().to_string(), constraints)
}

fn rightmost_separator(text: &str) -> Option<usize> {
    text.match_indices(':')
        .map(|(index, _)| index)
        .filter(|&index| !text[..index].ends_with('\\'))
        .last()
}

fn unescape(text: &str) -> String {
    text.replace("\\:", ":")
}

fn constraint_value(key: &str, value: &str) -> Value {
    if BOOLEAN_KEYWORDS.contains(&key) {
        return Value::Bool(matches!(value, "True" | "true" | "1"));
    }

    if NUMERIC_KEYWORDS.contains(&key) {
        if let Ok(int) = value.parse::<i64>() {
            return Value::from(int);
        }
        if let Some(number) = value.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(number);
        }
    }

    Value::String(value.to_string())
}

fn parse_params(
    buffer: &str,
    kind: ParamKind,
    requirement: Requirement,
    default_type: &str,
) -> Vec<Param> {
    clean_lines(buffer)
        .iter()
        .enumerate()
        .filter_map(|(order, line)| {
            let parsed = parse_param_line(line, order, kind, requirement, default_type);
            if parsed.is_none() && !line.is_empty() {
                debug!("Skipping malformed {} line: {:?}", kind.as_str(), line);
            }
            parsed
        })
        .collect()
}

fn parse_param_line(
    line: &str,
    order: usize,
    kind: ParamKind,
    requirement: Requirement,
    default_type: &str,
) -> Option<Param> {
    let captures = PARAM_LINE.captures(line)?;
    let name = captures.name("name")?.as_str();

    let marker = captures.name("required").map(|m| m.as_str().to_lowercase());
    let required = match requirement {
        Requirement::Always => true,
        Requirement::UnlessOptional => marker.as_deref() != Some("optional"),
        Requirement::OnlyIfRequired => marker.as_deref() == Some("required"),
    };

    let description = captures.name("description").map_or("", |m| m.as_str());
    let (description, constraints) = split_constraints(description.trim());

    let token = captures.name("type").map_or("", |m| m.as_str()).trim();
    let token = if token.is_empty() { default_type } else { token };

    Some(Param {
        name: name.to_string(),
        param_type: resolve(token, constraints),
        kind,
        required,
        description,
        order,
    })
}

fn parse_errors(buffer: &str) -> Vec<Param> {
    clean_lines(buffer)
        .iter()
        .enumerate()
        .filter_map(|(order, line)| {
            let Some(captures) = ERROR_LINE.captures(line) else {
                if !line.is_empty() {
                    debug!("Skipping malformed error line: {:?}", line);
                }
                return None;
            };
            let code = captures.name("code")?.as_str().to_lowercase();
            let token = captures.name("type").map_or("", |m| m.as_str());

            let mut param =
                Param::new(code, TypeDescriptor::parse(token), ParamKind::Response, false);
            param.description = captures
                .name("description")
                .map_or("", |m| m.as_str())
                .trim()
                .to_string();
            param.order = order;
            Some(param)
        })
        .collect()
}

/// Inserts `params` after the entries already in `target`, keeping declaration order
/// across repeated sections.
fn merge(target: &mut ParamMap, params: Vec<Param>) {
    let offset = target.values().map(|p| p.order + 1).max().unwrap_or(0);
    for mut param in params {
        param.order += offset;
        target.insert(param.name.clone(), param);
    }
}
