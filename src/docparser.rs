//! Docstring parser.
//!
//! A docstring is read line by line by a small state machine. The first paragraph
//! becomes the summary, the following paragraphs the description, and every
//! recognised section header hands its buffered lines to [`crate::processors`].
//!
//! ```text
//! Returns the pets of an owner.
//!
//! Longer description, any number of lines.
//!
//! Path Parameters:
//!     owner_id (int) -- The owner.
//!
//! Response:
//!     pets ([Pet]) -- The pets.
//! ```

use crate::model::{PathSpec, SchemaSpec};
use crate::processors::{apply_section, is_section_header, lookup_section};
use log::debug;
use std::mem;

/// Parses the docstring of one API operation.
///
/// Parsing never fails: malformed lines and unknown sections are skipped.
///
/// # Example
///
/// ```
/// use openapi_from_docstring::docparser::parse_from_docstring;
///
/// let spec = parse_from_docstring(
///     "Get an employee.\n\nPath Parameters:\n    employee_uid (int) -- The employee ID.\n",
/// );
/// assert_eq!(spec.summary.trim(), "Get an employee.");
/// assert!(spec.path_params["employee_uid"].required);
/// ```
pub fn parse_from_docstring(doc: &str) -> PathSpec {
    let mut parser = DocParser::new();
    let doc = doc.replace("\r\n", "\n");

    for line in doc.split_inclusive('\n') {
        parser.feed(Line::Text(line));
    }
    parser.feed(Line::End);

    parser.spec
}

/// Parses the docstring of a data model.
///
/// Only the summary, description, deprecation marker and `Properties:` sections are
/// kept; other sections are parsed but have no place in a model.
pub fn parse_schema(name: &str, doc: &str) -> SchemaSpec {
    debug!("Parsing schema docstring for {}", name);
    SchemaSpec::from_path_spec(name, parse_from_docstring(doc))
}

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Summary,
    Description,
    Blank,
    Section,
    End,
}

/// Input fed to the state machine
#[derive(Debug, Clone, Copy)]
enum Line<'a> {
    Text(&'a str),
    /// Marks the end of the docstring
    End,
}

/// Classification of one input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass {
    Generic,
    Blank,
    Header,
    End,
}

impl LineClass {
    fn of(line: Line<'_>) -> Self {
        match line {
            Line::End => LineClass::End,
            Line::Text(text) if text.trim().is_empty() => LineClass::Blank,
            Line::Text(text) if is_section_header(text) => LineClass::Header,
            Line::Text(_) => LineClass::Generic,
        }
    }
}

/// Guard of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Condition {
    Generic,
    Blank,
    Header,
    End,
    /// Generic or blank
    Text,
}

impl Condition {
    fn accepts(self, class: LineClass) -> bool {
        match self {
            Condition::Generic => class == LineClass::Generic,
            Condition::Blank => class == LineClass::Blank,
            Condition::Header => class == LineClass::Header,
            Condition::End => class == LineClass::End,
            Condition::Text => matches!(class, LineClass::Generic | LineClass::Blank),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Buffer,
    FlushSummary,
    FlushDescription,
    RecordHeader,
    Dispatch,
    DispatchAndRecord,
}

/// Transition table; the first matching row for the current state wins
const TRANSITIONS: &[(State, Condition, State, Action)] = &[
    (State::Start, Condition::Generic, State::Summary, Action::Buffer),
    (State::Summary, Condition::Generic, State::Summary, Action::Buffer),
    (State::Summary, Condition::Blank, State::Blank, Action::FlushSummary),
    (State::Summary, Condition::End, State::End, Action::FlushSummary),
    (State::Blank, Condition::Generic, State::Description, Action::Buffer),
    (State::Description, Condition::Generic, State::Description, Action::Buffer),
    (State::Description, Condition::Blank, State::Blank, Action::FlushDescription),
    (State::Start, Condition::Header, State::Section, Action::RecordHeader),
    (State::Blank, Condition::Header, State::Section, Action::RecordHeader),
    (State::Section, Condition::Text, State::Section, Action::Buffer),
    (State::Section, Condition::Header, State::Section, Action::DispatchAndRecord),
    (State::Section, Condition::End, State::End, Action::Dispatch),
    (State::Start, Condition::End, State::End, Action::Dispatch),
    (State::Blank, Condition::End, State::End, Action::Dispatch),
    (State::Description, Condition::End, State::End, Action::FlushDescription),
];

/// Single-use parser; owns its buffer and the spec being filled
struct DocParser {
    state: State,
    buffer: String,
    header: Option<String>,
    spec: PathSpec,
}

impl DocParser {
    fn new() -> Self {
        Self {
            state: State::Start,
            buffer: String::new(),
            header: None,
            spec: PathSpec::new(),
        }
    }

    fn feed(&mut self, line: Line<'_>) {
        let class = LineClass::of(line);
        let transition = TRANSITIONS
            .iter()
            .find(|(from, condition, _, _)| *from == self.state && condition.accepts(class));

        match transition {
            Some(&(_, _, to, action)) => {
                self.perform(action, line);
                self.state = to;
            }
            None => debug!(
                "No transition from {:?} on {:?}, skipping {:?}",
                self.state, class, line
            ),
        }
    }

    fn perform(&mut self, action: Action, line: Line<'_>) {
        match action {
            Action::Buffer => {
                if let Line::Text(text) = line {
                    self.buffer.push_str(text.trim_start());
                }
            }
            Action::FlushSummary => self.spec.summary = mem::take(&mut self.buffer),
            Action::FlushDescription => {
                let paragraph = mem::take(&mut self.buffer);
                self.spec.description.push_str(&paragraph);
            }
            Action::RecordHeader => self.record_header(line),
            Action::Dispatch => self.dispatch(),
            Action::DispatchAndRecord => {
                self.dispatch();
                self.record_header(line);
            }
        }
    }

    fn record_header(&mut self, line: Line<'_>) {
        self.buffer.clear();
        if let Line::Text(text) = line {
            self.header = Some(text.trim().to_string());
        }
    }

    fn dispatch(&mut self) {
        let buffer = mem::take(&mut self.buffer);
        let Some(header) = self.header.take() else {
            return;
        };

        match lookup_section(&header) {
            Some(section) => apply_section(&section, &buffer, &mut self.spec),
            None => debug!("Ignoring unrecognized section {:?}", header),
        }
    }
}
