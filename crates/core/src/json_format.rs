//! JSON pretty-printing with a fixed set of indentation presets.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;

/// Tab widths offered for display.
pub const TAB_WIDTHS: [usize; 4] = [2, 4, 6, 8];
pub const DEFAULT_TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JsonFormatError {
    #[error("Please enter JSON data")]
    EmptyInput,

    #[error("Invalid JSON: {0}")]
    Invalid(String),

    #[error("Failed to serialize JSON: {0}")]
    Serialize(String),
}

/// How nested values are indented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndentStyle {
    Tab,
    #[default]
    Space2,
    Space4,
    Space6,
    Space8,
    /// Two ideographic spaces (U+3000).
    FullWidthSpace2,
    Underscore4,
    /// One value per line, no indentation.
    NoIndent,
    /// No newlines and no insignificant whitespace.
    Compact,
}

impl IndentStyle {
    pub const ALL: [IndentStyle; 9] = [
        IndentStyle::Tab,
        IndentStyle::Space2,
        IndentStyle::Space4,
        IndentStyle::Space6,
        IndentStyle::Space8,
        IndentStyle::FullWidthSpace2,
        IndentStyle::Underscore4,
        IndentStyle::NoIndent,
        IndentStyle::Compact,
    ];

    pub fn id(self) -> &'static str {
        match self {
            IndentStyle::Tab => "tab",
            IndentStyle::Space2 => "space2",
            IndentStyle::Space4 => "space4",
            IndentStyle::Space6 => "space6",
            IndentStyle::Space8 => "space8",
            IndentStyle::FullWidthSpace2 => "fullspace2",
            IndentStyle::Underscore4 => "underscore4",
            IndentStyle::NoIndent => "noindent",
            IndentStyle::Compact => "compact",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IndentStyle::Tab => "Tab",
            IndentStyle::Space2 => "2 spaces",
            IndentStyle::Space4 => "4 spaces",
            IndentStyle::Space6 => "6 spaces",
            IndentStyle::Space8 => "8 spaces",
            IndentStyle::FullWidthSpace2 => "2 full-width spaces",
            IndentStyle::Underscore4 => "4 underscores",
            IndentStyle::NoIndent => "Newlines, no indent",
            IndentStyle::Compact => "No newlines, no indent, no spaces",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|style| style.id() == id)
    }

    /// Indent unit, or `None` for compact output.
    fn indent(self) -> Option<&'static str> {
        match self {
            IndentStyle::Tab => Some("\t"),
            IndentStyle::Space2 => Some("  "),
            IndentStyle::Space4 => Some("    "),
            IndentStyle::Space6 => Some("      "),
            IndentStyle::Space8 => Some("        "),
            IndentStyle::FullWidthSpace2 => Some("\u{3000}\u{3000}"),
            IndentStyle::Underscore4 => Some("____"),
            IndentStyle::NoIndent => Some(""),
            IndentStyle::Compact => None,
        }
    }
}

fn parse(input: &str) -> Result<Value, JsonFormatError> {
    if input.trim().is_empty() {
        return Err(JsonFormatError::EmptyInput);
    }
    serde_json::from_str(input).map_err(|e| JsonFormatError::Invalid(e.to_string()))
}

fn write_with_indent(value: &Value, indent: &str) -> Result<String, JsonFormatError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| JsonFormatError::Serialize(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| JsonFormatError::Serialize(e.to_string()))
}

/// Parse `input` and re-serialize it with `style`. Key order is preserved.
pub fn format_json(input: &str, style: IndentStyle) -> Result<String, JsonFormatError> {
    let value = parse(input)?;
    match style.indent() {
        None => serde_json::to_string(&value).map_err(|e| JsonFormatError::Serialize(e.to_string())),
        Some(indent) => write_with_indent(&value, indent),
    }
}

/// Parse `input` and serialize it without any whitespace.
pub fn minify_json(input: &str) -> Result<String, JsonFormatError> {
    format_json(input, IndentStyle::Compact)
}

/// Expand tab characters for display. JSON escapes tabs inside strings, so
/// every literal tab in formatter output is indentation.
pub fn expand_tabs(output: &str, tab_width: usize) -> String {
    output.replace('\t', &" ".repeat(tab_width))
}

/// A formatter session: input, last good output and last error.
///
/// A failed operation records the error and leaves the previous output in
/// place.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    pub input: String,
    pub style: IndentStyle,
    pub tab_width: usize,
    output: String,
    error: Option<JsonFormatError>,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            tab_width: DEFAULT_TAB_WIDTH,
            ..Self::default()
        }
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
        self.error = None;
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn error(&self) -> Option<&JsonFormatError> {
        self.error.as_ref()
    }

    pub fn format(&mut self) -> Result<&str, JsonFormatError> {
        let result = format_json(&self.input, self.style);
        self.apply(result)
    }

    pub fn minify(&mut self) -> Result<&str, JsonFormatError> {
        let result = minify_json(&self.input);
        self.apply(result)
    }

    /// Output with tabs expanded to the configured display width.
    pub fn display_output(&self) -> String {
        expand_tabs(&self.output, self.tab_width)
    }

    fn apply(&mut self, result: Result<String, JsonFormatError>) -> Result<&str, JsonFormatError> {
        match result {
            Ok(output) => {
                self.output = output;
                self.error = None;
                Ok(&self.output)
            }
            Err(e) => {
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }
}
