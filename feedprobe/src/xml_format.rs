//! Cosmetic XML indenter for displaying the original feed.
//!
//! This is a line-oriented heuristic, not a parser: text content gets its
//! own line, blank lines are left in place, and mixed content or malformed
//! markup comes out readable but not necessarily well nested.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

pub const DEFAULT_MAX_INPUT_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("input is {len} bytes, formatter limit is {limit}")]
    TooLarge { len: usize, limit: usize },
    #[error("formatter pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

struct Patterns {
    space_before_tag: Regex,
    space_after_tag: Regex,
    adjacent_tags: Regex,
    tag_then_text: Regex,
}

static PATTERNS: Lazy<Result<Patterns, regex::Error>> = Lazy::new(compile_patterns);

fn compile_patterns() -> Result<Patterns, regex::Error> {
    Ok(Patterns {
        space_before_tag: Regex::new(r"\s+<")?,
        space_after_tag: Regex::new(r">\s+")?,
        adjacent_tags: Regex::new(r"><")?,
        tag_then_text: Regex::new(r"(<[^>]+>)([^<]+)")?,
    })
}

#[derive(Debug, Clone)]
pub struct XmlFormatter {
    indent_unit: String,
    max_input_bytes: usize,
}

impl Default for XmlFormatter {
    fn default() -> Self {
        Self::new(2, DEFAULT_MAX_INPUT_BYTES)
    }
}

impl XmlFormatter {
    pub fn new(indent_width: usize, max_input_bytes: usize) -> Self {
        Self {
            indent_unit: " ".repeat(indent_width),
            max_input_bytes,
        }
    }

    /// Formats `xml`, or returns it unchanged when formatting fails.
    pub fn format(&self, xml: &str) -> String {
        match self.try_format(xml) {
            Ok(formatted) => formatted,
            Err(e) => {
                warn!("XML formatting failed: {}", e);
                xml.to_string()
            }
        }
    }

    pub fn try_format(&self, xml: &str) -> Result<String, FormatError> {
        if xml.len() > self.max_input_bytes {
            return Err(FormatError::TooLarge {
                len: xml.len(),
                limit: self.max_input_bytes,
            });
        }
        let patterns = match &*PATTERNS {
            Ok(patterns) => patterns,
            Err(e) => return Err(FormatError::Pattern(e.clone())),
        };

        let collapsed = patterns.space_before_tag.replace_all(xml, "<");
        let collapsed = patterns.space_after_tag.replace_all(&collapsed, ">");
        let broken = patterns.adjacent_tags.replace_all(&collapsed, ">\n<");
        let broken = patterns.tag_then_text.replace_all(&broken, "${1}\n${2}");

        let mut depth = 0usize;
        let lines: Vec<String> = broken
            .split('\n')
            .map(|line| {
                let line = line.trim();
                if line.is_empty() {
                    return String::new();
                }
                if line.starts_with("</") {
                    depth = depth.saturating_sub(1);
                }
                let indented = format!("{}{}", self.indent_unit.repeat(depth), line);
                if opens_element(line) {
                    depth += 1;
                }
                indented
            })
            .collect();

        Ok(lines.join("\n"))
    }
}

fn opens_element(line: &str) -> bool {
    line.starts_with('<')
        && !line.starts_with("</")
        && !line.starts_with("<?")
        && !line.ends_with("/>")
        && !line.contains("</")
}

/// Formats with the default two-space indent.
pub fn format_xml(xml: &str) -> String {
    XmlFormatter::default().format(xml)
}
