use std::fmt;

use crate::report::sink::{Event, ReportSink};

/// The indentation in effect, as a stack of prefixes.
#[derive(Debug, Default, Clone)]
pub struct Indent {
    widths: Vec<usize>,
    current: String,
}

impl Indent {
    pub fn push(&mut self, prefix: &str) {
        self.widths.push(prefix.len());
        self.current.push_str(prefix);
    }

    pub fn pop(&mut self) {
        if let Some(width) = self.widths.pop() {
            self.current.truncate(self.current.len() - width);
        }
    }

    pub fn as_str(&self) -> &str {
        &self.current
    }
}

impl fmt::Display for Indent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.current)
    }
}

/// Turns report events into text, one event at a time.
pub trait Formatter {
    /// Renders `event` as a complete line, prefix included, or nothing.
    /// Opening events indent what follows, closing events undo that before
    /// rendering.
    fn format(&self, event: &Event<'_>, indent: &mut Indent) -> Option<String>;
}

/// A [`ReportSink`] writing formatted lines into a string.
pub struct FormattedReporter {
    formatter: Box<dyn Formatter>,
    indent: Indent,
    output: String,
}

impl FormattedReporter {
    pub fn new(formatter: Box<dyn Formatter>) -> Self {
        Self {
            formatter,
            indent: Indent::default(),
            output: String::new(),
        }
    }

    pub fn into_string(self) -> String {
        self.output
    }
}

impl ReportSink for FormattedReporter {
    fn accept(&mut self, event: Event<'_>) {
        if let Some(line) = self.formatter.format(&event, &mut self.indent) {
            self.output.push_str(&line);
            self.output.push('\n');
        }
    }
}

impl fmt::Debug for FormattedReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormattedReporter")
            .field("indent", &self.indent)
            .field("output", &self.output.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_stack() {
        let mut indent = Indent::default();
        indent.push("  ");
        indent.push("  - ");
        assert_eq!(indent.as_str(), "    - ");
        indent.pop();
        assert_eq!(indent.to_string(), "  ");
        indent.pop();
        indent.pop();
        assert_eq!(indent.as_str(), "");
    }
}
