//! Debugging sink that prints one indented line per call.

use std::fmt::Write;

use crate::props::PropertyList;

use super::DocumentSink;

/// Configuration for [`RawSink`].
#[derive(Debug, Clone)]
pub struct RawConfig {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Print property lists after open calls.
    pub show_properties: bool,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            indent: 2,
            show_properties: true,
        }
    }
}

/// Renders the event stream as an indented trace.
///
/// Also checks nesting: every close must match the innermost open. Problems
/// are reported inline as `!! ...` lines and counted.
#[derive(Debug, Default)]
pub struct RawSink {
    config: RawConfig,
    out: String,
    stack: Vec<&'static str>,
    errors: usize,
}

impl RawSink {
    pub fn new() -> Self {
        Self::with_config(RawConfig::default())
    }

    pub fn with_config(config: RawConfig) -> Self {
        Self {
            config,
            out: String::new(),
            stack: Vec::new(),
            errors: 0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    /// Whether every open was closed in order.
    pub fn is_balanced(&self) -> bool {
        self.errors == 0 && self.stack.is_empty()
    }

    fn line(&mut self, text: &str) {
        let width = self.stack.len() * self.config.indent;
        let _ = writeln!(self.out, "{:width$}{text}", "");
    }

    fn open(&mut self, element: &'static str, props: &PropertyList) {
        if self.config.show_properties && !props.is_empty() {
            self.line(&format!("open_{element}({props})"));
        } else {
            self.line(&format!("open_{element}"));
        }
        self.stack.push(element);
    }

    fn close(&mut self, element: &'static str) {
        match self.stack.pop() {
            Some(open) if open == element => {}
            Some(open) => {
                self.errors += 1;
                self.line(&format!("!! close_{element} while {open} is open"));
            }
            None => {
                self.errors += 1;
                self.line(&format!("!! close_{element} with nothing open"));
            }
        }
        self.line(&format!("close_{element}"));
    }

    fn leaf(&mut self, name: &str, props: &PropertyList) {
        if self.config.show_properties && !props.is_empty() {
            self.line(&format!("{name}({props})"));
        } else {
            self.line(name);
        }
    }
}

impl DocumentSink for RawSink {
    fn start_document(&mut self, metadata: &PropertyList) {
        self.open("document", metadata);
    }

    fn end_document(&mut self) {
        self.close("document");
    }

    fn open_page_span(&mut self, props: &PropertyList) {
        self.open("page_span", props);
    }

    fn close_page_span(&mut self) {
        self.close("page_span");
    }

    fn open_header(&mut self, props: &PropertyList) {
        self.open("header", props);
    }

    fn close_header(&mut self) {
        self.close("header");
    }

    fn open_footer(&mut self, props: &PropertyList) {
        self.open("footer", props);
    }

    fn close_footer(&mut self) {
        self.close("footer");
    }

    fn open_footnote(&mut self, props: &PropertyList) {
        self.open("footnote", props);
    }

    fn close_footnote(&mut self) {
        self.close("footnote");
    }

    fn open_paragraph(&mut self, props: &PropertyList) {
        self.open("paragraph", props);
    }

    fn close_paragraph(&mut self) {
        self.close("paragraph");
    }

    fn open_span(&mut self, props: &PropertyList) {
        self.open("span", props);
    }

    fn close_span(&mut self) {
        self.close("span");
    }

    fn open_link(&mut self, props: &PropertyList) {
        self.open("link", props);
    }

    fn close_link(&mut self) {
        self.close("link");
    }

    fn open_ordered_list(&mut self, props: &PropertyList) {
        self.open("ordered_list", props);
    }

    fn close_ordered_list(&mut self) {
        self.close("ordered_list");
    }

    fn open_unordered_list(&mut self, props: &PropertyList) {
        self.open("unordered_list", props);
    }

    fn close_unordered_list(&mut self) {
        self.close("unordered_list");
    }

    fn open_list_element(&mut self, props: &PropertyList) {
        self.open("list_element", props);
    }

    fn close_list_element(&mut self) {
        self.close("list_element");
    }

    fn open_table(&mut self, props: &PropertyList) {
        self.open("table", props);
    }

    fn close_table(&mut self) {
        self.close("table");
    }

    fn open_table_row(&mut self, props: &PropertyList) {
        self.open("table_row", props);
    }

    fn close_table_row(&mut self) {
        self.close("table_row");
    }

    fn open_table_cell(&mut self, props: &PropertyList) {
        self.open("table_cell", props);
    }

    fn close_table_cell(&mut self) {
        self.close("table_cell");
    }

    fn insert_covered_table_cell(&mut self, props: &PropertyList) {
        self.leaf("insert_covered_table_cell", props);
    }

    fn insert_text(&mut self, text: &str) {
        self.line(&format!("insert_text({text:?})"));
    }

    fn insert_space(&mut self) {
        self.line("insert_space");
    }

    fn insert_tab(&mut self) {
        self.line("insert_tab");
    }

    fn insert_line_break(&mut self) {
        self.line("insert_line_break");
    }

    fn insert_binary_object(&mut self, props: &PropertyList) {
        self.leaf("insert_binary_object", props);
    }

    fn insert_equation(&mut self, props: &PropertyList) {
        self.leaf("insert_equation", props);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indented_trace() {
        let mut sink = RawSink::new();
        sink.start_document(&PropertyList::new());
        sink.open_paragraph(&PropertyList::new().with("fo:margin-left", "1in"));
        sink.insert_text("hi");
        sink.close_paragraph();
        sink.end_document();

        assert!(sink.is_balanced());
        assert_eq!(
            sink.into_string(),
            "open_document\n  open_paragraph(fo:margin-left: 1in)\n    insert_text(\"hi\")\n  close_paragraph\nclose_document\n"
        );
    }

    #[test]
    fn test_mismatched_close_reported() {
        let mut sink = RawSink::with_config(RawConfig {
            indent: 1,
            show_properties: false,
        });
        sink.open_span(&PropertyList::new());
        sink.close_paragraph();

        assert!(!sink.is_balanced());
        assert!(sink.as_str().contains("!! close_paragraph while span is open"));
    }
}
