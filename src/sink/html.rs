//! XHTML rendering sink.
//!
//! Page spans become `<div class="page">`, headers and footers become
//! `<header>`/`<footer>`, and footnotes are replaced in the flow by a
//! numbered reference. Footnote bodies are collected and emitted together at
//! the end of the document.

use std::fmt::Write;

use base64::Engine;

use crate::props::{PropertyList, keys};

use super::DocumentSink;

/// Configuration for [`HtmlSink`].
#[derive(Debug, Clone, Default)]
pub struct HtmlConfig {
    /// Document title; falls back to the `dc:title` metadata, then "Untitled".
    pub title: Option<String>,
    /// Force a page break before every page span except the first.
    pub page_breaks: bool,
}

/// Output buffer with its own block indentation.
#[derive(Debug, Default)]
struct Buffer {
    out: String,
    level: usize,
}

impl Buffer {
    fn indent(&mut self) {
        for _ in 0..self.level {
            self.out.push_str("  ");
        }
    }

    /// Block element that holds other blocks.
    fn open_container(&mut self, tag: &str, attrs: &str) {
        self.indent();
        let _ = writeln!(self.out, "<{tag}{attrs}>");
        self.level += 1;
    }

    fn close_container(&mut self, tag: &str) {
        self.level = self.level.saturating_sub(1);
        self.indent();
        let _ = writeln!(self.out, "</{tag}>");
    }
}

/// Renders a collected document as an XHTML string.
#[derive(Debug, Default)]
pub struct HtmlSink {
    config: HtmlConfig,
    title: String,
    body: Buffer,
    /// Footnote bodies being written with their slot in `notes`, innermost
    /// last.
    open_notes: Vec<(usize, Buffer)>,
    notes: Vec<(String, String)>,
    pages: usize,
    document: String,
}

impl HtmlSink {
    pub fn new() -> Self {
        Self::with_config(HtmlConfig::default())
    }

    pub fn with_config(config: HtmlConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The rendered document. Empty until `end_document` has been called.
    pub fn as_str(&self) -> &str {
        &self.document
    }

    pub fn into_string(self) -> String {
        self.document
    }

    fn current(&mut self) -> &mut Buffer {
        match self.open_notes.last_mut() {
            Some((_, note)) => note,
            None => &mut self.body,
        }
    }

    fn push_str(&mut self, s: &str) {
        self.current().out.push_str(s);
    }
}

/// Escape special XML/HTML characters.
pub fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

fn span_attrs(props: &PropertyList) -> String {
    let mut attrs = String::new();
    let columns = props.get(keys::COLUMNS_SPANNED).and_then(|v| v.as_int());
    if let Some(colspan) = columns.filter(|&n| n > 1) {
        let _ = write!(attrs, " colspan=\"{colspan}\"");
    }
    let rows = props.get(keys::ROWS_SPANNED).and_then(|v| v.as_int());
    if let Some(rowspan) = rows.filter(|&n| n > 1) {
        let _ = write!(attrs, " rowspan=\"{rowspan}\"");
    }
    attrs
}

impl DocumentSink for HtmlSink {
    fn start_document(&mut self, metadata: &PropertyList) {
        self.title = self
            .config
            .title
            .clone()
            .or_else(|| metadata.get_str(keys::TITLE).map(str::to_string))
            .unwrap_or_else(|| "Untitled".to_string());
        self.body.level = 1;
    }

    fn end_document(&mut self) {
        let mut doc = String::new();
        doc.push_str(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
  <meta http-equiv="Content-Type" content="application/xhtml+xml; charset=utf-8"/>
  <title>"#,
        );
        doc.push_str(&escape_xml(&self.title));
        doc.push_str("</title>\n</head>\n<body>\n");
        doc.push_str(&self.body.out);

        if !self.notes.is_empty() {
            doc.push_str("  <div class=\"footnotes\">\n");
            for (i, (label, content)) in self.notes.iter().enumerate() {
                let n = i + 1;
                let _ = writeln!(
                    doc,
                    "    <aside id=\"fn{n}\"><a href=\"#fnref{n}\">{}</a>",
                    escape_xml(label)
                );
                doc.push_str(content);
                doc.push_str("    </aside>\n");
            }
            doc.push_str("  </div>\n");
        }

        doc.push_str("</body>\n</html>\n");
        self.document = doc;
    }

    fn open_page_span(&mut self, _props: &PropertyList) {
        self.pages += 1;
        if self.config.page_breaks && self.pages > 1 {
            self.current()
                .open_container("div", " class=\"page\" style=\"page-break-before: always\"");
        } else {
            self.current().open_container("div", " class=\"page\"");
        }
    }

    fn close_page_span(&mut self) {
        self.current().close_container("div");
    }

    fn open_header(&mut self, _props: &PropertyList) {
        self.current().open_container("header", "");
    }

    fn close_header(&mut self) {
        self.current().close_container("header");
    }

    fn open_footer(&mut self, _props: &PropertyList) {
        self.current().open_container("footer", "");
    }

    fn close_footer(&mut self) {
        self.current().close_container("footer");
    }

    fn open_footnote(&mut self, props: &PropertyList) {
        let n = self.notes.len() + 1;
        let label = props
            .get_str(keys::FOOTNOTE_LABEL)
            .map(str::to_string)
            .unwrap_or_else(|| n.to_string());
        let _ = write!(
            self.current().out,
            "<sup><a id=\"fnref{n}\" href=\"#fn{n}\">{}</a></sup>",
            escape_xml(&label)
        );
        // Reserve the slot so numbering follows reference order.
        self.notes.push((label, String::new()));
        let slot = self.notes.len() - 1;
        self.open_notes.push((
            slot,
            Buffer {
                out: String::new(),
                level: 3,
            },
        ));
    }

    fn close_footnote(&mut self) {
        let Some((slot, note)) = self.open_notes.pop() else {
            return;
        };
        if let Some((_, content)) = self.notes.get_mut(slot) {
            *content = note.out;
        }
    }

    fn open_paragraph(&mut self, _props: &PropertyList) {
        let buffer = self.current();
        buffer.indent();
        buffer.out.push_str("<p>");
    }

    fn close_paragraph(&mut self) {
        self.push_str("</p>\n");
    }

    fn open_span(&mut self, _props: &PropertyList) {
        self.push_str("<span>");
    }

    fn close_span(&mut self) {
        self.push_str("</span>");
    }

    fn open_link(&mut self, props: &PropertyList) {
        match props.get_str(keys::HREF) {
            Some(href) => {
                let tag = format!("<a href=\"{}\">", escape_xml(href));
                self.push_str(&tag);
            }
            None => self.push_str("<a>"),
        }
    }

    fn close_link(&mut self) {
        self.push_str("</a>");
    }

    fn open_ordered_list(&mut self, _props: &PropertyList) {
        self.current().open_container("ol", "");
    }

    fn close_ordered_list(&mut self) {
        self.current().close_container("ol");
    }

    fn open_unordered_list(&mut self, _props: &PropertyList) {
        self.current().open_container("ul", "");
    }

    fn close_unordered_list(&mut self) {
        self.current().close_container("ul");
    }

    fn open_list_element(&mut self, _props: &PropertyList) {
        self.current().open_container("li", "");
    }

    fn close_list_element(&mut self) {
        self.current().close_container("li");
    }

    fn open_table(&mut self, _props: &PropertyList) {
        self.current().open_container("table", "");
    }

    fn close_table(&mut self) {
        self.current().close_container("table");
    }

    fn open_table_row(&mut self, _props: &PropertyList) {
        self.current().open_container("tr", "");
    }

    fn close_table_row(&mut self) {
        self.current().close_container("tr");
    }

    fn open_table_cell(&mut self, props: &PropertyList) {
        let attrs = span_attrs(props);
        self.current().open_container("td", &attrs);
    }

    fn close_table_cell(&mut self) {
        self.current().close_container("td");
    }

    // Covered positions are implied by colspan/rowspan.
    fn insert_covered_table_cell(&mut self, _props: &PropertyList) {}

    fn insert_text(&mut self, text: &str) {
        self.push_str(&escape_xml(text));
    }

    fn insert_space(&mut self) {
        self.push_str(" ");
    }

    fn insert_tab(&mut self) {
        self.push_str("\t");
    }

    fn insert_line_break(&mut self) {
        self.push_str("<br/>");
    }

    fn insert_binary_object(&mut self, props: &PropertyList) {
        let Some(data) = props.get(keys::BINARY_DATA).and_then(|v| v.as_bytes()) else {
            return;
        };
        let mime = props
            .get_str(keys::MIME_TYPE)
            .unwrap_or("application/octet-stream");
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        let tag = format!("<img src=\"data:{};base64,{encoded}\" alt=\"\"/>", escape_xml(mime));
        self.push_str(&tag);
    }

    fn insert_equation(&mut self, props: &PropertyList) {
        let source = props.get_str(keys::EQUATION).unwrap_or_default();
        let tag = format!("<span class=\"equation\">{}</span>", escape_xml(source));
        self.push_str(&tag);
    }
}
