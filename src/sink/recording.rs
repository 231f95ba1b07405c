//! In-memory sink that records every call.

use crate::props::PropertyList;

use super::DocumentSink;

/// One recorded sink call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(tag = "event", content = "data", rename_all = "snake_case"))]
pub enum SinkEvent {
    StartDocument(PropertyList),
    EndDocument,
    OpenPageSpan(PropertyList),
    ClosePageSpan,
    OpenHeader(PropertyList),
    CloseHeader,
    OpenFooter(PropertyList),
    CloseFooter,
    OpenFootnote(PropertyList),
    CloseFootnote,
    OpenParagraph(PropertyList),
    CloseParagraph,
    OpenSpan(PropertyList),
    CloseSpan,
    OpenLink(PropertyList),
    CloseLink,
    OpenOrderedList(PropertyList),
    CloseOrderedList,
    OpenUnorderedList(PropertyList),
    CloseUnorderedList,
    OpenListElement(PropertyList),
    CloseListElement,
    OpenTable(PropertyList),
    CloseTable,
    OpenTableRow(PropertyList),
    CloseTableRow,
    OpenTableCell(PropertyList),
    CloseTableCell,
    InsertCoveredTableCell(PropertyList),
    InsertText(String),
    InsertSpace,
    InsertTab,
    InsertLineBreak,
    InsertBinaryObject(PropertyList),
    InsertEquation(PropertyList),
}

impl SinkEvent {
    /// Name of the sink method that produced this event.
    pub fn name(&self) -> &'static str {
        match self {
            SinkEvent::StartDocument(_) => "start_document",
            SinkEvent::EndDocument => "end_document",
            SinkEvent::OpenPageSpan(_) => "open_page_span",
            SinkEvent::ClosePageSpan => "close_page_span",
            SinkEvent::OpenHeader(_) => "open_header",
            SinkEvent::CloseHeader => "close_header",
            SinkEvent::OpenFooter(_) => "open_footer",
            SinkEvent::CloseFooter => "close_footer",
            SinkEvent::OpenFootnote(_) => "open_footnote",
            SinkEvent::CloseFootnote => "close_footnote",
            SinkEvent::OpenParagraph(_) => "open_paragraph",
            SinkEvent::CloseParagraph => "close_paragraph",
            SinkEvent::OpenSpan(_) => "open_span",
            SinkEvent::CloseSpan => "close_span",
            SinkEvent::OpenLink(_) => "open_link",
            SinkEvent::CloseLink => "close_link",
            SinkEvent::OpenOrderedList(_) => "open_ordered_list",
            SinkEvent::CloseOrderedList => "close_ordered_list",
            SinkEvent::OpenUnorderedList(_) => "open_unordered_list",
            SinkEvent::CloseUnorderedList => "close_unordered_list",
            SinkEvent::OpenListElement(_) => "open_list_element",
            SinkEvent::CloseListElement => "close_list_element",
            SinkEvent::OpenTable(_) => "open_table",
            SinkEvent::CloseTable => "close_table",
            SinkEvent::OpenTableRow(_) => "open_table_row",
            SinkEvent::CloseTableRow => "close_table_row",
            SinkEvent::OpenTableCell(_) => "open_table_cell",
            SinkEvent::CloseTableCell => "close_table_cell",
            SinkEvent::InsertCoveredTableCell(_) => "insert_covered_table_cell",
            SinkEvent::InsertText(_) => "insert_text",
            SinkEvent::InsertSpace => "insert_space",
            SinkEvent::InsertTab => "insert_tab",
            SinkEvent::InsertLineBreak => "insert_line_break",
            SinkEvent::InsertBinaryObject(_) => "insert_binary_object",
            SinkEvent::InsertEquation(_) => "insert_equation",
        }
    }

    /// The element an open or close event refers to, such as `"paragraph"`.
    pub fn element(&self) -> Option<&'static str> {
        let name = self.name();
        name.strip_prefix("open_")
            .or_else(|| name.strip_prefix("close_"))
    }

    pub fn is_open(&self) -> bool {
        self.name().starts_with("open_")
    }

    pub fn is_close(&self) -> bool {
        self.name().starts_with("close_")
    }
}

/// Sink that keeps every call for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<SinkEvent> {
        self.events
    }

    /// Method names in call order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events.iter().map(SinkEvent::name).collect()
    }

    /// Concatenated text content, with spaces and tabs rendered as
    /// whitespace and line breaks as `\n`.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            match event {
                SinkEvent::InsertText(text) => out.push_str(text),
                SinkEvent::InsertSpace => out.push(' '),
                SinkEvent::InsertTab => out.push('\t'),
                SinkEvent::InsertLineBreak => out.push('\n'),
                _ => {}
            }
        }
        out
    }
}

impl DocumentSink for RecordingSink {
    fn start_document(&mut self, metadata: &PropertyList) {
        self.events.push(SinkEvent::StartDocument(metadata.clone()));
    }

    fn end_document(&mut self) {
        self.events.push(SinkEvent::EndDocument);
    }

    fn open_page_span(&mut self, props: &PropertyList) {
        self.events.push(SinkEvent::OpenPageSpan(props.clone()));
    }

    fn close_page_span(&mut self) {
        self.events.push(SinkEvent::ClosePageSpan);
    }

    fn open_header(&mut self, props: &PropertyList) {
        self.events.push(SinkEvent::OpenHeader(props.clone()));
    }

    fn close_header(&mut self) {
        self.events.push(SinkEvent::CloseHeader);
    }

    fn open_footer(&mut self, props: &PropertyList) {
        self.events.push(SinkEvent::OpenFooter(props.clone()));
    }

    fn close_footer(&mut self) {
        self.events.push(SinkEvent::CloseFooter);
    }

    fn open_footnote(&mut self, props: &PropertyList) {
        self.events.push(SinkEvent::OpenFootnote(props.clone()));
    }

    fn close_footnote(&mut self) {
        self.events.push(SinkEvent::CloseFootnote);
    }

    fn open_paragraph(&mut self, props: &PropertyList) {
        self.events.push(SinkEvent::OpenParagraph(props.clone()));
    }

    fn close_paragraph(&mut self) {
        self.events.push(SinkEvent::CloseParagraph);
    }

    fn open_span(&mut self, props: &PropertyList) {
        self.events.push(SinkEvent::OpenSpan(props.clone()));
    }

    fn close_span(&mut self) {
        self.events.push(SinkEvent::CloseSpan);
    }

    fn open_link(&mut self, props: &PropertyList) {
        self.events.push(SinkEvent::OpenLink(props.clone()));
    }

    fn close_link(&mut self) {
        self.events.push(SinkEvent::CloseLink);
    }

    fn open_ordered_list(&mut self, props: &PropertyList) {
        self.events.push(SinkEvent::OpenOrderedList(props.clone()));
    }

    fn close_ordered_list(&mut self) {
        self.events.push(SinkEvent::CloseOrderedList);
    }

    fn open_unordered_list(&mut self, props: &PropertyList) {
        self.events.push(SinkEvent::OpenUnorderedList(props.clone()));
    }

    fn close_unordered_list(&mut self) {
        self.events.push(SinkEvent::CloseUnorderedList);
    }

    fn open_list_element(&mut self, props: &PropertyList) {
        self.events.push(SinkEvent::OpenListElement(props.clone()));
    }

    fn close_list_element(&mut self) {
        self.events.push(SinkEvent::CloseListElement);
    }

    fn open_table(&mut self, props: &PropertyList) {
        self.events.push(SinkEvent::OpenTable(props.clone()));
    }

    fn close_table(&mut self) {
        self.events.push(SinkEvent::CloseTable);
    }

    fn open_table_row(&mut self, props: &PropertyList) {
        self.events.push(SinkEvent::OpenTableRow(props.clone()));
    }

    fn close_table_row(&mut self) {
        self.events.push(SinkEvent::CloseTableRow);
    }

    fn open_table_cell(&mut self, props: &PropertyList) {
        self.events.push(SinkEvent::OpenTableCell(props.clone()));
    }

    fn close_table_cell(&mut self) {
        self.events.push(SinkEvent::CloseTableCell);
    }

    fn insert_covered_table_cell(&mut self, props: &PropertyList) {
        self.events
            .push(SinkEvent::InsertCoveredTableCell(props.clone()));
    }

    fn insert_text(&mut self, text: &str) {
        self.events.push(SinkEvent::InsertText(text.to_string()));
    }

    fn insert_space(&mut self) {
        self.events.push(SinkEvent::InsertSpace);
    }

    fn insert_tab(&mut self) {
        self.events.push(SinkEvent::InsertTab);
    }

    fn insert_line_break(&mut self) {
        self.events.push(SinkEvent::InsertLineBreak);
    }

    fn insert_binary_object(&mut self, props: &PropertyList) {
        self.events.push(SinkEvent::InsertBinaryObject(props.clone()));
    }

    fn insert_equation(&mut self, props: &PropertyList) {
        self.events.push(SinkEvent::InsertEquation(props.clone()));
    }
}
