//! Recorded output commands.
//!
//! [`OutputElements`] is the deferred half of the collector: output guards
//! append [`Command`]s to it while the engine runs, and [`OutputElements::write`]
//! replays them against a sink once the whole document has been collected.
//!
//! Commands live in three places:
//! - the body sequence, in document order
//! - header sequences, keyed by a small integer id
//! - footer sequences, keyed the same way
//!
//! Opening a header or footer redirects recording to its sequence until the
//! matching close. A page span refers to header/footer sequences through
//! [`HeaderFooterRefs`]; they are replayed inline right after the page span
//! opens.

use std::collections::BTreeMap;

use crate::props::PropertyList;
use crate::sink::DocumentSink;

/// Header or footer ids for each page occurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Occurrences {
    /// Used on every page unless overridden.
    pub normal: Option<u32>,
    pub left: Option<u32>,
    pub first: Option<u32>,
    pub last: Option<u32>,
}

impl Occurrences {
    /// Only a normal occurrence.
    pub fn normal(id: u32) -> Self {
        Self {
            normal: Some(id),
            ..Self::default()
        }
    }

    fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        [self.normal, self.left, self.first, self.last]
            .into_iter()
            .flatten()
    }
}

/// Headers and footers referenced by a page span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderFooterRefs {
    pub headers: Occurrences,
    pub footers: Occurrences,
}

impl HeaderFooterRefs {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A recorded primitive output operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    OpenPageSpan(PropertyList, HeaderFooterRefs),
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

/// Which sequence new commands are appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selector {
    Body,
    Header(u32),
    Footer(u32),
}

/// Deferred output: body, header and footer command sequences.
#[derive(Debug, Clone)]
pub struct OutputElements {
    body: Vec<Command>,
    headers: BTreeMap<u32, Vec<Command>>,
    footers: BTreeMap<u32, Vec<Command>>,
    current: Selector,
}

impl Default for OutputElements {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputElements {
    pub fn new() -> Self {
        Self {
            body: Vec::new(),
            headers: BTreeMap::new(),
            footers: BTreeMap::new(),
            current: Selector::Body,
        }
    }

    /// The body sequence recorded so far.
    pub fn body(&self) -> &[Command] {
        &self.body
    }

    /// A header sequence, if one was recorded under `id`.
    pub fn header(&self, id: u32) -> Option<&[Command]> {
        self.headers.get(&id).map(Vec::as_slice)
    }

    /// A footer sequence, if one was recorded under `id`.
    pub fn footer(&self, id: u32) -> Option<&[Command]> {
        self.footers.get(&id).map(Vec::as_slice)
    }

    fn push(&mut self, command: Command) {
        log::trace!(target: "folio::output", "record {command:?} into {:?}", self.current);
        let sequence = match self.current {
            Selector::Body => &mut self.body,
            Selector::Header(id) => self.headers.entry(id).or_default(),
            Selector::Footer(id) => self.footers.entry(id).or_default(),
        };
        sequence.push(command);
    }

    pub fn add_open_page_span(&mut self, props: &PropertyList, refs: HeaderFooterRefs) {
        self.push(Command::OpenPageSpan(props.clone(), refs));
    }

    pub fn add_close_page_span(&mut self) {
        self.push(Command::ClosePageSpan);
    }

    /// Start recording into header `id` and record its open.
    pub fn add_open_header(&mut self, props: &PropertyList, id: u32) {
        debug_assert_eq!(self.current, Selector::Body, "header opened inside {:?}", self.current);
        self.current = Selector::Header(id);
        self.headers.entry(id).or_default();
        self.push(Command::OpenHeader(props.clone()));
    }

    /// Record the header close and go back to the body.
    pub fn add_close_header(&mut self) {
        self.push(Command::CloseHeader);
        self.current = Selector::Body;
    }

    /// Start recording into footer `id` and record its open.
    pub fn add_open_footer(&mut self, props: &PropertyList, id: u32) {
        debug_assert_eq!(self.current, Selector::Body, "footer opened inside {:?}", self.current);
        self.current = Selector::Footer(id);
        self.footers.entry(id).or_default();
        self.push(Command::OpenFooter(props.clone()));
    }

    /// Record the footer close and go back to the body.
    pub fn add_close_footer(&mut self) {
        self.push(Command::CloseFooter);
        self.current = Selector::Body;
    }

    pub fn add_open_footnote(&mut self, props: &PropertyList) {
        self.push(Command::OpenFootnote(props.clone()));
    }

    pub fn add_close_footnote(&mut self) {
        self.push(Command::CloseFootnote);
    }

    pub fn add_open_paragraph(&mut self, props: &PropertyList) {
        self.push(Command::OpenParagraph(props.clone()));
    }

    pub fn add_close_paragraph(&mut self) {
        self.push(Command::CloseParagraph);
    }

    pub fn add_open_span(&mut self, props: &PropertyList) {
        self.push(Command::OpenSpan(props.clone()));
    }

    pub fn add_close_span(&mut self) {
        self.push(Command::CloseSpan);
    }

    pub fn add_open_link(&mut self, props: &PropertyList) {
        self.push(Command::OpenLink(props.clone()));
    }

    pub fn add_close_link(&mut self) {
        self.push(Command::CloseLink);
    }

    pub fn add_open_ordered_list(&mut self, props: &PropertyList) {
        self.push(Command::OpenOrderedList(props.clone()));
    }

    pub fn add_close_ordered_list(&mut self) {
        self.push(Command::CloseOrderedList);
    }

    pub fn add_open_unordered_list(&mut self, props: &PropertyList) {
        self.push(Command::OpenUnorderedList(props.clone()));
    }

    pub fn add_close_unordered_list(&mut self) {
        self.push(Command::CloseUnorderedList);
    }

    pub fn add_open_list_element(&mut self, props: &PropertyList) {
        self.push(Command::OpenListElement(props.clone()));
    }

    pub fn add_close_list_element(&mut self) {
        self.push(Command::CloseListElement);
    }

    pub fn add_open_table(&mut self, props: &PropertyList) {
        self.push(Command::OpenTable(props.clone()));
    }

    pub fn add_close_table(&mut self) {
        self.push(Command::CloseTable);
    }

    pub fn add_open_table_row(&mut self, props: &PropertyList) {
        self.push(Command::OpenTableRow(props.clone()));
    }

    pub fn add_close_table_row(&mut self) {
        self.push(Command::CloseTableRow);
    }

    pub fn add_open_table_cell(&mut self, props: &PropertyList) {
        self.push(Command::OpenTableCell(props.clone()));
    }

    pub fn add_close_table_cell(&mut self) {
        self.push(Command::CloseTableCell);
    }

    pub fn add_covered_table_cell(&mut self, props: &PropertyList) {
        self.push(Command::InsertCoveredTableCell(props.clone()));
    }

    pub fn add_text(&mut self, text: &str) {
        self.push(Command::InsertText(text.to_string()));
    }

    pub fn add_space(&mut self) {
        self.push(Command::InsertSpace);
    }

    pub fn add_tab(&mut self) {
        self.push(Command::InsertTab);
    }

    pub fn add_line_break(&mut self) {
        self.push(Command::InsertLineBreak);
    }

    pub fn add_binary_object(&mut self, props: &PropertyList) {
        self.push(Command::InsertBinaryObject(props.clone()));
    }

    pub fn add_equation(&mut self, props: &PropertyList) {
        self.push(Command::InsertEquation(props.clone()));
    }

    /// Replay the body against `sink`.
    ///
    /// Each page span open is followed by the header and footer sequences it
    /// refers to; ids with no (or an empty) sequence are skipped.
    pub fn write<S: DocumentSink + ?Sized>(&self, sink: &mut S) {
        for command in &self.body {
            replay(command, sink);
            if let Command::OpenPageSpan(_, refs) = command {
                replay_referenced(&self.headers, refs.headers, sink);
                replay_referenced(&self.footers, refs.footers, sink);
            }
        }
    }
}

fn replay_referenced<S: DocumentSink + ?Sized>(
    sequences: &BTreeMap<u32, Vec<Command>>,
    occurrences: Occurrences,
    sink: &mut S,
) {
    for id in occurrences.ids() {
        let Some(sequence) = sequences.get(&id) else {
            log::debug!(target: "folio::output", "page span refers to missing sequence {id}");
            continue;
        };
        for command in sequence {
            replay(command, sink);
        }
    }
}

fn replay<S: DocumentSink + ?Sized>(command: &Command, sink: &mut S) {
    match command {
        Command::OpenPageSpan(props, _) => sink.open_page_span(props),
        Command::ClosePageSpan => sink.close_page_span(),
        Command::OpenHeader(props) => sink.open_header(props),
        Command::CloseHeader => sink.close_header(),
        Command::OpenFooter(props) => sink.open_footer(props),
        Command::CloseFooter => sink.close_footer(),
        Command::OpenFootnote(props) => sink.open_footnote(props),
        Command::CloseFootnote => sink.close_footnote(),
        Command::OpenParagraph(props) => sink.open_paragraph(props),
        Command::CloseParagraph => sink.close_paragraph(),
        Command::OpenSpan(props) => sink.open_span(props),
        Command::CloseSpan => sink.close_span(),
        Command::OpenLink(props) => sink.open_link(props),
        Command::CloseLink => sink.close_link(),
        Command::OpenOrderedList(props) => sink.open_ordered_list(props),
        Command::CloseOrderedList => sink.close_ordered_list(),
        Command::OpenUnorderedList(props) => sink.open_unordered_list(props),
        Command::CloseUnorderedList => sink.close_unordered_list(),
        Command::OpenListElement(props) => sink.open_list_element(props),
        Command::CloseListElement => sink.close_list_element(),
        Command::OpenTable(props) => sink.open_table(props),
        Command::CloseTable => sink.close_table(),
        Command::OpenTableRow(props) => sink.open_table_row(props),
        Command::CloseTableRow => sink.close_table_row(),
        Command::OpenTableCell(props) => sink.open_table_cell(props),
        Command::CloseTableCell => sink.close_table_cell(),
        Command::InsertCoveredTableCell(props) => sink.insert_covered_table_cell(props),
        Command::InsertText(text) => sink.insert_text(text),
        Command::InsertSpace => sink.insert_space(),
        Command::InsertTab => sink.insert_tab(),
        Command::InsertLineBreak => sink.insert_line_break(),
        Command::InsertBinaryObject(props) => sink.insert_binary_object(props),
        Command::InsertEquation(props) => sink.insert_equation(props),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{RecordingSink, SinkEvent};

    #[test]
    fn test_body_replay_in_order() {
        let mut output = OutputElements::new();
        output.add_open_paragraph(&PropertyList::new());
        output.add_text("hello");
        output.add_space();
        output.add_close_paragraph();

        let mut sink = RecordingSink::new();
        output.write(&mut sink);

        assert_eq!(
            sink.names(),
            vec!["open_paragraph", "insert_text", "insert_space", "close_paragraph"]
        );
    }

    #[test]
    fn test_header_recorded_off_body() {
        let mut output = OutputElements::new();
        output.add_open_header(&PropertyList::new(), 3);
        output.add_open_paragraph(&PropertyList::new());
        output.add_text("running head");
        output.add_close_paragraph();
        output.add_close_header();
        output.add_open_paragraph(&PropertyList::new());
        output.add_close_paragraph();

        assert_eq!(output.body().len(), 2);
        assert_eq!(output.header(3).map(<[Command]>::len), Some(5));
        assert!(output.footer(3).is_none());
    }

    #[test]
    fn test_page_span_replays_referenced_sequences() {
        let mut output = OutputElements::new();
        output.add_open_footer(&PropertyList::new(), 1);
        output.add_close_footer();
        output.add_open_header(&PropertyList::new(), 1);
        output.add_text("head");
        output.add_close_header();

        let refs = HeaderFooterRefs {
            headers: Occurrences::normal(1),
            footers: Occurrences {
                normal: Some(1),
                first: Some(9),
                ..Occurrences::default()
            },
        };
        output.add_open_page_span(&PropertyList::new(), refs);
        output.add_close_page_span();

        let mut sink = RecordingSink::new();
        output.write(&mut sink);

        assert_eq!(
            sink.names(),
            vec![
                "open_page_span",
                "open_header",
                "insert_text",
                "close_header",
                "open_footer",
                "close_footer",
                "close_page_span",
            ]
        );
        assert_eq!(sink.events()[2], SinkEvent::InsertText("head".to_string()));
    }

    #[test]
    fn test_unreferenced_header_not_replayed() {
        let mut output = OutputElements::new();
        output.add_open_header(&PropertyList::new(), 2);
        output.add_close_header();
        output.add_open_page_span(&PropertyList::new(), HeaderFooterRefs::default());
        output.add_close_page_span();

        let mut sink = RecordingSink::new();
        output.write(&mut sink);
        assert_eq!(sink.names(), vec!["open_page_span", "close_page_span"]);
    }
}
