//! Structure normalization for flow documents.
//!
//! Format parsers drive a [`Collector`] with whatever open/close/insert calls
//! their input suggests, in whatever order the input happens to have them.
//! The collector repairs the structure as it goes:
//!
//! - content that arrives without a container gets one (text at document
//!   level becomes page span > paragraph > span)
//! - a container opened where it cannot live suspends the contexts that
//!   forbid it, and resumes them once it is closed again
//! - containers that never receive content and were not asked for leave no
//!   trace in the output
//!
//! Nothing reaches the sink until [`Collector::finish`], which replays the
//! recorded commands as one balanced event sequence.
//!
//! # Example
//!
//! ```
//! use folio::collect::Collector;
//! use folio::sink::RecordingSink;
//!
//! let mut collector = Collector::new();
//! collector.collect_text("Hello");
//! collector.collect_space();
//! collector.collect_text("world");
//!
//! let mut sink = RecordingSink::new();
//! collector.finish(&mut sink).unwrap();
//! assert_eq!(sink.names()[..4], ["start_document", "open_page_span", "open_paragraph", "open_span"]);
//! ```

mod context;
mod machine;
mod output;
mod transition;

pub use context::{ContextType, EventType, Leaf};
pub use output::{Command, HeaderFooterRefs, Occurrences, OutputElements};

use crate::error::Result;
use crate::props::PropertyList;
use crate::sink::DocumentSink;

use machine::{Payload, StackMachine};

/// Entry point for format parsers.
///
/// Owns the normalization engine, the recorded commands and the document
/// metadata. Each call settles completely before it returns.
pub struct Collector {
    machine: StackMachine,
    output: OutputElements,
    metadata: PropertyList,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector {
    pub fn new() -> Self {
        Self {
            machine: StackMachine::new(),
            output: OutputElements::new(),
            metadata: PropertyList::new(),
        }
    }

    fn event(&mut self, event: EventType, payload: Payload) {
        self.machine.handle(event, payload, &mut self.output);
    }

    fn open(&mut self, kind: ContextType, props: &PropertyList) {
        self.event(EventType::Open(kind), Payload::props(props.clone()));
    }

    fn close(&mut self, kind: ContextType) {
        self.event(EventType::Close(kind), Payload::default());
    }

    fn leaf(&mut self, leaf: Leaf, props: &PropertyList) {
        self.event(EventType::Insert(leaf), Payload::props(props.clone()));
    }

    /// Document-level properties passed to `start_document`. Later calls
    /// override earlier keys.
    pub fn collect_metadata(&mut self, props: &PropertyList) {
        for (key, value) in props.iter() {
            self.metadata.insert(key, value.clone());
        }
    }

    pub fn metadata(&self) -> &PropertyList {
        &self.metadata
    }

    pub fn open_page_span(&mut self, props: &PropertyList) {
        self.open_page_span_with_refs(props, HeaderFooterRefs::default());
    }

    /// Open a page span that shows the given headers and footers.
    pub fn open_page_span_with_refs(&mut self, props: &PropertyList, refs: HeaderFooterRefs) {
        let payload = Payload {
            props: props.clone(),
            refs,
            ..Payload::default()
        };
        self.event(EventType::Open(ContextType::PageSpan), payload);
    }

    pub fn close_page_span(&mut self) {
        self.close(ContextType::PageSpan);
    }

    /// Open header `id`. Its content is recorded apart from the body and
    /// replayed inside each page span that references it.
    pub fn open_header(&mut self, props: &PropertyList, id: u32) {
        let payload = Payload {
            props: props.clone(),
            id,
            ..Payload::default()
        };
        self.event(EventType::Open(ContextType::Header), payload);
    }

    pub fn close_header(&mut self) {
        self.close(ContextType::Header);
    }

    /// Open footer `id`; see [`Collector::open_header`].
    pub fn open_footer(&mut self, props: &PropertyList, id: u32) {
        let payload = Payload {
            props: props.clone(),
            id,
            ..Payload::default()
        };
        self.event(EventType::Open(ContextType::Footer), payload);
    }

    pub fn close_footer(&mut self) {
        self.close(ContextType::Footer);
    }

    pub fn open_footnote(&mut self, props: &PropertyList) {
        self.open(ContextType::Footnote, props);
    }

    pub fn close_footnote(&mut self) {
        self.close(ContextType::Footnote);
    }

    pub fn open_paragraph(&mut self, props: &PropertyList) {
        self.open(ContextType::Paragraph, props);
    }

    pub fn close_paragraph(&mut self) {
        self.close(ContextType::Paragraph);
    }

    pub fn open_span(&mut self, props: &PropertyList) {
        self.open(ContextType::Span, props);
    }

    pub fn close_span(&mut self) {
        self.close(ContextType::Span);
    }

    pub fn open_link(&mut self, props: &PropertyList) {
        self.open(ContextType::Link, props);
    }

    pub fn close_link(&mut self) {
        self.close(ContextType::Link);
    }

    pub fn open_ordered_list(&mut self, props: &PropertyList) {
        self.open(ContextType::OrderedList, props);
    }

    pub fn close_ordered_list(&mut self) {
        self.close(ContextType::OrderedList);
    }

    pub fn open_unordered_list(&mut self, props: &PropertyList) {
        self.open(ContextType::UnorderedList, props);
    }

    pub fn close_unordered_list(&mut self) {
        self.close(ContextType::UnorderedList);
    }

    pub fn open_list_element(&mut self, props: &PropertyList) {
        self.open(ContextType::ListElement, props);
    }

    pub fn close_list_element(&mut self) {
        self.close(ContextType::ListElement);
    }

    pub fn open_table(&mut self, props: &PropertyList) {
        self.open(ContextType::Table, props);
    }

    pub fn close_table(&mut self) {
        self.close(ContextType::Table);
    }

    pub fn open_table_row(&mut self, props: &PropertyList) {
        self.open(ContextType::TableRow, props);
    }

    pub fn close_table_row(&mut self) {
        self.close(ContextType::TableRow);
    }

    pub fn open_table_cell(&mut self, props: &PropertyList) {
        self.open(ContextType::TableCell, props);
    }

    pub fn close_table_cell(&mut self) {
        self.close(ContextType::TableCell);
    }

    /// Open an inline frame for images and equations.
    pub fn open_object(&mut self) {
        self.open(ContextType::Object, &PropertyList::new());
    }

    pub fn close_object(&mut self) {
        self.close(ContextType::Object);
    }

    pub fn collect_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.event(EventType::Insert(Leaf::Text), Payload::text(text));
    }

    pub fn collect_space(&mut self) {
        self.leaf(Leaf::Space, &PropertyList::new());
    }

    pub fn collect_tab(&mut self) {
        self.leaf(Leaf::Tab, &PropertyList::new());
    }

    pub fn collect_line_break(&mut self) {
        self.leaf(Leaf::LineBreak, &PropertyList::new());
    }

    /// Insert binary data, typically an image. `props` carries the MIME type
    /// and the data itself.
    pub fn collect_image(&mut self, props: &PropertyList) {
        self.leaf(Leaf::Image, props);
    }

    pub fn collect_equation(&mut self, props: &PropertyList) {
        self.leaf(Leaf::Equation, props);
    }

    /// Mark a grid position occupied by a neighbouring spanning cell.
    pub fn collect_covered_table_cell(&mut self, props: &PropertyList) {
        self.leaf(Leaf::CoveredTableCell, props);
    }

    /// Context types currently open, outermost first, excluding the
    /// document root.
    pub fn open_contexts(&self) -> Vec<ContextType> {
        self.machine
            .active_kinds()
            .into_iter()
            .filter(|&kind| kind != ContextType::Document)
            .collect()
    }

    /// Commands recorded so far.
    pub fn output(&self) -> &OutputElements {
        &self.output
    }

    /// Close what the engine opened on its own and replay the document into
    /// `sink`.
    ///
    /// Fails without touching the sink if the caller left a context open or
    /// a suspended context was never resumed.
    pub fn finish<S: DocumentSink + ?Sized>(mut self, sink: &mut S) -> Result<()> {
        self.machine.finish(&mut self.output)?;
        log::debug!(
            target: "folio::machine",
            "collected {} body commands, {} suspended left",
            self.output.body().len(),
            self.machine.suspended_len()
        );

        sink.start_document(&self.metadata);
        self.output.write(sink);
        sink.end_document();
        Ok(())
    }
}
