//! Document sinks: the downstream consumers of a collected document.
//!
//! A [`DocumentSink`] receives the final, well-formed event sequence when a
//! [`Collector`](crate::Collector) finishes. Every open call is matched by its
//! close, nesting is always legal, and `start_document`/`end_document` wrap
//! everything else. The sink interface is total: it has no way to report
//! failure, so sinks that write somewhere fallible buffer their output and
//! hand it over afterwards.
//!
//! Three sinks ship with the crate:
//! - [`RecordingSink`] keeps the calls as a vector of [`SinkEvent`]s
//! - [`RawSink`] renders one indented line per call, for debugging
//! - [`HtmlSink`] renders an XHTML document

mod html;
mod raw;
mod recording;

pub use html::{HtmlConfig, HtmlSink, escape_xml};
pub use raw::{RawConfig, RawSink};
pub use recording::{RecordingSink, SinkEvent};

use crate::props::PropertyList;

/// Consumer of a balanced flow-document event stream.
pub trait DocumentSink {
    fn start_document(&mut self, metadata: &PropertyList);
    fn end_document(&mut self);

    fn open_page_span(&mut self, props: &PropertyList);
    fn close_page_span(&mut self);
    fn open_header(&mut self, props: &PropertyList);
    fn close_header(&mut self);
    fn open_footer(&mut self, props: &PropertyList);
    fn close_footer(&mut self);

    fn open_footnote(&mut self, props: &PropertyList);
    fn close_footnote(&mut self);
    fn open_paragraph(&mut self, props: &PropertyList);
    fn close_paragraph(&mut self);
    fn open_span(&mut self, props: &PropertyList);
    fn close_span(&mut self);
    fn open_link(&mut self, props: &PropertyList);
    fn close_link(&mut self);

    fn open_ordered_list(&mut self, props: &PropertyList);
    fn close_ordered_list(&mut self);
    fn open_unordered_list(&mut self, props: &PropertyList);
    fn close_unordered_list(&mut self);
    fn open_list_element(&mut self, props: &PropertyList);
    fn close_list_element(&mut self);

    fn open_table(&mut self, props: &PropertyList);
    fn close_table(&mut self);
    fn open_table_row(&mut self, props: &PropertyList);
    fn close_table_row(&mut self);
    fn open_table_cell(&mut self, props: &PropertyList);
    fn close_table_cell(&mut self);
    fn insert_covered_table_cell(&mut self, props: &PropertyList);

    fn insert_text(&mut self, text: &str);
    fn insert_space(&mut self);
    fn insert_tab(&mut self);
    fn insert_line_break(&mut self);
    fn insert_binary_object(&mut self, props: &PropertyList);
    fn insert_equation(&mut self, props: &PropertyList);
}
