//! # folio
//!
//! Structure normalization for flow documents: headings and page furniture
//! aside, a word-processor document is page spans holding paragraphs,
//! lists and tables, with spans, links, footnotes and images inside.
//!
//! Format parsers rarely produce that structure cleanly. They forget to open
//! a paragraph before the first word, open a paragraph inside a span, or
//! close things in the wrong order. A [`Collector`] accepts those calls as
//! they come and repairs the structure on the fly, then hands a balanced,
//! properly nested event stream to a [`DocumentSink`].
//!
//! ## Quick Start
//!
//! ```
//! use folio::{Collector, PropertyList};
//! use folio::sink::HtmlSink;
//!
//! let mut collector = Collector::new();
//! collector.collect_text("Loose");
//! collector.open_paragraph(&PropertyList::new());
//! collector.collect_text("Tidy");
//! collector.close_paragraph();
//!
//! let mut sink = HtmlSink::new();
//! collector.finish(&mut sink).unwrap();
//! assert!(sink.as_str().contains("<p><span>Loose</span></p>"));
//! ```
//!
//! ## Importers
//!
//! ```no_run
//! use std::path::Path;
//! use folio::import::{self, TextConfig};
//! use folio::sink::RawSink;
//!
//! let importer = import::open(Path::new("book.pdb"), TextConfig::default()).unwrap();
//! let mut sink = RawSink::new();
//! import::convert(importer.as_ref(), &mut sink).unwrap();
//! println!("{}", sink.as_str());
//! ```

pub mod collect;
pub mod error;
pub mod import;
pub mod props;
pub mod sink;
pub mod table;

pub use collect::{Collector, ContextType, HeaderFooterRefs, Occurrences};
pub use error::{Error, Result};
pub use props::{PropertyList, PropertyValue};
pub use sink::DocumentSink;
pub use table::{CellPlacement, Fill, TableModel};
