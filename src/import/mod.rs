//! Format importers that drive a [`Collector`].
//!
//! Importers are the upstream side of the collector: they read a file, turn
//! it into open/close/insert calls, and leave structural repair to the
//! collector.

mod palmdoc;
mod text;

pub use palmdoc::{PalmDocImporter, decompress};
pub use text::{ParagraphBreak, TextConfig, TextImporter, decode_text};

use std::path::Path;

use crate::collect::Collector;
use crate::error::Result;
use crate::props::PropertyList;
use crate::sink::DocumentSink;

/// A parsed input document that can replay itself into a collector.
pub trait Importer {
    /// Document metadata passed to the sink's `start_document`.
    fn metadata(&self) -> &PropertyList;

    /// Feed the whole document to `collector`.
    fn import(&self, collector: &mut Collector) -> Result<()>;
}

/// Input formats known to [`open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    PalmDoc,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdb" | "prc") => Format::PalmDoc,
            _ => Format::Text,
        }
    }
}

/// Open a file with the importer for its extension.
pub fn open(path: &Path, config: TextConfig) -> Result<Box<dyn Importer>> {
    let importer: Box<dyn Importer> = match Format::from_path(path) {
        Format::PalmDoc => Box::new(PalmDocImporter::open(path, config)?),
        Format::Text => Box::new(TextImporter::open(path, config)?),
    };
    Ok(importer)
}

/// Run an importer through a fresh collector into `sink`.
pub fn convert<S: DocumentSink + ?Sized>(importer: &dyn Importer, sink: &mut S) -> Result<()> {
    let mut collector = Collector::new();
    importer.import(&mut collector)?;
    collector.finish(sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("book.PDB")), Format::PalmDoc);
        assert_eq!(Format::from_path(Path::new("a/b.prc")), Format::PalmDoc);
        assert_eq!(Format::from_path(Path::new("notes.txt")), Format::Text);
        assert_eq!(Format::from_path(Path::new("README")), Format::Text);
    }
}
