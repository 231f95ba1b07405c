//! Plain text importer.

use std::borrow::Cow;
use std::path::Path;

use encoding_rs::Encoding;

use crate::collect::Collector;
use crate::error::Result;
use crate::props::{PropertyList, keys};

use super::Importer;

/// How paragraphs are delimited in the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParagraphBreak {
    /// Every line is a paragraph.
    #[default]
    Line,
    /// Blank lines separate paragraphs; single newlines are line breaks.
    BlankLine,
}

/// Configuration for text import.
#[derive(Debug, Clone, Default)]
pub struct TextConfig {
    /// Input encoding. When unset, UTF-8 is tried first and Windows-1252 is
    /// the fallback.
    pub encoding: Option<&'static Encoding>,
    pub paragraphs: ParagraphBreak,
}

impl TextConfig {
    /// Look up an encoding by WHATWG label (`"latin1"`, `"utf-16le"`, ...).
    pub fn with_encoding_label(mut self, label: &str) -> Option<Self> {
        self.encoding = Some(Encoding::for_label(label.as_bytes())?);
        Some(self)
    }
}

/// Decode bytes to text.
///
/// An explicit encoding wins (a byte order mark still overrides it). Without
/// one, valid UTF-8 is taken as is and anything else is read as Windows-1252.
pub fn decode_text<'a>(bytes: &'a [u8], encoding: Option<&'static Encoding>) -> Cow<'a, str> {
    if let Some(encoding) = encoding {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Imports a plain text file, one paragraph per line or per block of lines.
#[derive(Debug, Clone)]
pub struct TextImporter {
    text: String,
    metadata: PropertyList,
    config: TextConfig,
}

impl TextImporter {
    pub fn from_bytes(bytes: &[u8], config: TextConfig) -> Self {
        Self {
            text: decode_text(bytes, config.encoding).into_owned(),
            metadata: PropertyList::new(),
            config,
        }
    }

    /// Read a file; its stem becomes the document title.
    pub fn open(path: &Path, config: TextConfig) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let mut importer = Self::from_bytes(&bytes, config);
        if let Some(stem) = path.file_stem() {
            importer
                .metadata
                .insert(keys::TITLE, stem.to_string_lossy().into_owned());
        }
        Ok(importer)
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Importer for TextImporter {
    fn metadata(&self) -> &PropertyList {
        &self.metadata
    }

    fn import(&self, collector: &mut Collector) -> Result<()> {
        collector.collect_metadata(&self.metadata);
        collect_text(&self.text, self.config.paragraphs, collector);
        Ok(())
    }
}

/// Feed text to the collector as paragraphs.
pub(crate) fn collect_text(text: &str, paragraphs: ParagraphBreak, collector: &mut Collector) {
    let empty = PropertyList::new();
    let mut count = 0usize;

    match paragraphs {
        ParagraphBreak::Line => {
            for line in text.lines() {
                collector.open_paragraph(&empty);
                collect_line(line, collector);
                collector.close_paragraph();
                count += 1;
            }
        }
        ParagraphBreak::BlankLine => {
            let mut open = false;
            for line in text.lines() {
                if line.trim().is_empty() {
                    if open {
                        collector.close_paragraph();
                        open = false;
                    }
                    continue;
                }
                if open {
                    collector.collect_line_break();
                } else {
                    collector.open_paragraph(&empty);
                    open = true;
                    count += 1;
                }
                collect_line(line, collector);
            }
            if open {
                collector.close_paragraph();
            }
        }
    }

    log::debug!(target: "folio::import", "collected {count} paragraphs");
}

/// Split a line into text runs, spaces and tabs.
fn collect_line(line: &str, collector: &mut Collector) {
    let mut start = 0;
    for (i, c) in line.char_indices() {
        if c != ' ' && c != '\t' {
            continue;
        }
        collector.collect_text(&line[start..i]);
        if c == ' ' {
            collector.collect_space();
        } else {
            collector.collect_tab();
        }
        start = i + 1;
    }
    collector.collect_text(&line[start..]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;

    fn import(text: &str, paragraphs: ParagraphBreak) -> RecordingSink {
        let mut collector = Collector::new();
        collect_text(text, paragraphs, &mut collector);
        let mut sink = RecordingSink::new();
        collector.finish(&mut sink).expect("finish");
        sink
    }

    fn count(sink: &RecordingSink, name: &str) -> usize {
        sink.names().iter().filter(|&&n| n == name).count()
    }

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_text("héllo".as_bytes(), None), "héllo");
    }

    #[test]
    fn test_decode_falls_back_to_cp1252() {
        assert_eq!(decode_text(&[0x93, b'q', 0x94], None), "\u{201c}q\u{201d}");
    }

    #[test]
    fn test_decode_explicit_encoding() {
        let latin = Encoding::for_label(b"iso-8859-2");
        assert_eq!(decode_text(&[0xA3], latin), "\u{141}");
    }

    #[test]
    fn test_lines_become_paragraphs() {
        let sink = import("one\ntwo\r\nthree\n", ParagraphBreak::Line);
        assert_eq!(count(&sink, "open_paragraph"), 3);
        assert_eq!(count(&sink, "open_page_span"), 1);
        assert_eq!(sink.text(), "onetwothree");
    }

    #[test]
    fn test_blank_lines_separate_paragraphs() {
        let sink = import("a\nb\n\n\nc\n", ParagraphBreak::BlankLine);
        assert_eq!(count(&sink, "open_paragraph"), 2);
        assert_eq!(count(&sink, "insert_line_break"), 1);
        assert_eq!(sink.text(), "a\nbc");
    }

    #[test]
    fn test_whitespace_runs() {
        let sink = import("a  b\tc", ParagraphBreak::Line);
        assert_eq!(count(&sink, "insert_space"), 2);
        assert_eq!(count(&sink, "insert_tab"), 1);
        assert_eq!(count(&sink, "insert_text"), 3);
    }

    #[test]
    fn test_empty_line_keeps_empty_paragraph() {
        let sink = import("a\n\nb", ParagraphBreak::Line);
        assert_eq!(count(&sink, "open_paragraph"), 3);
    }
}
