//! Importer tests.
//!
//! Write small text and PalmDoc files to a temporary directory, import them,
//! and check what reaches the sinks.

use std::fs;

use tempfile::TempDir;

use folio::import::{self, Importer, PalmDocImporter, ParagraphBreak, TextConfig, TextImporter};
use folio::props::keys;
use folio::sink::{HtmlSink, RecordingSink, SinkEvent};
use folio::{Error, PropertyList};

/// Build a PalmDoc database holding `text`, optionally LZ77-compressed with
/// one literal-run-per-record encoding.
fn palmdoc(name: &str, text: &[u8], compressed: bool) -> Vec<u8> {
    let chunks: Vec<Vec<u8>> = text
        .chunks(4096)
        .map(|chunk| {
            if compressed {
                // Literal runs of up to 8 bytes are valid PalmDoc LZ77.
                chunk
                    .chunks(8)
                    .flat_map(|run| std::iter::once(run.len() as u8).chain(run.iter().copied()))
                    .collect()
            } else {
                chunk.to_vec()
            }
        })
        .collect();

    let mut record0 = Vec::new();
    record0.extend_from_slice(&(if compressed { 2u16 } else { 1u16 }).to_be_bytes());
    record0.extend_from_slice(&[0, 0]);
    record0.extend_from_slice(&(text.len() as u32).to_be_bytes());
    record0.extend_from_slice(&(chunks.len() as u16).to_be_bytes());
    record0.extend_from_slice(&4096u16.to_be_bytes());
    record0.extend_from_slice(&[0, 0, 0, 0]);

    let records: Vec<Vec<u8>> = std::iter::once(record0).chain(chunks).collect();

    let mut data = vec![0u8; 78];
    data[..name.len()].copy_from_slice(name.as_bytes());
    data[60..68].copy_from_slice(b"TEXtREAd");
    data[76..78].copy_from_slice(&(records.len() as u16).to_be_bytes());

    let mut offset = 78 + records.len() * 8;
    for (i, record) in records.iter().enumerate() {
        data.extend_from_slice(&(offset as u32).to_be_bytes());
        data.extend_from_slice(&(i as u32).to_be_bytes());
        offset += record.len();
    }
    for record in records {
        data.extend(record);
    }
    data
}

fn paragraphs(sink: &RecordingSink) -> usize {
    sink.names().iter().filter(|&&n| n == "open_paragraph").count()
}

// ============================================================================
// Text
// ============================================================================

#[test]
fn test_text_file_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chapter one.txt");
    fs::write(&path, "First line\nSecond\tline\n").unwrap();

    let importer = TextImporter::open(&path, TextConfig::default()).unwrap();
    assert_eq!(importer.metadata().get_str(keys::TITLE), Some("chapter one"));

    let mut sink = RecordingSink::new();
    import::convert(&importer, &mut sink).unwrap();
    assert_eq!(paragraphs(&sink), 2);
    assert_eq!(sink.text(), "First lineSecond\tline");
    assert_eq!(
        sink.events()[0],
        SinkEvent::StartDocument(PropertyList::new().with(keys::TITLE, "chapter one"))
    );
}

#[test]
fn test_text_blank_line_paragraphs() {
    let config = TextConfig {
        paragraphs: ParagraphBreak::BlankLine,
        ..TextConfig::default()
    };
    let importer = TextImporter::from_bytes(b"one\ntwo\n\nthree", config);

    let mut sink = RecordingSink::new();
    import::convert(&importer, &mut sink).unwrap();
    assert_eq!(paragraphs(&sink), 2);
    assert_eq!(
        sink.names().iter().filter(|&&n| n == "insert_line_break").count(),
        1
    );
}

#[test]
fn test_text_explicit_encoding() {
    let config = TextConfig::default()
        .with_encoding_label("koi8-r")
        .expect("known label");
    let importer = TextImporter::from_bytes(&[0xF0, 0xD2, 0xC9], config);
    assert_eq!(importer.text(), "При");
}

#[test]
fn test_unknown_encoding_label() {
    assert!(TextConfig::default().with_encoding_label("no-such-thing").is_none());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = import::open(&dir.path().join("absent.txt"), TextConfig::default());
    assert!(matches!(result, Err(Error::Io(_))));
}

// ============================================================================
// PalmDoc
// ============================================================================

#[test]
fn test_palmdoc_uncompressed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.pdb");
    fs::write(&path, palmdoc("My Book", b"Hello\nWorld\n", false)).unwrap();

    let importer = import::open(&path, TextConfig::default()).unwrap();
    assert_eq!(importer.metadata().get_str(keys::TITLE), Some("My Book"));

    let mut sink = RecordingSink::new();
    import::convert(importer.as_ref(), &mut sink).unwrap();
    assert_eq!(paragraphs(&sink), 2);
    assert_eq!(sink.text(), "HelloWorld");
}

#[test]
fn test_palmdoc_compressed_multiple_records() {
    let text: String = (0..600).map(|i| format!("Line {i}\n")).collect();
    let data = palmdoc("Long", text.as_bytes(), true);

    let importer = PalmDocImporter::from_bytes(&data, TextConfig::default()).unwrap();
    assert_eq!(importer.text(), text);
}

#[test]
fn test_palmdoc_cp1252_text() {
    let data = palmdoc("Quotes", &[0x93, b'h', b'i', 0x94], false);
    let importer = PalmDocImporter::from_bytes(&data, TextConfig::default()).unwrap();
    assert_eq!(importer.text(), "\u{201c}hi\u{201d}");
}

#[test]
fn test_palmdoc_truncated_header() {
    let result = PalmDocImporter::from_bytes(&[0u8; 40], TextConfig::default());
    assert!(matches!(result, Err(Error::InvalidPalmDoc(_))));
}

#[test]
fn test_palmdoc_to_html() {
    let data = palmdoc("A <Title>", b"Tom & Jerry", false);
    let importer = PalmDocImporter::from_bytes(&data, TextConfig::default()).unwrap();

    let mut sink = HtmlSink::new();
    import::convert(&importer, &mut sink).unwrap();
    let html = sink.into_string();
    assert!(html.contains("<title>A &lt;Title&gt;</title>"));
    assert!(html.contains("<p><span>Tom &amp; Jerry</span></p>"));
}
