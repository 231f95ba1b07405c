//! PalmDoc (`TEXtREAd`) importer.
//!
//! A PalmDoc file is a Palm database: a 78-byte header, a table of record
//! offsets, then the records. Record 0 describes the text (compression and
//! uncompressed length); records 1..=n hold the text itself, either stored
//! as is or LZ77-compressed.

use std::path::Path;

use encoding_rs::Encoding;

use crate::collect::Collector;
use crate::error::{Error, Result};
use crate::props::{PropertyList, keys};

use super::Importer;
use super::text::{ParagraphBreak, TextConfig, collect_text, decode_text};

const HEADER_LEN: usize = 78;
const TYPE_CREATOR: &[u8; 8] = b"TEXtREAd";

const COMPRESSION_NONE: u16 = 1;
const COMPRESSION_PALMDOC: u16 = 2;

/// Palm database header.
#[derive(Debug)]
struct PdbHeader {
    name: String,
    /// Byte range of each record within the file.
    records: Vec<(usize, usize)>,
}

impl PdbHeader {
    fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(Error::InvalidPalmDoc("header too short".into()));
        }

        // Bytes 0-31: database name, NUL-terminated.
        let name_end = memchr::memchr(0, &data[..32]).unwrap_or(32);
        let name = String::from_utf8_lossy(&data[..name_end]).into_owned();

        let ident = &data[60..68];
        if ident == b"BOOKMOBI" {
            return Err(Error::UnsupportedFormat("MOBI (BOOKMOBI) database".into()));
        }
        if ident != TYPE_CREATOR {
            return Err(Error::InvalidPalmDoc(format!(
                "unknown type/creator {:?}",
                String::from_utf8_lossy(ident)
            )));
        }

        let num_records = u16::from_be_bytes([data[76], data[77]]) as usize;
        let table_end = HEADER_LEN + num_records * 8;
        if data.len() < table_end {
            return Err(Error::InvalidPalmDoc("record table truncated".into()));
        }

        let offsets: Vec<usize> = (0..num_records)
            .map(|i| {
                let pos = HEADER_LEN + i * 8;
                u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
                    as usize
            })
            .collect();

        let mut records = Vec::with_capacity(num_records);
        for (i, &start) in offsets.iter().enumerate() {
            let end = offsets.get(i + 1).copied().unwrap_or(data.len());
            if start < table_end || start > end || end > data.len() {
                return Err(Error::InvalidPalmDoc(format!("record {i} out of bounds")));
            }
            records.push((start, end));
        }

        Ok(Self { name, records })
    }
}

/// Decompress one PalmDoc LZ77 record.
///
/// - `0x01..=0x08`: copy the next n bytes literally
/// - `0x00`, `0x09..=0x7F`: literal byte
/// - `0x80..=0xBF`: with the next byte, an 11-bit distance and 3-bit length
///   (plus 3) back-reference
/// - `0xC0..=0xFF`: a space followed by `byte ^ 0x80`
pub fn decompress(input: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(input.len() * 2);
    let mut i = 0;

    while i < input.len() {
        let c = input[i];
        i += 1;

        match c {
            0x01..=0x08 => {
                let count = c as usize;
                let Some(literal) = input.get(i..i + count) else {
                    return Err(Error::InvalidPalmDoc("literal run past end of record".into()));
                };
                output.extend_from_slice(literal);
                i += count;
            }
            0x00 | 0x09..=0x7F => output.push(c),
            0x80..=0xBF => {
                let Some(&next) = input.get(i) else {
                    return Err(Error::InvalidPalmDoc("back-reference past end of record".into()));
                };
                i += 1;

                let combined = u16::from_be_bytes([c, next]);
                let distance = ((combined & 0x3FFF) >> 3) as usize;
                let length = ((combined & 7) + 3) as usize;
                if distance == 0 || distance > output.len() {
                    return Err(Error::InvalidPalmDoc(format!(
                        "back-reference distance {distance} at output offset {}",
                        output.len()
                    )));
                }
                // Byte by byte: the source may overlap what is being written.
                for _ in 0..length {
                    let byte = output[output.len() - distance];
                    output.push(byte);
                }
            }
            0xC0..=0xFF => {
                output.push(b' ');
                output.push(c ^ 0x80);
            }
        }
    }

    Ok(output)
}

/// Imports the text of a PalmDoc e-book.
#[derive(Debug, Clone)]
pub struct PalmDocImporter {
    text: String,
    metadata: PropertyList,
    paragraphs: ParagraphBreak,
}

impl PalmDocImporter {
    /// Parse a PalmDoc database. Text is read as Windows-1252 unless
    /// `config` names an encoding.
    pub fn from_bytes(data: &[u8], config: TextConfig) -> Result<Self> {
        let header = PdbHeader::parse(data)?;
        let Some(&(start, end)) = header.records.first() else {
            return Err(Error::InvalidPalmDoc("no records".into()));
        };
        let record0 = &data[start..end];
        if record0.len() < 10 {
            return Err(Error::InvalidPalmDoc("record 0 too short".into()));
        }

        let compression = u16::from_be_bytes([record0[0], record0[1]]);
        let text_length =
            u32::from_be_bytes([record0[4], record0[5], record0[6], record0[7]]) as usize;
        let text_records = u16::from_be_bytes([record0[8], record0[9]]) as usize;
        if compression != COMPRESSION_NONE && compression != COMPRESSION_PALMDOC {
            return Err(Error::UnsupportedCompression(compression));
        }

        let available = header.records.len() - 1;
        if text_records > available {
            log::warn!(
                target: "folio::import",
                "record 0 declares {text_records} text records, only {available} present"
            );
        }

        let mut raw = Vec::with_capacity(text_length);
        for &(start, end) in header.records.iter().skip(1).take(text_records) {
            let record = &data[start..end];
            if compression == COMPRESSION_PALMDOC {
                raw.extend(decompress(record)?);
            } else {
                raw.extend_from_slice(record);
            }
        }
        raw.truncate(text_length);

        let encoding: &'static Encoding = config.encoding.unwrap_or(encoding_rs::WINDOWS_1252);
        let text = decode_text(&raw, Some(encoding)).into_owned();
        log::debug!(
            target: "folio::import",
            "palmdoc {:?}: {} records, {} bytes of text",
            header.name,
            text_records,
            raw.len()
        );

        let mut metadata = PropertyList::new();
        if !header.name.is_empty() {
            metadata.insert(keys::TITLE, header.name);
        }

        Ok(Self {
            text,
            metadata,
            paragraphs: config.paragraphs,
        })
    }

    pub fn open(path: &Path, config: TextConfig) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data, config)
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Importer for PalmDocImporter {
    fn metadata(&self) -> &PropertyList {
        &self.metadata
    }

    fn import(&self, collector: &mut Collector) -> Result<()> {
        collector.collect_metadata(&self.metadata);
        collect_text(&self.text, self.paragraphs, collector);
        Ok(())
    }
}
