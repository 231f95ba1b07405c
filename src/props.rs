//! Opaque property payloads.
//!
//! A [`PropertyList`] travels from a format parser, through the collector,
//! into the sink without being inspected on the way. Keys and their meaning
//! are agreed between the parser that produces them and the sink that
//! consumes them; the constants in [`keys`] are the ones used by the importers
//! and sinks shipped with this crate.

use std::collections::BTreeMap;
use std::fmt;

/// Well-known property keys.
pub mod keys {
    /// Document title (metadata).
    pub const TITLE: &str = "dc:title";
    /// Document author (metadata).
    pub const CREATOR: &str = "dc:creator";
    /// Document language (metadata).
    pub const LANGUAGE: &str = "dc:language";
    /// Link target.
    pub const HREF: &str = "xlink:href";
    /// MIME type of a binary object.
    pub const MIME_TYPE: &str = "librevenge:mime-type";
    /// Raw bytes of a binary object.
    pub const BINARY_DATA: &str = "office:binary-data";
    /// Number of columns a table cell spans.
    pub const COLUMNS_SPANNED: &str = "table:number-columns-spanned";
    /// Number of rows a table cell spans.
    pub const ROWS_SPANNED: &str = "table:number-rows-spanned";
    /// Equation source (MathML or TeX).
    pub const EQUATION: &str = "folio:equation";
    /// Footnote label.
    pub const FOOTNOTE_LABEL: &str = "text:label";
}

/// A single property value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(untagged))]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Double(f64),
    Bool(bool),
    Binary(Vec<u8>),
}

impl PropertyValue {
    /// The value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The value as an integer, if it is one (or a string holding one).
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(n) => Some(*n),
            PropertyValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// The value as raw bytes, if it is binary.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PropertyValue::Binary(data) => Some(data),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => f.write_str(s),
            PropertyValue::Int(n) => write!(f, "{n}"),
            PropertyValue::Double(n) => write!(f, "{n}"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Binary(data) => write!(f, "<{} bytes>", data.len()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::Int(value as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Double(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(value: Vec<u8>) -> Self {
        PropertyValue::Binary(value)
    }
}

/// Ordered string-keyed map of property values.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(transparent))]
pub struct PropertyList {
    entries: BTreeMap<String, PropertyValue>,
}

impl PropertyList {
    /// Create an empty property list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    /// Shortcut for string values.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropertyValue::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for PropertyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for PropertyList {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut list = PropertyList::new();
        for (key, value) in iter {
            list.insert(key, value);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_display() {
        let props = PropertyList::new()
            .with("zeta", 3i64)
            .with("alpha", "first")
            .with("mid", true);

        assert_eq!(props.to_string(), "alpha: first, mid: true, zeta: 3");
    }

    #[test]
    fn test_typed_access() {
        let props: PropertyList = [(keys::COLUMNS_SPANNED, "2")].into_iter().collect();
        assert_eq!(props.get(keys::COLUMNS_SPANNED).and_then(|v| v.as_int()), Some(2));
        assert_eq!(props.get_str(keys::COLUMNS_SPANNED), Some("2"));
        assert!(props.get(keys::ROWS_SPANNED).is_none());
    }

    #[test]
    fn test_binary_display() {
        let props = PropertyList::new().with(keys::BINARY_DATA, vec![1u8, 2, 3]);
        assert_eq!(props.to_string(), "office:binary-data: <3 bytes>");
    }
}
