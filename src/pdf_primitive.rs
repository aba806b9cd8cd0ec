//! PDF primitive values and their text serialization.
//!
//! Graphics state dictionaries, dash arrays and soft mask references are
//! assembled as [`PdfPrimitive`] trees and rendered with
//! [`render_pdf_primitive`].

use crate::basics::number_to_str;
use crate::error::{Error, Result};

/// Types that know their own PDF text form.
pub trait PdfSerialize {
    fn serialize(&self) -> String;
}

/// A PDF name object, e.g. `/ExtGState`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Name(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_regular(byte: u8) -> bool {
        (33..127).contains(&byte) && !b"()<>[]{}/%#\\".contains(&byte)
    }
}

impl PdfSerialize for Name {
    /// Delimiters, `#` and bytes outside the printable range become `#XX`.
    fn serialize(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + 1);
        out.push('/');
        for &byte in self.0.as_bytes() {
            if Self::is_regular(byte) {
                out.push(byte as char);
            } else {
                out.push_str(&format!("#{byte:02X}"));
            }
        }
        out
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::new(s)
    }
}

/// Escape a literal string body: backslash, parentheses and carriage return.
pub fn escape_parens(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// A PDF value.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfPrimitive {
    Null,
    Bool(bool),
    Number(f64),
    /// Literal string, rendered in parentheses.
    String(String),
    /// Byte string, rendered as hex in angle brackets.
    Bytes(Vec<u8>),
    Name(Name),
    Array(Vec<PdfPrimitive>),
    /// Dictionary with insertion-ordered name keys.
    Dict(Vec<(Name, PdfPrimitive)>),
    /// Pre-rendered text emitted verbatim.
    Raw(String),
}

impl PdfPrimitive {
    /// Render a value through its own serialization hook.
    pub fn custom(value: &dyn PdfSerialize) -> Self {
        PdfPrimitive::Raw(value.serialize())
    }

    /// Build a dictionary from arbitrary keys. Every key must be a name.
    pub fn dict_from(entries: Vec<(PdfPrimitive, PdfPrimitive)>) -> Result<Self> {
        entries
            .into_iter()
            .map(|(key, value)| match key {
                PdfPrimitive::Name(name) => Ok((name, value)),
                _ => Err(Error::NonNameKey),
            })
            .collect::<Result<Vec<_>>>()
            .map(PdfPrimitive::Dict)
    }

    /// Array of numbers.
    pub fn numbers(values: &[f64]) -> Self {
        PdfPrimitive::Array(values.iter().map(|&v| PdfPrimitive::Number(v)).collect())
    }
}

impl From<f64> for PdfPrimitive {
    fn from(v: f64) -> Self {
        PdfPrimitive::Number(v)
    }
}

impl From<bool> for PdfPrimitive {
    fn from(v: bool) -> Self {
        PdfPrimitive::Bool(v)
    }
}

impl From<&str> for PdfPrimitive {
    fn from(v: &str) -> Self {
        PdfPrimitive::String(v.to_string())
    }
}

impl From<Name> for PdfPrimitive {
    fn from(v: Name) -> Self {
        PdfPrimitive::Name(v)
    }
}

impl<T: Into<PdfPrimitive>> From<Option<T>> for PdfPrimitive {
    fn from(v: Option<T>) -> Self {
        v.map_or(PdfPrimitive::Null, Into::into)
    }
}

/// Render any primitive to PDF text.
pub fn render_pdf_primitive(primitive: &PdfPrimitive) -> String {
    match primitive {
        PdfPrimitive::Null => "null".to_string(),
        PdfPrimitive::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        PdfPrimitive::Number(n) => number_to_str(*n),
        PdfPrimitive::String(s) => format!("({})", escape_parens(s)),
        PdfPrimitive::Bytes(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            format!("<{hex}>")
        }
        PdfPrimitive::Name(name) => name.serialize(),
        PdfPrimitive::Array(items) => {
            let inner: Vec<String> = items.iter().map(render_pdf_primitive).collect();
            format!("[{}]", inner.join(" "))
        }
        PdfPrimitive::Dict(entries) => {
            let inner: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{} {}", k.serialize(), render_pdf_primitive(v)))
                .collect();
            format!("<< {} >>", inner.join("\n"))
        }
        PdfPrimitive::Raw(text) => text.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================
