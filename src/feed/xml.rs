//! Thin event layer over `quick-xml` shared by both parser adapters.
//!
//! Both adapters see exactly the same open/text/close sequence from
//! [`drive`], so text trimming, entity handling and self-closing elements
//! cannot diverge between them.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::feed::parser::ParseError;

/// SEC-003: Maximum element nesting depth accepted from a feed document.
pub const MAX_DEPTH: usize = 64;

/// Receives the flattened event stream of one document.
pub trait XmlSink {
    /// An element opened. Attribute values are already unescaped.
    fn open(&mut self, name: &str, attrs: &[(String, String)]);
    /// A trimmed, non-empty text or CDATA chunk inside the innermost open element.
    fn text(&mut self, chunk: &str);
    fn close(&mut self, name: &str);
}

/// Streams `bytes` through `sink`.
///
/// Self-closing elements are reported as `open` immediately followed by
/// `close`. Whitespace-only text never reaches the sink.
///
/// # Errors
///
/// - [`ParseError::Xml`] for malformed markup or mismatched end tags
/// - [`ParseError::TooDeep`] past [`MAX_DEPTH`] nested elements
/// - [`ParseError::UnexpectedEof`] if the document ends with open elements
pub fn drive<S: XmlSink>(bytes: &[u8], sink: &mut S) -> Result<(), ParseError> {
    // SEC-002: quick-xml (0.37) never expands <!ENTITY> declarations, so
    // custom entities surface as errors instead of being resolved.
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut depth: usize = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(ParseError::TooDeep(MAX_DEPTH));
                }
                let name = element_name(&e);
                let attrs = attributes(&e, &reader);
                sink.open(&name, &attrs);
            }
            Ok(Event::Empty(e)) => {
                if depth + 1 > MAX_DEPTH {
                    return Err(ParseError::TooDeep(MAX_DEPTH));
                }
                let name = element_name(&e);
                let attrs = attributes(&e, &reader);
                sink.open(&name, &attrs);
                sink.close(&name);
            }
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                sink.close(&name);
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| ParseError::Xml(e.to_string()))?;
                push_chunk(sink, &text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                push_chunk(sink, &text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if depth > 0 {
        return Err(ParseError::UnexpectedEof(depth));
    }
    Ok(())
}

fn push_chunk<S: XmlSink>(sink: &mut S, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        sink.text(trimmed);
    }
}

/// Qualified element name, prefix included (`media:thumbnail`).
fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attributes(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed XML attribute");
                continue;
            }
        };
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        match attr.decode_and_unescape_value(reader.decoder()) {
            Ok(value) => attrs.push((key, value.into_owned())),
            Err(e) => {
                tracing::warn!(attribute = %key, error = %e, "Skipping undecodable XML attribute");
            }
        }
    }
    attrs
}
