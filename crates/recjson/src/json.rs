//! JSON-text edge: parse incoming text/bytes to a wire mapping, render an
//! outgoing mapping to text.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;

use crate::error::CodecError;
use crate::value::JsonMap;

/// Output formatting for `to_json`: item/key separators and indentation.
/// When neither is set, output uses the most compact valid separator set.
/// Setting `indent` switches to pretty output with that string per nesting
/// level; its separators default to `(",", ": ")` unless overridden.
#[derive(Debug, Clone, Default)]
pub struct JsonOptions {
    pub indent: Option<String>,
    pub separators: Option<(String, String)>,
}

impl JsonOptions {
    pub fn indent(indent: impl Into<String>) -> Self {
        Self {
            indent: Some(indent.into()),
            separators: None,
        }
    }

    pub fn separators(item: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            indent: None,
            separators: Some((item.into(), key.into())),
        }
    }

    pub fn with_separators(mut self, item: impl Into<String>, key: impl Into<String>) -> Self {
        self.separators = Some((item.into(), key.into()));
        self
    }
}

/// Writes separators verbatim, with an optional newline-and-indent after
/// each item separator and around container brackets.
struct WireFormatter<'a> {
    indent: Option<&'a str>,
    item: &'a str,
    key: &'a str,
    depth: usize,
    has_value: bool,
}

impl<'a> WireFormatter<'a> {
    fn new(indent: Option<&'a str>, item: &'a str, key: &'a str) -> Self {
        Self {
            indent,
            item,
            key,
            depth: 0,
            has_value: false,
        }
    }

    fn newline<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if let Some(indent) = self.indent {
            writer.write_all(b"\n")?;
            for _ in 0..self.depth {
                writer.write_all(indent.as_bytes())?;
            }
        }
        Ok(())
    }
}

impl Formatter for WireFormatter<'_> {
    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.depth += 1;
        self.has_value = false;
        writer.write_all(b"[")
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.depth -= 1;
        if self.has_value {
            self.newline(writer)?;
        }
        writer.write_all(b"]")
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if !first {
            writer.write_all(self.item.as_bytes())?;
        }
        self.newline(writer)
    }

    fn end_array_value<W>(&mut self, _writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.has_value = true;
        Ok(())
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.depth += 1;
        self.has_value = false;
        writer.write_all(b"{")
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.depth -= 1;
        if self.has_value {
            self.newline(writer)?;
        }
        writer.write_all(b"}")
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if !first {
            writer.write_all(self.item.as_bytes())?;
        }
        self.newline(writer)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(self.key.as_bytes())
    }

    fn end_object_value<W>(&mut self, _writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.has_value = true;
        Ok(())
    }
}

pub(crate) fn parse_mapping(input: &[u8]) -> Result<JsonMap, CodecError> {
    let value: Value = serde_json::from_slice(input)
        .map_err(|e| CodecError::malformed(format!("invalid JSON: {e}")))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CodecError::malformed(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

pub(crate) fn render_mapping(map: &JsonMap, options: &JsonOptions) -> Result<String, CodecError> {
    let bytes = match (&options.indent, &options.separators) {
        (None, None) => serde_json::to_vec(map)
            .map_err(|e| CodecError::malformed(format!("serialization failed: {e}")))?,
        (indent, separators) => {
            let (item, key) = match separators {
                Some((item, key)) => (item.as_str(), key.as_str()),
                // Indented output pads the key separator only; the item
                // separator's line break comes from the indent itself.
                None => (",", ": "),
            };
            let mut buf = Vec::new();
            let formatter = WireFormatter::new(indent.as_deref(), item, key);
            let mut ser = Serializer::with_formatter(&mut buf, formatter);
            map.serialize(&mut ser)
                .map_err(|e| CodecError::malformed(format!("serialization failed: {e}")))?;
            buf
        }
    };
    String::from_utf8(bytes).map_err(|e| CodecError::malformed(format!("non-UTF-8 output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> JsonMap {
        match json!({"a": 1, "b": [true, null]}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn compact_by_default() {
        let text = render_mapping(&fixture(), &JsonOptions::default()).unwrap();
        assert_eq!(text, r#"{"a":1,"b":[true,null]}"#);
    }

    #[test]
    fn indented_output() {
        let text = render_mapping(&fixture(), &JsonOptions::indent("  ")).unwrap();
        assert!(text.starts_with("{\n  \"a\": 1"));
    }

    #[test]
    fn custom_separators() {
        let text = render_mapping(&fixture(), &JsonOptions::separators(", ", ": ")).unwrap();
        assert_eq!(text, r#"{"a": 1, "b": [true, null]}"#);
    }

    #[test]
    fn custom_separators_combine_with_indent() {
        let text = render_mapping(
            &fixture(),
            &JsonOptions::indent(" ").with_separators(",", " = "),
        )
        .unwrap();
        assert_eq!(
            text,
            "{\n \"a\" = 1,\n \"b\" = [\n  true,\n  null\n ]\n}"
        );
    }

    #[test]
    fn parse_rejects_non_object() {
        let err = parse_mapping(b"[1,2]").unwrap_err();
        assert_eq!(err.kind, crate::error::CodecErrorKind::Malformed);
    }

    #[test]
    fn parse_accepts_bytes() {
        let map = parse_mapping(br#"{"x": 3}"#).unwrap();
        assert_eq!(map.get("x"), Some(&json!(3)));
    }
}
