//! Indented JSON text for the audit log.
//!
//! Payload objects are written the way browsers' back ends commonly log
//! them: two-space indentation, keys sorted, `<`, `>`, `&`, U+2028 and
//! U+2029 escaped as `\uXXXX`, and every number printed as a double in its
//! shortest form (`1.0` becomes `1`, `1e21` becomes `1e+21`).

use std::io;

use serde::Serialize;
use serde_json::ser::{CharEscape, Formatter, PrettyFormatter};
use serde_json::{Map, Value};

use crate::error::Result;

/// Renders `object` as indented, HTML-safe JSON text.
pub fn to_indented_json(object: &Map<String, Value>) -> Result<String> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, IndentFormatter::new());
    object.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

struct IndentFormatter {
    pretty: PrettyFormatter<'static>,
}

impl IndentFormatter {
    fn new() -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(b"  "),
        }
    }
}

impl Formatter for IndentFormatter {
    fn write_i64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: i64) -> io::Result<()> {
        write_double(writer, value as f64)
    }

    fn write_u64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: u64) -> io::Result<()> {
        write_double(writer, value as f64)
    }

    fn write_f64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        write_double(writer, value)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            let escaped = match ch {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[start..index].as_bytes())?;
            writer.write_all(escaped.as_bytes())?;
            start = index + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn write_char_escape<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        char_escape: CharEscape,
    ) -> io::Result<()> {
        let escaped = match char_escape {
            CharEscape::Quote => "\\\"".to_string(),
            CharEscape::ReverseSolidus => "\\\\".to_string(),
            CharEscape::Solidus => "\\/".to_string(),
            CharEscape::Backspace => "\\u0008".to_string(),
            CharEscape::FormFeed => "\\u000c".to_string(),
            CharEscape::LineFeed => "\\n".to_string(),
            CharEscape::CarriageReturn => "\\r".to_string(),
            CharEscape::Tab => "\\t".to_string(),
            CharEscape::AsciiControl(byte) => format!("\\u{:04x}", byte),
        };
        writer.write_all(escaped.as_bytes())
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }
}

/// Shortest round-trip decimal, switching to exponent form outside
/// `[1e-6, 1e21)`.
fn write_double<W: ?Sized + io::Write>(writer: &mut W, value: f64) -> io::Result<()> {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-6..1e21).contains(&magnitude) {
        let text = format!("{:e}", value);
        match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                write!(writer, "{}e+{}", mantissa, exponent)
            }
            _ => writer.write_all(text.as_bytes()),
        }
    } else {
        write!(writer, "{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(json: &str) -> String {
        let Value::Object(object) = serde_json::from_str(json).unwrap() else {
            panic!("not an object");
        };
        to_indented_json(&object).unwrap()
    }

    #[test]
    fn indents_and_sorts_keys() {
        assert_eq!(
            render(r#"{"password":"abc123","email":"a@b","nested":{"list":[1,"x"],"empty":{}}}"#),
            "{\n  \"email\": \"a@b\",\n  \"nested\": {\n    \"empty\": {},\n    \"list\": [\n      1,\n      \"x\"\n    ]\n  },\n  \"password\": \"abc123\"\n}"
        );
    }

    #[test]
    fn html_characters_are_escaped() {
        assert_eq!(
            render(r#"{"q":"<b>&amp;</b>","<k>":"\u2028"}"#),
            "{\n  \"\\u003ck\\u003e\": \"\\u2028\",\n  \"q\": \"\\u003cb\\u003e\\u0026amp;\\u003c/b\\u003e\"\n}"
        );
    }

    #[test]
    fn control_characters_use_unicode_escapes() {
        assert_eq!(
            render(r#"{"s":"a\b\f\n\r\t\u0001\"\\/"}"#),
            "{\n  \"s\": \"a\\u0008\\u000c\\n\\r\\t\\u0001\\\"\\\\/\"\n}"
        );
    }

    #[test]
    fn numbers_print_as_doubles() {
        assert_eq!(
            render(r#"{"a":1.0,"b":-5,"c":0.5,"d":1e21,"e":1.5e-7,"f":1e20,"g":0.000001,"h":9007199254740993}"#),
            "{\n  \"a\": 1,\n  \"b\": -5,\n  \"c\": 0.5,\n  \"d\": 1e+21,\n  \"e\": 1.5e-7,\n  \"f\": 100000000000000000000,\n  \"g\": 0.000001,\n  \"h\": 9007199254740992\n}"
        );
    }
}
