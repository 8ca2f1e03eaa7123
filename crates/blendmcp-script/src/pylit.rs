//! Reader for the literal payloads remote scripts print after `RESULT:`.
//!
//! Blender scripts report structured data by printing a Python `repr` (or a
//! `json.dumps` string) on stdout. This module turns that text into a
//! [`serde_json::Value`] without evaluating anything: only dicts, lists,
//! tuples, strings, numbers, booleans and `None` are accepted. It also
//! provides [`quote`] for embedding arbitrary text in generated scripts.

use serde_json::{Map, Number, Value};
use thiserror::Error;

pub const RESULT_MARKER: &str = "RESULT:";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PyLiteralError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected character {found:?} at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("invalid number at offset {offset}")]
    InvalidNumber { offset: usize },
    #[error("invalid escape sequence at offset {offset}")]
    InvalidEscape { offset: usize },
    #[error("trailing characters at offset {offset}")]
    Trailing { offset: usize },
}

/// Parses one complete literal; trailing non-whitespace is an error.
pub fn parse_literal(input: &str) -> Result<Value, PyLiteralError> {
    let mut parser = Parser {
        chars: input.char_indices().collect(),
        pos: 0,
        len: input.len(),
    };
    let value = parser.value()?;
    parser.skip_ws();
    if let Some(&(offset, _)) = parser.chars.get(parser.pos) {
        return Err(PyLiteralError::Trailing { offset });
    }
    Ok(value)
}

/// Returns the text printed on the same line after the first `RESULT:`.
pub fn result_payload(output: &str) -> Option<&str> {
    let (_, rest) = output.split_once(RESULT_MARKER)?;
    let line = rest.lines().next().unwrap_or_default();
    Some(line.trim())
}

/// Locates and parses the `RESULT:` payload in captured script output.
pub fn parse_result(output: &str) -> Option<Value> {
    result_payload(output).and_then(|payload| parse_literal(payload).ok())
}

/// Renders `text` as a double-quoted Python string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
    len: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.len, |(offset, _)| *offset)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, wanted: char) -> Result<(), PyLiteralError> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == wanted => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(PyLiteralError::Unexpected {
                found,
                offset: self.offset(),
            }),
            None => Err(PyLiteralError::UnexpectedEnd),
        }
    }

    fn value(&mut self) -> Result<Value, PyLiteralError> {
        self.skip_ws();
        let Some(ch) = self.peek() else {
            return Err(PyLiteralError::UnexpectedEnd);
        };
        match ch {
            '{' => self.dict(),
            '[' => self.sequence('[', ']'),
            '(' => self.sequence('(', ')'),
            '\'' | '"' => self.string().map(Value::String),
            'b' | 'u' | 'r' if matches!(self.lookahead(1), Some('\'' | '"')) => {
                let raw = ch == 'r';
                self.pos += 1;
                if raw {
                    self.raw_string().map(Value::String)
                } else {
                    self.string().map(Value::String)
                }
            }
            '-' | '+' | '.' | '0'..='9' => self.number(),
            c if c.is_alphabetic() => self.word(),
            found => Err(PyLiteralError::Unexpected {
                found,
                offset: self.offset(),
            }),
        }
    }

    fn lookahead(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).map(|(_, c)| *c)
    }

    fn dict(&mut self) -> Result<Value, PyLiteralError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }
            let key = match self.value()? {
                Value::String(s) => s,
                Value::Null => "None".to_string(),
                other => other.to_string(),
            };
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);

            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(Value::Object(map)),
                Some(found) => {
                    return Err(PyLiteralError::Unexpected {
                        found,
                        offset: self.chars[self.pos - 1].0,
                    });
                }
                None => return Err(PyLiteralError::UnexpectedEnd),
            }
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Result<Value, PyLiteralError> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);

            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some(c) if c == close => return Ok(Value::Array(items)),
                Some(found) => {
                    return Err(PyLiteralError::Unexpected {
                        found,
                        offset: self.chars[self.pos - 1].0,
                    });
                }
                None => return Err(PyLiteralError::UnexpectedEnd),
            }
        }
    }

    fn raw_string(&mut self) -> Result<String, PyLiteralError> {
        let quote = self.bump().ok_or(PyLiteralError::UnexpectedEnd)?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(PyLiteralError::UnexpectedEnd),
            }
        }
    }

    fn string(&mut self) -> Result<String, PyLiteralError> {
        let quote = self.bump().ok_or(PyLiteralError::UnexpectedEnd)?;
        let mut out = String::new();
        loop {
            let escape_offset = self.offset();
            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escaped = self.bump().ok_or(PyLiteralError::UnexpectedEnd)?;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '0' => out.push('\0'),
                        '\\' => out.push('\\'),
                        '\'' => out.push('\''),
                        '"' => out.push('"'),
                        '/' => out.push('/'),
                        'x' => out.push(self.hex_escape(2, escape_offset)?),
                        'u' => out.push(self.hex_escape(4, escape_offset)?),
                        'U' => out.push(self.hex_escape(8, escape_offset)?),
                        _ => {
                            return Err(PyLiteralError::InvalidEscape {
                                offset: escape_offset,
                            });
                        }
                    }
                }
                Some(c) => out.push(c),
                None => return Err(PyLiteralError::UnexpectedEnd),
            }
        }
    }

    fn hex_escape(&mut self, digits: usize, offset: usize) -> Result<char, PyLiteralError> {
        let mut code = 0_u32;
        for _ in 0..digits {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or(PyLiteralError::InvalidEscape { offset })?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or(PyLiteralError::InvalidEscape { offset })
    }

    fn number(&mut self) -> Result<Value, PyLiteralError> {
        let start = self.pos;
        let offset = self.offset();
        if matches!(self.peek(), Some('-' | '+')) {
            self.pos += 1;
        }
        // JSON has no representation for signed infinities, both map to null.
        if self.peek().is_some_and(char::is_alphabetic) {
            return match self.identifier().as_str() {
                "inf" | "nan" | "Infinity" | "NaN" => Ok(Value::Null),
                _ => Err(PyLiteralError::InvalidNumber { offset }),
            };
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '_'))
        {
            let ch = self.chars[self.pos].1;
            self.pos += 1;
            if matches!(ch, 'e' | 'E') && matches!(self.peek(), Some('-' | '+')) {
                self.pos += 1;
            }
        }

        let text: String = self.chars[start..self.pos]
            .iter()
            .map(|(_, c)| *c)
            .filter(|c| *c != '_')
            .collect();
        let text = text.strip_prefix('+').unwrap_or(&text);

        if let Ok(int) = text.parse::<i64>() {
            return Ok(Value::Number(int.into()));
        }
        let float = text
            .parse::<f64>()
            .map_err(|_| PyLiteralError::InvalidNumber { offset })?;
        Ok(Number::from_f64(float).map_or(Value::Null, Value::Number))
    }

    fn identifier(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        out
    }

    fn word(&mut self) -> Result<Value, PyLiteralError> {
        let offset = self.offset();
        let start = self.pos;
        let word = self.identifier();
        match word.as_str() {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            "inf" | "nan" | "Infinity" | "NaN" => Ok(Value::Null),
            _ => {
                self.pos = start;
                Err(PyLiteralError::Unexpected {
                    found: word.chars().next().unwrap_or('?'),
                    offset,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PyLiteralError, parse_literal, parse_result, quote, result_payload};
    use serde_json::json;

    #[test]
    fn parses_python_dict_repr() {
        let value = parse_literal(
            "{'version': '4.1.0', 'current_file': '', 'count': 3, 'ok': True, 'parent': None}",
        )
        .expect("literal should parse");
        assert_eq!(
            value,
            json!({"version": "4.1.0", "current_file": "", "count": 3, "ok": true, "parent": null})
        );
    }

    #[test]
    fn parses_nested_sequences_and_tuples() {
        let value = parse_literal("{'location': [1.0, -2.5, 3e2], 'res': (1920, 1080), 'one': (7,)}")
            .expect("literal should parse");
        assert_eq!(
            value,
            json!({"location": [1.0, -2.5, 300.0], "res": [1920, 1080], "one": [7]})
        );
    }

    #[test]
    fn parses_json_output() {
        let value = parse_literal(r#"{"success": true, "names": ["Cube", "Light"], "x": null}"#)
            .expect("json should parse");
        assert_eq!(value, json!({"success": true, "names": ["Cube", "Light"], "x": null}));
    }

    #[test]
    fn decodes_escapes() {
        let value = parse_literal(r"'it\'s\n\x41é'").expect("string should parse");
        assert_eq!(value, json!("it's\nAé"));
    }

    #[test]
    fn non_finite_floats_become_null() {
        let value = parse_literal("[inf, -inf, nan]").expect("literal should parse");
        assert_eq!(value, json!([null, null, null]));
    }

    #[test]
    fn rejects_constructor_calls() {
        let err = parse_literal("{'loc': Vector((0, 0, 0))}").expect_err("must fail");
        assert!(matches!(err, PyLiteralError::Unexpected { found: 'V', .. }));
    }

    #[test]
    fn rejects_trailing_text() {
        let err = parse_literal("{} extra").expect_err("must fail");
        assert!(matches!(err, PyLiteralError::Trailing { offset: 3 }));
    }

    #[test]
    fn payload_is_first_line_after_marker() {
        let output = "Hello\nRESULT: {'a': 1}\nmore output\n";
        assert_eq!(result_payload(output), Some("{'a': 1}"));
        assert_eq!(parse_result(output), Some(json!({"a": 1})));
        assert_eq!(result_payload("no marker here"), None);
        assert_eq!(parse_result("RESULT: not a literal"), None);
    }

    #[test]
    fn quote_escapes_python_specials() {
        assert_eq!(quote("Cube"), "\"Cube\"");
        assert_eq!(quote("a\"b\\c\nd"), "\"a\\\"b\\\\c\\nd\"");
    }

    #[test]
    fn quoted_text_parses_back() {
        let original = "weird \"name\"\twith\\slashes";
        assert_eq!(parse_literal(&quote(original)), Ok(json!(original)));
    }
}
