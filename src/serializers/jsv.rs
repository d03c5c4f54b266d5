//! JSV codec: the compact text format (`{key:value,list:[a,b]}`).
//!
//! # Design Decisions
//! - Bridged through `serde_json::Value` so any serde type rides for free
//! - Strings are bare unless they contain structural characters, look like
//!   a number/bool, or carry edge whitespace; quoting doubles `"` to escape
//! - Empty bare values parse as null; `""` is the explicit empty string

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::CodecError;

/// Serialize any serde value to JSV text.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let tree = serde_json::to_value(value)?;
    let mut out = String::new();
    write_value(&tree, &mut out);
    Ok(out.into_bytes())
}

/// Deserialize JSV text into any serde type.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let text = std::str::from_utf8(bytes).map_err(|e| CodecError::Jsv {
        pos: e.valid_up_to(),
        message: "invalid utf-8".to_string(),
    })?;
    let tree = parse(text)?;
    Ok(serde_json::from_value(tree)?)
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_value(item, out);
            }
            out.push('}');
        }
    }
}

fn write_string(s: &str, out: &mut String) {
    if needs_quoting(s) {
        out.push('"');
        for ch in s.chars() {
            if ch == '"' {
                out.push('"');
            }
            out.push(ch);
        }
        out.push('"');
    } else {
        out.push_str(s);
    }
}

fn needs_quoting(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
        return true;
    }
    if s.chars().any(|c| matches!(c, '{' | '}' | '[' | ']' | ',' | '"' | ':')) {
        return true;
    }
    // quote anything a re-parse would mistake for a scalar
    s.parse::<f64>().is_ok() || s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false")
}

/// Parse JSV text into a JSON value tree.
pub fn parse(text: &str) -> Result<Value, CodecError> {
    let mut parser = Parser {
        bytes: text.as_bytes(),
        pos: 0,
    };
    let value = parser.parse_value(&[])?;
    if parser.pos != parser.bytes.len() {
        return Err(parser.error("trailing input"));
    }
    Ok(value)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: &str) -> CodecError {
        CodecError::Jsv {
            pos: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn parse_value(&mut self, terminators: &[u8]) -> Result<Value, CodecError> {
        match self.peek() {
            Some(b'{') => self.parse_map(),
            Some(b'[') => self.parse_list(),
            Some(b'"') => Ok(Value::String(self.parse_quoted()?)),
            _ => {
                let start = self.pos;
                while let Some(b) = self.peek() {
                    if terminators.contains(&b) {
                        break;
                    }
                    self.pos += 1;
                }
                let raw = std::str::from_utf8(&self.bytes[start..self.pos])
                    .map_err(|_| self.error("invalid utf-8"))?;
                Ok(infer_scalar(raw))
            }
        }
    }

    fn parse_map(&mut self) -> Result<Value, CodecError> {
        self.pos += 1; // '{'
        let mut map = serde_json::Map::new();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Value::Object(map));
        }
        loop {
            let key = match self.peek() {
                Some(b'"') => self.parse_quoted()?,
                _ => {
                    let start = self.pos;
                    while let Some(b) = self.peek() {
                        if b == b':' {
                            break;
                        }
                        self.pos += 1;
                    }
                    std::str::from_utf8(&self.bytes[start..self.pos])
                        .map_err(|_| self.error("invalid utf-8"))?
                        .to_string()
                }
            };
            if self.peek() != Some(b':') {
                return Err(self.error("expected ':' after map key"));
            }
            self.pos += 1;
            let value = self.parse_value(&[b',', b'}'])?;
            map.insert(key, value);
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                _ => return Err(self.error("unterminated map")),
            }
        }
    }

    fn parse_list(&mut self) -> Result<Value, CodecError> {
        self.pos += 1; // '['
        let mut items = Vec::new();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Value::Array(items));
        }
        loop {
            items.push(self.parse_value(&[b',', b']'])?);
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                _ => return Err(self.error("unterminated list")),
            }
        }
    }

    fn parse_quoted(&mut self) -> Result<String, CodecError> {
        self.pos += 1; // opening '"'
        let mut out = String::new();
        loop {
            match self.peek() {
                Some(b'"') => {
                    // doubled quote is an escaped quote
                    if self.bytes.get(self.pos + 1) == Some(&b'"') {
                        out.push('"');
                        self.pos += 2;
                    } else {
                        self.pos += 1;
                        return Ok(out);
                    }
                }
                Some(_) => {
                    let start = self.pos;
                    while let Some(b) = self.peek() {
                        if b == b'"' {
                            break;
                        }
                        self.pos += 1;
                    }
                    out.push_str(
                        std::str::from_utf8(&self.bytes[start..self.pos])
                            .map_err(|_| self.error("invalid utf-8"))?,
                    );
                }
                None => return Err(self.error("unterminated string")),
            }
        }
    }
}

fn infer_scalar(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = raw.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Default, Serialize, Deserialize)]
    struct Order {
        id: u32,
        name: String,
        tags: Vec<String>,
    }

    #[test]
    fn typed_round_trip() {
        let order = Order {
            id: 7,
            name: "alpha beta".to_string(),
            tags: vec!["a".to_string(), "b,c".to_string()],
        };
        let bytes = encode(&order).unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{id:7,name:alpha beta,tags:[a,"b,c"]}"#
        );
        let back: Order = decode(&bytes).unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn quoting_protects_structural_characters() {
        let tree = json!({"text": "{not:a,map}"});
        let mut out = String::new();
        write_value(&tree, &mut out);
        assert_eq!(out, r#"{text:"{not:a,map}"}"#);
        assert_eq!(parse(&out).unwrap(), tree);
    }

    #[test]
    fn doubled_quotes_escape() {
        let tree = json!({"text": "say \"hi\""});
        let mut out = String::new();
        write_value(&tree, &mut out);
        assert_eq!(out, r#"{text:"say ""hi"""}"#);
        assert_eq!(parse(&out).unwrap(), tree);
    }

    #[test]
    fn numeric_looking_strings_stay_strings() {
        let tree = json!({"code": "007"});
        let mut out = String::new();
        write_value(&tree, &mut out);
        assert_eq!(out, r#"{code:"007"}"#);
        assert_eq!(parse(&out).unwrap(), tree);
    }

    #[test]
    fn scalars_are_inferred() {
        assert_eq!(parse("42").unwrap(), json!(42));
        assert_eq!(parse("1.5").unwrap(), json!(1.5));
        assert_eq!(parse("True").unwrap(), json!(true));
        assert_eq!(parse("plain").unwrap(), json!("plain"));
        assert_eq!(parse("").unwrap(), Value::Null);
    }

    #[test]
    fn malformed_input_reports_position() {
        let err = parse("{id:1").unwrap_err();
        match err {
            CodecError::Jsv { message, .. } => assert!(message.contains("unterminated")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
