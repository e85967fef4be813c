//! Decoder for PHP `serialize()` output.
//!
//! WordPress stores arrays and objects in the options table in PHP's native
//! serialization format. Only decoding is supported; the service never writes
//! options back.
//!
//! ```text
//! a:2:{i:0;s:19:"akismet/akismet.php";i:1;s:9:"hello.php";}
//! ```

use std::borrow::Cow;

use crate::error::HostError;

/// Array key: PHP arrays are keyed by integers or byte strings.
#[derive(Debug, Clone, PartialEq)]
pub enum PhpKey {
    /// Integer key.
    Int(i64),
    /// String key.
    Str(Vec<u8>),
}

impl PhpKey {
    /// Key rendered as text, integers in decimal.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        match self {
            PhpKey::Int(i) => Cow::Owned(i.to_string()),
            PhpKey::Str(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            PhpKey::Int(i) => name.parse::<i64>().ok() == Some(*i),
            PhpKey::Str(bytes) => bytes.as_slice() == name.as_bytes(),
        }
    }
}

/// A decoded PHP value.
#[derive(Debug, Clone, PartialEq)]
pub enum PhpValue {
    /// `N;`
    Null,
    /// `b:0;` / `b:1;`
    Bool(bool),
    /// `i:42;`
    Int(i64),
    /// `d:1.5;`
    Float(f64),
    /// `s:5:"hello";`, length counted in bytes.
    Str(Vec<u8>),
    /// `a:n:{...}` in insertion order.
    Array(Vec<(PhpKey, PhpValue)>),
    /// `O:len:"Class":n:{...}`.
    Object {
        /// Class name, e.g. `stdClass`.
        class: String,
        /// Properties with visibility markers stripped.
        properties: Vec<(String, PhpValue)>,
    },
}

impl PhpValue {
    /// Look up an array element or object property by name.
    pub fn get(&self, name: &str) -> Option<&PhpValue> {
        match self {
            PhpValue::Array(entries) => entries
                .iter()
                .find(|(k, _)| k.matches(name))
                .map(|(_, v)| v),
            PhpValue::Object { properties, .. } => properties
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Scalar rendered as text the way PHP's string cast would.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            PhpValue::Str(bytes) => Some(String::from_utf8_lossy(bytes)),
            PhpValue::Int(i) => Some(Cow::Owned(i.to_string())),
            PhpValue::Float(f) => Some(Cow::Owned(f.to_string())),
            _ => None,
        }
    }

    /// Key/value pairs of an array or object, keys rendered as text.
    pub fn entries(&self) -> Vec<(Cow<'_, str>, &PhpValue)> {
        match self {
            PhpValue::Array(entries) => entries
                .iter()
                .map(|(k, v)| (k.to_string_lossy(), v))
                .collect(),
            PhpValue::Object { properties, .. } => properties
                .iter()
                .map(|(k, v)| (Cow::Borrowed(k.as_str()), v))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Array values in order, ignoring keys.
    pub fn values(&self) -> Vec<&PhpValue> {
        self.entries().into_iter().map(|(_, v)| v).collect()
    }
}

/// Deepest array/object nesting accepted.
const MAX_DEPTH: usize = 64;

/// Decode a single serialized value. Trailing bytes are rejected.
pub fn unserialize(input: &[u8]) -> Result<PhpValue, HostError> {
    let mut parser = Parser {
        input,
        pos: 0,
        depth: 0,
    };
    let value = parser.value()?;
    if parser.pos != input.len() {
        return Err(parser.error("trailing data after value"));
    }
    Ok(value)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> HostError {
        HostError::Unserialize {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<(), HostError> {
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(self.error(format!(
                "expected '{}', found '{}'",
                byte as char, b as char
            ))),
            None => Err(self.error(format!("expected '{}', found end of input", byte as char))),
        }
    }

    /// Bytes up to (not including) `terminator`, consuming the terminator.
    fn until(&mut self, terminator: u8) -> Result<&[u8], HostError> {
        let start = self.pos;
        let len = self.input[start..]
            .iter()
            .position(|&b| b == terminator)
            .ok_or_else(|| self.error(format!("missing '{}'", terminator as char)))?;
        self.pos = start + len + 1;
        Ok(&self.input[start..start + len])
    }

    fn number<T: std::str::FromStr>(&mut self, terminator: u8) -> Result<T, HostError> {
        let start = self.pos;
        let raw = self.until(terminator)?;
        std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| HostError::Unserialize {
                offset: start,
                reason: "invalid number".to_string(),
            })
    }

    /// `<len>:"<bytes>"` without the leading type tag.
    fn quoted(&mut self) -> Result<Vec<u8>, HostError> {
        let len: usize = self.number(b':')?;
        self.expect(b'"')?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| self.error("string length exceeds input"))?;
        let bytes = self.input[self.pos..end].to_vec();
        self.pos = end;
        self.expect(b'"')?;
        Ok(bytes)
    }

    fn enter(&mut self) -> Result<(), HostError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        Ok(())
    }

    fn value(&mut self) -> Result<PhpValue, HostError> {
        let tag = self.peek().ok_or_else(|| self.error("unexpected end of input"))?;
        self.pos += 1;

        match tag {
            b'N' => {
                self.expect(b';')?;
                Ok(PhpValue::Null)
            }
            b'b' => {
                self.expect(b':')?;
                let flag: u8 = self.number(b';')?;
                Ok(PhpValue::Bool(flag != 0))
            }
            b'i' => {
                self.expect(b':')?;
                Ok(PhpValue::Int(self.number(b';')?))
            }
            b'd' => {
                self.expect(b':')?;
                let start = self.pos;
                let raw = self.until(b';')?;
                let parsed = match raw {
                    b"INF" => Some(f64::INFINITY),
                    b"-INF" => Some(f64::NEG_INFINITY),
                    b"NAN" => Some(f64::NAN),
                    _ => std::str::from_utf8(raw).ok().and_then(|s| s.parse().ok()),
                };
                parsed.map(PhpValue::Float).ok_or(HostError::Unserialize {
                    offset: start,
                    reason: "invalid float".to_string(),
                })
            }
            b's' => {
                self.expect(b':')?;
                let bytes = self.quoted()?;
                self.expect(b';')?;
                Ok(PhpValue::Str(bytes))
            }
            b'a' => {
                self.expect(b':')?;
                let count: usize = self.number(b':')?;
                self.expect(b'{')?;
                self.enter()?;
                let mut entries = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    let key = self.key()?;
                    let value = self.value()?;
                    entries.push((key, value));
                }
                self.expect(b'}')?;
                self.depth -= 1;
                Ok(PhpValue::Array(entries))
            }
            b'O' => {
                self.expect(b':')?;
                let class = String::from_utf8_lossy(&self.quoted()?).into_owned();
                self.expect(b':')?;
                let count: usize = self.number(b':')?;
                self.expect(b'{')?;
                self.enter()?;
                let mut properties = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    let name = match self.key()? {
                        PhpKey::Str(bytes) => property_name(&bytes),
                        PhpKey::Int(i) => i.to_string(),
                    };
                    let value = self.value()?;
                    properties.push((name, value));
                }
                self.expect(b'}')?;
                self.depth -= 1;
                Ok(PhpValue::Object { class, properties })
            }
            other => {
                self.pos -= 1;
                Err(self.error(format!("unsupported type tag '{}'", other as char)))
            }
        }
    }

    fn key(&mut self) -> Result<PhpKey, HostError> {
        match self.value()? {
            PhpValue::Int(i) => Ok(PhpKey::Int(i)),
            PhpValue::Str(bytes) => Ok(PhpKey::Str(bytes)),
            _ => Err(self.error("array key must be int or string")),
        }
    }
}

/// Strip the `\0*\0` (protected) and `\0Class\0` (private) markers.
fn property_name(raw: &[u8]) -> String {
    let name = match raw.first() {
        Some(0) => raw[1..]
            .iter()
            .position(|&b| b == 0)
            .map(|i| &raw[i + 2..])
            .unwrap_or(raw),
        _ => raw,
    };
    String::from_utf8_lossy(name).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_active_plugins_list() {
        let raw = br#"a:2:{i:0;s:19:"akismet/akismet.php";i:1;s:9:"hello.php";}"#;
        let value = unserialize(raw).unwrap();

        let names: Vec<String> = value
            .values()
            .into_iter()
            .filter_map(|v| v.as_text().map(|s| s.into_owned()))
            .collect();
        assert_eq!(names, vec!["akismet/akismet.php", "hello.php"]);
    }

    #[test]
    fn decodes_update_transient_shape() {
        let raw = br#"O:8:"stdClass":2:{s:12:"last_checked";i:1700000000;s:8:"response";a:1:{s:19:"akismet/akismet.php";O:8:"stdClass":2:{s:4:"slug";s:7:"akismet";s:11:"new_version";s:5:"5.3.1";}}}"#;
        let value = unserialize(raw).unwrap();

        let response = value.get("response").unwrap();
        let entry = response.get("akismet/akismet.php").unwrap();
        assert_eq!(entry.get("new_version").unwrap().as_text().unwrap(), "5.3.1");
        assert_eq!(value.get("last_checked"), Some(&PhpValue::Int(1_700_000_000)));
    }

    #[test]
    fn string_length_counts_bytes_not_chars() {
        // "héllo" is 6 bytes in UTF-8.
        let raw = "s:6:\"héllo\";".as_bytes();
        assert_eq!(unserialize(raw).unwrap().as_text().unwrap(), "héllo");
    }

    #[test]
    fn decodes_scalars() {
        assert_eq!(unserialize(b"N;").unwrap(), PhpValue::Null);
        assert_eq!(unserialize(b"b:1;").unwrap(), PhpValue::Bool(true));
        assert_eq!(unserialize(b"i:-7;").unwrap(), PhpValue::Int(-7));
        assert_eq!(unserialize(b"d:0.5;").unwrap(), PhpValue::Float(0.5));
    }

    #[test]
    fn strips_visibility_markers_from_properties() {
        let raw = b"O:3:\"Foo\":2:{s:6:\"\0*\0bar\";i:1;s:8:\"\0Foo\0baz\";i:2;}";
        let value = unserialize(raw).unwrap();
        assert_eq!(value.get("bar"), Some(&PhpValue::Int(1)));
        assert_eq!(value.get("baz"), Some(&PhpValue::Int(2)));
    }

    #[test]
    fn rejects_truncated_input() {
        assert!(unserialize(br#"s:10:"short";"#).is_err());
        assert!(unserialize(br#"a:2:{i:0;s:1:"a";}"#).is_err());
        assert!(unserialize(b"").is_err());
    }

    #[test]
    fn rejects_trailing_data() {
        assert!(unserialize(b"i:1;i:2;").is_err());
    }

    fn nested(depth: usize) -> Vec<u8> {
        let mut raw = "a:1:{i:0;".repeat(depth);
        raw.push_str("N;");
        raw.push_str(&"}".repeat(depth));
        raw.into_bytes()
    }

    #[test]
    fn limits_nesting_depth() {
        assert!(unserialize(&nested(64)).is_ok());

        for depth in [65, 100_000] {
            match unserialize(&nested(depth)) {
                Err(HostError::Unserialize { reason, .. }) => {
                    assert_eq!(reason, "nesting too deep")
                }
                other => panic!("expected nesting error, got {:?}", other.map(|_| ())),
            }
        }
    }
}
