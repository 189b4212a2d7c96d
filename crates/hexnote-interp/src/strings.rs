//! Fixed-length string interpreter.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use hexnote_types::{Binary, Range};

use crate::error::{InterpError, InterpResult};
use crate::interpreter::{Interpreter, InterpreterInfo};
use crate::options::{OptionSpec, OptionType, OptionValue, OptionValues};
use crate::value::Value;

pub const CHARSET_OPTION: &str = "charset";

/// Supported text encodings. Malformed input decodes to U+FFFD.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Charset {
    Utf8,
    UsAscii,
    Iso8859_1,
    Utf16Be,
    Utf16Le,
}

impl Charset {
    pub const ALL: [Charset; 5] = [
        Charset::Utf8,
        Charset::UsAscii,
        Charset::Iso8859_1,
        Charset::Utf16Be,
        Charset::Utf16Le,
    ];

    /// Canonical name, as persisted.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::UsAscii => "US-ASCII",
            Self::Iso8859_1 => "ISO-8859-1",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf16Le => "UTF-16LE",
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::UsAscii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
                .collect(),
            Self::Iso8859_1 => bytes.iter().map(|&b| b as char).collect(),
            Self::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
            Self::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
        }
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let chunks = bytes.chunks_exact(2);
    let dangling = !chunks.remainder().is_empty();
    let mut text: String = char::decode_utf16(chunks.map(|c| unit([c[0], c[1]])))
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    if dangling {
        text.push(char::REPLACEMENT_CHARACTER);
    }
    text
}

impl FromStr for Charset {
    type Err = InterpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_uppercase().replace('_', "-");
        match normalized.as_str() {
            "UTF-8" | "UTF8" => Ok(Self::Utf8),
            "US-ASCII" | "ASCII" => Ok(Self::UsAscii),
            "ISO-8859-1" | "LATIN1" | "LATIN-1" => Ok(Self::Iso8859_1),
            "UTF-16BE" => Ok(Self::Utf16Be),
            "UTF-16LE" => Ok(Self::Utf16Le),
            _ => Err(InterpError::InvalidOption {
                key: CHARSET_OPTION.to_string(),
                reason: format!("unsupported charset {s:?}"),
            }),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Interprets the whole annotated range as text in one charset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StringInterpreter {
    charset: Charset,
}

impl StringInterpreter {
    pub const TYPE_NAME: &'static str = "string";

    pub fn new(charset: Charset) -> Self {
        Self { charset }
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }
}

impl Interpreter for StringInterpreter {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn human_name(&self) -> String {
        format!("String ({})", self.charset)
    }

    fn options(&self) -> OptionValues {
        OptionValues::new().with(CHARSET_OPTION, self.charset.name())
    }

    fn interpret(&self, binary: &dyn Binary, range: Range) -> InterpResult<Value> {
        let bytes = binary.read_range(range)?;
        Ok(Value::Text(self.charset.decode(&bytes)))
    }
}

/// [`InterpreterInfo`] for [`StringInterpreter`].
#[derive(Debug)]
pub struct StringInfo {
    options: [OptionSpec; 1],
}

impl StringInfo {
    pub fn new() -> Self {
        Self {
            options: [OptionSpec {
                key: CHARSET_OPTION,
                display_name: "Character Set",
                value_type: OptionType::Text,
                default_value: OptionValue::Text(Charset::Utf8.name().to_string()),
            }],
        }
    }
}

impl Default for StringInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl InterpreterInfo for StringInfo {
    fn type_name(&self) -> &str {
        StringInterpreter::TYPE_NAME
    }

    fn human_name(&self) -> &str {
        "String"
    }

    fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    fn create(&self, options: &OptionValues) -> InterpResult<Arc<dyn Interpreter>> {
        let resolved = options.resolve(StringInterpreter::TYPE_NAME, &self.options)?;
        let charset = resolved
            .get(CHARSET_OPTION)
            .and_then(OptionValue::as_text)
            .unwrap_or(Charset::Utf8.name())
            .parse()?;
        Ok(Arc::new(StringInterpreter::new(charset)))
    }
}
