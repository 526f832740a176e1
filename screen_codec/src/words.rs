/*!
Hex text parsing and formatting of 32-bit command words.

Input text is forgiving: whitespace, commas and `0x` prefixes are dropped and
`X`/`x` stands for a `0` nibble, so `0CXXXX32` reads as `0x0C000032`. Output is
one token per word, built from a per-byte [`FormatTemplate`] and joined with
single spaces.
*/

use crate::error::{CodecError, Result};
use crate::protocol::WORD_BYTES;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::str::FromStr;

/// Hex digits making up one word
const HEX_DIGITS_PER_WORD: usize = WORD_BYTES * 2;

/// Default per-byte output template
pub const DEFAULT_TEMPLATE: &str = "%02X%02X%02X%02X";

/// Byte order of words in command text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    #[default]
    Big,
    Little,
}

impl Endianness {
    /// Serialize a word in this byte order
    pub fn to_bytes(self, word: u32) -> [u8; WORD_BYTES] {
        match self {
            Self::Big => word.to_be_bytes(),
            Self::Little => word.to_le_bytes(),
        }
    }

    /// Interpret 4 bytes in this byte order
    pub fn from_bytes(self, bytes: [u8; WORD_BYTES]) -> u32 {
        match self {
            Self::Big => u32::from_be_bytes(bytes),
            Self::Little => u32::from_le_bytes(bytes),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Big => "big",
            Self::Little => "little",
        }
    }
}

impl FromStr for Endianness {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "big" => Ok(Self::Big),
            "little" => Ok(Self::Little),
            _ => Err(CodecError::InvalidIndex {
                field: "endianness",
                value: s.to_string(),
                expected: "big or little",
            }),
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse command text into words
pub fn parse_words(text: &str, endianness: Endianness) -> Result<Vec<u32>> {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    let cleaned: String = compact
        .replace("0x", "")
        .chars()
        .map(|c| if c == 'X' || c == 'x' { '0' } else { c })
        .collect();

    if let Some((position, c)) = cleaned.chars().enumerate().find(|(_, c)| !c.is_ascii_hexdigit()) {
        return Err(CodecError::malformed_hex(format!(
            "invalid character {c:?} at hex digit {position}"
        )));
    }

    if cleaned.len() % HEX_DIGITS_PER_WORD != 0 {
        return Err(CodecError::malformed_hex(format!(
            "{} hex digits is not a multiple of {}",
            cleaned.len(),
            HEX_DIGITS_PER_WORD
        )));
    }

    cleaned
        .as_bytes()
        .chunks_exact(HEX_DIGITS_PER_WORD)
        .map(|digits| -> Result<u32> {
            let mut bytes = [0u8; WORD_BYTES];
            hex::decode_to_slice(digits, &mut bytes)
                .map_err(|e| CodecError::malformed_hex(e.to_string()))?;
            Ok(endianness.from_bytes(bytes))
        })
        .collect()
}

/// Format words as space-separated tokens
pub fn format_words(words: &[u32], endianness: Endianness, template: &FormatTemplate) -> String {
    words
        .iter()
        .map(|&word| template.format_bytes(&endianness.to_bytes(word)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Radix {
    UpperHex,
    LowerHex,
    Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ByteFormat {
    width: usize,
    zero_pad: bool,
    radix: Radix,
}

impl ByteFormat {
    fn write(&self, out: &mut String, byte: u8) {
        let width = self.width;
        // Writing into a String cannot fail
        let _ = match (self.radix, self.zero_pad) {
            (Radix::UpperHex, true) => write!(out, "{byte:0width$X}"),
            (Radix::UpperHex, false) => write!(out, "{byte:>width$X}"),
            (Radix::LowerHex, true) => write!(out, "{byte:0width$x}"),
            (Radix::LowerHex, false) => write!(out, "{byte:>width$x}"),
            (Radix::Decimal, true) => write!(out, "{byte:0width$}"),
            (Radix::Decimal, false) => write!(out, "{byte:>width$}"),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Byte(ByteFormat),
}

/// Output template for the 4 bytes of one word.
///
/// Accepts printf style (`%02X`, `%x`, `%d`, `%%`) or brace style (`{:02X}`,
/// `{:x}`, `{}`, `{{`, `}}`) placeholders; exactly 4 are required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl FormatTemplate {
    /// Parse a template string
    pub fn parse(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            let placeholder = match c {
                '%' if chars.peek() == Some(&'%') => {
                    chars.next();
                    literal.push('%');
                    continue;
                }
                '%' => {
                    let mut directive = String::new();
                    while let Some(&next) = chars.peek() {
                        chars.next();
                        directive.push(next);
                        if !next.is_ascii_digit() {
                            break;
                        }
                    }
                    parse_directive(&directive, false, template)?
                }
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                    continue;
                }
                '{' => {
                    let mut inner = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(next) => inner.push(next),
                            None => {
                                return Err(CodecError::invalid_template(format!(
                                    "unterminated '{{' in {template:?}"
                                )))
                            }
                        }
                    }
                    match inner.strip_prefix(':') {
                        Some(directive) => parse_directive(directive, true, template)?,
                        None if inner.is_empty() => ByteFormat {
                            width: 0,
                            zero_pad: false,
                            radix: Radix::Decimal,
                        },
                        None => {
                            return Err(CodecError::invalid_template(format!(
                                "unsupported placeholder {{{inner}}} in {template:?}"
                            )))
                        }
                    }
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                    continue;
                }
                '}' => {
                    return Err(CodecError::invalid_template(format!(
                        "unmatched '}}' in {template:?}"
                    )))
                }
                other => {
                    literal.push(other);
                    continue;
                }
            };

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Byte(placeholder));
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let placeholders = segments
            .iter()
            .filter(|s| matches!(s, Segment::Byte(_)))
            .count();
        if placeholders != WORD_BYTES {
            return Err(CodecError::invalid_template(format!(
                "{template:?} has {placeholders} byte placeholders, expected {WORD_BYTES}"
            )));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// The template as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Format the 4 bytes of one word
    pub fn format_bytes(&self, bytes: &[u8; WORD_BYTES]) -> String {
        let mut out = String::new();
        let mut next = bytes.iter();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Byte(format) => {
                    if let Some(&byte) = next.next() {
                        format.write(&mut out, byte);
                    }
                }
            }
        }
        out
    }
}

/// Widest field a byte placeholder may request
const MAX_FIELD_WIDTH: usize = 8;

/// Parse `[0][width][X|x|d|u|i]`, the part after `%` or `{:`
fn parse_directive(directive: &str, brace: bool, template: &str) -> Result<ByteFormat> {
    let invalid = || {
        CodecError::invalid_template(format!("unsupported conversion {directive:?} in {template:?}"))
    };

    let digits_end = directive
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(directive.len());
    let (digits, conversion) = directive.split_at(digits_end);

    let zero_pad = digits.len() > 1 && digits.starts_with('0');
    let width = if digits.is_empty() {
        0
    } else {
        digits.parse::<usize>().map_err(|_| invalid())?
    };
    if width > MAX_FIELD_WIDTH {
        return Err(CodecError::invalid_template(format!(
            "field width {width} exceeds {MAX_FIELD_WIDTH} in {template:?}"
        )));
    }

    let radix = match conversion {
        "X" => Radix::UpperHex,
        "x" => Radix::LowerHex,
        "d" | "u" | "i" => Radix::Decimal,
        "" if brace => Radix::Decimal,
        _ => return Err(invalid()),
    };

    Ok(ByteFormat {
        width,
        zero_pad,
        radix,
    })
}

impl Default for FormatTemplate {
    fn default() -> Self {
        let byte = Segment::Byte(ByteFormat {
            width: 2,
            zero_pad: true,
            radix: Radix::UpperHex,
        });
        Self {
            source: DEFAULT_TEMPLATE.to_string(),
            segments: vec![byte; WORD_BYTES],
        }
    }
}

impl FromStr for FormatTemplate {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FormatTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_and_prefix_tolerance() {
        for text in ["0C 01 00 32", "0x0C,0x01,0x00,0x32", "0C010032", " 0C01\r\n\t0032 "] {
            assert_eq!(parse_words(text, Endianness::Big).unwrap(), vec![0x0C01_0032], "{text:?}");
        }
    }

    #[test]
    fn test_wildcard_nibbles() {
        assert_eq!(parse_words("0CXXXX32", Endianness::Big).unwrap(), vec![0x0C00_0032]);
        assert_eq!(parse_words("0cxxxx32", Endianness::Big).unwrap(), vec![0x0C00_0032]);
    }

    #[test]
    fn test_little_endian_parse() {
        assert_eq!(parse_words("3200010C", Endianness::Little).unwrap(), vec![0x0C01_0032]);
        assert_eq!(parse_words("04000000 00000000", Endianness::Little).unwrap(), vec![4, 0]);
    }

    #[test]
    fn test_empty_text_is_no_words() {
        assert!(parse_words("  \n", Endianness::Big).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_hex() {
        assert!(matches!(
            parse_words("0C01003", Endianness::Big),
            Err(CodecError::MalformedHex(_))
        ));
        assert!(matches!(
            parse_words("0C01003G", Endianness::Big),
            Err(CodecError::MalformedHex(_))
        ));
        assert!(matches!(
            parse_words("0C01-0032", Endianness::Big),
            Err(CodecError::MalformedHex(_))
        ));
    }

    #[test]
    fn test_endianness_tokens() {
        assert_eq!("big".parse::<Endianness>().unwrap(), Endianness::Big);
        assert_eq!("little".parse::<Endianness>().unwrap(), Endianness::Little);
        assert!(matches!(
            "middle".parse::<Endianness>(),
            Err(CodecError::InvalidIndex { field: "endianness", .. })
        ));
        assert_eq!(Endianness::default().to_string(), "big");
    }

    #[test]
    fn test_default_template_matches_parsed() {
        assert_eq!(FormatTemplate::default(), FormatTemplate::parse(DEFAULT_TEMPLATE).unwrap());
    }

    #[test]
    fn test_format_default_template() {
        let template = FormatTemplate::default();
        let words = [0x0C01_0032, 0x0000_0004];
        assert_eq!(format_words(&words, Endianness::Big, &template), "0C010032 00000004");
        assert_eq!(format_words(&words, Endianness::Little, &template), "3200010C 04000000");
    }

    #[test]
    fn test_format_then_parse_little_endian() {
        let words = vec![0x0C01_0032, 0xDEAD_BEEF, 0];
        let text = format_words(&words, Endianness::Little, &FormatTemplate::default());
        assert_eq!(parse_words(&text, Endianness::Little).unwrap(), words);
    }

    #[test]
    fn test_custom_templates() {
        let bytes = [0x0C, 0x01, 0x00, 0x32];

        let spaced: FormatTemplate = "%02X %02X %02X %02X".parse().unwrap();
        assert_eq!(spaced.format_bytes(&bytes), "0C 01 00 32");

        let braces: FormatTemplate = "{:02X}{:02X}{:02X}{:02X}".parse().unwrap();
        assert_eq!(braces.format_bytes(&bytes), "0C010032");

        let prefixed: FormatTemplate = "0x%02x%02x%02x%02x,".parse().unwrap();
        assert_eq!(prefixed.format_bytes(&bytes), "0x0c010032,");

        let decimal: FormatTemplate = "%d.%d.%d.{}".parse().unwrap();
        assert_eq!(decimal.format_bytes(&bytes), "12.1.0.50");

        let escaped: FormatTemplate = "{{%02X}}%%%02X%02X%02X".parse().unwrap();
        assert_eq!(escaped.format_bytes(&bytes), "{0C}%010032");

        let padded: FormatTemplate = "%3X%3X%3X%3X".parse().unwrap();
        assert_eq!(padded.format_bytes(&bytes), "  C  1  0 32");
    }

    #[test]
    fn test_invalid_templates() {
        for template in ["%02X", "%02X%02X%02X%02X%02X", "%q%q%q%q", "{:02X", "}%X%X%X%X", "{0}{1}{2}{3}"] {
            assert!(
                matches!(FormatTemplate::parse(template), Err(CodecError::InvalidTemplate(_))),
                "{template:?}"
            );
        }
    }

    #[test]
    fn test_field_width_is_capped() {
        let widest: FormatTemplate = "%08X%08X%08X%08X".parse().unwrap();
        assert_eq!(widest.format_bytes(&[0x0C, 0x01, 0x00, 0x32]), "0000000C000000010000000000000032");
        assert_eq!(widest.to_string(), "%08X%08X%08X%08X");

        for template in ["%9X%X%X%X", "%4000000000X%X%X%X", "{:099X}{}{}{}", "%99999999999999999999999X%X%X%X"] {
            assert!(
                matches!(FormatTemplate::parse(template), Err(CodecError::InvalidTemplate(_))),
                "{template:?}"
            );
        }
    }
}
