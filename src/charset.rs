use crate::error::{Error, Result};

/// A text charset named by its canonical IANA name (spec §6 "Wire").
/// Only the charsets observed in the seed test vectors (spec §8) are
/// implemented; an unrecognized name is an annotation-time error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Ascii,
    Utf8,
}

impl Charset {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "US-ASCII" | "ASCII" | "ascii" => Ok(Charset::Ascii),
            "UTF-8" | "UTF8" | "utf-8" => Ok(Charset::Utf8),
            other => Err(Error::annotation("charset", format!("unknown charset `{other}`"))),
        }
    }

    pub fn canonical_name(self) -> &'static str {
        match self {
            Charset::Ascii => "US-ASCII",
            Charset::Utf8 => "UTF-8",
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            Charset::Ascii => {
                if bytes.iter().any(|&b| b > 0x7f) {
                    return Err(Error::annotation("charset", "non-ASCII byte in US-ASCII text"));
                }
                Ok(bytes.iter().map(|&b| b as char).collect())
            }
            Charset::Utf8 => {
                String::from_utf8(bytes.to_vec()).map_err(|e| Error::annotation("charset", e.to_string()))
            }
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        match self {
            Charset::Ascii => {
                if !text.is_ascii() {
                    return Err(Error::annotation("charset", "non-ASCII text for US-ASCII charset"));
                }
                Ok(text.as_bytes().to_vec())
            }
            Charset::Utf8 => Ok(text.as_bytes().to_vec()),
        }
    }
}

impl Default for Charset {
    fn default() -> Self {
        Charset::Ascii
    }
}
