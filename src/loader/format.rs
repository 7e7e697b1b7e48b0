//! File kind, delimiter and text encoding choices

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::IngestionError;

/// Accepted file kinds, recognised by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Txt,
}

impl FileKind {
    /// Check a file name's extension
    pub fn from_name(name: &str) -> Result<Self, IngestionError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(FileKind::Csv),
            "txt" => Ok(FileKind::Txt),
            _ => Err(IngestionError::UnsupportedFileType {
                name: name.to_string(),
            }),
        }
    }
}

/// Field delimiter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Pipe,
    Semicolon,
    Tab,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Pipe => b'|',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
        }
    }

    pub fn as_char(self) -> char {
        self.as_byte() as char
    }
}

impl std::str::FromStr for Delimiter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "," | "comma" => Ok(Delimiter::Comma),
            "|" | "pipe" => Ok(Delimiter::Pipe),
            ";" | "semicolon" => Ok(Delimiter::Semicolon),
            "\t" | "\\t" | "tab" => Ok(Delimiter::Tab),
            _ => Err(format!(
                "Unknown delimiter: {:?} (expected ',', '|', ';' or tab)",
                s
            )),
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Tab => write!(f, "'\\t'"),
            other => write!(f, "'{}'", other.as_char()),
        }
    }
}

/// Text encoding of the input bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "latin-1")]
    Latin1,
    #[serde(rename = "cp1252")]
    Cp1252,
}

/// Windows-1252 code points for bytes 0x80..=0x9F; `None` marks the
/// five bytes the code page leaves undefined.
const CP1252_C1: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

impl Encoding {
    /// Decode one byte of a single-byte encoding.
    ///
    /// Always `None` for UTF-8, which is not a single-byte encoding.
    pub fn decode_byte(self, byte: u8) -> Option<char> {
        match self {
            Encoding::Utf8 => None,
            Encoding::Latin1 => Some(byte as char),
            Encoding::Cp1252 => match byte {
                0x80..=0x9F => CP1252_C1[(byte - 0x80) as usize],
                _ => Some(byte as char),
            },
        }
    }

    /// Decode a sample prefix of a stream.
    ///
    /// A UTF-8 sequence cut off by the end of the sample is dropped rather
    /// than reported, since the rest of it lies past the sample boundary.
    pub fn decode_sample(self, bytes: &[u8]) -> Result<String, IngestionError> {
        match self {
            Encoding::Utf8 => match std::str::from_utf8(bytes) {
                Ok(s) => Ok(s.to_string()),
                Err(e) if e.error_len().is_none() => {
                    Ok(String::from_utf8_lossy(&bytes[..e.valid_up_to()]).into_owned())
                }
                Err(e) => Err(IngestionError::Decode {
                    encoding: self,
                    offset: e.valid_up_to() as u64,
                }),
            },
            _ => bytes
                .iter()
                .enumerate()
                .map(|(offset, &b)| {
                    self.decode_byte(b).ok_or(IngestionError::Decode {
                        encoding: self,
                        offset: offset as u64,
                    })
                })
                .collect(),
        }
    }
}

impl std::str::FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(Encoding::Latin1),
            "cp1252" | "windows-1252" => Ok(Encoding::Cp1252),
            _ => Err(format!("Unknown encoding: {}", s)),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => write!(f, "utf-8"),
            Encoding::Latin1 => write!(f, "latin-1"),
            Encoding::Cp1252 => write!(f, "cp1252"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind() {
        assert_eq!(FileKind::from_name("a.CSV").unwrap(), FileKind::Csv);
        assert_eq!(FileKind::from_name("dir/b.txt").unwrap(), FileKind::Txt);
        assert!(matches!(
            FileKind::from_name("c.xlsx"),
            Err(IngestionError::UnsupportedFileType { .. })
        ));
        assert!(FileKind::from_name("noext").is_err());
    }

    #[test]
    fn test_parse_choices() {
        assert_eq!("tab".parse::<Delimiter>().unwrap(), Delimiter::Tab);
        assert_eq!(";".parse::<Delimiter>().unwrap(), Delimiter::Semicolon);
        assert!(":".parse::<Delimiter>().is_err());
        assert_eq!("Latin1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert_eq!("windows-1252".parse::<Encoding>().unwrap(), Encoding::Cp1252);
    }

    #[test]
    fn test_cp1252_bytes() {
        assert_eq!(Encoding::Cp1252.decode_byte(0x80), Some('€'));
        assert_eq!(Encoding::Cp1252.decode_byte(0x81), None);
        assert_eq!(Encoding::Cp1252.decode_byte(0xE9), Some('é'));
        assert_eq!(Encoding::Latin1.decode_byte(0x80), Some('\u{80}'));
    }

    #[test]
    fn test_sample_tolerates_cut_utf8_sequence() {
        let bytes = "a,é".as_bytes();
        let cut = &bytes[..bytes.len() - 1];
        assert_eq!(Encoding::Utf8.decode_sample(cut).unwrap(), "a,");
        assert!(matches!(
            Encoding::Utf8.decode_sample(b"a,\xFFb"),
            Err(IngestionError::Decode { offset: 2, .. })
        ));
    }
}
