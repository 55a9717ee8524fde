use serde::Serialize;
use std::{borrow::Cow, fmt};
use thiserror::Error;
use tracing::{debug, trace};

use crate::process::{date_parser::parse_leading_date, DELIMITER};

/// Header length assumed when no candidate encoding reveals a date line.
pub const FALLBACK_HEADER_SKIP: usize = 4;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Text encodings a meter export may arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Codec {
    /// UTF-8 with a leading byte-order mark stripped.
    #[serde(rename = "utf-8-sig")]
    Utf8Sig,
    #[serde(rename = "utf-8")]
    Utf8,
    /// ISO-8859-1. Every byte sequence is valid.
    #[serde(rename = "latin-1")]
    Latin1,
    #[serde(rename = "windows-1252")]
    Windows1252,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {codec} byte sequence{}", .offset.map(|o| format!(" at byte {o}")).unwrap_or_default())]
pub struct DecodeError {
    pub codec: Codec,
    pub offset: Option<usize>,
}

impl Codec {
    /// Detection order.
    pub const CANDIDATES: [Codec; 4] = [
        Codec::Utf8Sig,
        Codec::Utf8,
        Codec::Latin1,
        Codec::Windows1252,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Codec::Utf8Sig => "utf-8-sig",
            Codec::Utf8 => "utf-8",
            Codec::Latin1 => "latin-1",
            Codec::Windows1252 => "windows-1252",
        }
    }

    /// Decode the whole buffer, failing on the first malformed sequence instead of
    /// substituting replacement characters.
    pub fn decode(self, bytes: &[u8]) -> Result<Cow<'_, str>, DecodeError> {
        match self {
            Codec::Utf8Sig => decode_utf8(self, bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)),
            Codec::Utf8 => decode_utf8(self, bytes),
            Codec::Latin1 => Ok(encoding_rs::mem::decode_latin1(bytes)),
            Codec::Windows1252 => encoding_rs::WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes)
                .ok_or(DecodeError {
                    codec: self,
                    offset: None,
                }),
        }
    }
}

fn decode_utf8(codec: Codec, bytes: &[u8]) -> Result<Cow<'_, str>, DecodeError> {
    std::str::from_utf8(bytes)
        .map(Cow::Borrowed)
        .map_err(|e| DecodeError {
            codec,
            offset: Some(e.valid_up_to()),
        })
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where the data rows of a file begin and how its bytes are to be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataStart {
    /// Number of lines preceding the first data row.
    pub line: usize,
    pub codec: Codec,
    /// Set when no candidate produced a date line and the defaults were used.
    pub fallback: bool,
}

/// Find the first line whose first field starts with a `DDMMYYYY` date, trying each
/// candidate encoding in turn. The first candidate that both decodes and yields such
/// a line wins; if none does, `FALLBACK_HEADER_SKIP` lines of UTF-8 (BOM stripped)
/// are assumed.
pub fn detect_data_start(bytes: &[u8]) -> DataStart {
    for codec in Codec::CANDIDATES {
        let text = match codec.decode(bytes) {
            Ok(text) => text,
            Err(e) => {
                trace!(error = %e, "candidate rejected");
                continue;
            }
        };

        if let Some(line) = first_date_line(&text) {
            return DataStart {
                line,
                codec,
                fallback: false,
            };
        }
        trace!(%codec, "decoded without a date line");
    }

    debug!(
        skip = FALLBACK_HEADER_SKIP,
        "no date line under any candidate, using defaults"
    );
    DataStart {
        line: FALLBACK_HEADER_SKIP,
        codec: Codec::Utf8Sig,
        fallback: true,
    }
}

fn first_date_line(text: &str) -> Option<usize> {
    text.split('\n').position(|line| {
        let first_field = line.split(DELIMITER as char).next().unwrap_or_default();
        parse_leading_date(first_field).is_some()
    })
}
