//! Decoding of the `ValCurs` daily rates document.
//!
//! The document declares its own encoding in the XML prolog. cbr.ru serves
//! windows-1251, so the body is transcoded to UTF-8 with `encoding_rs` before
//! it is handed to the quick-xml deserializer. Any other declared encoding is
//! rejected rather than guessed at.

use std::borrow::Cow;

use chrono::NaiveDate;
use encoding_rs::WINDOWS_1251;
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{DailyRateEntry, DailyRates};

/// Date format of the `ValCurs/@Date` attribute.
pub const PUBLICATION_DATE_FORMAT: &str = "%d.%m.%Y";
/// Some mirrors of the endpoint echo the request format back.
const PUBLICATION_DATE_FORMAT_ALT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    #[error("unsupported document encoding '{0}'")]
    UnsupportedEncoding(String),
    #[error("document is not valid {0} text")]
    InvalidText(&'static str),
    #[error("malformed rates document: {0}")]
    Malformed(String),
    #[error("invalid {field} '{raw}' for currency {code}")]
    InvalidNumber {
        code: String,
        field: &'static str,
        raw: String,
    },
    #[error("invalid publication date '{0}'")]
    InvalidDate(String),
}

#[derive(Debug, Deserialize)]
struct ValCurs {
    #[serde(rename = "@Date")]
    date: String,
    #[serde(rename = "Valute", default)]
    valutes: Vec<Valute>,
}

// NumCode, Name and VunitRate are present in the document but unused.
#[derive(Debug, Deserialize)]
struct Valute {
    #[serde(rename = "CharCode")]
    char_code: String,
    #[serde(rename = "Nominal")]
    nominal: String,
    #[serde(rename = "Value")]
    value: String,
}

/// Decode a raw daily document into typed entries.
pub fn decode_daily_rates(bytes: &[u8]) -> Result<DailyRates, DecodeError> {
    let text = transcode(bytes)?;
    let doc: ValCurs = quick_xml::de::from_str(strip_declaration(&text))
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let date = parse_publication_date(&doc.date)?;

    let mut entries = Vec::with_capacity(doc.valutes.len());
    for v in doc.valutes {
        let code = v.char_code.trim().to_string();
        if code.is_empty() {
            return Err(DecodeError::Malformed("empty CharCode".to_string()));
        }

        let nominal = match v.nominal.trim().parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(DecodeError::InvalidNumber {
                    code,
                    field: "Nominal",
                    raw: v.nominal,
                });
            }
        };

        let value = match parse_decimal(&v.value) {
            Some(x) if x >= 0.0 => x,
            _ => {
                return Err(DecodeError::InvalidNumber {
                    code,
                    field: "Value",
                    raw: v.value,
                });
            }
        };

        entries.push(DailyRateEntry {
            code,
            nominal,
            value,
            date,
        });
    }

    Ok(DailyRates { date, entries })
}

/// Parse a comma-decimal number such as `"12,3456"`.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replacen(',', ".", 1);
    let v = normalized.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn parse_publication_date(raw: &str) -> Result<NaiveDate, DecodeError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, PUBLICATION_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, PUBLICATION_DATE_FORMAT_ALT))
        .map_err(|_| DecodeError::InvalidDate(raw.to_string()))
}

/// Encoding label from the XML declaration, lower-cased. `None` if the
/// document has no declaration or the declaration names no encoding.
fn declared_encoding(bytes: &[u8]) -> Result<Option<String>, DecodeError> {
    let mut reader = Reader::from_reader(bytes);
    match reader.read_event() {
        Ok(Event::Decl(decl)) => match decl.encoding() {
            None => Ok(None),
            Some(Ok(label)) => Ok(Some(
                String::from_utf8_lossy(&label).trim().to_ascii_lowercase(),
            )),
            Some(Err(e)) => Err(DecodeError::Malformed(e.to_string())),
        },
        Ok(_) => Ok(None),
        Err(e) => Err(DecodeError::Malformed(e.to_string())),
    }
}

fn transcode(bytes: &[u8]) -> Result<Cow<'_, str>, DecodeError> {
    match declared_encoding(bytes)?.as_deref() {
        None | Some("utf-8") | Some("utf8") => std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|_| DecodeError::InvalidText("utf-8")),
        Some("windows-1251") => {
            let (text, had_errors) = WINDOWS_1251.decode_without_bom_handling(bytes);
            if had_errors {
                return Err(DecodeError::InvalidText("windows-1251"));
            }
            Ok(text)
        }
        Some(other) => Err(DecodeError::UnsupportedEncoding(other.to_string())),
    }
}

/// Drop the `<?xml ...?>` prolog; it still names the source encoding after
/// transcoding.
fn strip_declaration(text: &str) -> &str {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with("<?xml") {
        if let Some(end) = trimmed.find("?>") {
            return &trimmed[end + 2..];
        }
    }
    trimmed
}
