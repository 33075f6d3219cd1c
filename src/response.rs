//! Raw text accumulated from one command/response exchange.

use heapless::Vec;

use crate::error::Error;

/// Capacity of a single exchange's ingress accumulator.
pub const INGRESS_BUF_SIZE: usize = 1024;

/// Final result code of a successful response with the blank line before it.
/// The closing `\r\n` is not part of it, reading stops as soon as `OK` shows.
const OK_TRAILER: &str = "\r\n\r\nOK";

/// Bytes read from the modem until a terminator or the deadline.
///
/// The channel never interprets the content; a short or garbled buffer is a
/// valid response, and parsers decide what it means.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    buf: Vec<u8, INGRESS_BUF_SIZE>,
}

impl RawResponse {
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append bytes, returning `false` once the accumulator is full. Bytes
    /// that do not fit are dropped.
    pub(crate) fn extend(&mut self, bytes: &[u8]) -> bool {
        let room = self.buf.capacity() - self.buf.len();
        let take = bytes.len().min(room);
        // `take` never exceeds the remaining capacity
        self.buf.extend_from_slice(&bytes[..take]).ok();
        take == bytes.len() && self.buf.len() < self.buf.capacity()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// The response as text. Anything after the first invalid UTF-8 sequence
    /// is left out.
    pub fn as_str(&self) -> &str {
        match core::str::from_utf8(&self.buf) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&self.buf[..e.valid_up_to()]).unwrap_or_default(),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.as_str().contains(marker)
    }

    pub fn is_ok(&self) -> bool {
        self.contains("OK")
    }

    pub fn is_error(&self) -> bool {
        self.contains("ERROR")
    }

    /// Whether a final result code has been observed.
    pub fn is_terminated(&self) -> bool {
        self.is_ok() || self.is_error()
    }

    /// Require a final `OK`.
    pub fn require_ok(&self) -> Result<(), Error> {
        if self.is_ok() {
            Ok(())
        } else if self.is_error() {
            Err(Error::CommandRejected)
        } else {
            Err(Error::ChannelTimeout)
        }
    }

    /// Text following `marker` up to the end of its line.
    pub fn line_after(&self, marker: &str) -> Option<&str> {
        let s = self.as_str();
        let start = s.find(marker)? + marker.len();
        let rest = &s[start..];
        let end = rest.find(['\r', '\n']).unwrap_or(rest.len());
        Some(&rest[..end])
    }

    /// The full line starting at `marker`, marker included.
    pub fn line_from(&self, marker: &str) -> Option<&str> {
        let s = self.as_str();
        let start = s.find(marker)?;
        let rest = &s[start..];
        let end = rest.find(['\r', '\n']).unwrap_or(rest.len());
        Some(&rest[..end])
    }

    /// Text between `marker` and the final `OK`, or the end of the buffer if
    /// there is none.
    pub fn payload_after(&self, marker: &str) -> Option<&str> {
        let s = self.as_str();
        let start = s.find(marker)? + marker.len();
        Some(strip_trailer(&s[start..]))
    }

    /// Lines of the response, split on `\r\n`.
    pub fn lines(&self) -> core::str::Split<'_, &'static str> {
        self.as_str().split("\r\n")
    }
}

impl From<&[u8]> for RawResponse {
    fn from(bytes: &[u8]) -> Self {
        let mut response = Self::new();
        response.extend(bytes);
        response
    }
}

impl From<&str> for RawResponse {
    fn from(s: &str) -> Self {
        Self::from(s.as_bytes())
    }
}

impl core::fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(self.as_str(), f)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for RawResponse {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(f, "{=str}", self.as_str())
    }
}

/// Cut `text` at its last `\r\n\r\nOK`, with or without the closing `\r\n`.
pub(crate) fn strip_trailer(text: &str) -> &str {
    text.rfind(OK_TRAILER).map_or(text, |end| &text[..end])
}

/// Deserialize the record following `marker` with `serde_at`.
pub(crate) fn parse_record<T>(resp: &RawResponse, marker: &str) -> Option<T>
where
    T: serde::de::DeserializeOwned,
{
    let record = resp.line_after(marker)?.trim_start();
    match atat::serde_at::from_slice::<T>(record.as_bytes()) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Failed to parse {} record: {}", marker, record);
            None
        }
    }
}

/// Strip one pair of surrounding double quotes and whitespace.
pub(crate) fn unquote(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field)
}

/// Parse an integer the way a C `strtol(.., 0)` would: optional sign,
/// `0x` prefix for hex, decimal otherwise.
pub(crate) fn parse_int_auto(field: &str) -> Option<i32> {
    let field = field.trim();
    let (negative, digits) = match field.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, field.strip_prefix('+').unwrap_or(field)),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i32>().ok()?,
    };
    Some(if negative { -value } else { value })
}
