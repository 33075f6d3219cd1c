use core::{fmt, num::ParseIntError};
use heapless::{String, Vec};

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

pub fn decode_hex<const N: usize>(s: &str) -> Result<Vec<u8, N>, DecodeHexError> {
    if s.len() % 2 != 0 {
        return Err(DecodeHexError::OddLength);
    }

    let mut out = Vec::new();
    for i in (0..s.len()).step_by(2) {
        let byte = s
            .get(i..i + 2)
            .ok_or(DecodeHexError::NonAscii)
            .and_then(|pair| u8::from_str_radix(pair, 16).map_err(DecodeHexError::ParseInt))?;
        out.push(byte).map_err(|_| DecodeHexError::Capacity)?;
    }
    Ok(out)
}

/// Append `byte` as two uppercase hex digits.
pub fn push_hex<const N: usize>(out: &mut String<N>, byte: u8) -> Result<(), ()> {
    out.push(HEX_DIGITS[(byte >> 4) as usize] as char)?;
    out.push(HEX_DIGITS[(byte & 0x0F) as usize] as char)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeHexError {
    OddLength,
    NonAscii,
    Capacity,
    ParseInt(ParseIntError),
}

impl fmt::Display for DecodeHexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeHexError::OddLength => f.write_str("input string has an odd number of bytes"),
            DecodeHexError::NonAscii => f.write_str("input string is not ascii"),
            DecodeHexError::Capacity => f.write_str("decoded bytes exceed buffer capacity"),
            DecodeHexError::ParseInt(e) => fmt::Display::fmt(e, f),
        }
    }
}
