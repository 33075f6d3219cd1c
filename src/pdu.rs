//! SMS PDU codec
//!
//! Outgoing messages are encoded as single-segment SMS-SUBMIT PDUs with 8-bit
//! user data. Incoming SMS-DELIVER PDUs are decoded from either the GSM 7-bit
//! default alphabet, 8-bit data or UCS2.

use heapless::{String, Vec};

use crate::error::Error;
use crate::hex::{decode_hex, push_hex};

/// Maximum user data of a single-segment message, in octets.
pub const MAX_MESSAGE_LEN: usize = 140;
/// Hard cap on the number of septets unpacked from one user data field.
pub const MAX_SEPTETS: usize = 0xA0;
/// Longest accepted recipient number, in digits.
pub const MAX_ADDRESS_DIGITS: usize = 20;
/// Longest SMS-SUBMIT PDU, as hex text.
pub const MAX_PDU_LEN: usize = 2 * (5 + MAX_ADDRESS_DIGITS / 2 + 4 + MAX_MESSAGE_LEN);
/// Longest decoded text body. A full 7-bit payload where every character is
/// three bytes of UTF-8.
pub const MAX_TEXT_LEN: usize = 3 * MAX_SEPTETS;

pub type Address = String<24>;
pub type Text = String<MAX_TEXT_LEN>;

// SMS-SUBMIT header fields
const SMSC_DEFAULT: u8 = 0x00;
const SMS_SUBMIT: u8 = 0x11;
const MESSAGE_REFERENCE: u8 = 0x00;
const TYPE_INTERNATIONAL: u8 = 0x91;
const TYPE_ALPHANUMERIC: u8 = 0xD0;
const PROTOCOL_ID: u8 = 0x00;
const DCS_8BIT: u8 = 0x04;
const VALIDITY_4_WEEKS: u8 = 0xC2;

const ESCAPE: u8 = 0x1B;

/// An encoded SMS-SUBMIT, ready for `AT+CMGS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsPdu {
    /// Octet count announced to `AT+CMGS`; the SMSC length octet is excluded.
    pub octets: usize,
    pub hex: String<MAX_PDU_LEN>,
}

/// A received message as handed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSms {
    /// Originating number; international numbers carry a leading `+`.
    pub sender: Option<Address>,
    pub text: Text,
}

/// A parsed SMS-DELIVER PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsDeliver {
    pub smsc: Option<Address>,
    pub sender: Address,
    pub pid: u8,
    pub dcs: u8,
    /// Service centre timestamp as `YYMMDDhhmmss`.
    pub timestamp: String<12>,
    pub udl: u8,
    pub text: Text,
}

impl From<SmsDeliver> for DecodedSms {
    fn from(deliver: SmsDeliver) -> Self {
        Self {
            sender: Some(deliver.sender),
            text: deliver.text,
        }
    }
}

/// Encode `text` for `recipient` as an SMS-SUBMIT PDU.
///
/// The recipient is a digit string in international format; a leading `+` is
/// dropped. Every character is sent as one octet, so only U+0000..=U+00FF is
/// accepted.
pub fn encode(recipient: &str, text: &str) -> Result<SmsPdu, Error> {
    let digits = recipient.strip_prefix('+').unwrap_or(recipient);
    if digits.is_empty()
        || digits.len() > MAX_ADDRESS_DIGITS
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(Error::InvalidRecipient);
    }

    let len = text.chars().count();
    if len > MAX_MESSAGE_LEN {
        return Err(Error::MessageTooLong);
    }

    let address: String<MAX_ADDRESS_DIGITS> =
        swap_semi_octets(digits).ok_or(Error::InvalidRecipient)?;

    let mut hex = String::new();
    let overflow = |_| Error::MessageTooLong;
    for byte in [
        SMSC_DEFAULT,
        SMS_SUBMIT,
        MESSAGE_REFERENCE,
        digits.len() as u8,
        TYPE_INTERNATIONAL,
    ] {
        push_hex(&mut hex, byte).map_err(overflow)?;
    }
    hex.push_str(&address).map_err(overflow)?;
    for byte in [PROTOCOL_ID, DCS_8BIT, VALIDITY_4_WEEKS, len as u8] {
        push_hex(&mut hex, byte).map_err(overflow)?;
    }
    for c in text.chars() {
        let byte = u8::try_from(u32::from(c)).map_err(|_| Error::InvalidMessage)?;
        push_hex(&mut hex, byte).map_err(overflow)?;
    }

    let octets = (hex.len() - 2) / 2;
    debug!("Encoded {} character SMS into {} octets", len, octets);
    Ok(SmsPdu { octets, hex })
}

/// Swap each pair of characters: `4155157916` becomes `1455519761`. An odd
/// trailing character is paired with an `F` filler.
///
/// Returns `None` if the result does not fit in `N` bytes.
pub fn swap_semi_octets<const N: usize>(digits: &str) -> Option<String<N>> {
    let mut out = String::new();
    let mut chars = digits.chars();
    while let Some(a) = chars.next() {
        let b = chars.next().unwrap_or('F');
        out.push(b).ok()?;
        out.push(a).ok()?;
    }
    Some(out)
}

/// Unpack hex encoded GSM 7-bit user data into septets.
///
/// Every seventh octet completes an extra septet from the carried bits. At
/// most [`MAX_SEPTETS`] septets are produced.
pub fn unpack_septets(hex: &str) -> Result<Vec<u8, MAX_SEPTETS>, Error> {
    if hex.len() % 2 != 0 {
        return Err(Error::MalformedResponse);
    }

    let mut septets = Vec::new();
    let mut count = 0u32;
    let mut last = 0u8;
    for i in (0..hex.len()).step_by(2) {
        let byte = hex
            .get(i..i + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .ok_or(Error::MalformedResponse)?;

        let mask = 0x7F >> count;
        let septet = ((byte & mask) << count) | last;
        last = byte >> (7 - count);
        if septets.push(septet).is_err() {
            break;
        }
        if count == 6 {
            if septets.push(last).is_err() {
                break;
            }
            last = 0;
        }
        count = (count + 1) % 7;
    }
    Ok(septets)
}

/// Map septets through the GSM 03.38 default alphabet.
pub fn septets_to_text(septets: &[u8]) -> Text {
    let mut text = Text::new();
    let mut iter = septets.iter().map(|s| s & 0x7F);
    while let Some(septet) = iter.next() {
        let c = if septet == ESCAPE {
            match iter.next() {
                Some(ext) => gsm_extension(ext),
                None => break,
            }
        } else {
            GSM_ALPHABET[septet as usize]
        };
        if text.push(c).is_err() {
            break;
        }
    }
    text
}

/// Decode a hex encoded SMS-DELIVER PDU, as read in PDU mode with `AT+CMGR`.
pub fn decode_deliver(hex: &str) -> Result<SmsDeliver, Error> {
    let mut reader = HexReader::new(hex.trim());

    let smsc_len = reader.octet()? as usize;
    let smsc = if smsc_len > 0 {
        let kind = reader.octet()?;
        Some(decode_number(kind, reader.take(smsc_len - 1)?, None)?)
    } else {
        None
    };

    let _first_octet = reader.octet()?;

    let sender_digits = reader.octet()? as usize;
    let sender_kind = reader.octet()?;
    let sender_hex = reader.take(sender_digits.div_ceil(2))?;
    let sender = decode_number(sender_kind, sender_hex, Some(sender_digits))?;

    let pid = reader.octet()?;
    let dcs = reader.octet()?;

    let stamp: String<14> = swap_semi_octets(reader.take(7)?).ok_or(Error::MalformedResponse)?;
    let mut timestamp = String::new();
    timestamp
        .push_str(stamp.get(..12).ok_or(Error::MalformedResponse)?)
        .map_err(|_| Error::MalformedResponse)?;

    let udl = reader.octet()?;
    let user_data = reader.rest();

    let text = match dcs & 0x0C {
        0x04 => latin1_to_text(user_data, udl as usize)?,
        0x08 => ucs2_to_text(user_data, udl as usize),
        _ => {
            let septets = unpack_septets(user_data)?;
            let len = septets.len().min(udl as usize);
            septets_to_text(&septets[..len])
        }
    };

    debug!("Decoded SMS-DELIVER from {}: {}", sender.as_str(), text.as_str());

    Ok(SmsDeliver {
        smsc,
        sender,
        pid,
        dcs,
        timestamp,
        udl,
        text,
    })
}

/// Decode an address field. `digits` is the semi-octet count announced for
/// originating addresses; service centre addresses fill all their octets.
fn decode_number(kind: u8, hex: &str, digits: Option<usize>) -> Result<Address, Error> {
    let mut out = Address::new();

    if kind == TYPE_ALPHANUMERIC {
        let septets = unpack_septets(hex)?;
        let len = digits.map_or(septets.len(), |d| (d * 4 / 7).min(septets.len()));
        for c in septets_to_text(&septets[..len]).chars() {
            out.push(c).map_err(|_| Error::MalformedResponse)?;
        }
        return Ok(out);
    }

    if kind == TYPE_INTERNATIONAL {
        out.push('+').map_err(|_| Error::MalformedResponse)?;
    }
    let swapped: String<24> = swap_semi_octets(hex).ok_or(Error::MalformedResponse)?;
    let number = swapped.trim_end_matches(['F', 'f']);
    let number = match digits {
        Some(d) => number.get(..d).unwrap_or(number),
        None => number,
    };
    out.push_str(number).map_err(|_| Error::MalformedResponse)?;
    Ok(out)
}

/// 8-bit user data, one character per octet. Data shorter than `udl` is
/// taken as is.
fn latin1_to_text(hex: &str, udl: usize) -> Result<Text, Error> {
    let data = hex.get(..2 * udl).unwrap_or(hex);
    let bytes: Vec<u8, MAX_MESSAGE_LEN> = decode_hex(data)?;
    let mut text = Text::new();
    for &byte in &bytes {
        // At most two UTF-8 bytes per octet, always within `MAX_TEXT_LEN`
        text.push(char::from(byte)).ok();
    }
    Ok(text)
}

fn ucs2_to_text(hex: &str, udl: usize) -> Text {
    let mut text = Text::new();
    let mut reader = HexReader::new(hex);
    for _ in 0..udl / 2 {
        let (Ok(hi), Ok(lo)) = (reader.octet(), reader.octet()) else {
            break;
        };
        let c = char::from_u32(u32::from(hi) << 8 | u32::from(lo))
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        if text.push(c).is_err() {
            break;
        }
    }
    text
}

struct HexReader<'a> {
    hex: &'a str,
    pos: usize,
}

impl<'a> HexReader<'a> {
    fn new(hex: &'a str) -> Self {
        Self { hex, pos: 0 }
    }

    fn take(&mut self, octets: usize) -> Result<&'a str, Error> {
        let end = self.pos + 2 * octets;
        let slice = self.hex.get(self.pos..end).ok_or(Error::MalformedResponse)?;
        self.pos = end;
        Ok(slice)
    }

    fn octet(&mut self) -> Result<u8, Error> {
        let pair = self.take(1)?;
        u8::from_str_radix(pair, 16).map_err(|_| Error::MalformedResponse)
    }

    fn rest(&self) -> &'a str {
        self.hex.get(self.pos..).unwrap_or_default()
    }
}

fn gsm_extension(septet: u8) -> char {
    match septet {
        0x0A => '\u{0C}',
        0x14 => '^',
        0x28 => '{',
        0x29 => '}',
        0x2F => '\\',
        0x3C => '[',
        0x3D => '~',
        0x3E => ']',
        0x40 => '|',
        0x65 => '€',
        other => GSM_ALPHABET[(other & 0x7F) as usize],
    }
}

#[rustfmt::skip]
const GSM_ALPHABET: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å',
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', ' ', 'Æ', 'æ', 'ß', 'É',
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/',
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?',
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§',
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à',
];
