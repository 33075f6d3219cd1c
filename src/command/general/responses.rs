//! Responses for General Commands
use heapless::String;

use crate::response::{unquote, RawResponse};

/// An IMSI has at most 15 digits.
pub type Imsi = String<15>;
pub type SubscriberNumber = String<24>;

/// The first line of the response made of digits only.
pub fn parse_imsi(resp: &RawResponse) -> Option<Imsi> {
    let line = resp
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && l.bytes().all(|b| b.is_ascii_digit()))?;
    String::try_from(line).ok()
}

/// `+CNUM: [<alpha>],<number>,<type>`, the number being the second, quoted
/// field.
pub fn parse_subscriber_number(resp: &RawResponse) -> Option<SubscriberNumber> {
    let record = resp.line_after("+CNUM:")?;
    let number = unquote(record.split(',').nth(1)?);
    if number.is_empty() {
        return None;
    }
    String::try_from(number).ok()
}
