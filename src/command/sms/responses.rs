//! Responses for Short Messages Service Commands
use atat::atat_derive::AtatResp;

use super::types::SmsMode;
use crate::error::Error;
use crate::pdu::{self, Address, DecodedSms, Text};
use crate::response::{parse_record, strip_trailer, unquote, RawResponse};

/// Message service +CSMS
#[derive(Debug, Clone, PartialEq, Eq, AtatResp)]
pub struct MessageService {
    #[at_arg(position = 0)]
    pub service: u8,
    /// Mobile terminated messages
    #[at_arg(position = 1)]
    pub mt: u8,
    /// Mobile originated messages
    #[at_arg(position = 2)]
    pub mo: u8,
    /// Broadcast messages
    #[at_arg(position = 3)]
    pub bm: u8,
}

/// Both mobile terminated and mobile originated messages must be supported.
pub fn require_sms_support(resp: &RawResponse) -> Result<(), Error> {
    let Some(service) = parse_record::<MessageService>(resp, "+CSMS:") else {
        error!("Failed to get SMS support: {}", resp.as_str());
        return Err(Error::SmsUnsupported);
    };
    info!(
        "SMS support. service = {}, mt = {}, mo = {}, bm = {}",
        service.service, service.mt, service.mo, service.bm
    );
    if service.mt == 1 && service.mo == 1 {
        Ok(())
    } else {
        Err(Error::SmsUnsupported)
    }
}

/// Parse a `+CMGR:` answer in the given message format. `None` when the
/// storage slot is empty or the message cannot be decoded.
pub fn parse_message(resp: &RawResponse, mode: SmsMode) -> Option<DecodedSms> {
    let s = resp.as_str();
    let Some(start) = s.find("+CMGR:") else {
        debug!("No MT messages");
        return None;
    };
    let (header, body) = s[start..].split_once("\r\n")?;
    let body = strip_trailer(body);

    match mode {
        SmsMode::Pdu => {
            let hex = body.split("\r\n").next().unwrap_or_default();
            match pdu::decode_deliver(hex) {
                Ok(deliver) => Some(deliver.into()),
                Err(e) => {
                    error!("Failed to decode PDU message {}: {}", hex, e);
                    None
                }
            }
        }
        SmsMode::Text => {
            let sender = header.split(',').nth(1).map(unquote).unwrap_or_default();
            let sender = Address::try_from(sender).ok().filter(|s| !s.is_empty());
            let mut text = Text::new();
            for c in body.trim_end_matches(['\r', '\n']).chars() {
                if text.push(c).is_err() {
                    warn!("Message truncated");
                    break;
                }
            }
            Some(DecodedSms { sender, text })
        }
    }
}
