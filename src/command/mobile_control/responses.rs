//! Responses for Mobile equipment control and status Commands
use atat::atat_derive::AtatResp;

use crate::error::Error;
use crate::response::{parse_record, RawResponse};

/// Phone functionality +CFUN
#[derive(Debug, Clone, PartialEq, Eq, AtatResp)]
pub struct ModuleFunctionality {
    #[at_arg(position = 0)]
    pub fun: u8,
}

/// The functionality level reported by `AT+CFUN?`.
pub fn parse_functionality(resp: &RawResponse) -> Result<u8, Error> {
    parse_record::<ModuleFunctionality>(resp, "+CFUN:")
        .map(|r| r.fun)
        .ok_or(Error::MalformedResponse)
}

/// Only full functionality lets the modem register and send messages.
pub fn require_full_functionality(resp: &RawResponse) -> Result<(), Error> {
    match parse_functionality(resp)? {
        1 => Ok(()),
        fun => {
            warn!("Modem reports functionality {}", fun);
            Err(Error::ModemNotFunctional)
        }
    }
}
