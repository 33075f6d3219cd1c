//! ### Short Messages Service
pub mod responses;
pub mod types;

use atat::atat_derive::AtatCmd;

use super::NoResponse;
use responses::MessageService;
use types::SmsMode;

/// Select message service +CSMS
///
/// The read form reports which message directions the service supports.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CSMS?", MessageService, termination = "\r")]
pub struct GetMessageService;

/// Message format +CMGF
#[derive(Clone, AtatCmd)]
#[at_cmd("+CMGF", NoResponse, termination = "\r")]
pub struct SetMessageFormat {
    #[at_arg(position = 0)]
    pub mode: SmsMode,
}

/// Read message +CMGR
///
/// The answer depends on the message format: a quoted header followed by the
/// text in text mode, or a short header followed by the SMS-DELIVER PDU.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CMGR", NoResponse, termination = "\r")]
pub struct ReadMessage {
    #[at_arg(position = 0)]
    pub index: u16,
}

/// Delete message +CMGD
#[derive(Clone, AtatCmd)]
#[at_cmd("+CMGD", NoResponse, termination = "\r")]
pub struct DeleteMessage {
    #[at_arg(position = 0)]
    pub index: u16,
}

/// Send message +CMGS
///
/// In PDU mode `length` counts the PDU octets following the SMSC field. The
/// modem answers with a `> ` prompt and waits for the PDU terminated by
/// Ctrl-Z.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CMGS", NoResponse, termination = "\r")]
pub struct SendMessage {
    #[at_arg(position = 0)]
    pub length: u16,
}
