//! ### Packet Switched Data Services Commands
//!
//! The modem keeps up to 16 PDP contexts; only the one configured as
//! `ModemConfig::CONTEXT_ID` is used here.
pub mod responses;

use atat::atat_derive::AtatCmd;

use super::NoResponse;
use responses::PDPContextState;

/// Read PDP context state +QIACT
///
/// Lists one `+QIACT:` record per activated context. No record at all means
/// no context is active.
#[derive(Clone, AtatCmd)]
#[at_cmd("+QIACT?", PDPContextState, termination = "\r")]
pub struct GetPDPContextState;

/// Activate a PDP context +QIACT
#[derive(Clone, AtatCmd)]
#[at_cmd("+QIACT", NoResponse, termination = "\r")]
pub struct ActivatePDPContext {
    #[at_arg(position = 0)]
    pub cid: u8,
}
