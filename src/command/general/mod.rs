//! ### General commands
pub mod responses;

use atat::atat_derive::AtatCmd;

use super::NoResponse;

/// Request international mobile subscriber identification +CIMI
///
/// The IMSI is answered on a line of its own, without a `+CIMI:` prefix.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CIMI", NoResponse, termination = "\r")]
pub struct GetIMSI;

/// Subscriber number +CNUM
#[derive(Clone, AtatCmd)]
#[at_cmd("+CNUM", NoResponse, termination = "\r")]
pub struct GetSubscriberNumber;

/// Software reset +CRES
///
/// The modem reboots without answering.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CRES", NoResponse, termination = "\r")]
pub struct SoftReset;
