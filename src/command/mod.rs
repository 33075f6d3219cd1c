//! AT commands for the Nimbelink Skywire modem family
//!
//! Commands are serialized with `atat` and terminated by a bare `\r`, which is
//! what the modem expects on its UART. Responses are read back as raw text by
//! the command channel and parsed by the `responses` module of each family.

pub mod general;
pub mod gnss;
pub mod mobile_control;
pub mod network_service;
pub mod psn;
pub mod sms;

use atat::atat_derive::{AtatCmd, AtatResp};

#[derive(Clone, AtatResp)]
pub struct NoResponse;

/// Attention, checks that the modem answers at all.
#[derive(Clone, AtatCmd)]
#[at_cmd("", NoResponse, termination = "\r")]
pub struct AT;
