//! ### GNSS Commands
pub mod responses;

use atat::atat_derive::AtatCmd;

use super::NoResponse;

/// GNSS engine power state +QGPS
#[derive(Clone, AtatCmd)]
#[at_cmd("+QGPS?", NoResponse, termination = "\r")]
pub struct GetGpsPower;

/// Turn on the GNSS engine +QGPS
#[derive(Clone, AtatCmd)]
#[at_cmd("+QGPS", NoResponse, termination = "\r")]
pub struct EnableGps {
    /// 1 for stand-alone positioning
    #[at_arg(position = 0)]
    pub mode: u8,
}

/// Acquire positioning information +QGPSLOC
#[derive(Clone, AtatCmd)]
#[at_cmd("+QGPSLOC?", NoResponse, termination = "\r")]
pub struct GetLocation;
