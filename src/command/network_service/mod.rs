//! ### Network service
pub mod responses;
pub mod types;

use atat::atat_derive::AtatCmd;

use super::NoResponse;
use responses::SignalQuality;
use types::CellMonitorMode;

/// Query and report signal strength +QCSQ
///
/// Answers the access technology in use, or `NOSERVICE`.
#[derive(Clone, AtatCmd)]
#[at_cmd("+QCSQ", NoResponse, termination = "\r")]
pub struct GetNetworkMode;

/// EPS network registration status +CEREG
#[derive(Clone, AtatCmd)]
#[at_cmd("+CEREG?", NoResponse, termination = "\r")]
pub struct GetEPSNetworkRegistrationStatus;

/// Signal quality +CSQ
#[derive(Clone, AtatCmd)]
#[at_cmd("+CSQ", SignalQuality, termination = "\r")]
pub struct GetSignalQuality;

/// Read current network status #RFSTS
#[derive(Clone, AtatCmd)]
#[at_cmd("#RFSTS", NoResponse, termination = "\r")]
pub struct GetServingCell;

/// Cell monitor selection #MONIZIP
#[derive(Clone, AtatCmd)]
#[at_cmd("#MONIZIP", NoResponse, termination = "\r")]
pub struct SetCellMonitor {
    #[at_arg(position = 0)]
    pub mode: CellMonitorMode,
}

/// Cell monitor #MONIZIP
///
/// Reports one `#MONIZIP:` row per cell selected by [`SetCellMonitor`].
#[derive(Clone, AtatCmd)]
#[at_cmd("#MONIZIP", NoResponse, termination = "\r")]
pub struct GetCellMonitor;
