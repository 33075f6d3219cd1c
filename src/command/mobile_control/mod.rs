//! ### Mobile equipment control and status Commands
pub mod responses;
pub mod types;

use atat::atat_derive::AtatCmd;

use super::NoResponse;
use responses::ModuleFunctionality;
use types::{Functionality, TerminationErrorMode};

/// Set phone functionality +CFUN
#[derive(Clone, AtatCmd)]
#[at_cmd("+CFUN", NoResponse, termination = "\r")]
pub struct SetModuleFunctionality {
    #[at_arg(position = 0)]
    pub fun: Functionality,
}

/// Read phone functionality +CFUN
#[derive(Clone, AtatCmd)]
#[at_cmd("+CFUN?", ModuleFunctionality, termination = "\r")]
pub struct GetModuleFunctionality;

/// Report mobile termination error +CMEE
///
/// With verbose mode, failures carry a readable reason after `+CME ERROR:`,
/// which ends up in the exchange log.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CMEE", NoResponse, termination = "\r")]
pub struct SetReportMobileTerminationError {
    #[at_arg(position = 0)]
    pub n: TerminationErrorMode,
}
