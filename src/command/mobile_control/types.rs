//! Argument and parameter types used by Mobile equipment control Commands
use atat::atat_derive::AtatEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Functionality {
    /// RF circuits disabled, SIM still readable
    Minimum = 0,
    Full = 1,
    /// Disables both transmit and receive RF circuits
    DisableRF = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum TerminationErrorMode {
    /// +CME ERROR: <err> result code disabled and ERROR used
    Disabled = 0,
    /// +CME ERROR: <err> result code enabled and numeric <err> values used
    Enabled = 1,
    /// +CME ERROR: <err> result code enabled and verbose <err> values used
    Verbose = 2,
}
